//! Decode integration tests: schema text, JSON text, decoded value.

use avro_json_decoder::{
    decode_json, decode_str, DecoderConfig, Error, JsonDecoder, Result, Schema, SpecificRecord,
    TypeRegistry, Value,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;
use std::any::Any;

const USER_SCHEMA: &str = r#"{
    "type": "record",
    "name": "User",
    "namespace": "com.example",
    "fields": [
        {"name": "id", "type": "long"},
        {"name": "name", "type": "string"},
        {"name": "score", "type": "int", "default": 0},
        {"name": "email", "type": ["null", "string"], "default": null},
        {"name": "tags", "type": {"type": "array", "items": "string"}, "default": []},
        {"name": "role", "type": {"type": "enum", "name": "Role", "symbols": ["ADMIN", "MEMBER"]}, "default": "MEMBER"},
        {"name": "attrs", "type": ["null", {"type": "map", "values": "double"}], "default": null}
    ]
}"#;

fn user_schema() -> Schema {
    Schema::parse_str(USER_SCHEMA).unwrap()
}

// ── scalars ─────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn prop_int_round_trips(n in any::<i32>()) {
        prop_assert_eq!(decode_json(&json!(n), &Schema::Int).unwrap(), Value::Int(n));
    }

    #[test]
    fn prop_long_round_trips(n in any::<i64>()) {
        prop_assert_eq!(decode_json(&json!(n), &Schema::Long).unwrap(), Value::Long(n));
    }

    #[test]
    fn prop_string_round_trips(s in ".*") {
        prop_assert_eq!(decode_json(&json!(s), &Schema::String).unwrap(), Value::String(s));
    }

    #[test]
    fn prop_stringified_int_is_mismatch(n in any::<i32>()) {
        let err = decode_json(&json!(n.to_string()), &Schema::Int).unwrap_err();
        let is_type_mismatch = matches!(err, Error::TypeMismatch { .. });
        prop_assert!(is_type_mismatch);
    }

    #[test]
    fn prop_out_of_range_long_is_not_int(n in (i64::from(i32::MAX) + 1)..i64::MAX) {
        prop_assert!(decode_json(&json!(n), &Schema::Int).is_err());
    }
}

// ── records ─────────────────────────────────────────────────────────────

#[test]
fn test_full_record_with_defaults() {
    let value = decode_str(r#"{"id": 7, "name": "ada"}"#, &user_schema()).unwrap();
    assert_eq!(
        value.to_json(),
        json!({
            "id": 7,
            "name": "ada",
            "score": 0,
            "email": null,
            "tags": [],
            "role": "MEMBER",
            "attrs": null
        })
    );

    let record = value.as_record().unwrap();
    assert_eq!(record.full_name(), "com.example.User");
    assert_eq!(record.get_by_name("score"), Some(&Value::Int(0)));
}

#[test]
fn test_record_with_every_field_present() {
    let text = r#"{
        "id": 1, "name": "bo", "score": 3, "email": "bo@example.com",
        "tags": ["a", "b"], "role": "ADMIN", "attrs": {"h": 1.5}
    }"#;
    let value = decode_str(text, &user_schema()).unwrap();
    assert_eq!(
        value.to_json(),
        json!({
            "id": 1, "name": "bo", "score": 3, "email": "bo@example.com",
            "tags": ["a", "b"], "role": "ADMIN", "attrs": {"h": 1.5}
        })
    );
}

#[test]
fn test_record_decoding_is_idempotent() {
    let schema = user_schema();
    let node = json!({"id": 2, "name": "cy", "tags": ["x"]});
    assert_eq!(decode_json(&node, &schema).unwrap(), decode_json(&node, &schema).unwrap());
}

#[test]
fn test_missing_field_with_and_without_default() {
    let with_default = Schema::parse_str(
        r#"{"type": "record", "name": "pkg.R", "fields": [{"name": "n", "type": "int", "default": 0}]}"#,
    )
    .unwrap();
    let value = decode_json(&json!({}), &with_default).unwrap();
    assert_eq!(value.as_record().unwrap().values(), &[Value::Int(0)]);

    let without_default = Schema::parse_str(
        r#"{"type": "record", "name": "pkg.R", "fields": [{"name": "n", "type": "int"}]}"#,
    )
    .unwrap();
    let err = decode_json(&json!({}), &without_default).unwrap_err();
    assert!(matches!(
        err,
        Error::MissingRequiredField { ref record, ref field } if record == "pkg.R" && field == "n"
    ));
}

#[test]
fn test_extra_field_rejection() {
    let schema = Schema::parse_str(
        r#"{"type": "record", "name": "pkg.R", "fields": [{"name": "a", "type": "int"}]}"#,
    )
    .unwrap();
    let err = decode_json(&json!({"a": 1, "b": 2}), &schema).unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"unexpected fields in record pkg.R: [b]");
}

#[test]
fn test_nested_error_surfaces_innermost_cause() {
    let err = decode_str(r#"{"id": 1, "name": "x", "tags": ["ok", 5]}"#, &user_schema()).unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"type mismatch: expected string, got integer 5");
}

#[test]
fn test_recursive_schema() {
    let schema = Schema::parse_str(
        r#"{
            "type": "record",
            "name": "pkg.Node",
            "fields": [
                {"name": "value", "type": "int"},
                {"name": "next", "type": ["null", "Node"], "default": null}
            ]
        }"#,
    )
    .unwrap();

    let value = decode_json(&json!({"value": 1, "next": {"value": 2, "next": {"value": 3}}}), &schema).unwrap();
    assert_eq!(
        value.to_json(),
        json!({"value": 1, "next": {"value": 2, "next": {"value": 3, "next": null}}})
    );
}

// ── unions ──────────────────────────────────────────────────────────────

#[test]
fn test_union_of_records_by_wrapper_and_order() {
    let schema = Schema::parse_str(
        r#"[
            {"type": "record", "name": "pkg.TypeA", "fields": [{"name": "v", "type": "int"}]},
            {"type": "record", "name": "pkg.TypeB", "fields": [{"name": "v", "type": "int"}]}
        ]"#,
    )
    .unwrap();

    let wrapped = decode_json(&json!({"pkg.TypeB": {"v": 1}}), &schema).unwrap();
    assert_eq!(wrapped.as_record().unwrap().full_name(), "pkg.TypeB");

    let bare = decode_json(&json!({"v": 1}), &schema).unwrap();
    assert_eq!(bare.as_record().unwrap().full_name(), "pkg.TypeA");
}

#[test]
fn test_union_with_no_match() {
    let schema = Schema::parse_str(r#"["int", "boolean"]"#).unwrap();
    let err = decode_json(&json!("nope"), &schema).unwrap_err();
    insta::assert_snapshot!(err.to_string(), @r#"cannot resolve union ["int","boolean"] for "nope""#);
}

#[test]
fn test_null_collections_in_optional_positions() {
    let schema = Schema::parse_str(r#"["null", {"type": "array", "items": "int"}]"#).unwrap();
    assert_eq!(decode_json(&json!(null), &schema).unwrap(), Value::Null);

    let schema = Schema::parse_str(r#"{"type": "map", "values": "int"}"#).unwrap();
    assert_eq!(decode_json(&json!(null), &schema).unwrap(), Value::Null);
}

// ── input syntax ────────────────────────────────────────────────────────

#[test]
fn test_lenient_and_strict_syntax() {
    let text = "{ /* user */ id: 3, name: 'dee', }";
    let value = decode_str(text, &user_schema()).unwrap();
    assert_eq!(value.as_record().unwrap().get_by_name("name"), Some(&Value::String("dee".into())));

    let strict = JsonDecoder::new(DecoderConfig {
        lenient_syntax: false,
        ..DecoderConfig::default()
    })
    .unwrap();
    let err = strict.decode_str(text, &user_schema(), false).unwrap_err();
    assert!(matches!(err, Error::MalformedInput(_)));
}

#[test]
fn test_lenient_default_keeps_standard_json_numbers() {
    let optional = Schema::parse_str(r#"["null", "double"]"#).unwrap();
    assert!(matches!(decode_str("NaN", &optional), Err(Error::MalformedInput(_))));
    assert!(matches!(decode_str("-Infinity", &Schema::Double), Err(Error::MalformedInput(_))));
    assert_eq!(
        decode_str("18446744073709551615", &optional).unwrap(),
        Value::Double(18_446_744_073_709_551_615_u64 as f64)
    );
}

// ── specific records ────────────────────────────────────────────────────

#[derive(Debug, Default, PartialEq)]
struct Point {
    x: i32,
    y: i32,
}

impl SpecificRecord for Point {
    fn put(&mut self, position: usize, value: Value) -> Result<()> {
        match (position, value) {
            (0, Value::Int(x)) => self.x = x,
            (1, Value::Int(y)) => self.y = y,
            (_, other) => return Err(Error::type_mismatch("int", &other.to_json())),
        }
        Ok(())
    }

    fn get(&self, position: usize) -> Option<Value> {
        match position {
            0 => Some(Value::Int(self.x)),
            1 => Some(Value::Int(self.y)),
            _ => None,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn shape_schema() -> Schema {
    Schema::parse_str(
        r#"{
            "type": "record",
            "name": "geo.Shape",
            "fields": [
                {"name": "points", "type": {"type": "array", "items": {
                    "type": "record", "name": "Point", "fields": [
                        {"name": "x", "type": "int"},
                        {"name": "y", "type": "int", "default": 0}
                    ]}}},
                {"name": "kind", "type": {"type": "enum", "name": "Kind", "symbols": ["OPEN", "CLOSED"]}}
            ]
        }"#,
    )
    .unwrap()
}

#[derive(Debug, Default)]
struct Shape {
    points: Vec<Value>,
    kind: Option<Value>,
}

impl SpecificRecord for Shape {
    fn put(&mut self, position: usize, value: Value) -> Result<()> {
        match (position, value) {
            (0, Value::Array(points)) => self.points = points,
            (1, kind) => self.kind = Some(kind),
            (_, other) => return Err(Error::type_mismatch("array", &other.to_json())),
        }
        Ok(())
    }

    fn get(&self, position: usize) -> Option<Value> {
        match position {
            0 => Some(Value::Array(self.points.clone())),
            1 => self.kind.clone(),
            _ => None,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn specific_decoder() -> JsonDecoder {
    let mut registry = TypeRegistry::new();
    registry.register_record::<Shape>("geo.Shape").unwrap();
    registry.register_record::<Point>("geo.Point").unwrap();
    registry.register_enum("geo.Kind", vec!["OPEN", "CLOSED"]).unwrap();
    JsonDecoder::default().with_resolver(registry)
}

#[test]
fn test_specific_records_are_registered_types() {
    let decoder = specific_decoder();
    let value = decoder
        .decode_str(r#"{"points": [{"x": 1, "y": 2}, {"x": 5}], "kind": "CLOSED"}"#, &shape_schema(), true)
        .unwrap();

    let shape = value.as_specific().unwrap();
    assert_eq!(shape.full_name(), "geo.Shape");
    let concrete = shape.downcast_ref::<Shape>().unwrap();
    let points: Vec<&Point> = concrete
        .points
        .iter()
        .map(|p| p.as_specific().unwrap().downcast_ref::<Point>().unwrap())
        .collect();
    assert_eq!(points, vec![&Point { x: 1, y: 2 }, &Point { x: 5, y: 0 }]);

    assert_eq!(
        value.to_json(),
        json!({"points": [{"x": 1, "y": 2}, {"x": 5, "y": 0}], "kind": "CLOSED"})
    );
}

#[test]
fn test_specific_mode_requires_registration() {
    let decoder = JsonDecoder::default();
    let err = decoder
        .decode_str(r#"{"points": [], "kind": "OPEN"}"#, &shape_schema(), true)
        .unwrap_err();
    assert!(matches!(err, Error::UnknownName(ref name) if name == "geo.Shape"));
}

#[test]
fn test_specific_enum_symbol_is_checked_against_registry() {
    let mut registry = TypeRegistry::new();
    registry.register_record::<Shape>("geo.Shape").unwrap();
    registry.register_enum("geo.Kind", vec!["OPEN"]).unwrap();
    let decoder = JsonDecoder::default().with_resolver(registry);

    let err = decoder
        .decode_str(r#"{"points": [], "kind": "CLOSED"}"#, &shape_schema(), true)
        .unwrap_err();
    assert!(matches!(err, Error::UnknownEnumSymbol { ref symbol, .. } if symbol == "CLOSED"));
}

#[test]
fn test_decoder_is_shareable_across_threads() {
    let decoder = std::sync::Arc::new(specific_decoder());
    let schema = std::sync::Arc::new(shape_schema());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let decoder = decoder.clone();
            let schema = schema.clone();
            std::thread::spawn(move || {
                let node = json!({"points": [{"x": i}], "kind": "OPEN"});
                decoder.decode(&node, &schema, true).map(|v| v.to_json())
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let decoded = handle.join().unwrap().unwrap();
        assert_eq!(decoded["points"][0]["x"], json!(i));
    }
}
