//! Avro schema JSON parser.
//!
//! Named types must be defined before they are referenced; a record may refer
//! to itself from its own fields. Namespaces follow the Avro rules: an explicit
//! `namespace` attribute wins, then a dotted name, then the enclosing
//! namespace.

use serde_json::{Map, Value as Json};
use std::collections::HashMap;
use std::sync::Arc;

use super::{EnumSchema, Field, FixedSchema, Name, RecordSchema, Schema, SchemaKind, UnionSchema};
use crate::types::{Error, Result};

#[derive(Debug, Default)]
pub(super) struct SchemaParser {
    /// Full names defined so far and their tags.
    defined: HashMap<String, SchemaKind>,
}

impl SchemaParser {
    pub(super) fn parse_root(mut self, json: &Json) -> Result<Schema> {
        self.parse(json, None)
    }

    fn parse(&mut self, json: &Json, namespace: Option<&str>) -> Result<Schema> {
        match json {
            Json::String(name) => self.parse_name(name, namespace),
            Json::Array(members) => {
                let members = members
                    .iter()
                    .map(|m| self.parse(m, namespace))
                    .collect::<Result<Vec<_>>>()?;
                Schema::union(members)
            }
            Json::Object(obj) => self.parse_object(obj, namespace),
            other => Err(Error::invalid_schema(format!(
                "expected a type name, object or union array, got {other}"
            ))),
        }
    }

    fn parse_name(&self, name: &str, namespace: Option<&str>) -> Result<Schema> {
        if let Some(kind) = SchemaKind::primitive(name) {
            return Ok(primitive(kind));
        }

        let qualified = Name::new(name, namespace)?;
        let candidates = [qualified.full_name(), name];
        for candidate in candidates {
            if let Some(kind) = self.defined.get(candidate) {
                return Ok(Schema::Ref {
                    name: Name::parse(candidate)?,
                    kind: *kind,
                });
            }
        }
        Err(Error::invalid_schema(format!("unknown type '{name}'")))
    }

    fn parse_object(&mut self, obj: &Map<String, Json>, namespace: Option<&str>) -> Result<Schema> {
        let type_attr = obj
            .get("type")
            .ok_or_else(|| Error::invalid_schema("schema object has no 'type' attribute"))?;

        let type_name = match type_attr {
            Json::String(s) => s.as_str(),
            // {"type": {...}} or {"type": [...]} wraps another schema
            other => return self.parse(other, namespace),
        };

        match type_name {
            "record" | "error" => self.parse_record(obj, namespace),
            "enum" => self.parse_enum(obj, namespace),
            "fixed" => self.parse_fixed(obj, namespace),
            "array" => {
                let items = obj
                    .get("items")
                    .ok_or_else(|| Error::invalid_schema("array schema has no 'items'"))?;
                Ok(Schema::array(self.parse(items, namespace)?))
            }
            "map" => {
                let values = obj
                    .get("values")
                    .ok_or_else(|| Error::invalid_schema("map schema has no 'values'"))?;
                Ok(Schema::map(self.parse(values, namespace)?))
            }
            other => self.parse_name(other, namespace),
        }
    }

    fn define(&mut self, obj: &Map<String, Json>, namespace: Option<&str>, kind: SchemaKind) -> Result<Name> {
        let name = required_str(obj, "name", kind)?;
        let namespace = match obj.get("namespace") {
            Some(Json::String(ns)) => Some(ns.as_str()),
            Some(Json::Null) | None => namespace,
            Some(other) => {
                return Err(Error::invalid_schema(format!("namespace must be a string, got {other}")))
            }
        };
        let name = Name::new(name, namespace)?;
        if SchemaKind::primitive(name.full_name()).is_some() {
            return Err(Error::invalid_schema(format!(
                "'{name}' is a primitive type name and cannot be redefined"
            )));
        }
        if self.defined.insert(name.full_name().to_string(), kind).is_some() {
            return Err(Error::invalid_schema(format!("type '{name}' is defined twice")));
        }
        Ok(name)
    }

    fn parse_record(&mut self, obj: &Map<String, Json>, namespace: Option<&str>) -> Result<Schema> {
        let name = self.define(obj, namespace, SchemaKind::Record)?;
        let fields_json = obj
            .get("fields")
            .and_then(Json::as_array)
            .ok_or_else(|| Error::invalid_schema(format!("record {name} has no 'fields' array")))?;

        let mut fields = Vec::with_capacity(fields_json.len());
        for field_json in fields_json {
            let field_obj = field_json.as_object().ok_or_else(|| {
                Error::invalid_schema(format!("record {name} has a non-object field entry"))
            })?;
            let field_name = required_str(field_obj, "name", SchemaKind::Record)?;
            let field_type = field_obj.get("type").ok_or_else(|| {
                Error::invalid_schema(format!("field '{field_name}' in record {name} has no 'type'"))
            })?;
            let mut field = Field::new(field_name, self.parse(field_type, name.namespace())?);
            field.default = field_obj.get("default").cloned();
            field.doc = field_obj.get("doc").and_then(Json::as_str).map(str::to_string);
            fields.push(field);
        }

        let mut record = RecordSchema::new(name, fields)?;
        record.doc = obj.get("doc").and_then(Json::as_str).map(str::to_string);
        Ok(Schema::Record(Arc::new(record)))
    }

    fn parse_enum(&mut self, obj: &Map<String, Json>, namespace: Option<&str>) -> Result<Schema> {
        let name = self.define(obj, namespace, SchemaKind::Enum)?;
        let symbols = obj
            .get("symbols")
            .and_then(Json::as_array)
            .ok_or_else(|| Error::invalid_schema(format!("enum {name} has no 'symbols' array")))?;

        let mut out: Vec<String> = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let symbol = symbol
                .as_str()
                .ok_or_else(|| Error::invalid_schema(format!("enum {name} has a non-string symbol")))?;
            if out.iter().any(|s| s == symbol) {
                return Err(Error::invalid_schema(format!(
                    "enum {name} declares symbol '{symbol}' twice"
                )));
            }
            out.push(symbol.to_string());
        }

        Ok(Schema::Enum(Arc::new(EnumSchema {
            name,
            symbols: out,
            doc: obj.get("doc").and_then(Json::as_str).map(str::to_string),
        })))
    }

    fn parse_fixed(&mut self, obj: &Map<String, Json>, namespace: Option<&str>) -> Result<Schema> {
        let name = self.define(obj, namespace, SchemaKind::Fixed)?;
        let size = obj
            .get("size")
            .and_then(Json::as_u64)
            .ok_or_else(|| Error::invalid_schema(format!("fixed {name} needs a non-negative 'size'")))?;
        let size = usize::try_from(size)
            .map_err(|_| Error::invalid_schema(format!("fixed {name} size {size} is too large")))?;
        Ok(Schema::Fixed(Arc::new(FixedSchema { name, size })))
    }
}

fn primitive(kind: SchemaKind) -> Schema {
    match kind {
        SchemaKind::Null => Schema::Null,
        SchemaKind::Boolean => Schema::Boolean,
        SchemaKind::Int => Schema::Int,
        SchemaKind::Long => Schema::Long,
        SchemaKind::Float => Schema::Float,
        SchemaKind::Double => Schema::Double,
        SchemaKind::String => Schema::String,
        _ => Schema::Bytes,
    }
}

fn required_str<'a>(obj: &'a Map<String, Json>, key: &str, kind: SchemaKind) -> Result<&'a str> {
    obj.get(key)
        .and_then(Json::as_str)
        .ok_or_else(|| Error::invalid_schema(format!("{kind} definition needs a string '{key}'")))
}

#[cfg(test)]
mod tests {
    use super::super::*;
    use serde_json::json;

    #[test]
    fn test_parse_primitives() {
        assert_eq!(Schema::parse_str(r#""int""#).unwrap(), Schema::Int);
        assert_eq!(Schema::parse_str(r#"{"type": "string"}"#).unwrap(), Schema::String);
        assert_eq!(Schema::parse_str(r#""bytes""#).unwrap(), Schema::Bytes);
    }

    #[test]
    fn test_parse_record_with_namespace_inheritance() {
        let schema = Schema::parse_str(
            r#"{
                "type": "record",
                "name": "User",
                "namespace": "com.example",
                "fields": [
                    {"name": "id", "type": "long"},
                    {"name": "status", "type": {"type": "enum", "name": "Status", "symbols": ["ACTIVE", "GONE"]}},
                    {"name": "nick", "type": ["null", "string"], "default": null}
                ]
            }"#,
        )
        .unwrap();

        let record = schema.as_record().unwrap();
        assert_eq!(record.full_name(), "com.example.User");
        assert_eq!(record.fields()[1].schema.full_name(), "com.example.Status");
        assert_eq!(record.fields()[2].default, Some(json!(null)));
        assert_eq!(record.fields()[0].default, None);
    }

    #[test]
    fn test_parse_recursive_reference() {
        let schema = Schema::parse_str(
            r#"{
                "type": "record",
                "name": "pkg.Node",
                "fields": [
                    {"name": "value", "type": "int"},
                    {"name": "next", "type": ["null", "Node"]}
                ]
            }"#,
        )
        .unwrap();

        let next = &schema.as_record().unwrap().fields()[1].schema;
        let member = &next.as_union().unwrap().members()[1];
        assert!(matches!(member, Schema::Ref { kind: SchemaKind::Record, .. }));
        assert_eq!(member.full_name(), "pkg.Node");
    }

    #[test]
    fn test_parse_reference_by_full_name() {
        let schema = Schema::parse_str(
            r#"[
                {"type": "fixed", "name": "a.Hash", "size": 16},
                {"type": "array", "items": "a.Hash"}
            ]"#,
        )
        .unwrap();
        let members = schema.as_union().unwrap().members();
        assert_eq!(members[0].kind(), SchemaKind::Fixed);
        assert_eq!(members[1].items().unwrap().full_name(), "a.Hash");
    }

    #[test]
    fn test_parse_errors() {
        let cases = [
            r#""Unknown""#,
            r#"{"type": "record", "name": "R"}"#,
            r#"{"type": "enum", "name": "E", "symbols": ["A", "A"]}"#,
            r#"{"type": "fixed", "name": "F", "size": -1}"#,
            r#"{"type": "array"}"#,
            r#"["int", "int"]"#,
            r#"[{"type": "enum", "name": "E", "symbols": []}, {"type": "enum", "name": "E", "symbols": []}]"#,
            r#"{"type": "record", "name": "int", "fields": []}"#,
            r#"42"#,
            r#"not json"#,
        ];
        for case in cases {
            let err = Schema::parse_str(case).unwrap_err();
            assert!(matches!(err, crate::Error::InvalidSchema(_)), "case {case}: {err}");
        }
    }

    #[test]
    fn test_parse_render_is_stable() {
        let text = r#"{"type":"record","name":"pkg.Pair","fields":[{"name":"left","type":{"type":"map","values":"double"}},{"name":"right","type":["null",{"type":"array","items":"string"}],"default":null}]}"#;
        let schema = Schema::parse_str(text).unwrap();
        let reparsed = Schema::parse(&schema.to_json()).unwrap();
        assert_eq!(schema, reparsed);
    }
}
