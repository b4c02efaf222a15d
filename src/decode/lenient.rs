//! JSON tree built from json5 text.
//!
//! `serde_json::Value` stores `NaN` and `Infinity` as `null`, which would let
//! a non-finite number decode as a union's null member. [`FiniteJson`] builds
//! the same tree but fails on non-finite numbers instead.

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde_json::{Map, Number, Value as Json};
use std::fmt;

pub(super) struct FiniteJson(pub(super) Json);

impl<'de> Deserialize<'de> for FiniteJson {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(FiniteVisitor).map(FiniteJson)
    }
}

struct FiniteVisitor;

impl<'de> Visitor<'de> for FiniteVisitor {
    type Value = Json;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON value with finite numbers")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Json, E> {
        Ok(Json::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Json, E> {
        Ok(Json::Number(v.into()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Json, E> {
        Ok(Json::Number(v.into()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Json, E> {
        Number::from_f64(v)
            .map(Json::Number)
            .ok_or_else(|| E::custom(format!("non-finite number {v} is not allowed")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Json, E> {
        Ok(Json::String(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Json, E> {
        Ok(Json::String(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Json, E> {
        Ok(Json::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Json, E> {
        Ok(Json::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Json, D::Error>
    where
        D: Deserializer<'de>,
    {
        FiniteJson::deserialize(deserializer).map(|FiniteJson(node)| node)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Json, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut out = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(FiniteJson(node)) = seq.next_element()? {
            out.push(node);
        }
        Ok(Json::Array(out))
    }

    fn visit_map<A>(self, mut map: A) -> Result<Json, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut out = Map::new();
        while let Some((key, FiniteJson(node))) = map.next_entry::<String, FiniteJson>()? {
            out.insert(key, node);
        }
        Ok(Json::Object(out))
    }
}

#[cfg(test)]
mod tests {
    use super::FiniteJson;
    use serde_json::json;

    fn parse(text: &str) -> Result<serde_json::Value, json5::Error> {
        json5::from_str::<FiniteJson>(text).map(|FiniteJson(node)| node)
    }

    #[test]
    fn test_builds_the_same_tree_as_json5() {
        let text = "{ a: [1, -2, 2.5, 'x', true, null], b: { c: {} } }";
        assert_eq!(
            parse(text).unwrap(),
            json!({"a": [1, -2, 2.5, "x", true, null], "b": {"c": {}}})
        );
    }

    #[test]
    fn test_non_finite_numbers_fail() {
        for text in ["NaN", "-Infinity", "[0, Infinity]", "{n: NaN}"] {
            assert!(parse(text).is_err(), "{text}");
        }
    }
}
