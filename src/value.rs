//! Decoded values.
//!
//! [`Value`] is the output algebra of the decoder. Its shape mirrors the schema
//! it was decoded against: records carry their schema, enums carry their type
//! name, and unions leave no wrapper behind.

use serde_json::{Map, Number, Value as Json};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::registry::SpecificRecord;
use crate::schema::RecordSchema;

/// A schema-conformant decoded value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Array(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Enum(EnumValue),
    Record(GenericRecord),
    Specific(SpecificValue),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_record(&self) -> Option<&GenericRecord> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_specific(&self) -> Option<&SpecificValue> {
        match self {
            Value::Specific(s) => Some(s),
            _ => None,
        }
    }

    /// Render as a plain JSON tree. Records become objects keyed by field
    /// name and enums become their symbol. Non-finite floats become `null`.
    pub fn to_json(&self) -> Json {
        match self {
            Value::Null => Json::Null,
            Value::Boolean(b) => Json::Bool(*b),
            Value::Int(i) => Json::Number((*i).into()),
            Value::Long(l) => Json::Number((*l).into()),
            Value::Float(f) => Number::from_f64(f64::from(*f)).map_or(Json::Null, Json::Number),
            Value::Double(d) => Number::from_f64(*d).map_or(Json::Null, Json::Number),
            Value::String(s) => Json::String(s.clone()),
            Value::Array(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(entries) => Json::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Value::Enum(e) => Json::String(e.symbol.clone()),
            Value::Record(r) => record_json(r.schema(), |pos| r.get(pos).cloned()),
            Value::Specific(s) => record_json(s.schema(), |pos| s.get(pos)),
        }
    }
}

fn record_json(schema: &RecordSchema, get: impl Fn(usize) -> Option<Value>) -> Json {
    let mut obj = Map::new();
    for field in schema.fields() {
        let value = get(field.position).map_or(Json::Null, |v| v.to_json());
        obj.insert(field.name.clone(), value);
    }
    Json::Object(obj)
}

/// A resolved enum member.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    pub type_name: String,
    pub symbol: String,
    pub ordinal: usize,
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.type_name, self.symbol)
    }
}

/// A schema-carrying record with positionally addressed field values.
#[derive(Debug, Clone, PartialEq)]
pub struct GenericRecord {
    schema: Arc<RecordSchema>,
    values: Vec<Value>,
}

impl GenericRecord {
    pub(crate) fn new(schema: Arc<RecordSchema>, values: Vec<Value>) -> Self {
        Self { schema, values }
    }

    pub fn schema(&self) -> &Arc<RecordSchema> {
        &self.schema
    }

    pub fn full_name(&self) -> &str {
        self.schema.full_name()
    }

    pub fn get(&self, position: usize) -> Option<&Value> {
        self.values.get(position)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.schema
            .field(name)
            .and_then(|field| self.values.get(field.position))
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

/// A finished instance of a registered concrete record type.
#[derive(Clone)]
pub struct SpecificValue {
    schema: Arc<RecordSchema>,
    record: Arc<dyn SpecificRecord>,
}

impl SpecificValue {
    pub(crate) fn new(schema: Arc<RecordSchema>, record: Box<dyn SpecificRecord>) -> Self {
        Self {
            schema,
            record: Arc::from(record),
        }
    }

    pub fn schema(&self) -> &Arc<RecordSchema> {
        &self.schema
    }

    pub fn full_name(&self) -> &str {
        self.schema.full_name()
    }

    pub fn get(&self, position: usize) -> Option<Value> {
        self.record.get(position)
    }

    /// Borrow the concrete registered type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.record.as_any().downcast_ref::<T>()
    }
}

impl fmt::Debug for SpecificValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpecificValue")
            .field("type", &self.full_name())
            .field("record", &self.record)
            .finish()
    }
}

impl PartialEq for SpecificValue {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.record, &other.record) {
            return true;
        }
        self.full_name() == other.full_name()
            && self
                .schema
                .fields()
                .iter()
                .all(|f| self.get(f.position) == other.get(f.position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Field, Schema};
    use serde_json::json;

    fn point_schema() -> Arc<RecordSchema> {
        Schema::record(
            "pkg.Point",
            vec![Field::new("x", Schema::Int), Field::new("y", Schema::Int)],
        )
        .unwrap()
        .as_record()
        .unwrap()
        .clone()
    }

    #[test]
    fn test_generic_record_access() {
        let record = GenericRecord::new(point_schema(), vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(record.full_name(), "pkg.Point");
        assert_eq!(record.get(1), Some(&Value::Int(2)));
        assert_eq!(record.get_by_name("x"), Some(&Value::Int(1)));
        assert_eq!(record.get_by_name("z"), None);
    }

    #[test]
    fn test_to_json() {
        let record = GenericRecord::new(point_schema(), vec![Value::Int(1), Value::Int(2)]);
        let mut map = BTreeMap::new();
        map.insert("p".to_string(), Value::Record(record));
        let value = Value::Array(vec![
            Value::Map(map),
            Value::Enum(EnumValue {
                type_name: "pkg.Color".into(),
                symbol: "RED".into(),
                ordinal: 0,
            }),
            Value::Double(f64::NAN),
            Value::Float(0.5),
        ]);
        assert_eq!(
            value.to_json(),
            json!([{"p": {"x": 1, "y": 2}}, "RED", null, 0.5])
        );
    }
}
