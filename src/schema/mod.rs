//! Schema model - the immutable type description values are decoded against.
//!
//! A [`Schema`] is a recursive algebraic type: primitives, arrays, maps,
//! records, enums, fixed, and unions of these. Composite nodes are shared via
//! `Arc` so cloning a schema (or any sub-schema) is cheap. Named types that
//! are referenced again after their definition appear as [`Schema::Ref`]
//! nodes; [`Schema::named_types`] maps those references back to definitions.

use serde_json::Value as Json;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

mod parse;

use crate::types::{Error, Result};

// =============================================================================
// Type tags and names
// =============================================================================

/// Type tag of a schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    String,
    Bytes,
    Fixed,
    Enum,
    Array,
    Map,
    Record,
    Union,
}

impl SchemaKind {
    /// The Avro type name of this tag.
    pub fn as_str(self) -> &'static str {
        match self {
            SchemaKind::Null => "null",
            SchemaKind::Boolean => "boolean",
            SchemaKind::Int => "int",
            SchemaKind::Long => "long",
            SchemaKind::Float => "float",
            SchemaKind::Double => "double",
            SchemaKind::String => "string",
            SchemaKind::Bytes => "bytes",
            SchemaKind::Fixed => "fixed",
            SchemaKind::Enum => "enum",
            SchemaKind::Array => "array",
            SchemaKind::Map => "map",
            SchemaKind::Record => "record",
            SchemaKind::Union => "union",
        }
    }

    /// Parse a primitive type name.
    pub fn primitive(name: &str) -> Option<Self> {
        Some(match name {
            "null" => SchemaKind::Null,
            "boolean" => SchemaKind::Boolean,
            "int" => SchemaKind::Int,
            "long" => SchemaKind::Long,
            "float" => SchemaKind::Float,
            "double" => SchemaKind::Double,
            "string" => SchemaKind::String,
            "bytes" => SchemaKind::Bytes,
            _ => return None,
        })
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Qualified name of a record, enum or fixed schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Name {
    name: String,
    namespace: Option<String>,
    full_name: String,
}

impl Name {
    /// Build a name from a simple or dotted name and an optional namespace.
    ///
    /// A dotted `name` carries its own namespace and ignores `namespace`.
    pub fn new(name: &str, namespace: Option<&str>) -> Result<Self> {
        let (namespace, simple) = match name.rsplit_once('.') {
            Some((ns, simple)) => (Some(ns.to_string()), simple),
            None => (namespace.filter(|ns| !ns.is_empty()).map(str::to_string), name),
        };
        if !is_valid_identifier(simple) {
            return Err(Error::invalid_schema(format!("invalid name '{name}'")));
        }
        if let Some(ns) = &namespace {
            if !ns.split('.').all(is_valid_identifier) {
                return Err(Error::invalid_schema(format!("invalid namespace '{ns}'")));
            }
        }
        let full_name = match &namespace {
            Some(ns) => format!("{ns}.{simple}"),
            None => simple.to_string(),
        };
        Ok(Self {
            name: simple.to_string(),
            namespace,
            full_name,
        })
    }

    /// Parse a full name such as `com.example.User`.
    pub fn parse(full_name: &str) -> Result<Self> {
        Self::new(full_name, None)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name)
    }
}

fn is_valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// =============================================================================
// Composite schemas
// =============================================================================

/// A single declared record field.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub position: usize,
    pub schema: Schema,
    /// JSON literal used when the field is absent from the input. `Some(Null)`
    /// is a real `null` default, distinct from "no default".
    pub default: Option<Json>,
    pub doc: Option<String>,
}

impl Field {
    /// A field with no default. Its position is assigned by the enclosing record.
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            position: 0,
            schema,
            default: None,
            doc: None,
        }
    }

    pub fn with_default(mut self, default: Json) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }
}

/// Record schema: a named, ordered list of fields.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    pub name: Name,
    pub doc: Option<String>,
    fields: Vec<Field>,
}

impl RecordSchema {
    /// Create a record, assigning field positions in declaration order.
    pub fn new(name: Name, fields: Vec<Field>) -> Result<Self> {
        let mut seen = std::collections::HashSet::new();
        let fields = fields
            .into_iter()
            .enumerate()
            .map(|(position, field)| {
                if !seen.insert(field.name.clone()) {
                    return Err(Error::invalid_schema(format!(
                        "duplicate field '{}' in record {}",
                        field.name, name
                    )));
                }
                Ok(Field { position, ..field })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            name,
            doc: None,
            fields,
        })
    }

    pub fn full_name(&self) -> &str {
        self.name.full_name()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Enum schema: a named set of symbols.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumSchema {
    pub name: Name,
    pub symbols: Vec<String>,
    pub doc: Option<String>,
}

impl EnumSchema {
    pub fn full_name(&self) -> &str {
        self.name.full_name()
    }

    pub fn symbol_index(&self, symbol: &str) -> Option<usize> {
        self.symbols.iter().position(|s| s == symbol)
    }
}

/// Fixed schema: a named byte array of constant size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedSchema {
    pub name: Name,
    pub size: usize,
}

/// Union schema: an ordered list of member schemas.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionSchema {
    members: Vec<Schema>,
}

impl UnionSchema {
    /// Create a union, rejecting nested unions and duplicate members.
    pub fn new(members: Vec<Schema>) -> Result<Self> {
        let mut seen = std::collections::HashSet::new();
        for member in &members {
            if member.kind() == SchemaKind::Union {
                return Err(Error::invalid_schema("unions may not immediately contain unions"));
            }
            if !seen.insert(member.full_name()) {
                return Err(Error::invalid_schema(format!(
                    "duplicate union member {}",
                    member.full_name()
                )));
            }
        }
        Ok(Self { members })
    }

    pub fn members(&self) -> &[Schema] {
        &self.members
    }

    pub fn has_null(&self) -> bool {
        self.members.iter().any(|m| m.kind() == SchemaKind::Null)
    }

    /// The only non-null member and its index, if there is exactly one.
    pub fn sole_non_null_member(&self) -> Option<(usize, &Schema)> {
        let mut non_null = self
            .members
            .iter()
            .enumerate()
            .filter(|(_, m)| m.kind() != SchemaKind::Null);
        match (non_null.next(), non_null.next()) {
            (Some(only), None) => Some(only),
            _ => None,
        }
    }

    /// The member whose full name equals `full_name`.
    pub fn member_by_name(&self, full_name: &str) -> Option<(usize, &Schema)> {
        self.members
            .iter()
            .enumerate()
            .find(|(_, m)| m.full_name() == full_name)
    }
}

impl fmt::Display for UnionSchema {
    /// Renders as the JSON array of member full names.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<Json> = self
            .members
            .iter()
            .map(|m| Json::String(m.full_name().to_string()))
            .collect();
        write!(f, "{}", Json::Array(names))
    }
}

// =============================================================================
// Schema
// =============================================================================

/// A schema node.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    String,
    Bytes,
    Fixed(Arc<FixedSchema>),
    Enum(Arc<EnumSchema>),
    Array(Arc<Schema>),
    Map(Arc<Schema>),
    Record(Arc<RecordSchema>),
    Union(Arc<UnionSchema>),
    /// Reference to a named type defined elsewhere in the same schema tree.
    Ref { name: Name, kind: SchemaKind },
}

impl Schema {
    /// Parse an Avro schema JSON document.
    pub fn parse_str(text: &str) -> Result<Self> {
        let json: Json = serde_json::from_str(text)
            .map_err(|e| Error::invalid_schema(format!("schema is not valid JSON: {e}")))?;
        Self::parse(&json)
    }

    /// Parse an already-parsed Avro schema JSON tree.
    pub fn parse(json: &Json) -> Result<Self> {
        parse::SchemaParser::default().parse_root(json)
    }

    /// Record schema with fields positioned in declaration order.
    pub fn record(full_name: &str, fields: Vec<Field>) -> Result<Self> {
        Ok(Schema::Record(Arc::new(RecordSchema::new(
            Name::parse(full_name)?,
            fields,
        )?)))
    }

    pub fn enumeration<S: Into<String>>(full_name: &str, symbols: Vec<S>) -> Result<Self> {
        Ok(Schema::Enum(Arc::new(EnumSchema {
            name: Name::parse(full_name)?,
            symbols: symbols.into_iter().map(Into::into).collect(),
            doc: None,
        })))
    }

    pub fn fixed(full_name: &str, size: usize) -> Result<Self> {
        Ok(Schema::Fixed(Arc::new(FixedSchema {
            name: Name::parse(full_name)?,
            size,
        })))
    }

    pub fn array(items: Schema) -> Self {
        Schema::Array(Arc::new(items))
    }

    pub fn map(values: Schema) -> Self {
        Schema::Map(Arc::new(values))
    }

    pub fn union(members: Vec<Schema>) -> Result<Self> {
        Ok(Schema::Union(Arc::new(UnionSchema::new(members)?)))
    }

    /// Type tag of this node. References report the referenced type's tag.
    pub fn kind(&self) -> SchemaKind {
        match self {
            Schema::Null => SchemaKind::Null,
            Schema::Boolean => SchemaKind::Boolean,
            Schema::Int => SchemaKind::Int,
            Schema::Long => SchemaKind::Long,
            Schema::Float => SchemaKind::Float,
            Schema::Double => SchemaKind::Double,
            Schema::String => SchemaKind::String,
            Schema::Bytes => SchemaKind::Bytes,
            Schema::Fixed(_) => SchemaKind::Fixed,
            Schema::Enum(_) => SchemaKind::Enum,
            Schema::Array(_) => SchemaKind::Array,
            Schema::Map(_) => SchemaKind::Map,
            Schema::Record(_) => SchemaKind::Record,
            Schema::Union(_) => SchemaKind::Union,
            Schema::Ref { kind, .. } => *kind,
        }
    }

    /// Full name for named types; the type name for everything else.
    pub fn full_name(&self) -> &str {
        match self {
            Schema::Fixed(f) => f.name.full_name(),
            Schema::Enum(e) => e.name.full_name(),
            Schema::Record(r) => r.name.full_name(),
            Schema::Ref { name, .. } => name.full_name(),
            other => other.kind().as_str(),
        }
    }

    pub fn as_record(&self) -> Option<&Arc<RecordSchema>> {
        match self {
            Schema::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_union(&self) -> Option<&Arc<UnionSchema>> {
        match self {
            Schema::Union(u) => Some(u),
            _ => None,
        }
    }

    /// Element schema of an array.
    pub fn items(&self) -> Option<&Schema> {
        match self {
            Schema::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Value schema of a map.
    pub fn values(&self) -> Option<&Schema> {
        match self {
            Schema::Map(values) => Some(values),
            _ => None,
        }
    }

    /// Every named type defined in this tree, keyed by full name.
    pub fn named_types(&self) -> HashMap<&str, &Schema> {
        let mut out = HashMap::new();
        collect_named(self, &mut out);
        out
    }

    /// Render this schema as Avro schema JSON. Named types are expanded at
    /// their first occurrence and referenced by full name afterwards.
    pub fn to_json(&self) -> Json {
        let mut seen = std::collections::HashSet::new();
        render(self, &mut seen)
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schema::Union(u) => write!(f, "{u}"),
            other => f.write_str(other.full_name()),
        }
    }
}

fn collect_named<'a>(schema: &'a Schema, out: &mut HashMap<&'a str, &'a Schema>) {
    match schema {
        Schema::Record(r) => {
            if out.insert(r.full_name(), schema).is_none() {
                for field in r.fields() {
                    collect_named(&field.schema, out);
                }
            }
        }
        Schema::Enum(e) => {
            out.insert(e.full_name(), schema);
        }
        Schema::Fixed(f) => {
            out.insert(f.name.full_name(), schema);
        }
        Schema::Array(inner) | Schema::Map(inner) => collect_named(inner, out),
        Schema::Union(u) => {
            for member in u.members() {
                collect_named(member, out);
            }
        }
        _ => {}
    }
}

fn render(schema: &Schema, seen: &mut std::collections::HashSet<String>) -> Json {
    use serde_json::{json, Map};

    match schema {
        Schema::Record(r) => {
            if !seen.insert(r.full_name().to_string()) {
                return Json::String(r.full_name().to_string());
            }
            let fields: Vec<Json> = r
                .fields()
                .iter()
                .map(|field| {
                    let mut obj = Map::new();
                    obj.insert("name".into(), Json::String(field.name.clone()));
                    obj.insert("type".into(), render(&field.schema, seen));
                    if let Some(default) = &field.default {
                        obj.insert("default".into(), default.clone());
                    }
                    Json::Object(obj)
                })
                .collect();
            json!({"type": "record", "name": r.full_name(), "fields": fields})
        }
        Schema::Enum(e) => {
            if !seen.insert(e.full_name().to_string()) {
                return Json::String(e.full_name().to_string());
            }
            json!({"type": "enum", "name": e.full_name(), "symbols": e.symbols})
        }
        Schema::Fixed(f) => {
            if !seen.insert(f.name.full_name().to_string()) {
                return Json::String(f.name.full_name().to_string());
            }
            json!({"type": "fixed", "name": f.name.full_name(), "size": f.size})
        }
        Schema::Array(items) => json!({"type": "array", "items": render(items, seen)}),
        Schema::Map(values) => json!({"type": "map", "values": render(values, seen)}),
        Schema::Union(u) => Json::Array(u.members().iter().map(|m| render(m, seen)).collect()),
        other => Json::String(other.full_name().to_string()),
    }
}
