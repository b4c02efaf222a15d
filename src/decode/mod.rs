//! Schema-driven JSON decoding.
//!
//! [`JsonDecoder`] walks a JSON tree and a schema in lockstep, dispatching on
//! the schema's type tag. Every node is validated strictly against its schema;
//! the first violation aborts the whole decode. Unions are handed to the
//! union resolver (see `union.rs`), which recurses back into the same
//! dispatch.
//!
//! ```text
//!   decode_str ──parse──▶ decode ──▶ decode_node ──┬─▶ scalars / enum
//!                                        ▲          ├─▶ array / map ──┐
//!                                        │          ├─▶ record ───────┤
//!                                        │          └─▶ resolve_union ┤
//!                                        └────────────────────────────┘
//! ```

use serde_json::Value as Json;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use crate::registry::{DefaultRecordFactory, NameResolver, RecordFactory, ResolvedType, TypeRegistry};
use crate::schema::{EnumSchema, RecordSchema, Schema};
use crate::types::{DecoderConfig, Error, Result};
use crate::value::{EnumValue, Value};

mod lenient;
mod union;

use lenient::FiniteJson;

/// Decodes JSON into schema-conformant [`Value`]s.
///
/// A decoder holds no per-call state and can be shared across threads.
#[derive(Debug, Clone)]
pub struct JsonDecoder {
    config: DecoderConfig,
    resolver: Arc<dyn NameResolver>,
    factory: Arc<dyn RecordFactory>,
}

impl Default for JsonDecoder {
    fn default() -> Self {
        Self::build(DecoderConfig::default())
    }
}

impl JsonDecoder {
    /// A decoder with an empty type registry and the default record factory.
    ///
    /// Fails with [`Error::Config`] when `config` does not validate.
    pub fn new(config: DecoderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: DecoderConfig) -> Self {
        Self {
            config,
            resolver: Arc::new(TypeRegistry::new()),
            factory: Arc::new(DefaultRecordFactory),
        }
    }

    pub fn with_resolver(mut self, resolver: impl NameResolver + 'static) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    pub fn with_factory(mut self, factory: impl RecordFactory + 'static) -> Self {
        self.factory = Arc::new(factory);
        self
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Parse `text` and decode it against `schema`.
    pub fn decode_str(&self, text: &str, schema: &Schema, specific: bool) -> Result<Value> {
        let node = parse_json(text, self.config.lenient_syntax)?;
        self.decode(&node, schema, specific)
    }

    /// Decode an already-parsed JSON tree against `schema`.
    ///
    /// With `specific` set, records are built as registered concrete types
    /// looked up by full name; otherwise they are generic records.
    pub fn decode(&self, node: &Json, schema: &Schema, specific: bool) -> Result<Value> {
        tracing::trace!(schema = %schema, specific, "decode");
        let ctx = DecodeContext {
            decoder: self,
            named: schema.named_types(),
            specific,
        };
        ctx.decode_node(node, schema, 0)
    }
}

/// Parse JSON text. Lenient syntax accepts comments, single-quoted strings,
/// unquoted field names and trailing commas on top of standard JSON.
///
/// `NaN` and `Infinity` are rejected in both modes.
pub fn parse_json(text: &str, lenient: bool) -> Result<Json> {
    let strict: serde_json::Result<Json> = serde_json::from_str(text);
    if !lenient {
        return strict.map_err(|e| Error::malformed_input(e.to_string()));
    }
    if let Ok(node) = strict {
        return Ok(node);
    }
    json5::from_str::<FiniteJson>(text)
        .map(|FiniteJson(node)| node)
        .map_err(|e| Error::malformed_input(e.to_string()))
}

/// Decode JSON text into a generic value with the default decoder.
pub fn decode_str(text: &str, schema: &Schema) -> Result<Value> {
    JsonDecoder::default().decode_str(text, schema, false)
}

/// Decode a JSON tree into a generic value with the default decoder.
pub fn decode_json(node: &Json, schema: &Schema) -> Result<Value> {
    JsonDecoder::default().decode(node, schema, false)
}

// =============================================================================
// Decode context
// =============================================================================

/// State shared by one top-level decode: the decoder, the named types of the
/// root schema (to follow references), and the specific flag.
struct DecodeContext<'a> {
    decoder: &'a JsonDecoder,
    named: HashMap<&'a str, &'a Schema>,
    specific: bool,
}

impl<'a> DecodeContext<'a> {
    fn decode_node(&self, node: &Json, schema: &'a Schema, depth: usize) -> Result<Value> {
        let limit = self.decoder.config.max_depth;
        if depth >= limit {
            return Err(Error::DepthLimitExceeded { limit });
        }
        let depth = depth + 1;

        match schema {
            Schema::Null => match node {
                Json::Null => Ok(Value::Null),
                other => Err(Error::type_mismatch("null", other)),
            },
            Schema::Boolean => match node {
                Json::Bool(b) => Ok(Value::Boolean(*b)),
                other => Err(Error::type_mismatch("boolean", other)),
            },
            Schema::Int => match node {
                Json::Number(n) => n
                    .as_i64()
                    .and_then(|i| i32::try_from(i).ok())
                    .map(Value::Int)
                    .ok_or_else(|| Error::type_mismatch("int", node)),
                other => Err(Error::type_mismatch("int", other)),
            },
            Schema::Long => match node {
                Json::Number(n) => n
                    .as_i64()
                    .map(Value::Long)
                    .ok_or_else(|| Error::type_mismatch("long", node)),
                other => Err(Error::type_mismatch("long", other)),
            },
            Schema::Float => match node {
                Json::Number(n) => n
                    .as_f64()
                    .map(|f| Value::Float(f as f32))
                    .ok_or_else(|| Error::type_mismatch("float", node)),
                other => Err(Error::type_mismatch("float", other)),
            },
            Schema::Double => match node {
                Json::Number(n) => n
                    .as_f64()
                    .map(Value::Double)
                    .ok_or_else(|| Error::type_mismatch("double", node)),
                other => Err(Error::type_mismatch("double", other)),
            },
            Schema::String => match node {
                Json::String(s) => Ok(Value::String(s.clone())),
                other => Err(Error::type_mismatch("string", other)),
            },
            Schema::Bytes => Err(Error::unsupported(
                "decoding bytes from their JSON string encoding",
            )),
            Schema::Fixed(fixed) => Err(Error::unsupported(format!(
                "decoding fixed {} from its JSON string encoding",
                fixed.name
            ))),
            Schema::Enum(enum_schema) => self.decode_enum(node, enum_schema),
            Schema::Array(items) => match node {
                Json::Null => Ok(Value::Null),
                Json::Array(elements) => {
                    let mut out = Vec::with_capacity(elements.len());
                    for element in elements {
                        out.push(self.decode_node(element, items, depth)?);
                    }
                    Ok(Value::Array(out))
                }
                other => Err(Error::type_mismatch("array", other)),
            },
            Schema::Map(values) => match node {
                Json::Null => Ok(Value::Null),
                Json::Object(entries) => {
                    let mut out = BTreeMap::new();
                    for (key, value) in entries {
                        out.insert(key.clone(), self.decode_node(value, values, depth)?);
                    }
                    Ok(Value::Map(out))
                }
                other => Err(Error::type_mismatch("map", other)),
            },
            Schema::Record(record) => self.decode_record(node, record, depth),
            Schema::Union(union) => self.resolve_union(node, union, depth),
            Schema::Ref { name, .. } => {
                let target = self
                    .named
                    .get(name.full_name())
                    .copied()
                    .filter(|target| !matches!(target, Schema::Ref { .. }))
                    .ok_or_else(|| Error::UnresolvedReference(name.full_name().to_string()))?;
                self.decode_node(node, target, depth)
            }
        }
    }

    fn decode_enum(&self, node: &Json, schema: &EnumSchema) -> Result<Value> {
        let symbol = match node {
            Json::String(s) => s.as_str(),
            other => return Err(Error::type_mismatch(schema.full_name(), other)),
        };

        if self.specific {
            return match self.decoder.resolver.resolve(schema.full_name()) {
                Some(ResolvedType::Enum(enum_type)) => self
                    .decoder
                    .resolver
                    .resolve_enum_symbol(enum_type, symbol)
                    .map(Value::Enum),
                _ => Err(Error::UnknownName(schema.full_name().to_string())),
            };
        }

        schema
            .symbol_index(symbol)
            .map(|ordinal| {
                Value::Enum(EnumValue {
                    type_name: schema.full_name().to_string(),
                    symbol: symbol.to_string(),
                    ordinal,
                })
            })
            .ok_or_else(|| Error::unknown_enum_symbol(schema.full_name(), symbol))
    }

    fn decode_record(&self, node: &Json, schema: &'a Arc<RecordSchema>, depth: usize) -> Result<Value> {
        let object = match node {
            Json::Null => return Ok(Value::Null),
            Json::Object(object) => object,
            other => return Err(Error::type_mismatch(schema.full_name(), other)),
        };

        let factory = &self.decoder.factory;
        let mut instance = if self.specific {
            match self.decoder.resolver.resolve(schema.full_name()) {
                Some(ResolvedType::Record(record_type)) => factory.new_specific(record_type, schema)?,
                _ => return Err(Error::UnknownName(schema.full_name().to_string())),
            }
        } else {
            factory.new_generic(schema)?
        };

        let mut unconsumed: BTreeSet<&str> = object.keys().map(String::as_str).collect();
        for field in schema.fields() {
            let value = match object.get(&field.name) {
                Some(value) => {
                    unconsumed.remove(field.name.as_str());
                    self.decode_node(value, &field.schema, depth)?
                }
                None => match &field.default {
                    Some(default) => self.decode_node(default, &field.schema, depth)?,
                    None => {
                        return Err(Error::missing_required_field(
                            schema.full_name(),
                            &field.name,
                        ))
                    }
                },
            };
            instance.put(field.position, value)?;
        }

        if !unconsumed.is_empty() {
            return Err(Error::UnexpectedField {
                record: schema.full_name().to_string(),
                fields: unconsumed.into_iter().map(str::to_string).collect(),
            });
        }

        instance.finish()
    }
}
