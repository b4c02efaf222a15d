//! Name resolution and record construction.
//!
//! The decoder never looks types up or builds records itself. It consults a
//! [`NameResolver`] to turn a full name into a registered record or enum type,
//! and a [`RecordFactory`] to obtain an empty, position-addressable record it
//! can fill in field by field.
//!
//! [`TypeRegistry`] is the static resolver: constructor closures registered by
//! name at startup and only read while decoding.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::schema::RecordSchema;
use crate::types::{Error, Result};
use crate::value::{EnumValue, GenericRecord, SpecificValue, Value};

// =============================================================================
// Concrete record types
// =============================================================================

/// A concrete record type that can be filled positionally by the decoder.
///
/// Positions follow the declaration order of the record schema's fields. The
/// type's name and field count come from that schema, carried by the finished
/// [`SpecificValue`].
pub trait SpecificRecord: fmt::Debug + Send + Sync + 'static {
    /// Set the field at `position`.
    fn put(&mut self, position: usize, value: Value) -> Result<()>;

    /// Read the field at `position`.
    fn get(&self, position: usize) -> Option<Value>;

    fn as_any(&self) -> &dyn Any;
}

/// Constructor for an empty instance of a registered record type.
pub type RecordConstructor = Arc<dyn Fn() -> Box<dyn SpecificRecord> + Send + Sync>;

/// A registered, constructible record type.
#[derive(Clone)]
pub struct RecordType {
    full_name: String,
    constructor: RecordConstructor,
}

impl RecordType {
    pub fn new<F>(full_name: impl Into<String>, constructor: F) -> Self
    where
        F: Fn() -> Box<dyn SpecificRecord> + Send + Sync + 'static,
    {
        Self {
            full_name: full_name.into(),
            constructor: Arc::new(constructor),
        }
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// A fresh, empty instance.
    pub fn instantiate(&self) -> Box<dyn SpecificRecord> {
        (self.constructor)()
    }
}

impl fmt::Debug for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordType")
            .field("full_name", &self.full_name)
            .finish_non_exhaustive()
    }
}

/// A registered enum type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    full_name: String,
    symbols: Vec<String>,
}

impl EnumType {
    pub fn new<S: Into<String>>(full_name: impl Into<String>, symbols: Vec<S>) -> Self {
        Self {
            full_name: full_name.into(),
            symbols: symbols.into_iter().map(Into::into).collect(),
        }
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }
}

/// Result of a successful name lookup.
#[derive(Debug, Clone)]
pub enum ResolvedType {
    Record(RecordType),
    Enum(EnumType),
}

// =============================================================================
// Resolver
// =============================================================================

/// Maps full names to registered types.
///
/// Implementations are consulted read-only during decoding and must be safe
/// to share across threads.
pub trait NameResolver: fmt::Debug + Send + Sync {
    /// Look up a type by full name.
    fn resolve(&self, full_name: &str) -> Option<&ResolvedType>;

    /// Look up a member of a registered enum type by symbol.
    fn resolve_enum_symbol(&self, enum_type: &EnumType, symbol: &str) -> Result<EnumValue> {
        enum_type
            .symbols
            .iter()
            .position(|s| s == symbol)
            .map(|ordinal| EnumValue {
                type_name: enum_type.full_name.clone(),
                symbol: symbol.to_string(),
                ordinal,
            })
            .ok_or_else(|| Error::unknown_enum_symbol(&enum_type.full_name, symbol))
    }
}

/// In-memory type registry. Populate at startup, then share read-only.
#[derive(Debug, Default, Clone)]
pub struct TypeRegistry {
    types: HashMap<String, ResolvedType>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// Register a record type whose empty instance is `T::default()`.
    pub fn register_record<T>(&mut self, full_name: impl Into<String>) -> Result<()>
    where
        T: SpecificRecord + Default,
    {
        self.register(ResolvedType::Record(RecordType::new(full_name, || {
            Box::new(T::default()) as Box<dyn SpecificRecord>
        })))
    }

    /// Register a record type with an explicit constructor.
    pub fn register_record_with<F>(&mut self, full_name: impl Into<String>, constructor: F) -> Result<()>
    where
        F: Fn() -> Box<dyn SpecificRecord> + Send + Sync + 'static,
    {
        self.register(ResolvedType::Record(RecordType::new(full_name, constructor)))
    }

    /// Register an enum type.
    pub fn register_enum<S: Into<String>>(&mut self, full_name: impl Into<String>, symbols: Vec<S>) -> Result<()> {
        self.register(ResolvedType::Enum(EnumType::new(full_name, symbols)))
    }

    fn register(&mut self, resolved: ResolvedType) -> Result<()> {
        let name = match &resolved {
            ResolvedType::Record(r) => r.full_name(),
            ResolvedType::Enum(e) => e.full_name(),
        };
        if name.is_empty() {
            return Err(Error::config("type name cannot be empty"));
        }
        if self.types.contains_key(name) {
            return Err(Error::config(format!("type already registered: {name}")));
        }

        let name = name.to_string();
        tracing::debug!("Registered type: {}", name);
        self.types.insert(name, resolved);
        Ok(())
    }

    pub fn contains(&self, full_name: &str) -> bool {
        self.types.contains_key(full_name)
    }

    /// All registered names, sorted.
    pub fn list_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.types.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl NameResolver for TypeRegistry {
    fn resolve(&self, full_name: &str) -> Option<&ResolvedType> {
        self.types.get(full_name)
    }
}

// =============================================================================
// Record factory
// =============================================================================

/// An empty record being filled in by the decoder.
///
/// Finishing the instance yields an immutable [`Value`]; no mutation is
/// possible afterwards.
#[derive(Debug)]
pub enum RecordInstance {
    Generic {
        schema: Arc<RecordSchema>,
        slots: Vec<Option<Value>>,
    },
    Specific {
        schema: Arc<RecordSchema>,
        record: Box<dyn SpecificRecord>,
    },
}

impl RecordInstance {
    /// Set the field at `position`.
    pub fn put(&mut self, position: usize, value: Value) -> Result<()> {
        match self {
            RecordInstance::Generic { schema, slots } => {
                let slot = slots.get_mut(position).ok_or_else(|| Error::InvalidField {
                    record: schema.full_name().to_string(),
                    position,
                })?;
                *slot = Some(value);
                Ok(())
            }
            RecordInstance::Specific { schema, record } => {
                if position >= schema.fields().len() {
                    return Err(Error::InvalidField {
                        record: schema.full_name().to_string(),
                        position,
                    });
                }
                record.put(position, value)
            }
        }
    }

    /// Finalize into an immutable value.
    pub fn finish(self) -> Result<Value> {
        match self {
            RecordInstance::Generic { schema, slots } => {
                let mut values = Vec::with_capacity(slots.len());
                for (field, slot) in schema.fields().iter().zip(slots) {
                    let value = slot.ok_or_else(|| {
                        Error::missing_required_field(schema.full_name(), &field.name)
                    })?;
                    values.push(value);
                }
                Ok(Value::Record(GenericRecord::new(schema, values)))
            }
            RecordInstance::Specific { schema, record } => {
                Ok(Value::Specific(SpecificValue::new(schema, record)))
            }
        }
    }
}

/// Produces empty record instances for the decoder to populate.
pub trait RecordFactory: fmt::Debug + Send + Sync {
    /// A schema-carrying record for generic decoding.
    fn new_generic(&self, schema: &Arc<RecordSchema>) -> Result<RecordInstance>;

    /// An instance of a registered concrete type for specific decoding.
    fn new_specific(&self, record_type: &RecordType, schema: &Arc<RecordSchema>) -> Result<RecordInstance>;
}

/// The stock factory: generic records hold one slot per field, specific
/// records come from the registered constructor.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultRecordFactory;

impl RecordFactory for DefaultRecordFactory {
    fn new_generic(&self, schema: &Arc<RecordSchema>) -> Result<RecordInstance> {
        Ok(RecordInstance::Generic {
            schema: Arc::clone(schema),
            slots: vec![None; schema.fields().len()],
        })
    }

    fn new_specific(&self, record_type: &RecordType, schema: &Arc<RecordSchema>) -> Result<RecordInstance> {
        Ok(RecordInstance::Specific {
            schema: Arc::clone(schema),
            record: record_type.instantiate(),
        })
    }
}
