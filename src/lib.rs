//! # Avro JSON Decoder - schema-driven JSON decoding
//!
//! Decodes loosely-typed JSON documents into values that conform to an
//! Avro-style schema:
//! - Strict per-type validation of primitives, arrays, maps and enums
//! - Record field reconciliation against declared defaults
//! - Three-tier union resolution (optional shortcut, wrapped value, ordered fallback)
//! - Generic records, or registered concrete record types in specific mode
//!
//! ## Architecture
//!
//! ```text
//!   JSON text ──parse──▶ JSON tree ─┐
//!                                   ▼
//!                    ┌──────────────────────────────┐
//!   Schema ────────▶ │         JsonDecoder          │ ──▶ Value
//!                    │  ┌────────┐  ┌────────────┐  │
//!                    │  │ Value  │◀▶│   Union    │  │
//!                    │  │Decoder │  │  Resolver  │  │
//!                    │  └────────┘  └────────────┘  │
//!                    └───────┬──────────────┬───────┘
//!                            ▼              ▼
//!                      NameResolver   RecordFactory
//! ```
//!
//! ```
//! use avro_json_decoder::{decode_str, Schema, Value};
//!
//! let schema = Schema::parse_str(r#"["null", "string"]"#).unwrap();
//! assert_eq!(decode_str("'hello'", &schema).unwrap(), Value::String("hello".into()));
//! ```

// Enforce strict safety at compile time
#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]

pub mod decode;
pub mod registry;
pub mod schema;
pub mod types;
pub mod value;

// Internal utilities
pub mod observability;

pub use decode::{decode_json, decode_str, parse_json, JsonDecoder};
pub use registry::{
    DefaultRecordFactory, EnumType, NameResolver, RecordFactory, RecordInstance, RecordType,
    ResolvedType, SpecificRecord, TypeRegistry,
};
pub use schema::{Field, Name, Schema, SchemaKind};
pub use types::{Config, DecoderConfig, Error, Result};
pub use value::{EnumValue, GenericRecord, SpecificValue, Value};
