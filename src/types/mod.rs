//! Core types for the decoder.
//!
//! This module provides foundational types used throughout the crate:
//! - **Errors**: Decoder error types with thiserror derives
//! - **Config**: Configuration structures for decoding and observability

mod config;
mod errors;

pub use config::{Config, DecoderConfig, ObservabilityConfig};
pub use errors::{json_kind, Error, Result};
