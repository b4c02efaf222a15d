//! Decoder error types.
//!
//! All errors use `thiserror` for automatic Error trait derivation and carry
//! the schema and JSON context needed to locate the failure.

use thiserror::Error;

/// Decoder result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error enum for schema-driven decoding.
#[derive(Error, Debug)]
pub enum Error {
    /// JSON node shape does not match the schema type at this position.
    #[error("type mismatch: expected {expected}, got {found} {node}")]
    TypeMismatch {
        expected: String,
        found: &'static str,
        node: String,
    },

    /// A declared record field has neither a JSON value nor a default.
    #[error("missing required field '{field}' in record {record}")]
    MissingRequiredField { record: String, field: String },

    /// The JSON object supplies keys the record schema does not declare.
    #[error("unexpected fields in record {record}: [{}]", .fields.join(", "))]
    UnexpectedField { record: String, fields: Vec<String> },

    /// No union member could decode the JSON node.
    #[error("cannot resolve union {union} for {node}")]
    UnresolvedUnion { node: String, union: String },

    /// Strict unions only: more than one member decodes the JSON node.
    #[error("ambiguous union value {node}: matches [{}]", .candidates.join(", "))]
    AmbiguousUnion {
        node: String,
        candidates: Vec<String>,
    },

    /// The name resolver has no type registered under this full name.
    #[error("unknown type name: {0}")]
    UnknownName(String),

    /// A named-type reference with no definition in the schema being decoded.
    /// Decodes must start from a schema that defines every name it refers to.
    #[error("schema reference {0} has no definition in the decoded schema")]
    UnresolvedReference(String),

    /// The enum has no member with this symbol.
    #[error("unknown symbol '{symbol}' for enum {enum_name}")]
    UnknownEnumSymbol { enum_name: String, symbol: String },

    /// A capability this decoder does not implement (BYTES, FIXED).
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// The JSON text failed to parse.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// The schema document is not a valid schema.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// Nesting exceeded the configured depth limit.
    #[error("nesting depth limit of {limit} exceeded")]
    DepthLimitExceeded { limit: usize },

    /// A record builder was addressed at a position it does not have.
    #[error("record {record} has no field at position {position}")]
    InvalidField { record: String, position: usize },

    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),

    /// Serialization/deserialization errors.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether a union resolver may swallow this error and try another member.
    ///
    /// Depth violations come from the input shape and dangling references from
    /// the schema, not the member choice, so both abort resolution outright.
    pub fn is_recoverable_in_union(&self) -> bool {
        !matches!(
            self,
            Error::DepthLimitExceeded { .. } | Error::UnresolvedReference(_)
        )
    }
}

// Convenience constructors
impl Error {
    pub fn type_mismatch(expected: impl Into<String>, node: &serde_json::Value) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: json_kind(node),
            node: truncate_node(node),
        }
    }

    pub fn missing_required_field(record: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingRequiredField {
            record: record.into(),
            field: field.into(),
        }
    }

    pub fn unresolved_union(node: &serde_json::Value, union: impl Into<String>) -> Self {
        Self::UnresolvedUnion {
            node: truncate_node(node),
            union: union.into(),
        }
    }

    pub fn unknown_enum_symbol(enum_name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self::UnknownEnumSymbol {
            enum_name: enum_name.into(),
            symbol: symbol.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    pub fn malformed_input(msg: impl Into<String>) -> Self {
        Self::MalformedInput(msg.into())
    }

    pub fn invalid_schema(msg: impl Into<String>) -> Self {
        Self::InvalidSchema(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Maximum rendered length of a JSON node embedded in an error message.
const NODE_DISPLAY_LIMIT: usize = 120;

/// Name of a JSON node's variant, as used in error messages.
pub fn json_kind(node: &serde_json::Value) -> &'static str {
    use serde_json::Value;
    match node {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn truncate_node(node: &serde_json::Value) -> String {
    let rendered = node.to_string();
    if rendered.len() <= NODE_DISPLAY_LIMIT {
        return rendered;
    }
    let mut cut = NODE_DISPLAY_LIMIT;
    while !rendered.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &rendered[..cut])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_type_mismatch_display() {
        let err = Error::type_mismatch("int", &json!("42"));
        assert_eq!(err.to_string(), "type mismatch: expected int, got string \"42\"");
    }

    #[test]
    fn test_unexpected_field_lists_keys() {
        let err = Error::UnexpectedField {
            record: "pkg.Point".into(),
            fields: vec!["b".into(), "c".into()],
        };
        assert_eq!(err.to_string(), "unexpected fields in record pkg.Point: [b, c]");
    }

    #[test]
    fn test_long_nodes_are_truncated() {
        let node = json!("x".repeat(500));
        let err = Error::unresolved_union(&node, "[\"int\",\"long\"]");
        let msg = err.to_string();
        assert!(msg.contains("..."));
        assert!(msg.len() < 300);
    }

    #[test]
    fn test_depth_limit_is_not_recoverable() {
        assert!(!Error::DepthLimitExceeded { limit: 4 }.is_recoverable_in_union());
        assert!(!Error::UnresolvedReference("pkg.Node".into()).is_recoverable_in_union());
        assert!(Error::UnknownName("pkg.Node".into()).is_recoverable_in_union());
        assert!(Error::type_mismatch("int", &json!(null)).is_recoverable_in_union());
    }

    #[test]
    fn test_json_kind_distinguishes_integers() {
        assert_eq!(json_kind(&json!(1)), "integer");
        assert_eq!(json_kind(&json!(1.5)), "number");
        assert_eq!(json_kind(&json!({})), "object");
    }
}
