//! Configuration structures.
//!
//! Configuration is loaded from a JSON config file or built from defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{Error, Result};

/// Global decoder configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Decoding behaviour.
    #[serde(default)]
    pub decoder: DecoderConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from a JSON file. Missing sections take defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Config = serde_json::from_str(&text)?;
        config.decoder.validate()?;
        Ok(config)
    }
}

/// Decoder configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DecoderConfig {
    /// Accept comments, single-quoted strings and unquoted field names when
    /// parsing JSON text.
    pub lenient_syntax: bool,

    /// Fail instead of picking the first member when more than one union
    /// member decodes the same JSON value.
    pub strict_unions: bool,

    /// Maximum schema nesting depth followed during a single decode.
    pub max_depth: usize,
}

impl DecoderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(Error::config("decoder.max_depth must be positive"));
        }
        Ok(())
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            lenient_syntax: true,
            strict_unions: false,
            max_depth: 256,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Tracing log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable JSON log formatting.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.decoder.lenient_syntax);
        assert!(!config.decoder.strict_unions);
        assert_eq!(config.decoder.max_depth, 256);
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_from_file_partial_sections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"decoder": {{"strict_unions": true}}}}"#).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert!(config.decoder.strict_unions);
        assert!(config.decoder.lenient_syntax);
        assert_eq!(config.observability, ObservabilityConfig::default());
    }

    #[test]
    fn test_from_file_rejects_zero_depth() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"decoder": {{"max_depth": 0}}}}"#).unwrap();

        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_from_file_missing() {
        let err = Config::from_file("/nonexistent/avro-json.json").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
