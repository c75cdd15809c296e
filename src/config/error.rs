//! Failures while assembling the demo's configuration.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Why a configuration could not be produced.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The selected config file exists but could not be read.
    #[error("Cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file is not TOML matching the `[serial]`/`[demo]`/`[logging]` layout.
    #[error("Config file {path} is malformed: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A `TINYSERIAL_*` override holds something other than the expected type.
    #[error("{var}={value:?} is not a valid {expected}")]
    Env {
        var: String,
        value: String,
        expected: &'static str,
    },

    /// A value the demo cannot run with, named by its `section.key`.
    #[error("{key} {reason}")]
    Invalid {
        key: &'static str,
        reason: &'static str,
    },
}

impl ConfigError {
    pub fn invalid(key: &'static str, reason: &'static str) -> Self {
        Self::Invalid { key, reason }
    }

    /// Name of the offending key or variable.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Env { var, .. } => Some(var.as_str()),
            Self::Invalid { key, .. } => Some(*key),
            Self::Read { .. } | Self::Parse { .. } => None,
        }
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_names_the_key() {
        let err = ConfigError::invalid("demo.buffer_size", "must be positive");
        assert_eq!(err.to_string(), "demo.buffer_size must be positive");
        assert_eq!(err.key(), Some("demo.buffer_size"));
    }

    #[test]
    fn test_env_shows_offending_value() {
        let err = ConfigError::Env {
            var: "TINYSERIAL_SERIAL_BAUD_RATE".to_string(),
            value: "fast".to_string(),
            expected: "baud rate",
        };
        assert_eq!(
            err.to_string(),
            "TINYSERIAL_SERIAL_BAUD_RATE=\"fast\" is not a valid baud rate"
        );
        assert_eq!(err.key(), Some("TINYSERIAL_SERIAL_BAUD_RATE"));
    }
}
