//! Configuration schema for the `tinyserial` binary.
//!
//! Every section has defaults, so an empty or partial file is valid.

use super::error::{ConfigError, ConfigResult};
use crate::reader::DEFAULT_READ_BUFFER;
use serde::Deserialize;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which port to drive and how
    pub serial: SerialConfig,
    /// Demo write/read loop
    pub demo: DemoConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Reject values the binary cannot run with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.serial.port.trim().is_empty() {
            return Err(ConfigError::invalid("serial.port", "must not be empty"));
        }
        if self.serial.baud_rate == 0 {
            return Err(ConfigError::invalid("serial.baud_rate", "must be positive"));
        }
        if self.demo.buffer_size == 0 {
            return Err(ConfigError::invalid("demo.buffer_size", "must be positive"));
        }
        Ok(())
    }
}

/// Serial port section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// OS port name, e.g. "COM5" or "/dev/ttyUSB0"
    pub port: String,
    /// Baud rate applied after opening (open itself always uses 9600)
    pub baud_rate: u32,
    /// Pause between configuring the port and starting traffic
    pub settle_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_port_name().to_string(),
            baud_rate: 9600,
            settle_ms: 1500,
        }
    }
}

impl SerialConfig {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

#[cfg(windows)]
fn default_port_name() -> &'static str {
    "COM5"
}

#[cfg(not(windows))]
fn default_port_name() -> &'static str {
    "/dev/ttyUSB0"
}

/// Demo loop section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Number of numbered "Hello World" messages to send
    pub count: u64,
    /// Pause between two messages
    pub interval_ms: u64,
    /// Reader buffer capacity
    pub buffer_size: usize,
    /// Grace period for trailing replies before the reader stops
    pub drain_ms: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            count: 10,
            interval_ms: 1,
            buffer_size: DEFAULT_READ_BUFFER,
            drain_ms: 1000,
        }
    }
}

impl DemoConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn drain(&self) -> Duration {
        Duration::from_millis(self.drain_ms)
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Log format: "json", "pretty", "compact"
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format
    Json,
    /// Pretty format with colors
    #[default]
    Pretty,
    /// Compact format
    Compact,
}
