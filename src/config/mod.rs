//! Configuration for the `tinyserial` binary.
//!
//! The library itself takes no configuration: line settings and timeouts
//! applied by `SerialPort::open` are fixed. This module only feeds the demo
//! binary.
//!
//! # Configuration Resolution
//!
//! 1. `TINYSERIAL_CONFIG` environment variable (explicit path)
//! 2. `./tinyserial.toml` (current directory)
//! 3. `~/.config/tinyserial/tinyserial.toml` (XDG on Linux/macOS)
//! 4. `%APPDATA%\tinyserial\tinyserial.toml` (Windows)
//! 5. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! The pattern is `TINYSERIAL_<SECTION>_<KEY>`, e.g.
//! `TINYSERIAL_SERIAL_PORT=COM7` or `TINYSERIAL_LOGGING_FORMAT=json`.
//!
//! # Example
//!
//! ```toml
//! [serial]
//! port = "COM5"
//! baud_rate = 1000000
//!
//! [demo]
//! count = 100
//! interval_ms = 1
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{get_default_config_path, resolve_config_path, ConfigLoader};
pub use schema::{Config, DemoConfig, LogFormat, LoggingConfig, SerialConfig};
