//! tinyserial: one serial port, blocking reads and writes, fixed timeouts.
//!
//! # Modules
//!
//! - `port`: the [`SerialPort`] handle, its backends and error types
//! - `reader`: a cancellable background reader thread
//! - `config`: TOML configuration for the demo binary
//! - `logging`: tracing subscriber setup
//! - `error`: application-level errors

pub mod config;
pub mod error;
pub mod logging;
pub mod port;
pub mod reader;

pub use error::{AppError, AppResult};
pub use port::{
    ComBackend, Connector, DataBits, LastError, LineSettings, MockBackend, MockRegistry, Parity,
    PortError, PortResult, SerialPort, StopBits, SystemBackend, SystemConnector, TimeoutPolicy,
    Transfer,
};
pub use reader::SerialReader;

pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};
