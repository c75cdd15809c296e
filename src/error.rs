//! Application-level errors for the `tinyserial` binary.

use crate::config::ConfigError;
use crate::port::PortError;
use thiserror::Error;

/// Unified application error type.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Port(#[from] PortError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to initialise logging: {0}")]
    Logging(String),

    #[error("An I/O error occurred: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized `Result` type for the binary.
pub type AppResult<T> = Result<T, AppError>;
