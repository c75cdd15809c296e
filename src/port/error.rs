//! Port-specific error types.
//!
//! Every fallible port operation returns a [`PortError`] directly. Open
//! failures are classified into not-found, access-denied and busy, and keep
//! the raw platform code when one was available.

use thiserror::Error;

/// Result type for port operations.
pub type PortResult<T> = Result<T, PortError>;

/// Errors that can occur during serial port operations.
#[derive(Debug, Error)]
pub enum PortError {
    /// The specified serial port does not exist.
    #[error("Serial port not found: {port}")]
    NotFound { port: String, code: Option<i32> },

    /// The caller lacks permission to open the port.
    #[error("Access to serial port {port} denied")]
    AccessDenied { port: String, code: Option<i32> },

    /// Another owner already holds the port.
    #[error("Serial port {port} is busy")]
    Busy { port: String, code: Option<i32> },

    /// Attempted to open a port instance that's already open.
    #[error("Port is already open")]
    AlreadyOpen,

    /// Attempted to use a port that's not open.
    #[error("Port is not open")]
    NotOpen,

    /// The OS or device rejected a line configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An I/O error occurred during a transfer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A serialport-specific error occurred.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

impl PortError {
    /// Create a NotFound error from a port name.
    pub fn not_found(port_name: impl Into<String>, code: Option<i32>) -> Self {
        Self::NotFound {
            port: port_name.into(),
            code,
        }
    }

    /// Create an AccessDenied error from a port name.
    pub fn access_denied(port_name: impl Into<String>, code: Option<i32>) -> Self {
        Self::AccessDenied {
            port: port_name.into(),
            code,
        }
    }

    /// Create a Busy error from a port name.
    pub fn busy(port_name: impl Into<String>, code: Option<i32>) -> Self {
        Self::Busy {
            port: port_name.into(),
            code,
        }
    }

    /// Create a Config error from a message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// The raw platform error code, when one is known.
    pub fn os_code(&self) -> Option<i32> {
        match self {
            Self::NotFound { code, .. } | Self::AccessDenied { code, .. } | Self::Busy { code, .. } => {
                *code
            }
            Self::Io(e) => e.raw_os_error(),
            _ => None,
        }
    }

    /// Whether this error came from the port being held elsewhere.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy { .. })
    }
}

/// Classify a raw OS code from a failed open, if it names a known condition.
#[cfg(unix)]
pub(crate) fn classify_open_code(port_name: &str, code: i32) -> Option<PortError> {
    match code {
        libc::ENOENT | libc::ENODEV | libc::ENXIO => Some(PortError::not_found(port_name, Some(code))),
        libc::EACCES | libc::EPERM => Some(PortError::access_denied(port_name, Some(code))),
        libc::EBUSY => Some(PortError::busy(port_name, Some(code))),
        _ => None,
    }
}

/// Classify a raw OS code from a failed open, if it names a known condition.
#[cfg(windows)]
pub(crate) fn classify_open_code(port_name: &str, code: i32) -> Option<PortError> {
    use winapi::shared::winerror::{
        ERROR_ACCESS_DENIED, ERROR_FILE_NOT_FOUND, ERROR_PATH_NOT_FOUND, ERROR_SHARING_VIOLATION,
    };

    match code as u32 {
        ERROR_FILE_NOT_FOUND | ERROR_PATH_NOT_FOUND => Some(PortError::not_found(port_name, Some(code))),
        // COM ports report an existing owner as access denied.
        ERROR_ACCESS_DENIED | ERROR_SHARING_VIOLATION => Some(PortError::busy(port_name, Some(code))),
        _ => None,
    }
}

#[cfg(not(any(unix, windows)))]
pub(crate) fn classify_open_code(_port_name: &str, _code: i32) -> Option<PortError> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PortError::not_found("/dev/ttyUSB0", None);
        assert_eq!(err.to_string(), "Serial port not found: /dev/ttyUSB0");

        let err = PortError::config("Invalid baud rate");
        assert_eq!(err.to_string(), "Configuration error: Invalid baud rate");

        let err = PortError::AlreadyOpen;
        assert_eq!(err.to_string(), "Port is already open");

        let err = PortError::busy("COM5", Some(5));
        assert_eq!(err.to_string(), "Serial port COM5 is busy");
    }

    #[test]
    fn test_os_code() {
        assert_eq!(PortError::not_found("COM9", Some(2)).os_code(), Some(2));
        assert_eq!(PortError::access_denied("COM9", None).os_code(), None);
        assert_eq!(PortError::NotOpen.os_code(), None);

        let io = std::io::Error::from_raw_os_error(13);
        assert_eq!(PortError::Io(io).os_code(), Some(13));
    }

    #[cfg(unix)]
    #[test]
    fn test_classify_unix_codes() {
        assert!(matches!(
            classify_open_code("/dev/ttyS9", libc::ENOENT),
            Some(PortError::NotFound { .. })
        ));
        assert!(matches!(
            classify_open_code("/dev/ttyS9", libc::EACCES),
            Some(PortError::AccessDenied { .. })
        ));
        assert!(classify_open_code("/dev/ttyS9", libc::EBUSY).is_some_and(|e| e.is_busy()));
        assert!(classify_open_code("/dev/ttyS9", libc::EINTR).is_none());
    }

    #[cfg(windows)]
    #[test]
    fn test_classify_windows_codes() {
        assert!(matches!(
            classify_open_code("COM9", 2),
            Some(PortError::NotFound { code: Some(2), .. })
        ));
        assert!(classify_open_code("COM9", 5).is_some_and(|e| e.is_busy()));
    }
}
