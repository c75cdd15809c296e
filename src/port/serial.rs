//! The serial port handle.
//!
//! [`SerialPort`] owns zero or one backend and carries all the
//! platform-independent behaviour: the open/closed guards, the default line
//! configuration, the fixed timeout policy and the deadline loops that turn
//! single backend transfers into bounded blocking reads and writes.

use super::error::{PortError, PortResult};
use super::system::SystemConnector;
use super::timeouts::{TimeoutPolicy, Transfer};
use super::traits::{ComBackend, Connector, LineSettings};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace, warn};

/// Record of the most recent failed `open`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastError {
    /// Platform code, 0 when none was available.
    pub code: i32,
    pub message: String,
}

/// One exclusively owned serial channel.
///
/// Created closed. `open` acquires the channel with 9600-8-N-1 and the
/// fixed [`TimeoutPolicy`]; `close` or drop releases it.
///
/// # Example
/// ```no_run
/// use tinyserial::SerialPort;
///
/// let mut port = SerialPort::new();
/// if let Err(e) = port.open("COM5") {
///     eprintln!("open failed: {e} (code {})", port.last_error());
///     return Ok(());
/// }
/// port.set_baud_rate(115_200)?;
/// port.write_str("Hello World")?;
///
/// let mut buffer = [0u8; 256];
/// let transfer = port.read(&mut buffer)?;
/// println!("read {} bytes", transfer.len());
/// # Ok::<(), tinyserial::PortError>(())
/// ```
#[derive(Debug)]
pub struct SerialPort {
    connector: Arc<dyn Connector>,
    backend: Option<Box<dyn ComBackend>>,
    timeouts: TimeoutPolicy,
    last_error: Option<LastError>,
}

impl Default for SerialPort {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialPort {
    /// A closed port that opens real devices.
    pub fn new() -> Self {
        Self::with_connector(Arc::new(SystemConnector))
    }

    /// A closed port that acquires channels through `connector`.
    pub fn with_connector(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            backend: None,
            timeouts: TimeoutPolicy::default(),
            last_error: None,
        }
    }

    /// Open the named port for exclusive reading and writing.
    ///
    /// Fails with [`PortError::AlreadyOpen`] without touching the current
    /// channel or the recorded error when this instance is already open.
    /// Any other failure is recorded for [`last_error`](Self::last_error).
    pub fn open(&mut self, port_name: &str) -> PortResult<()> {
        if self.is_open() {
            return Err(PortError::AlreadyOpen);
        }

        match self.acquire(port_name) {
            Ok(backend) => {
                debug!("Opened serial port {} at 9600-8-N-1", port_name);
                self.backend = Some(backend);
                Ok(())
            }
            Err(e) => {
                debug!("Failed to open serial port {}: {}", port_name, e);
                self.last_error = Some(LastError {
                    code: e.os_code().unwrap_or(0),
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    fn acquire(&self, port_name: &str) -> PortResult<Box<dyn ComBackend>> {
        let defaults = LineSettings::default();
        let mut backend = self.connector.connect(port_name, &defaults)?;
        backend.set_timeout(self.timeouts.read_interval)?;
        backend.apply_line_settings(&defaults)?;
        Ok(backend)
    }

    /// Release the channel. Does nothing when already closed.
    pub fn close(&mut self) {
        if let Some(backend) = self.backend.take() {
            debug!("Closed serial port {}", backend.name());
        }
    }

    pub fn is_open(&self) -> bool {
        self.backend.is_some()
    }

    /// Name of the open port.
    pub fn name(&self) -> Option<&str> {
        self.backend.as_deref().map(|b| b.name())
    }

    /// The bounds applied to reads and writes.
    pub fn timeouts(&self) -> TimeoutPolicy {
        self.timeouts
    }

    fn backend_mut(&mut self) -> PortResult<&mut Box<dyn ComBackend>> {
        self.backend.as_mut().ok_or(PortError::NotOpen)
    }

    /// Read into `buffer`, blocking at most
    /// `read_total_constant + read_total_multiplier * buffer.len()`.
    ///
    /// Once the first byte arrives the read also ends when the line stays
    /// idle for `read_interval`. Bytes are passed through untouched.
    pub fn read(&mut self, buffer: &mut [u8]) -> PortResult<Transfer> {
        let policy = self.timeouts;
        let backend = self.backend_mut()?;
        if buffer.is_empty() {
            return Ok(Transfer::Complete(0));
        }

        let deadline = Instant::now() + policy.read_total(buffer.len());
        let mut filled = 0;
        while filled < buffer.len() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            let mut wait = deadline - now;
            if filled > 0 {
                wait = wait.min(policy.read_interval);
            }

            backend.set_timeout(wait)?;
            let n = backend.read_bytes(&mut buffer[filled..])?;
            if n == 0 && filled > 0 {
                break;
            }
            filled += n;
        }

        trace!("Read {} of {} bytes", filled, buffer.len());
        Ok(Transfer::from_counts(filled, buffer.len()))
    }

    /// Write `data`, blocking at most
    /// `write_total_constant + write_total_multiplier * data.len()`.
    ///
    /// A short count is reported as [`Transfer::Partial`]; the remainder is
    /// not retried.
    pub fn write(&mut self, data: &[u8]) -> PortResult<Transfer> {
        let policy = self.timeouts;
        let backend = self.backend_mut()?;
        if data.is_empty() {
            return Ok(Transfer::Complete(0));
        }

        let deadline = Instant::now() + policy.write_total(data.len());
        let mut written = 0;
        while written < data.len() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }

            backend.set_timeout(deadline - now)?;
            written += backend.write_bytes(&data[written..])?;
        }

        trace!("Wrote {} of {} bytes", written, data.len());
        Ok(Transfer::from_counts(written, data.len()))
    }

    /// Write the bytes of `text` followed by a single NUL terminator.
    pub fn write_str(&mut self, text: &str) -> PortResult<Transfer> {
        let mut payload = Vec::with_capacity(text.len() + 1);
        payload.extend_from_slice(text.as_bytes());
        payload.push(0);
        self.write(&payload)
    }

    /// Change only the baud rate, keeping the rest of the line configuration.
    pub fn set_baud_rate(&mut self, baud_rate: u32) -> PortResult<()> {
        let backend = self.backend_mut()?;
        let mut settings = backend.line_settings()?;
        settings.baud_rate = baud_rate;

        if let Err(e) = backend.apply_line_settings(&settings) {
            warn!(
                "Serial port {} rejected baud rate {}: {}",
                backend.name(),
                baud_rate,
                e
            );
            return Err(e);
        }
        Ok(())
    }

    /// Line configuration as currently reported by the device.
    pub fn line_settings(&self) -> PortResult<LineSettings> {
        self.backend
            .as_deref()
            .ok_or(PortError::NotOpen)?
            .line_settings()
    }

    /// Print the active line configuration to stdout. No-op when closed.
    pub fn print_com_state(&self) {
        if !self.is_open() {
            return;
        }
        match self.line_settings() {
            Ok(settings) => println!("{settings}"),
            Err(e) => warn!("Failed to query com state: {}", e),
        }
    }

    /// Code of the most recent failed `open` as decimal text.
    ///
    /// `"0"` when nothing failed yet. Successful calls do not reset it, so
    /// the value may be stale.
    pub fn last_error(&self) -> String {
        self.last_error
            .as_ref()
            .map_or(0, |e| e.code)
            .to_string()
    }

    /// Full record of the most recent failed `open`.
    pub fn last_error_details(&self) -> Option<&LastError> {
        self.last_error.as_ref()
    }

    /// Block until the data-received event fires, with no timeout.
    ///
    /// Returns once at least one byte is waiting; the byte stays in the
    /// receive buffer for the next `read`.
    pub fn wait_until_data_received(&mut self) -> PortResult<()> {
        self.backend_mut()?.wait_for_data()
    }

    /// Duplicate the channel into a second, independently owned port.
    ///
    /// Lets one thread read while another writes without sharing a handle.
    pub fn try_clone(&self) -> PortResult<SerialPort> {
        let backend = self
            .backend
            .as_deref()
            .ok_or(PortError::NotOpen)?
            .try_clone()?;

        Ok(SerialPort {
            connector: self.connector.clone(),
            backend: Some(backend),
            timeouts: self.timeouts,
            last_error: None,
        })
    }
}

impl Drop for SerialPort {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::mock::{MockBackend, MockRegistry, MOCK_NOT_FOUND_CODE};
    use std::time::Duration;

    fn mock_port(registry: &Arc<MockRegistry>) -> SerialPort {
        SerialPort::with_connector(registry.clone())
    }

    #[test]
    fn test_new_port_is_closed() {
        let port = SerialPort::new();
        assert!(!port.is_open());
        assert_eq!(port.name(), None);
        assert_eq!(port.last_error(), "0");
    }

    #[test]
    fn test_open_applies_defaults() {
        let registry = Arc::new(MockRegistry::new());
        registry.register_loopback("COM5");

        let mut port = mock_port(&registry);
        port.open("COM5").unwrap();

        assert!(port.is_open());
        assert_eq!(port.name(), Some("COM5"));
        assert_eq!(port.line_settings().unwrap(), LineSettings::default());
    }

    #[test]
    fn test_failed_open_records_code() {
        let registry = Arc::new(MockRegistry::new());
        let mut port = mock_port(&registry);

        let err = port.open("COM404").unwrap_err();
        assert!(matches!(err, PortError::NotFound { .. }));
        assert!(!port.is_open());
        assert_eq!(port.last_error(), MOCK_NOT_FOUND_CODE.to_string());
        assert!(port
            .last_error_details()
            .is_some_and(|e| e.message.contains("COM404")));
    }

    #[test]
    fn test_short_read_stops_after_interval() {
        let registry = Arc::new(MockRegistry::new());
        let observer = registry.register(MockBackend::new("COM1"));
        let mut port = mock_port(&registry);
        port.open("COM1").unwrap();

        observer.inject(b"abc");
        let mut buffer = [0u8; 200];
        let started = Instant::now();
        let transfer = port.read(&mut buffer).unwrap();

        assert_eq!(transfer, Transfer::Partial(3));
        // Interval cut-off, far below the 2050ms total bound.
        assert!(started.elapsed() < Duration::from_millis(1000));
    }

    #[test]
    fn test_write_timeout_is_bounded() {
        let registry = Arc::new(MockRegistry::new());
        let observer = registry.register_loopback("COM1");
        let mut port = mock_port(&registry);
        port.open("COM1").unwrap();
        observer.set_write_budget(Some(0));

        let started = Instant::now();
        let transfer = port.write(b"xy").unwrap();
        assert_eq!(transfer, Transfer::TimedOut);
        assert!(started.elapsed() >= Duration::from_millis(70));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_drop_releases_channel() {
        let registry = Arc::new(MockRegistry::new());
        let observer = registry.register_loopback("COM1");
        {
            let mut port = mock_port(&registry);
            port.open("COM1").unwrap();
            assert_eq!(observer.open_handles(), 1);
        }
        assert_eq!(observer.open_handles(), 0);
    }
}
