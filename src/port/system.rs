//! Operating-system serial port backend.
//!
//! Wraps the `serialport` crate, which talks to the Win32 comm API on
//! Windows and termios on Unix. Ports are opened exclusively on every
//! platform.

use super::error::{classify_open_code, PortError, PortResult};
use super::traits::{ComBackend, Connector, LineSettings};
use std::io::{self, Read, Write};
use std::time::Duration;

/// Initial timeout handed to `serialport` before the policy takes over.
const OPEN_TIMEOUT: Duration = Duration::from_millis(50);

/// Backend over a real serial device.
pub struct SystemBackend {
    /// The underlying serial port implementation.
    port: Box<dyn serialport::SerialPort>,
    /// The port name/path for identification.
    name: String,
}

impl SystemBackend {
    /// Open a serial port exclusively with the given line settings.
    ///
    /// # Example
    /// ```no_run
    /// use tinyserial::port::{LineSettings, SystemBackend};
    ///
    /// let port = SystemBackend::open("/dev/ttyUSB0", &LineSettings::default())?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(port_name: &str, settings: &LineSettings) -> PortResult<Self> {
        let port = serialport::new(port_name, settings.baud_rate)
            .data_bits(settings.data_bits.into())
            .flow_control(serialport::FlowControl::None)
            .parity(settings.parity.into())
            .stop_bits(settings.stop_bits.into())
            .timeout(OPEN_TIMEOUT)
            .open()
            .map_err(|e| {
                // Captured before anything else can overwrite the thread's last error.
                open_error(port_name, e, io::Error::last_os_error().raw_os_error())
            })?;

        Ok(Self {
            port,
            name: port_name.to_string(),
        })
    }

    /// Get a reference to the underlying serialport implementation.
    pub fn as_raw(&self) -> &dyn serialport::SerialPort {
        &*self.port
    }
}

/// `raw_code` is the thread's last OS error. It only describes this failure
/// when the open actually reached the OS, so other kinds ignore it.
fn open_error(port_name: &str, err: serialport::Error, raw_code: Option<i32>) -> PortError {
    let code = raw_code.filter(|c| {
        *c != 0
            && matches!(
                err.kind(),
                serialport::ErrorKind::NoDevice | serialport::ErrorKind::Io(_)
            )
    });
    if let Some(classified) = code.and_then(|c| classify_open_code(port_name, c)) {
        return classified;
    }

    match err.kind() {
        serialport::ErrorKind::NoDevice => PortError::not_found(port_name, code),
        serialport::ErrorKind::InvalidInput => PortError::config(err.to_string()),
        serialport::ErrorKind::Io(io::ErrorKind::NotFound) => PortError::not_found(port_name, code),
        serialport::ErrorKind::Io(io::ErrorKind::PermissionDenied) => {
            PortError::access_denied(port_name, code)
        }
        _ => PortError::Serial(err),
    }
}

fn config_error(err: serialport::Error) -> PortError {
    match err.kind() {
        serialport::ErrorKind::InvalidInput => PortError::config(err.to_string()),
        _ => PortError::Serial(err),
    }
}

/// Timeouts surface as `Ok(0)` so the caller's deadline loop decides.
fn transfer_result(result: io::Result<usize>) -> PortResult<usize> {
    match result {
        Ok(n) => Ok(n),
        Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => Ok(0),
        Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(0),
        Err(e) => Err(PortError::Io(e)),
    }
}

impl ComBackend for SystemBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> PortResult<usize> {
        transfer_result(self.port.read(buffer))
    }

    fn write_bytes(&mut self, data: &[u8]) -> PortResult<usize> {
        transfer_result(self.port.write(data))
    }

    fn set_timeout(&mut self, timeout: Duration) -> PortResult<()> {
        self.port.set_timeout(timeout).map_err(PortError::Serial)
    }

    fn line_settings(&self) -> PortResult<LineSettings> {
        Ok(LineSettings {
            baud_rate: self.port.baud_rate()?,
            data_bits: self.port.data_bits()?.into(),
            stop_bits: self.port.stop_bits()?.into(),
            parity: self.port.parity()?.into(),
        })
    }

    fn apply_line_settings(&mut self, settings: &LineSettings) -> PortResult<()> {
        self.port
            .set_baud_rate(settings.baud_rate)
            .map_err(config_error)?;
        self.port
            .set_data_bits(settings.data_bits.into())
            .map_err(config_error)?;
        self.port
            .set_stop_bits(settings.stop_bits.into())
            .map_err(config_error)?;
        self.port
            .set_parity(settings.parity.into())
            .map_err(config_error)
    }

    fn bytes_to_read(&self) -> PortResult<usize> {
        Ok(self.port.bytes_to_read()? as usize)
    }

    fn try_clone(&self) -> PortResult<Box<dyn ComBackend>> {
        let port = self.port.try_clone()?;
        Ok(Box::new(Self {
            port,
            name: self.name.clone(),
        }))
    }
}

impl std::fmt::Debug for SystemBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemBackend")
            .field("name", &self.name)
            .field("baud_rate", &self.port.baud_rate())
            .finish()
    }
}

/// Opens ports through [`SystemBackend`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemConnector;

impl Connector for SystemConnector {
    fn connect(&self, port_name: &str, settings: &LineSettings) -> PortResult<Box<dyn ComBackend>> {
        Ok(Box::new(SystemBackend::open(port_name, settings)?))
    }
}

/// Names of the serial ports currently present on the system.
pub fn available_port_names() -> PortResult<Vec<String>> {
    Ok(serialport::available_ports()?
        .into_iter()
        .map(|info| info.port_name)
        .collect())
}
