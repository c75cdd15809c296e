//! Core traits for serial port abstraction.
//!
//! `ComBackend` is the narrow capability interface each platform (or the
//! in-memory mock) implements. Everything above it, including timeout
//! bounds, default configuration and the open/closed guards, lives in
//! [`SerialPort`](super::SerialPort) and is shared by all backends.

use super::error::PortResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Line configuration governing byte framing on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSettings {
    /// Baud rate (symbols per second).
    pub baud_rate: u32,

    /// Number of data bits (5, 6, 7, or 8).
    pub data_bits: DataBits,

    /// Number of stop bits.
    pub stop_bits: StopBits,

    /// Parity checking mode.
    pub parity: Parity,
}

/// 9600-8-N-1, applied by every `open`.
impl Default for LineSettings {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            data_bits: DataBits::Eight,
            stop_bits: StopBits::One,
            parity: Parity::None,
        }
    }
}

/// The diagnostic line printed by `print_com_state`.
impl fmt::Display for LineSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BaudRate: {} ByteSize: {} Stop bits: {} Parity: {}",
            self.baud_rate,
            self.data_bits.bits(),
            self.stop_bits.code(),
            self.parity.code()
        )
    }
}

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataBits {
    Five,
    Six,
    Seven,
    Eight,
}

impl DataBits {
    pub fn bits(self) -> u8 {
        match self {
            DataBits::Five => 5,
            DataBits::Six => 6,
            DataBits::Seven => 7,
            DataBits::Eight => 8,
        }
    }
}

impl From<DataBits> for serialport::DataBits {
    fn from(bits: DataBits) -> Self {
        match bits {
            DataBits::Five => serialport::DataBits::Five,
            DataBits::Six => serialport::DataBits::Six,
            DataBits::Seven => serialport::DataBits::Seven,
            DataBits::Eight => serialport::DataBits::Eight,
        }
    }
}

impl From<serialport::DataBits> for DataBits {
    fn from(bits: serialport::DataBits) -> Self {
        match bits {
            serialport::DataBits::Five => DataBits::Five,
            serialport::DataBits::Six => DataBits::Six,
            serialport::DataBits::Seven => DataBits::Seven,
            serialport::DataBits::Eight => DataBits::Eight,
        }
    }
}

/// Parity checking modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    None,
    Odd,
    Even,
}

impl Parity {
    /// Numeric encoding used by the com state line (0 none, 1 odd, 2 even).
    pub fn code(self) -> u8 {
        match self {
            Parity::None => 0,
            Parity::Odd => 1,
            Parity::Even => 2,
        }
    }
}

impl From<Parity> for serialport::Parity {
    fn from(parity: Parity) -> Self {
        match parity {
            Parity::None => serialport::Parity::None,
            Parity::Odd => serialport::Parity::Odd,
            Parity::Even => serialport::Parity::Even,
        }
    }
}

impl From<serialport::Parity> for Parity {
    fn from(parity: serialport::Parity) -> Self {
        match parity {
            serialport::Parity::None => Parity::None,
            serialport::Parity::Odd => Parity::Odd,
            serialport::Parity::Even => Parity::Even,
        }
    }
}

/// Number of stop bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopBits {
    One,
    Two,
}

impl StopBits {
    /// Numeric encoding used by the com state line (0 one, 2 two).
    pub fn code(self) -> u8 {
        match self {
            StopBits::One => 0,
            StopBits::Two => 2,
        }
    }
}

impl From<StopBits> for serialport::StopBits {
    fn from(bits: StopBits) -> Self {
        match bits {
            StopBits::One => serialport::StopBits::One,
            StopBits::Two => serialport::StopBits::Two,
        }
    }
}

impl From<serialport::StopBits> for StopBits {
    fn from(bits: serialport::StopBits) -> Self {
        match bits {
            serialport::StopBits::One => StopBits::One,
            serialport::StopBits::Two => StopBits::Two,
        }
    }
}

/// Blocking byte channel to one serial device.
///
/// Implementations own exactly one OS handle (or one mock endpoint).
/// `read_bytes` and `write_bytes` honour the timeout last passed to
/// `set_timeout` and return `Ok(0)` when it elapses without progress.
pub trait ComBackend: Send + fmt::Debug {
    /// Get the name/path of this serial port.
    fn name(&self) -> &str;

    /// Read whatever is available into `buffer`, waiting at most the
    /// configured timeout for the first byte.
    fn read_bytes(&mut self, buffer: &mut [u8]) -> PortResult<usize>;

    /// Write as much of `data` as the device accepts within the timeout.
    fn write_bytes(&mut self, data: &[u8]) -> PortResult<usize>;

    /// Set the bound for the next read or write.
    fn set_timeout(&mut self, timeout: Duration) -> PortResult<()>;

    /// Read the active line configuration back from the device.
    fn line_settings(&self) -> PortResult<LineSettings>;

    /// Apply a complete line configuration.
    fn apply_line_settings(&mut self, settings: &LineSettings) -> PortResult<()>;

    /// Number of bytes waiting in the receive buffer.
    fn bytes_to_read(&self) -> PortResult<usize>;

    /// Block until at least one byte is waiting, with no timeout.
    ///
    /// The default polls `bytes_to_read`; backends with a real event
    /// primitive override it.
    fn wait_for_data(&mut self) -> PortResult<()> {
        while self.bytes_to_read()? == 0 {
            std::thread::sleep(DATA_POLL_INTERVAL);
        }
        Ok(())
    }

    /// Duplicate the underlying handle into an independent owner.
    fn try_clone(&self) -> PortResult<Box<dyn ComBackend>>;
}

/// Poll period of the default `wait_for_data`.
pub const DATA_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Acquires backends by port name.
///
/// Acquisition must be exclusive: a second `connect` to a port that is still
/// held fails with [`PortError::Busy`](super::PortError::Busy).
pub trait Connector: Send + Sync + fmt::Debug {
    fn connect(&self, port_name: &str, settings: &LineSettings) -> PortResult<Box<dyn ComBackend>>;
}
