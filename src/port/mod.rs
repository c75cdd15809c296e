//! Port abstraction layer for serial communication.
//!
//! `traits` defines the narrow backend interface, `system` implements it
//! over the operating system and `mock` in memory. `serial` holds the
//! platform-independent [`SerialPort`] built on top of either.

pub mod error;
pub mod mock;
pub mod serial;
pub mod system;
pub mod timeouts;
pub mod traits;

pub use error::{PortError, PortResult};
pub use mock::{MockBackend, MockRegistry};
pub use serial::{LastError, SerialPort};
pub use system::{available_port_names, SystemBackend, SystemConnector};
pub use timeouts::{TimeoutPolicy, Transfer};
pub use traits::*;
