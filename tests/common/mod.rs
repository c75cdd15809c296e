//! Shared test utilities.
//!
//! Builds ports over the in-memory backend so the port contract can be
//! exercised without hardware.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};
use tinyserial::port::{MockBackend, MockRegistry, SerialPort};

/// A registry holding one connected pair named `LEFT` and `RIGHT`.
pub struct PairFixture {
    pub registry: Arc<MockRegistry>,
    pub left: MockBackend,
    pub right: MockBackend,
}

impl PairFixture {
    pub fn new() -> Self {
        let registry = Arc::new(MockRegistry::new());
        let (left, right) = registry.register_pair("LEFT", "RIGHT");
        Self {
            registry,
            left,
            right,
        }
    }

    /// A closed port that resolves names against this fixture.
    pub fn port(&self) -> SerialPort {
        SerialPort::with_connector(self.registry.clone())
    }

    /// An opened port on the named endpoint.
    pub fn open(&self, name: &str) -> SerialPort {
        let mut port = self.port();
        port.open(name)
            .unwrap_or_else(|e| panic!("failed to open {name}: {e}"));
        port
    }
}

/// A registry with one self-looped endpoint named `LOOP`.
pub fn loopback() -> (Arc<MockRegistry>, MockBackend) {
    let registry = Arc::new(MockRegistry::new());
    let observer = registry.register_loopback("LOOP");
    (registry, observer)
}

/// Read from `port` until `expected` bytes arrived or `timeout` passed.
pub fn read_until(port: &mut SerialPort, expected: usize, timeout: Duration) -> Vec<u8> {
    let deadline = Instant::now() + timeout;
    let mut received = Vec::new();
    let mut buffer = [0u8; 64];

    while received.len() < expected && Instant::now() < deadline {
        let transfer = port.read(&mut buffer).expect("read failed");
        received.extend_from_slice(&buffer[..transfer.len()]);
    }
    received
}
