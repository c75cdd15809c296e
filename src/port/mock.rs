//! In-memory serial backend for tests and demos.
//!
//! A [`MockBackend`] is one endpoint of a virtual null-modem cable: bytes
//! written on one endpoint become readable on its peer. `MockBackend::new`
//! creates a single endpoint wired back to itself (a loopback plug).
//! [`MockRegistry`] hands endpoints out by name and enforces exclusive
//! ownership the same way an OS does.

use super::error::{PortError, PortResult};
use super::traits::{ComBackend, Connector, LineSettings};
use parking_lot::{Condvar, Mutex};
use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Code reported when a mock port name is not registered.
pub const MOCK_NOT_FOUND_CODE: i32 = 2;
/// Code reported when a mock port is already held.
pub const MOCK_BUSY_CODE: i32 = 16;

const DEFAULT_TIMEOUT: Duration = Duration::from_millis(50);

/// One direction of the virtual cable.
#[derive(Debug, Default)]
struct Pipe {
    bytes: Mutex<VecDeque<u8>>,
    readable: Condvar,
}

impl Pipe {
    fn push(&self, data: &[u8]) {
        let mut bytes = self.bytes.lock();
        bytes.extend(data);
        self.readable.notify_all();
    }
}

/// Per-endpoint device state, shared by every handle to the endpoint.
#[derive(Debug)]
struct EndpointState {
    settings: LineSettings,
    write_log: Vec<Vec<u8>>,
    /// Remaining bytes the device accepts before writes stall.
    write_budget: Option<usize>,
    rejected_bauds: Vec<u32>,
    fail_next: Option<io::ErrorKind>,
    open_handles: usize,
}

impl Default for EndpointState {
    fn default() -> Self {
        Self {
            settings: LineSettings::default(),
            write_log: Vec::new(),
            write_budget: None,
            rejected_bauds: Vec::new(),
            fail_next: None,
            open_handles: 0,
        }
    }
}

/// Mock serial endpoint.
///
/// Clones are observer handles onto the same endpoint: they can inject
/// data and failures and inspect what was written, but they do not count
/// as owners. Owning handles come from [`MockRegistry::connect`] or
/// [`ComBackend::try_clone`].
///
/// # Example
/// ```
/// use tinyserial::port::{ComBackend, MockBackend};
///
/// let (mut left, mut right) = MockBackend::pair("LEFT", "RIGHT");
/// left.write_bytes(b"Hello").unwrap();
///
/// let mut buffer = [0u8; 8];
/// let n = right.read_bytes(&mut buffer).unwrap();
/// assert_eq!(&buffer[..n], b"Hello");
/// ```
#[derive(Debug)]
pub struct MockBackend {
    name: String,
    rx: Arc<Pipe>,
    tx: Arc<Pipe>,
    state: Arc<Mutex<EndpointState>>,
    /// Per-handle, like an OS file descriptor's timeout.
    timeout: Duration,
    owner: bool,
}

impl MockBackend {
    /// Create an endpoint whose writes loop back to its own reads.
    pub fn new(name: impl Into<String>) -> Self {
        let pipe = Arc::new(Pipe::default());
        Self::endpoint(name.into(), pipe.clone(), pipe)
    }

    /// Create two connected endpoints.
    pub fn pair(a: impl Into<String>, b: impl Into<String>) -> (Self, Self) {
        let a_to_b = Arc::new(Pipe::default());
        let b_to_a = Arc::new(Pipe::default());
        (
            Self::endpoint(a.into(), b_to_a.clone(), a_to_b.clone()),
            Self::endpoint(b.into(), a_to_b, b_to_a),
        )
    }

    fn endpoint(name: String, rx: Arc<Pipe>, tx: Arc<Pipe>) -> Self {
        Self {
            name,
            rx,
            tx,
            state: Arc::new(Mutex::new(EndpointState::default())),
            timeout: DEFAULT_TIMEOUT,
            owner: false,
        }
    }

    /// A new owning handle; released again on drop.
    fn claim(&self) -> Self {
        self.state.lock().open_handles += 1;
        Self {
            name: self.name.clone(),
            rx: self.rx.clone(),
            tx: self.tx.clone(),
            state: self.state.clone(),
            timeout: self.timeout,
            owner: true,
        }
    }

    /// Make bytes readable on this endpoint as if the far side sent them.
    pub fn inject(&self, data: &[u8]) {
        self.rx.push(data);
    }

    /// Bytes sent by this endpoint that its peer has not read yet.
    pub fn in_flight(&self) -> usize {
        self.tx.bytes.lock().len()
    }

    /// Bytes waiting to be read on this endpoint.
    pub fn available_bytes(&self) -> usize {
        self.rx.bytes.lock().len()
    }

    /// Every write accepted on this endpoint, in order.
    pub fn get_write_log(&self) -> Vec<Vec<u8>> {
        self.state.lock().write_log.clone()
    }

    /// Limit how many more bytes the endpoint accepts; `None` lifts the limit.
    pub fn set_write_budget(&self, budget: Option<usize>) {
        self.state.lock().write_budget = budget;
    }

    /// Make the device refuse a baud rate.
    pub fn reject_baud_rate(&self, baud_rate: u32) {
        self.state.lock().rejected_bauds.push(baud_rate);
    }

    /// Fail the next read or write with a hard I/O error.
    pub fn fail_next_io(&self, kind: io::ErrorKind) {
        self.state.lock().fail_next = Some(kind);
    }

    /// Number of live owning handles.
    pub fn open_handles(&self) -> usize {
        self.state.lock().open_handles
    }

    fn take_failure(&self) -> PortResult<()> {
        match self.state.lock().fail_next.take() {
            Some(kind) => Err(PortError::Io(io::Error::new(kind, "injected mock failure"))),
            None => Ok(()),
        }
    }
}

impl Clone for MockBackend {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            rx: self.rx.clone(),
            tx: self.tx.clone(),
            state: self.state.clone(),
            timeout: self.timeout,
            owner: false,
        }
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        if self.owner {
            let mut state = self.state.lock();
            state.open_handles = state.open_handles.saturating_sub(1);
        }
    }
}

impl ComBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> PortResult<usize> {
        self.take_failure()?;
        let deadline = Instant::now() + self.timeout;

        let mut bytes = self.rx.bytes.lock();
        while bytes.is_empty() {
            if self.rx.readable.wait_until(&mut bytes, deadline).timed_out() {
                break;
            }
        }

        let n = buffer.len().min(bytes.len());
        for (slot, byte) in buffer.iter_mut().zip(bytes.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn write_bytes(&mut self, data: &[u8]) -> PortResult<usize> {
        self.take_failure()?;
        let mut state = self.state.lock();

        let accepted = match state.write_budget {
            Some(budget) => data.len().min(budget),
            None => data.len(),
        };
        if accepted == 0 && !data.is_empty() {
            // A stalled device holds the writer until its timeout.
            drop(state);
            std::thread::sleep(self.timeout);
            return Ok(0);
        }
        if let Some(budget) = state.write_budget.as_mut() {
            *budget -= accepted;
        }

        state.write_log.push(data[..accepted].to_vec());
        drop(state);

        self.tx.push(&data[..accepted]);
        Ok(accepted)
    }

    fn set_timeout(&mut self, timeout: Duration) -> PortResult<()> {
        self.timeout = timeout;
        Ok(())
    }

    fn line_settings(&self) -> PortResult<LineSettings> {
        Ok(self.state.lock().settings)
    }

    fn apply_line_settings(&mut self, settings: &LineSettings) -> PortResult<()> {
        let mut state = self.state.lock();
        if settings.baud_rate == 0 || state.rejected_bauds.contains(&settings.baud_rate) {
            return Err(PortError::config(format!(
                "unsupported baud rate {}",
                settings.baud_rate
            )));
        }
        state.settings = *settings;
        Ok(())
    }

    fn bytes_to_read(&self) -> PortResult<usize> {
        Ok(self.available_bytes())
    }

    fn wait_for_data(&mut self) -> PortResult<()> {
        let mut bytes = self.rx.bytes.lock();
        while bytes.is_empty() {
            self.rx.readable.wait(&mut bytes);
        }
        Ok(())
    }

    fn try_clone(&self) -> PortResult<Box<dyn ComBackend>> {
        Ok(Box::new(self.claim()))
    }
}

/// Name-addressed set of mock endpoints acting as a [`Connector`].
#[derive(Debug, Default)]
pub struct MockRegistry {
    endpoints: Mutex<HashMap<String, MockBackend>>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an endpoint under its name and return an observer handle.
    pub fn register(&self, endpoint: MockBackend) -> MockBackend {
        let observer = endpoint.clone();
        self.endpoints
            .lock()
            .insert(endpoint.name().to_string(), endpoint);
        observer
    }

    /// Register a connected pair and return observer handles for both.
    pub fn register_pair(&self, a: &str, b: &str) -> (MockBackend, MockBackend) {
        let (left, right) = MockBackend::pair(a, b);
        (self.register(left), self.register(right))
    }

    /// Register a self-looped endpoint and return its observer handle.
    pub fn register_loopback(&self, name: &str) -> MockBackend {
        self.register(MockBackend::new(name))
    }
}

impl Connector for MockRegistry {
    fn connect(&self, port_name: &str, settings: &LineSettings) -> PortResult<Box<dyn ComBackend>> {
        let endpoints = self.endpoints.lock();
        let endpoint = endpoints
            .get(port_name)
            .ok_or_else(|| PortError::not_found(port_name, Some(MOCK_NOT_FOUND_CODE)))?;

        if endpoint.open_handles() > 0 {
            return Err(PortError::busy(port_name, Some(MOCK_BUSY_CODE)));
        }

        let mut backend = endpoint.claim();
        backend.apply_line_settings(settings)?;
        Ok(Box::new(backend))
    }
}
