//! Cancellable background reader.
//!
//! A [`SerialReader`] moves an open [`SerialPort`] onto its own thread and
//! drains it in a loop, handing every received chunk to a caller-supplied
//! sink. Shutdown is cooperative: the flag is checked between reads, and
//! each read is bounded by the port's timeout policy, so `stop` returns
//! within one read deadline.

use crate::port::{PortError, PortResult, SerialPort};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// Buffer size used by the demo reader loop.
pub const DEFAULT_READ_BUFFER: usize = 256;

struct ReaderExit {
    port: SerialPort,
    error: Option<PortError>,
}

/// Handle to a running reader thread.
pub struct SerialReader {
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<ReaderExit>>,
}

impl SerialReader {
    /// Start draining `port` into `sink`.
    ///
    /// The sink only sees non-empty chunks. A hard read error ends the
    /// loop; it is reported by [`stop`](Self::stop).
    pub fn spawn<F>(port: SerialPort, buffer_size: usize, sink: F) -> PortResult<Self>
    where
        F: FnMut(&[u8]) + Send + 'static,
    {
        if !port.is_open() {
            return Err(PortError::NotOpen);
        }

        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = shutdown.clone();
        let thread_name = format!("serial-reader-{}", port.name().unwrap_or("port"));

        let thread = thread::Builder::new()
            .name(thread_name)
            .spawn(move || read_loop(port, buffer_size.max(1), sink, &flag))?;

        Ok(Self {
            shutdown,
            thread: Some(thread),
        })
    }

    /// Whether the loop is still running.
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Signal shutdown, wait for the thread and hand the port back.
    pub fn stop(mut self) -> PortResult<SerialPort> {
        self.shutdown.store(true, Ordering::SeqCst);
        let thread = self.thread.take().ok_or(PortError::NotOpen)?;

        match thread.join() {
            Ok(ReaderExit { error: Some(e), .. }) => Err(e),
            Ok(ReaderExit { port, error: None }) => Ok(port),
            Err(_) => Err(PortError::Io(io::Error::other("serial reader thread panicked"))),
        }
    }
}

impl Drop for SerialReader {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn read_loop<F>(mut port: SerialPort, buffer_size: usize, mut sink: F, shutdown: &AtomicBool) -> ReaderExit
where
    F: FnMut(&[u8]),
{
    let mut buffer = vec![0u8; buffer_size];
    debug!("Reader started on {}", port.name().unwrap_or("closed port"));

    while !shutdown.load(Ordering::SeqCst) {
        match port.read(&mut buffer) {
            Ok(transfer) if !transfer.is_empty() => sink(&buffer[..transfer.len()]),
            Ok(_) => {}
            Err(e) => {
                warn!("Reader stopped after read failure: {}", e);
                return ReaderExit {
                    port,
                    error: Some(e),
                };
            }
        }
    }

    debug!("Reader shut down");
    ReaderExit { port, error: None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::MockRegistry;
    use parking_lot::Mutex;
    use std::time::{Duration, Instant};

    #[test]
    fn test_reader_collects_and_stops() {
        let registry = Arc::new(MockRegistry::new());
        let (left, _right) = registry.register_pair("A", "B");
        let mut port = SerialPort::with_connector(registry.clone());
        port.open("A").unwrap();

        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = received.clone();
        let reader = SerialReader::spawn(port, 16, move |chunk| sink.lock().extend_from_slice(chunk)).unwrap();
        assert!(reader.is_running());

        left.inject(b"hello");
        let deadline = Instant::now() + Duration::from_secs(2);
        while received.lock().len() < 5 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }

        let port = reader.stop().unwrap();
        assert!(port.is_open());
        assert_eq!(received.lock().as_slice(), b"hello");
    }

    #[test]
    fn test_spawn_requires_open_port() {
        let result = SerialReader::spawn(SerialPort::new(), 16, |_| {});
        assert!(matches!(result, Err(PortError::NotOpen)));
    }
}
