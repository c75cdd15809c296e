//! Fixed timeout policy and transfer outcomes.

use std::time::Duration;

/// Bounds applied to every read and write once a port is open.
///
/// Total deadlines scale with the requested byte count:
/// `constant + multiplier * len`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutPolicy {
    /// Maximum gap between two received bytes once data started arriving.
    pub read_interval: Duration,
    pub read_total_constant: Duration,
    pub read_total_multiplier: Duration,
    pub write_total_constant: Duration,
    pub write_total_multiplier: Duration,
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self {
            read_interval: Duration::from_millis(50),
            read_total_constant: Duration::from_millis(50),
            read_total_multiplier: Duration::from_millis(10),
            write_total_constant: Duration::from_millis(50),
            write_total_multiplier: Duration::from_millis(10),
        }
    }
}

impl TimeoutPolicy {
    /// Deadline for reading up to `len` bytes.
    pub fn read_total(&self, len: usize) -> Duration {
        self.read_total_constant + scale(self.read_total_multiplier, len)
    }

    /// Deadline for writing `len` bytes.
    pub fn write_total(&self, len: usize) -> Duration {
        self.write_total_constant + scale(self.write_total_multiplier, len)
    }
}

fn scale(per_byte: Duration, len: usize) -> Duration {
    per_byte.saturating_mul(u32::try_from(len).unwrap_or(u32::MAX))
}

/// Outcome of a read or write that did not hit a hard error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    /// Every requested byte was transferred.
    Complete(usize),
    /// The deadline or the inter-byte interval ended the transfer early.
    Partial(usize),
    /// Nothing was transferred before the deadline.
    TimedOut,
}

impl Transfer {
    pub(crate) fn from_counts(done: usize, requested: usize) -> Self {
        if done == requested {
            Transfer::Complete(done)
        } else if done == 0 {
            Transfer::TimedOut
        } else {
            Transfer::Partial(done)
        }
    }

    /// Number of bytes transferred.
    pub fn len(&self) -> usize {
        match *self {
            Transfer::Complete(n) | Transfer::Partial(n) => n,
            Transfer::TimedOut => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Transfer::Complete(_))
    }
}
