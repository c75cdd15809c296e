//! Tests against real serial devices.
//!
//! - `real_port_tests`: open/close, line settings and loopback traffic on a
//!   real port

pub mod real_port_tests;
pub mod utils;
