//! Hardware integration test suite.
//!
//! These tests require actual serial hardware and are ignored by default.
//! Run with: cargo test -- --ignored

#[path = "hardware/mod.rs"]
mod hardware;

pub use hardware::*;
