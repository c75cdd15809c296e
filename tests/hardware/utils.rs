//! Environment-driven helpers for hardware tests.

#![allow(dead_code)]

use std::env;

/// Test port configuration from environment.
pub struct TestPortConfig {
    /// Port under test (`TEST_PORT`)
    pub port_name: String,
    /// Second endpoint wired to the first (`TEST_PEER_PORT`), e.g. the
    /// other half of a `socat` pty pair or a null-modem cable
    pub peer_name: Option<String>,
    /// Baud rate to switch to after opening (`TEST_BAUD`)
    pub baud_rate: u32,
    /// TX and RX of `port_name` are bridged (`TEST_LOOPBACK=1`)
    pub loopback_enabled: bool,
}

impl TestPortConfig {
    /// Get test configuration from environment variables.
    pub fn from_env() -> Option<Self> {
        let port_name = env::var("TEST_PORT").ok()?;
        let peer_name = env::var("TEST_PEER_PORT").ok();
        let baud_rate = env::var("TEST_BAUD")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(9600);
        let loopback_enabled = env::var("TEST_LOOPBACK").ok().as_deref() == Some("1");

        Some(TestPortConfig {
            port_name,
            peer_name,
            baud_rate,
            loopback_enabled,
        })
    }
}

/// Skip test if hardware is not available.
pub fn skip_without_hardware() -> Option<TestPortConfig> {
    let config = TestPortConfig::from_env();
    if config.is_none() {
        println!("Skipping hardware test: TEST_PORT not set");
    }
    config
}
