//! Tests requiring actual serial hardware.
//!
//! # Running Hardware Tests
//!
//! ```bash
//! export TEST_PORT=COM3                  # or /dev/ttyUSB0 on Linux
//! export TEST_BAUD=19200                 # optional, default: 9600
//! export TEST_LOOPBACK=1                 # if the port has TX-RX bridged
//! export TEST_PEER_PORT=/dev/pts/5       # optional second endpoint
//!
//! cargo test -- --ignored
//! ```
//!
//! A virtual pair for the peer tests can be created on Linux with
//! `socat -d -d pty,raw,echo=0 pty,raw,echo=0`.

use super::utils::skip_without_hardware;
use std::time::{Duration, Instant};
use tinyserial::{DataBits, Parity, PortError, SerialPort, StopBits, Transfer};

fn read_exactly(port: &mut SerialPort, expected: usize, timeout: Duration) -> Vec<u8> {
    let deadline = Instant::now() + timeout;
    let mut received = Vec::new();
    let mut buffer = [0u8; 64];
    while received.len() < expected && Instant::now() < deadline {
        let transfer = port.read(&mut buffer).expect("read failed");
        received.extend_from_slice(&buffer[..transfer.len()]);
    }
    received
}

#[test]
#[ignore] // Run with --ignored flag
fn test_real_port_open_close() {
    let Some(config) = skip_without_hardware() else {
        return;
    };

    let mut port = SerialPort::new();
    port.open(&config.port_name)
        .unwrap_or_else(|e| panic!("Port open failed: {e} (code {})", port.last_error()));
    assert!(port.is_open());

    let settings = port.line_settings().unwrap();
    assert_eq!(settings.baud_rate, 9600);
    assert_eq!(settings.data_bits, DataBits::Eight);
    assert_eq!(settings.stop_bits, StopBits::One);
    assert_eq!(settings.parity, Parity::None);
    port.print_com_state();

    port.close();
    port.close();
    assert!(!port.is_open());
}

#[test]
#[ignore]
fn test_real_port_is_exclusive() {
    let Some(config) = skip_without_hardware() else {
        return;
    };

    let mut first = SerialPort::new();
    first.open(&config.port_name).unwrap();

    let mut second = SerialPort::new();
    let err = second.open(&config.port_name).unwrap_err();
    println!("Second open failed as expected: {err} (code {})", second.last_error());
    assert!(!second.is_open());
}

#[test]
#[ignore]
fn test_real_port_baud_change() {
    let Some(config) = skip_without_hardware() else {
        return;
    };

    let mut port = SerialPort::new();
    port.open(&config.port_name).unwrap();
    port.set_baud_rate(config.baud_rate).unwrap();
    assert_eq!(port.line_settings().unwrap().baud_rate, config.baud_rate);
}

#[test]
#[ignore]
fn test_real_port_nonexistent() {
    let mut port = SerialPort::new();
    let err = port.open("/dev/tinyserial_does_not_exist").unwrap_err();
    assert!(matches!(err, PortError::NotFound { .. }), "got {err:?}");
    assert!(!port.is_open());
}

#[test]
#[ignore]
fn test_real_port_loopback() {
    let Some(config) = skip_without_hardware() else {
        return;
    };
    if !config.loopback_enabled {
        println!("Skipping loopback test: TEST_LOOPBACK not set");
        return;
    }

    let mut port = SerialPort::new();
    port.open(&config.port_name).unwrap();
    port.set_baud_rate(config.baud_rate).unwrap();

    let transfer = port.write_str("ABC").unwrap();
    assert_eq!(transfer, Transfer::Complete(4));

    let received = read_exactly(&mut port, 4, Duration::from_secs(2));
    assert_eq!(received, b"ABC\0");
}

#[test]
#[ignore]
fn test_real_port_pair_round_trip() {
    let Some(config) = skip_without_hardware() else {
        return;
    };
    let Some(peer_name) = config.peer_name.as_deref() else {
        println!("Skipping pair test: TEST_PEER_PORT not set");
        return;
    };

    let mut sender = SerialPort::new();
    sender.open(&config.port_name).unwrap();
    let mut receiver = SerialPort::new();
    receiver.open(peer_name).unwrap();

    let payload = [0x48, 0x65, 0x6C, 0x6C, 0x6F];
    assert_eq!(sender.write(&payload).unwrap(), Transfer::Complete(5));

    let received = read_exactly(&mut receiver, payload.len(), Duration::from_secs(2));
    assert_eq!(received, payload);
}
