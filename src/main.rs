use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use tinyserial::config::{Config, ConfigLoader};
use tinyserial::port::available_port_names;
use tinyserial::{AppResult, SerialPort, SerialReader};
use tracing::{info, warn};

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Open one serial port, print its state and exchange numbered messages with it.",
    long_about = "Opens the port at 9600-8-N-1, switches to the requested baud rate, prints the com state, then writes \"Hello World <n>\" messages while a background reader prints everything received."
)]
struct Args {
    /// Configuration file (defaults to the standard search path)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to open, e.g. COM5 or /dev/ttyUSB0
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate to switch to after opening
    #[arg(short, long)]
    baud: Option<u32>,

    /// Number of messages to write
    #[arg(short = 'n', long)]
    count: Option<u64>,

    /// Pause between messages in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Reader buffer size in bytes
    #[arg(long)]
    buffer_size: Option<usize>,

    /// How long to keep reading replies after the last message
    #[arg(long)]
    drain_ms: Option<u64>,

    /// List the serial ports present on this system and exit
    #[arg(short, long)]
    list: bool,
}

impl Args {
    fn load_config(&self) -> AppResult<Config> {
        let mut config = match &self.config {
            Some(path) => ConfigLoader::load_from(path)?.into_config(),
            None => ConfigLoader::load()?.into_config(),
        };

        if let Some(port) = &self.port {
            config.serial.port = port.clone();
        }
        if let Some(baud) = self.baud {
            config.serial.baud_rate = baud;
        }
        if let Some(count) = self.count {
            config.demo.count = count;
        }
        if let Some(interval_ms) = self.interval_ms {
            config.demo.interval_ms = interval_ms;
        }
        if let Some(buffer_size) = self.buffer_size {
            config.demo.buffer_size = buffer_size;
        }
        if let Some(drain_ms) = self.drain_ms {
            config.demo.drain_ms = drain_ms;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match args.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = tinyserial::logging::init(&config.logging) {
        eprintln!("{e}");
    }

    let result = if args.list { list_ports() } else { run(&config) };
    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn list_ports() -> AppResult<ExitCode> {
    let names = available_port_names()?;
    if names.is_empty() {
        println!("No serial ports detected on this system");
    }
    for name in names {
        println!("{name}");
    }
    Ok(ExitCode::SUCCESS)
}

/// Switch to `requested`, staying at the current rate if the device refuses.
/// Returns the rate actually in effect.
fn switch_baud_rate(port: &mut SerialPort, requested: u32) -> AppResult<u32> {
    if let Err(e) = port.set_baud_rate(requested) {
        warn!("Continuing without switching to {} baud: {}", requested, e);
    }
    Ok(port.line_settings()?.baud_rate)
}

fn run(config: &Config) -> AppResult<ExitCode> {
    let mut port = SerialPort::new();
    if let Err(e) = port.open(&config.serial.port) {
        warn!("Could not open {}: {}", config.serial.port, e);
        println!("{}", port.last_error());
        return Ok(ExitCode::FAILURE);
    }

    let baud_rate = switch_baud_rate(&mut port, config.serial.baud_rate)?;
    info!("Running at {} baud", baud_rate);
    port.print_com_state();
    thread::sleep(config.serial.settle());

    let reader = SerialReader::spawn(port.try_clone()?, config.demo.buffer_size, |chunk| {
        let text = String::from_utf8_lossy(chunk);
        println!("Bytes read: {} {}", chunk.len(), text.trim_end_matches('\0'));
    })?;

    for i in 0..config.demo.count {
        let message = format!("Hello World {i}");
        let transfer = port.write_str(&message)?;
        if !transfer.is_complete() {
            warn!("Short write of message {}: {:?}", i, transfer);
        }
        thread::sleep(config.demo.interval());
    }
    info!("Sent {} messages", config.demo.count);

    thread::sleep(config.demo.drain());
    let reader_port = reader.stop()?;
    drop(reader_port);
    port.close();

    Ok(ExitCode::SUCCESS)
}
