//! # pruio
//!
//! Starts a PRU I/O session, registers the requested channels and prints
//! every message the RTU produces as one JSON line on stdout. Logs go to
//! stderr.
//!
//! # Usage
//!
//! ```bash
//! # Simulated board, one input, one output, analog channel 0
//! pruio --simulate --pin P9_12 --pin P9_14:out --adc 0
//!
//! # Real board with a config file, locked memory, JSON logs
//! pruio --config /etc/pruio/pruio.toml --pin P9_11:in --lock-memory --json
//! ```

#![deny(warnings)]

use clap::Parser;
use pruio_common::config::{ConfigLoader, LogLevel};
use pruio_common::consts::DEFAULT_CONFIG_PATH;
use pruio_common::mmio::RegisterWindow;
use pruio_common::pins::{Direction, parse_pin};
use pruio_host::config::SessionConfig;
use pruio_host::platform::{BeagleBone, Platform, Simulation};
use pruio_host::session::Session;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

/// PRU I/O - GPIO and ADC sampling through the BeagleBone PRU
#[derive(Parser, Debug)]
#[command(name = "pruio")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Sample GPIO and ADC channels through the PRU real-time unit")]
#[command(long_about = None)]
struct Args {
    /// Session configuration file (defaults to /etc/pruio/pruio.toml if present)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Use the simulated board instead of the hardware
    #[arg(short = 's', long)]
    simulate: bool,

    /// Pin to configure, NAME or NUMBER with optional :in or :out (repeatable)
    #[arg(short, long = "pin", value_name = "PIN[:in|:out]", value_parser = parse_pin_arg, action = clap::ArgAction::Append)]
    pins: Vec<(u8, Direction)>,

    /// Analog channel to monitor, 0-13 (repeatable)
    #[arg(short, long = "adc", value_name = "N", action = clap::ArgAction::Append)]
    adc: Vec<u8>,

    /// Ring buffer poll interval in microseconds
    #[arg(long, default_value_t = 1000)]
    poll_us: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,

    /// Lock all current and future pages in memory
    #[arg(long)]
    lock_memory: bool,
}

fn parse_pin_arg(arg: &str) -> Result<(u8, Direction), String> {
    let (name, direction) = match arg.rsplit_once(':') {
        Some((name, "in")) => (name, Direction::Input),
        Some((name, "out")) => (name, Direction::Output),
        Some((_, other)) => return Err(format!("unknown direction '{other}', use in or out")),
        None => (arg, Direction::Input),
    };
    let pin = parse_pin(name).ok_or_else(|| format!("unknown pin '{name}'"))?;
    Ok((pin, direction))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = run() {
        error!("pruio failed: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref());

    // Tracing must be up before a config error is returned.
    let log_level = config
        .as_ref()
        .map(|config| config.shared.log_level)
        .unwrap_or_default();
    setup_tracing(&args, log_level);
    let config = config?;

    info!("pruio v{} starting...", env!("CARGO_PKG_VERSION"));

    if args.lock_memory {
        lock_memory()?;
    }

    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        flag.store(false, Ordering::SeqCst);
    })?;

    if args.simulate {
        info!("Simulation mode enabled");
        let platform = Simulation::new(&config.simulation);
        serve(&platform, &config, &args, &running)
    } else {
        if !nix::unistd::Uid::effective().is_root() {
            warn!("Not running as root; /dev/mem and sysfs access will likely fail");
        }
        let platform = BeagleBone::new(&config.platform);
        serve(&platform, &config, &args, &running)
    }
}

/// Run one session until `running` is cleared.
fn serve<P: Platform>(
    platform: &P,
    config: &SessionConfig,
    args: &Args,
    running: &AtomicBool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::start(platform, config)?;
    register_channels(&mut session, args);

    let poll = Duration::from_micros(args.poll_us.max(1));
    let mut total: u64 = 0;
    while running.load(Ordering::SeqCst) {
        for message in session.drain_ring_buffer() {
            println!("{}", serde_json::to_string(&message)?);
            total += 1;
        }
        std::thread::sleep(poll);
    }

    session.stop()?;
    info!(messages = total, "pruio shutdown complete");
    Ok(())
}

/// Configure every requested channel; a rejected channel is logged and skipped.
fn register_channels<W: RegisterWindow>(session: &mut Session<W>, args: &Args) {
    for &(pin, direction) in &args.pins {
        if let Err(e) = session.configure_pin(pin, direction) {
            warn!("Skipping pin {pin}: {e}");
        }
    }
    for &channel in &args.adc {
        if let Err(e) = session.register_adc_channel(channel) {
            warn!("Skipping ADC channel {channel}: {e}");
        }
    }
}

/// Explicit file, else the default file if present, else built-in defaults.
fn load_config(path: Option<&Path>) -> Result<SessionConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => SessionConfig::load(path)?,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            SessionConfig::load(Path::new(DEFAULT_CONFIG_PATH))?
        }
        None => SessionConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn lock_memory() -> Result<(), Box<dyn std::error::Error>> {
    use nix::sys::mman::{MlockAllFlags, mlockall};
    mlockall(MlockAllFlags::MCL_CURRENT | MlockAllFlags::MCL_FUTURE)
        .map_err(|e| format!("mlockall failed: {e}"))?;
    info!("Memory locked");
    Ok(())
}

/// Setup tracing subscriber based on CLI arguments and `[shared]` log level.
fn setup_tracing(args: &Args, log_level: LogLevel) {
    let filter = if args.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(log_level.as_directive()))
    };

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}
