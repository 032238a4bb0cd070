//! Host error taxonomy.
//!
//! Session-start failures (`RegisterMap`, `Overlay`, `SharedMemory`,
//! `FirmwareStart`) abort bring-up. Per-channel failures (`PinConfig`,
//! `PinConflict`, `InvalidPin`, `InvalidAdcChannel`) reject one request
//! and leave the session running. `RtuFault` is reported by teardown when
//! the RTU died while running. Ring overflow is not an error.

use pruio_common::config::ConfigError;
use pruio_common::error::ShmError;
use pruio_common::pins::Direction;
use thiserror::Error;

/// Errors raised by the host side.
#[derive(Debug, Error)]
pub enum HostError {
    /// A GPIO register window could not be mapped.
    #[error("Failed to map GPIO registers: {0}")]
    RegisterMap(#[source] ShmError),

    /// The pin configuration path could not be resolved or written.
    #[error("Cannot configure pin {pin}: {reason}")]
    PinConfig {
        /// Pin id
        pin: u8,
        /// What went wrong
        reason: String,
    },

    /// The pin is already configured with the other direction.
    #[error("Pin {pin} already configured as {existing}, cannot reconfigure as {requested}")]
    PinConflict {
        /// Pin id
        pin: u8,
        /// Direction already registered
        existing: Direction,
        /// Direction of the rejected request
        requested: Direction,
    },

    /// The RTU firmware could not be loaded or started.
    #[error("Failed to start RTU firmware: {0}")]
    FirmwareStart(String),

    /// The RTU stopped abnormally.
    #[error("RTU fault: {0}")]
    RtuFault(String),

    /// The device tree overlay could not be loaded.
    #[error("Failed to load overlay {overlay}: {reason}")]
    Overlay {
        /// Overlay id
        overlay: String,
        /// What went wrong
        reason: String,
    },

    /// Pin id outside `0..=127`.
    #[error("Invalid pin {0}")]
    InvalidPin(u8),

    /// Analog channel outside `0..=13`.
    #[error("Invalid ADC channel {0}")]
    InvalidAdcChannel(u8),

    /// Shared RAM could not be mapped or attached.
    #[error("Shared memory error: {0}")]
    SharedMemory(#[from] ShmError),

    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for host operations.
pub type HostResult<T> = Result<T, HostError>;
