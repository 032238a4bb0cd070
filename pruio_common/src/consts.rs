//! System-wide constants for the PRU I/O workspace.
//!
//! Single source of truth for channel counts and default paths.
//! Imported by all crates.

/// Number of GPIO modules on the SoC.
pub const GPIO_MODULES: usize = 4;

/// Pins per GPIO module (one bit per pin in every module register).
pub const PINS_PER_MODULE: usize = 32;

/// Highest number of distinct GPIO pins the RTU can track.
pub const MAX_GPIO_CHANNELS: usize = GPIO_MODULES * PINS_PER_MODULE;

/// Logical analog channels (0–13).
pub const MAX_ADC_CHANNELS: usize = 14;

/// Channels 0–5 are sampled on every iteration and averaged.
pub const FAST_ADC_CHANNELS: usize = 6;

/// Positions of the external analog multiplexer.
pub const MUX_POSITIONS: usize = 8;

/// Largest raw conversion value (12-bit converter).
pub const ADC_MAX_VALUE: u16 = 0x0fff;

/// Default physical memory device used for register mapping.
pub const DEFAULT_MEMORY_DEVICE: &str = "/dev/mem";

/// Default cape manager slots file.
pub const DEFAULT_SLOTS_PATH: &str = "/sys/devices/bone_capemgr.9/slots";

/// Default device tree overlay providing the PRU and pin mux setup.
pub const DEFAULT_OVERLAY: &str = "PRUIO-DTO";

/// Default root searched for `ocp.*` pin mux helpers.
pub const DEFAULT_DEVICES_ROOT: &str = "/sys/devices";

/// Settling delay after an overlay is loaded, in milliseconds.
pub const DEFAULT_SETTLE_MS: u64 = 100;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/pruio/pruio.toml";
