//! Session configuration (`pruio.toml`).
//!
//! ```toml
//! [shared]
//! service_name = "pruio"
//! log_level = "info"
//!
//! [firmware]
//! data_image = "/usr/lib/pruio/pruio_data0.bin"
//! text_image = "/usr/lib/pruio/pruio_text0.bin"
//! entry_address = 0
//!
//! [platform]
//! overlay = "PRUIO-DTO"
//! settle_ms = 100
//! rtu = "pru"
//!
//! [simulation]
//! tick_us = 83
//! ```
//!
//! Every section except `[firmware]` paths has defaults matching a stock
//! BeagleBone Black, so an empty file is a valid configuration.

use pruio_common::config::{ConfigError, ConfigLoader, SharedConfig};
use pruio_common::consts::{
    DEFAULT_DEVICES_ROOT, DEFAULT_MEMORY_DEVICE, DEFAULT_OVERLAY, DEFAULT_SETTLE_MS,
    DEFAULT_SLOTS_PATH,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Longest accepted settling delay after loading the overlay.
pub const MAX_SETTLE_MS: u64 = 10_000;

/// Default simulated loop period in microseconds.
pub const DEFAULT_TICK_US: u64 = 83;

/// Complete host configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Common fields.
    #[serde(default)]
    pub shared: SharedConfig,
    /// RTU firmware images.
    #[serde(default)]
    pub firmware: FirmwareConfig,
    /// BeagleBone platform paths.
    #[serde(default)]
    pub platform: PlatformConfig,
    /// Simulated board.
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// RTU firmware images and entry point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirmwareConfig {
    /// Image copied into PRU0 data RAM.
    pub data_image: PathBuf,
    /// Image copied into PRU0 instruction RAM.
    pub text_image: PathBuf,
    /// Byte address in instruction RAM where execution starts.
    #[serde(default)]
    pub entry_address: u32,
}

impl Default for FirmwareConfig {
    fn default() -> Self {
        Self {
            data_image: PathBuf::from("/usr/lib/pruio/pruio_data0.bin"),
            text_image: PathBuf::from("/usr/lib/pruio/pruio_text0.bin"),
            entry_address: 0,
        }
    }
}

/// Paths and delays of the real board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Device tree overlay providing the PRU and pin mux helpers.
    pub overlay: String,
    /// Cape manager slots file.
    pub slots_path: PathBuf,
    /// Delay after loading the overlay, in milliseconds.
    pub settle_ms: u64,
    /// Root searched for `ocp.*` pin mux helpers.
    pub devices_root: PathBuf,
    /// Physical memory device.
    pub memory_device: PathBuf,
    /// What runs the sampling loop.
    pub rtu: RtuBackend,
}

/// Sampling loop backend on the real board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RtuBackend {
    /// Firmware images on PRU0.
    #[default]
    Pru,
    /// Host thread driving the peripherals through `memory_device`.
    Soft,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            overlay: DEFAULT_OVERLAY.to_string(),
            slots_path: PathBuf::from(DEFAULT_SLOTS_PATH),
            settle_ms: DEFAULT_SETTLE_MS,
            devices_root: PathBuf::from(DEFAULT_DEVICES_ROOT),
            memory_device: PathBuf::from(DEFAULT_MEMORY_DEVICE),
            rtu: RtuBackend::Pru,
        }
    }
}

impl PlatformConfig {
    /// Settling delay as a duration.
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// Simulated board settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Loop period of the simulated timer, in microseconds.
    pub tick_us: u64,
    /// Directory holding simulated pin mux `state` files.
    pub pinmux_dir: PathBuf,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_us: DEFAULT_TICK_US,
            pinmux_dir: std::env::temp_dir().join("pruio-pinmux"),
        }
    }
}

impl SimulationConfig {
    /// Loop period as a duration.
    pub fn tick(&self) -> Duration {
        Duration::from_micros(self.tick_us)
    }
}

impl SessionConfig {
    /// Load and validate `path`.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that parse but cannot work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;

        if self.platform.overlay.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "platform.overlay cannot be empty".to_string(),
            ));
        }
        if self.platform.settle_ms > MAX_SETTLE_MS {
            return Err(ConfigError::ValidationError(format!(
                "platform.settle_ms must be <= {MAX_SETTLE_MS}, got {}",
                self.platform.settle_ms
            )));
        }
        if self.firmware.data_image.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "firmware.data_image must be set".to_string(),
            ));
        }
        if self.firmware.text_image.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "firmware.text_image must be set".to_string(),
            ));
        }
        if self.firmware.entry_address % 4 != 0 {
            return Err(ConfigError::ValidationError(format!(
                "firmware.entry_address must be word aligned, got {:#x}",
                self.firmware.entry_address
            )));
        }
        if self.simulation.tick_us == 0 {
            return Err(ConfigError::ValidationError(
                "simulation.tick_us must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn empty_file_uses_defaults() {
        let config = SessionConfig::parse("").unwrap();
        assert_eq!(config, SessionConfig::default());
        assert_eq!(config.platform.overlay, "PRUIO-DTO");
        assert_eq!(config.platform.settle(), Duration::from_millis(100));
        assert_eq!(config.simulation.tick_us, 83);
        assert_eq!(config.platform.rtu, RtuBackend::Pru);
        config.validate().unwrap();
    }

    #[test]
    fn sections_override_defaults() {
        let config = SessionConfig::parse(
            r#"
            [shared]
            service_name = "bench"
            log_level = "debug"

            [firmware]
            data_image = "/opt/fw/data.bin"
            text_image = "/opt/fw/text.bin"
            entry_address = 0x40

            [platform]
            settle_ms = 250
            slots_path = "/tmp/slots"
            rtu = "soft"
            "#,
        )
        .unwrap();
        assert_eq!(config.shared.service_name, "bench");
        assert_eq!(config.firmware.entry_address, 0x40);
        assert_eq!(config.platform.settle_ms, 250);
        assert_eq!(config.platform.slots_path, PathBuf::from("/tmp/slots"));
        assert_eq!(config.platform.rtu, RtuBackend::Soft);
        assert_eq!(config.platform.memory_device, PathBuf::from("/dev/mem"));
    }

    #[test]
    fn long_settle_is_rejected() {
        let mut config = SessionConfig::default();
        config.platform.settle_ms = 20_000;
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn blank_overlay_is_rejected() {
        let mut config = SessionConfig::default();
        config.platform.overlay = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn unaligned_entry_is_rejected() {
        let mut config = SessionConfig::default();
        config.firmware.entry_address = 0x42;
        assert!(config.validate().is_err());
    }

    #[test]
    fn from_file_loads_and_validates() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[simulation]\ntick_us = 0").unwrap();
        assert!(matches!(
            SessionConfig::from_file(file.path()),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = SessionConfig::from_file(Path::new("/nonexistent/pruio.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }
}
