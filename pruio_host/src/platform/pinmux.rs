//! Pin configuration path resolution.
//!
//! On the board every header pin used by the overlay has a pin mux helper
//! device under `<devices_root>/ocp.*/`, named after the pin
//! (`P9_12_pinmux.22`). Writing `input` or `output` to its `state` file
//! selects the multiplexer mode.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use pruio_common::pins::pin_name;
use tracing::debug;

use super::PinmuxResolver;
use crate::error::{HostError, HostResult};

fn pin_config_error(pin: u8, reason: impl Into<String>) -> HostError {
    HostError::PinConfig {
        pin,
        reason: reason.into(),
    }
}

/// Resolves helpers in the sysfs device tree.
#[derive(Debug, Clone)]
pub struct SysfsPinmux {
    devices_root: PathBuf,
}

impl SysfsPinmux {
    /// Resolver searching `devices_root` (normally `/sys/devices`).
    pub fn new(devices_root: impl Into<PathBuf>) -> Self {
        Self {
            devices_root: devices_root.into(),
        }
    }

    fn ocp_dirs(&self) -> std::io::Result<Vec<PathBuf>> {
        let mut dirs: Vec<PathBuf> = fs::read_dir(&self.devices_root)?
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().contains("ocp."))
            .map(|entry| entry.path())
            .collect();
        dirs.sort();
        Ok(dirs)
    }
}

impl PinmuxResolver for SysfsPinmux {
    fn state_path(&self, pin: u8) -> HostResult<PathBuf> {
        let name = pin_name(pin)
            .ok_or_else(|| pin_config_error(pin, "pin has no header name"))?;
        let ocp_dirs = self.ocp_dirs().map_err(|e| {
            pin_config_error(pin, format!("cannot list {}: {e}", self.devices_root.display()))
        })?;

        for dir in ocp_dirs {
            let Ok(entries) = fs::read_dir(&dir) else {
                continue;
            };
            let mut helpers: Vec<PathBuf> = entries
                .filter_map(Result::ok)
                .filter(|entry| entry.file_name().to_string_lossy().contains(name))
                .map(|entry| entry.path())
                .collect();
            helpers.sort();
            if let Some(helper) = helpers.into_iter().next() {
                let path = helper.join("state");
                debug!(pin, name, path = %path.display(), "Pin mux helper resolved");
                return Ok(path);
            }
        }
        Err(pin_config_error(
            pin,
            format!("no {name} pin mux helper under {}/ocp.*", self.devices_root.display()),
        ))
    }
}

/// Keeps `state` files in a plain directory, one subdirectory per pin.
///
/// Used by the simulated board. Files are created on first use; pins
/// without a header name are filed as `gpio<N>`.
#[derive(Debug, Clone)]
pub struct DirectoryPinmux {
    root: PathBuf,
}

impl DirectoryPinmux {
    /// Resolver rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl PinmuxResolver for DirectoryPinmux {
    fn state_path(&self, pin: u8) -> HostResult<PathBuf> {
        let name = pin_name(pin).map_or_else(|| format!("gpio{pin}"), str::to_string);
        let dir = self.root.join(name);
        fs::create_dir_all(&dir)
            .map_err(|e| pin_config_error(pin, format!("cannot create {}: {e}", dir.display())))?;
        let path = dir.join("state");
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| pin_config_error(pin, format!("cannot create {}: {e}", path.display())))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fake_sysfs() -> TempDir {
        let root = TempDir::new().unwrap();
        let ocp = root.path().join("ocp.3");
        fs::create_dir_all(ocp.join("P9_12_pinmux.22")).unwrap();
        fs::create_dir_all(ocp.join("P9_27_pinmux.31")).unwrap();
        fs::create_dir_all(root.path().join("platform")).unwrap();
        root
    }

    #[test]
    fn sysfs_helper_is_found_by_pin_name() {
        let root = fake_sysfs();
        let resolver = SysfsPinmux::new(root.path());
        assert_eq!(
            resolver.state_path(60).unwrap(),
            root.path().join("ocp.3/P9_12_pinmux.22/state")
        );
        assert_eq!(
            resolver.state_path(115).unwrap(),
            root.path().join("ocp.3/P9_27_pinmux.31/state")
        );
    }

    #[test]
    fn sysfs_missing_helper_is_a_pin_config_error() {
        let root = fake_sysfs();
        let resolver = SysfsPinmux::new(root.path());
        // P9_11
        assert!(matches!(
            resolver.state_path(30),
            Err(HostError::PinConfig { pin: 30, .. })
        ));
        // No header name at all.
        assert!(matches!(
            resolver.state_path(11),
            Err(HostError::PinConfig { pin: 11, .. })
        ));
    }

    #[test]
    fn sysfs_missing_root_is_a_pin_config_error() {
        let resolver = SysfsPinmux::new("/nonexistent/devices");
        assert!(resolver.state_path(60).is_err());
    }

    #[test]
    fn directory_resolver_creates_state_files() {
        let root = TempDir::new().unwrap();
        let resolver = DirectoryPinmux::new(root.path().join("pinmux"));
        let named = resolver.state_path(60).unwrap();
        assert_eq!(named, root.path().join("pinmux/P9_12/state"));
        assert!(named.is_file());

        let unnamed = resolver.state_path(11).unwrap();
        assert_eq!(unnamed, root.path().join("pinmux/gpio11/state"));
        assert!(unnamed.is_file());
    }
}
