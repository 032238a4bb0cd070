//! Cape manager overlay loader.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::OverlayLoader;
use crate::error::{HostError, HostResult};

/// Loads overlays by writing their id to the cape manager `slots` file.
#[derive(Debug, Clone)]
pub struct CapeManager {
    slots_path: PathBuf,
}

impl CapeManager {
    /// Loader using the `slots` file at `slots_path`.
    pub fn new(slots_path: impl Into<PathBuf>) -> Self {
        Self {
            slots_path: slots_path.into(),
        }
    }

    /// Path of the `slots` file.
    pub fn slots_path(&self) -> &Path {
        &self.slots_path
    }

    /// `true` if some slot line mentions `overlay`.
    pub fn is_loaded(&self, overlay: &str) -> HostResult<bool> {
        let slots = fs::read_to_string(&self.slots_path).map_err(|e| HostError::Overlay {
            overlay: overlay.to_string(),
            reason: format!("cannot read {}: {e}", self.slots_path.display()),
        })?;
        Ok(slots.lines().any(|line| line.contains(overlay)))
    }
}

impl OverlayLoader for CapeManager {
    fn ensure_overlay_loaded(&self, overlay: &str) -> HostResult<()> {
        if self.is_loaded(overlay)? {
            debug!(overlay, "Overlay already loaded");
            return Ok(());
        }
        fs::write(&self.slots_path, overlay).map_err(|e| HostError::Overlay {
            overlay: overlay.to_string(),
            reason: format!("cannot write {}: {e}", self.slots_path.display()),
        })?;
        info!(overlay, slots = %self.slots_path.display(), "Overlay loaded");
        Ok(())
    }
}
