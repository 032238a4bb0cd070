//! Collaborators the session depends on, and the boards that provide them.
//!
//! # Module Structure
//!
//! - [`capemgr`] - Device tree overlay loading through the cape manager
//! - [`pinmux`] - Pin configuration `state` file resolution
//! - [`pruss`] - PRU0 firmware loader and controller
//! - [`soft`] - In-process RTU running the sampling loop on a thread
//! - [`beaglebone`] - Real board: `/dev/mem`, sysfs, PRU0
//! - [`simulation`] - Simulated board for development and tests

pub mod beaglebone;
pub mod capemgr;
pub mod pinmux;
pub mod pruss;
pub mod simulation;
pub mod soft;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use pruio_common::consts::GPIO_MODULES;
use pruio_common::mmio::RegisterWindow;
use pruio_common::shm::region::SharedRegion;

use crate::error::HostResult;

pub use beaglebone::BeagleBone;
pub use capemgr::CapeManager;
pub use pinmux::{DirectoryPinmux, SysfsPinmux};
pub use pruss::PrussRtu;
pub use simulation::Simulation;
pub use soft::SoftRtu;

/// One-shot platform bring-up.
pub trait OverlayLoader: Send {
    /// Make sure `overlay` is active. Loading an active overlay is a no-op.
    fn ensure_overlay_loaded(&self, overlay: &str) -> HostResult<()>;
}

/// Maps a pin to the file selecting its multiplexer function.
pub trait PinmuxResolver: Send {
    /// Path of the `state` file of `pin`. Errors with `PinConfig`.
    fn state_path(&self, pin: u8) -> HostResult<PathBuf>;
}

/// Loads, starts and stops the RTU.
pub trait RtuController: Send {
    /// Backend name for logs.
    fn name(&self) -> &'static str;

    /// Load both images and start execution at `entry_address`.
    fn load_and_start(
        &mut self,
        data_image: &Path,
        text_image: &Path,
        entry_address: u32,
    ) -> HostResult<()>;

    /// Halt the RTU. Stopping a stopped RTU is a no-op.
    fn stop(&mut self) -> HostResult<()>;

    /// `true` between a successful start and the next stop.
    fn is_running(&self) -> bool;
}

/// Everything a session needs from a board.
pub trait Platform {
    /// Register window type of this board.
    type Window: RegisterWindow + 'static;

    /// Name for logs.
    fn name(&self) -> &'static str;

    /// Overlay loader, or `None` if the board needs no overlay.
    fn overlay_loader(&self) -> Option<&dyn OverlayLoader>;

    /// Map the four GPIO windows. Errors with `RegisterMap`.
    fn map_gpio(&self) -> HostResult<[Self::Window; GPIO_MODULES]>;

    /// Map or allocate the shared RAM.
    fn map_shared_memory(&self) -> HostResult<Arc<SharedRegion>>;

    /// Controller for the RTU that will run against `region`.
    fn rtu_controller(&self, region: &Arc<SharedRegion>) -> HostResult<Box<dyn RtuController>>;

    /// Pin configuration path resolver.
    fn pinmux_resolver(&self) -> Box<dyn PinmuxResolver>;
}
