//! Simulated board: [`SimBoard`] registers, an in-process RTU and pin mux
//! files in a plain directory. No overlay is needed.

use std::path::PathBuf;
use std::sync::Arc;

use pruio_common::consts::GPIO_MODULES;
use pruio_common::shm::region::SharedRegion;
use pruio_rtu::{SimBoard, SimWindow};

use super::{DirectoryPinmux, OverlayLoader, PinmuxResolver, Platform, RtuController, SoftRtu};
use crate::config::SimulationConfig;
use crate::error::HostResult;

/// Simulated board.
pub struct Simulation {
    board: SimBoard,
    pinmux_dir: PathBuf,
}

impl Simulation {
    /// Board paced by `config.tick_us`, pin mux files under `config.pinmux_dir`.
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            board: SimBoard::with_period(config.tick()),
            pinmux_dir: config.pinmux_dir.clone(),
        }
    }

    /// Handle to the simulated hardware, for driving inputs.
    pub fn board(&self) -> &SimBoard {
        &self.board
    }
}

impl Platform for Simulation {
    type Window = SimWindow;

    fn name(&self) -> &'static str {
        "simulation"
    }

    fn overlay_loader(&self) -> Option<&dyn OverlayLoader> {
        None
    }

    fn map_gpio(&self) -> HostResult<[SimWindow; GPIO_MODULES]> {
        Ok(self.board.gpio_windows())
    }

    fn map_shared_memory(&self) -> HostResult<Arc<SharedRegion>> {
        Ok(Arc::new(SharedRegion::allocate()))
    }

    fn rtu_controller(&self, region: &Arc<SharedRegion>) -> HostResult<Box<dyn RtuController>> {
        let board = self.board.clone();
        Ok(Box::new(SoftRtu::new(Arc::clone(region), move || {
            Ok(board.peripherals())
        })))
    }

    fn pinmux_resolver(&self) -> Box<dyn PinmuxResolver> {
        Box::new(DirectoryPinmux::new(&self.pinmux_dir))
    }
}
