//! BeagleBone Black: `/dev/mem` register windows, sysfs pin mux helpers,
//! cape manager overlays and PRU0.
//!
//! With `rtu = "soft"` the sampling loop runs on a host thread against the
//! same `/dev/mem` windows instead of on PRU0.

use std::sync::Arc;

use pruio_common::consts::GPIO_MODULES;
use pruio_common::mmio::MappedWindow;
use pruio_common::shm::region::SharedRegion;
use pruio_rtu::Peripherals;

use super::{
    CapeManager, OverlayLoader, PinmuxResolver, Platform, PrussRtu, RtuController, SoftRtu,
    SysfsPinmux,
};
use crate::config::{PlatformConfig, RtuBackend};
use crate::error::HostResult;
use crate::manager::map_registers;

/// The real board.
pub struct BeagleBone {
    config: PlatformConfig,
    capemgr: CapeManager,
}

impl BeagleBone {
    /// Board described by `config`.
    pub fn new(config: &PlatformConfig) -> Self {
        Self {
            capemgr: CapeManager::new(&config.slots_path),
            config: config.clone(),
        }
    }
}

impl Platform for BeagleBone {
    type Window = MappedWindow;

    fn name(&self) -> &'static str {
        "beaglebone"
    }

    fn overlay_loader(&self) -> Option<&dyn OverlayLoader> {
        Some(&self.capemgr)
    }

    fn map_gpio(&self) -> HostResult<[MappedWindow; GPIO_MODULES]> {
        map_registers(&self.config.memory_device)
    }

    fn map_shared_memory(&self) -> HostResult<Arc<SharedRegion>> {
        Ok(Arc::new(SharedRegion::map(&self.config.memory_device)?))
    }

    fn rtu_controller(&self, region: &Arc<SharedRegion>) -> HostResult<Box<dyn RtuController>> {
        match self.config.rtu {
            RtuBackend::Pru => Ok(Box::new(PrussRtu::map(&self.config.memory_device)?)),
            RtuBackend::Soft => {
                let device = self.config.memory_device.clone();
                Ok(Box::new(SoftRtu::new(Arc::clone(region), move || {
                    Peripherals::map(&device)
                })))
            }
        }
    }

    fn pinmux_resolver(&self) -> Box<dyn PinmuxResolver> {
        Box::new(SysfsPinmux::new(&self.config.devices_root))
    }
}
