//! PRU0 firmware loader and controller.
//!
//! Loading halts the core, copies the data image into PRU0 data RAM and
//! the text image into PRU0 instruction RAM, then enables the core with
//! the program counter reset value set to the entry point. Stopping
//! clears the enable bit.

use std::fs;
use std::path::Path;

use pruio_common::error::ShmError;
use pruio_common::mmio::{MappedWindow, RegisterWindow, open_memory_device};
use pruio_common::regs::{WindowId, pru};
use tracing::{debug, info};

use super::RtuController;
use crate::error::{HostError, HostResult};

/// Controller for PRU0 of the PRU-ICSS.
pub struct PrussRtu<W> {
    control: W,
    dram: W,
    iram: W,
    running: bool,
}

impl PrussRtu<MappedWindow> {
    /// Map the PRU0 control register and both RAMs through `device`.
    pub fn map(device: &Path) -> HostResult<Self> {
        let region = WindowId::Pru0Ctrl.region();
        let file = open_memory_device(device).map_err(|source| {
            HostError::RegisterMap(ShmError::Map {
                window: WindowId::Pru0Ctrl.name(),
                base: region.base,
                len: region.len,
                source,
            })
        })?;
        let map = |id: WindowId| MappedWindow::map(&file, id).map_err(HostError::RegisterMap);
        Ok(Self::new(
            map(WindowId::Pru0Ctrl)?,
            map(WindowId::Pru0Dram)?,
            map(WindowId::Pru0Iram)?,
        ))
    }
}

impl<W: RegisterWindow> PrussRtu<W> {
    /// Controller over the PRU0 control, data RAM and instruction RAM windows.
    pub fn new(control: W, dram: W, iram: W) -> Self {
        Self {
            control,
            dram,
            iram,
            running: false,
        }
    }

    fn halt(&self) {
        self.control.write(pru::CONTROL, pru::CONTROL_SOFT_RST_N);
    }

    fn load_image(window: &W, path: &Path) -> HostResult<usize> {
        let image = fs::read(path).map_err(|e| {
            HostError::FirmwareStart(format!("cannot read {}: {e}", path.display()))
        })?;
        let capacity = window.id().region().len;
        if image.len() > capacity {
            return Err(HostError::FirmwareStart(format!(
                "{} is {} bytes, {} holds {capacity}",
                path.display(),
                image.len(),
                window.id().name()
            )));
        }
        for (index, chunk) in image.chunks(4).enumerate() {
            let mut word = [0u8; 4];
            word[..chunk.len()].copy_from_slice(chunk);
            window.write(index * 4, u32::from_le_bytes(word));
        }
        Ok(image.len())
    }
}

impl<W: RegisterWindow> RtuController for PrussRtu<W> {
    fn name(&self) -> &'static str {
        "pru0"
    }

    fn load_and_start(
        &mut self,
        data_image: &Path,
        text_image: &Path,
        entry_address: u32,
    ) -> HostResult<()> {
        let iram_len = self.iram.id().region().len;
        if entry_address % 4 != 0 || entry_address as usize >= iram_len {
            return Err(HostError::FirmwareStart(format!(
                "entry address {entry_address:#x} outside instruction RAM"
            )));
        }

        self.halt();
        self.running = false;
        let data_len = Self::load_image(&self.dram, data_image)?;
        let text_len = Self::load_image(&self.iram, text_image)?;
        debug!(data_len, text_len, "PRU0 images loaded");

        // Enabling with soft reset asserted restarts from the reset value.
        let pc = entry_address / 4;
        self.control.write(
            pru::CONTROL,
            (pc << pru::CONTROL_PCTR_RST_VAL_SHIFT) | pru::CONTROL_ENABLE,
        );
        self.running = true;
        info!("PRU0 started at {entry_address:#x}");
        Ok(())
    }

    fn stop(&mut self) -> HostResult<()> {
        if !self.running {
            return Ok(());
        }
        self.halt();
        self.running = false;
        info!("PRU0 halted");
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running
    }
}
