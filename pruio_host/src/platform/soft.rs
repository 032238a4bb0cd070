//! In-process RTU.
//!
//! Runs the sampling loop on a dedicated thread against any register
//! windows, standing in for PRU0 on the simulated board. Firmware images
//! are not used; "loading" attaches a fresh `Sampler` to the shared region
//! and "stopping" raises its halt flag and joins the thread.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use pruio_common::error::ShmResult;
use pruio_common::mmio::RegisterWindow;
use pruio_common::shm::region::SharedRegion;
use pruio_rtu::{Peripherals, Sampler, SamplerStats};
use tracing::{debug, error, info};

use super::RtuController;
use crate::error::{HostError, HostResult};

type PeripheralsFactory<W> = Box<dyn Fn() -> ShmResult<Peripherals<W>> + Send>;

/// Sampling loop on a host thread.
pub struct SoftRtu<W> {
    region: Arc<SharedRegion>,
    peripherals: PeripheralsFactory<W>,
    compare_ticks: Option<u32>,
    halt: Arc<AtomicBool>,
    worker: Option<JoinHandle<SamplerStats>>,
    last_stats: Option<SamplerStats>,
}

impl<W: RegisterWindow + 'static> SoftRtu<W> {
    /// RTU sampling `region` through the windows produced by `peripherals`.
    ///
    /// The factory runs once per start.
    pub fn new(
        region: Arc<SharedRegion>,
        peripherals: impl Fn() -> ShmResult<Peripherals<W>> + Send + 'static,
    ) -> Self {
        Self {
            region,
            peripherals: Box::new(peripherals),
            compare_ticks: None,
            halt: Arc::new(AtomicBool::new(false)),
            worker: None,
            last_stats: None,
        }
    }

    /// Override the IEP compare value used by the loop.
    pub fn with_compare_ticks(mut self, ticks: u32) -> Self {
        self.compare_ticks = Some(ticks);
        self
    }

    /// Loop counters of the last completed run.
    pub fn last_stats(&self) -> Option<SamplerStats> {
        self.last_stats
    }
}

impl<W: RegisterWindow + 'static> RtuController for SoftRtu<W> {
    fn name(&self) -> &'static str {
        "soft"
    }

    fn load_and_start(
        &mut self,
        data_image: &Path,
        text_image: &Path,
        entry_address: u32,
    ) -> HostResult<()> {
        if self.worker.is_some() {
            return Err(HostError::FirmwareStart("soft RTU already running".to_string()));
        }
        debug!(
            data = %data_image.display(),
            text = %text_image.display(),
            entry_address,
            "Soft RTU ignores firmware images"
        );

        let hw = (self.peripherals)()
            .map_err(|e| HostError::FirmwareStart(format!("cannot map RTU registers: {e}")))?;
        let mut sampler = Sampler::new(hw, &self.region)
            .map_err(|e| HostError::FirmwareStart(e.to_string()))?;
        if let Some(ticks) = self.compare_ticks {
            sampler = sampler.with_compare_ticks(ticks);
        }

        self.halt.store(false, Ordering::Release);
        let halt = Arc::clone(&self.halt);
        let worker = thread::Builder::new()
            .name("pruio-rtu".to_string())
            .spawn(move || sampler.run(&halt))
            .map_err(|e| HostError::FirmwareStart(format!("cannot spawn RTU thread: {e}")))?;
        self.worker = Some(worker);
        info!("Soft RTU started");
        Ok(())
    }

    fn stop(&mut self) -> HostResult<()> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };
        self.halt.store(true, Ordering::Release);
        match worker.join() {
            Ok(stats) => {
                info!(
                    cycles = stats.cycles,
                    overruns = stats.overruns,
                    messages = stats.messages,
                    dropped = stats.dropped,
                    "Soft RTU stopped"
                );
                self.last_stats = Some(stats);
                Ok(())
            }
            Err(_) => {
                error!("Soft RTU thread panicked");
                Err(HostError::RtuFault("soft RTU thread panicked".to_string()))
            }
        }
    }

    fn is_running(&self) -> bool {
        self.worker.is_some()
    }
}

impl<W> Drop for SoftRtu<W> {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            self.halt.store(true, Ordering::Release);
            let _ = worker.join();
        }
    }
}
