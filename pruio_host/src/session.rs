//! Session bring-up and teardown.
//!
//! Bring-up runs in a fixed order and aborts on the first failure:
//!
//! 1. load the overlay and wait for it to settle
//! 2. map the GPIO registers
//! 3. map the shared RAM and reset its control words
//! 4. attach the host end of the ring buffer
//! 5. start the RTU firmware
//! 6. configure the multiplexer select pins as outputs
//!
//! A failure after the RTU has started halts it again, so no partial
//! session is left behind. Teardown halts the RTU and forgets all
//! configured channels.

use std::thread;

use pruio_common::message::Level;
use pruio_common::mmio::RegisterWindow;
use pruio_common::pins::{Direction, MUX_SELECT_PINS};
use pruio_common::shm::ring::Drain;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::HostResult;
use crate::manager::ChannelManager;
use crate::platform::{Platform, RtuController};

/// Session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// RTU halted, channels forgotten.
    Stopped,
    /// RTU sampling, channels can be configured.
    Running,
}

/// A running host/RTU pairing on one board.
pub struct Session<W> {
    manager: ChannelManager<W>,
    rtu: Box<dyn RtuController>,
    state: SessionState,
}

impl<W: RegisterWindow> Session<W> {
    /// Bring up `platform` as described by `config`.
    ///
    /// # Errors
    /// The first failing step's error: `Overlay`, `RegisterMap`,
    /// `SharedMemory`, `FirmwareStart` or `PinConfig`.
    pub fn start<P>(platform: &P, config: &SessionConfig) -> HostResult<Self>
    where
        P: Platform<Window = W>,
    {
        info!(platform = platform.name(), service = %config.shared.service_name, "Starting session");

        if let Some(loader) = platform.overlay_loader() {
            loader.ensure_overlay_loaded(&config.platform.overlay)?;
            thread::sleep(config.platform.settle());
        }

        let gpio = platform.map_gpio()?;
        debug!("GPIO registers mapped");

        let region = platform.map_shared_memory()?;
        region.reset_control_words();
        let manager = ChannelManager::new(gpio, &region, platform.pinmux_resolver())?;
        debug!("Shared memory attached");

        let mut rtu = platform.rtu_controller(&region)?;
        let firmware = &config.firmware;
        rtu.load_and_start(
            &firmware.data_image,
            &firmware.text_image,
            firmware.entry_address,
        )?;

        let mut session = Self {
            manager,
            rtu,
            state: SessionState::Running,
        };
        if let Err(e) = session.init_default_pins() {
            warn!("Default pin setup failed: {e}");
            if let Err(stop_err) = session.stop() {
                warn!("RTU stop after failed bring-up failed: {stop_err}");
            }
            return Err(e);
        }

        info!(rtu = session.rtu.name(), "Session running");
        Ok(session)
    }

    fn init_default_pins(&mut self) -> HostResult<()> {
        for pin in MUX_SELECT_PINS {
            self.manager.configure_pin(pin, Direction::Output)?;
        }
        Ok(())
    }

    /// Configure `pin`, see [`ChannelManager::configure_pin`].
    pub fn configure_pin(&mut self, pin: u8, direction: Direction) -> HostResult<()> {
        self.manager.configure_pin(pin, direction)
    }

    /// Monitor analog channel `channel`, see [`ChannelManager::register_adc_channel`].
    pub fn register_adc_channel(&mut self, channel: u8) -> HostResult<()> {
        self.manager.register_adc_channel(channel)
    }

    /// Drive output `pin`, see [`ChannelManager::set_output`].
    pub fn set_output(&self, pin: u8, level: Level) -> HostResult<()> {
        self.manager.set_output(pin, level)
    }

    /// Pending messages, see [`ChannelManager::drain_ring_buffer`].
    pub fn drain_ring_buffer(&mut self) -> Drain<'_> {
        self.manager.drain_ring_buffer()
    }

    /// Channel manager of this session.
    pub fn manager(&self) -> &ChannelManager<W> {
        &self.manager
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Halt the RTU and forget configured channels. Idempotent.
    pub fn stop(&mut self) -> HostResult<()> {
        if self.state == SessionState::Stopped {
            return Ok(());
        }
        self.state = SessionState::Stopped;
        let halted = self.rtu.stop();
        self.manager.clear();
        halted?;
        info!("Session stopped");
        Ok(())
    }
}

impl<W> Drop for Session<W> {
    fn drop(&mut self) {
        if self.state == SessionState::Running {
            self.state = SessionState::Stopped;
            if let Err(e) = self.rtu.stop() {
                warn!("RTU stop on drop failed: {e}");
            }
        }
    }
}
