//! Host channel and register manager.
//!
//! [`ChannelManager`] owns the host's view of the board: the four GPIO
//! register windows, the host end of the shared RAM and the registry of
//! configured channels.
//!
//! - Inputs are requested through the interest bitmaps and reported by the
//!   RTU through the ring buffer.
//! - Outputs bypass the RTU: [`set_output`](ChannelManager::set_output)
//!   writes the GPIO set/clear registers directly.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use pruio_common::consts::{GPIO_MODULES, MAX_ADC_CHANNELS};
use pruio_common::message::Level;
use pruio_common::mmio::{MappedWindow, RegisterWindow, map_gpio_windows};
use pruio_common::pins::{Direction, bit_of, is_valid_pin, module_of};
use pruio_common::regs::gpio;
use pruio_common::shm::attach_host;
use pruio_common::shm::interest::InterestWriter;
use pruio_common::shm::region::SharedRegion;
use pruio_common::shm::ring::{Drain, RingConsumer};
use tracing::{debug, info};

use crate::error::{HostError, HostResult};
use crate::platform::PinmuxResolver;
use crate::registry::ChannelRegistry;

/// Map the four GPIO register windows through `device`.
///
/// # Errors
/// `RegisterMap` if any window cannot be mapped.
pub fn map_registers(device: &Path) -> HostResult<[MappedWindow; GPIO_MODULES]> {
    let windows = map_gpio_windows(device).map_err(HostError::RegisterMap)?;
    debug!(device = %device.display(), "GPIO registers mapped");
    Ok(windows)
}

/// Host-side channel state of one session.
pub struct ChannelManager<W> {
    gpio: [W; GPIO_MODULES],
    consumer: RingConsumer,
    interest: InterestWriter,
    pinmux: Box<dyn PinmuxResolver>,
    registry: ChannelRegistry,
}

impl<W: RegisterWindow> ChannelManager<W> {
    /// Attach to `region` as its host.
    ///
    /// # Errors
    /// `SharedMemory` if another host end is attached.
    pub fn new(
        gpio: [W; GPIO_MODULES],
        region: &Arc<SharedRegion>,
        pinmux: Box<dyn PinmuxResolver>,
    ) -> HostResult<Self> {
        let (consumer, interest) = attach_host(region)?;
        Ok(Self {
            gpio,
            consumer,
            interest,
            pinmux,
            registry: ChannelRegistry::new(),
        })
    }

    /// Configure `pin` for `direction`.
    ///
    /// Repeating a configuration is a no-op. Inputs are handed to the RTU
    /// for monitoring; outputs get their driver enabled.
    ///
    /// # Errors
    /// - `InvalidPin` for ids above 127.
    /// - `PinConflict` if `pin` is already configured the other way; the
    ///   earlier configuration stays in place.
    /// - `PinConfig` if the pin mux `state` file cannot be resolved or written.
    pub fn configure_pin(&mut self, pin: u8, direction: Direction) -> HostResult<()> {
        if !is_valid_pin(pin) {
            return Err(HostError::InvalidPin(pin));
        }
        match self.registry.direction(pin) {
            Some(existing) if existing == direction => {
                debug!(pin, %direction, "Pin already configured");
                return Ok(());
            }
            Some(existing) => {
                return Err(HostError::PinConflict {
                    pin,
                    existing,
                    requested: direction,
                });
            }
            None => {}
        }

        let path = self.pinmux.state_path(pin)?;
        write_state(&path, direction).map_err(|e| HostError::PinConfig {
            pin,
            reason: format!("cannot write {}: {e}", path.display()),
        })?;

        let window = &self.gpio[module_of(pin)];
        let mask = 1 << bit_of(pin);
        match direction {
            Direction::Output => window.clear_bits(gpio::OE, mask),
            Direction::Input => {
                window.set_bits(gpio::OE, mask);
                self.interest.request_pin(pin);
            }
        }
        self.registry.insert_pin(pin, direction);
        info!(pin, %direction, "Pin configured");
        Ok(())
    }

    /// Ask the RTU to monitor analog channel `channel`. Idempotent.
    ///
    /// # Errors
    /// `InvalidAdcChannel` for channels above 13.
    pub fn register_adc_channel(&mut self, channel: u8) -> HostResult<()> {
        if channel as usize >= MAX_ADC_CHANNELS {
            return Err(HostError::InvalidAdcChannel(channel));
        }
        if self.registry.insert_adc(channel) {
            self.interest.request_adc(channel);
            info!(channel, "ADC channel registered");
        }
        Ok(())
    }

    /// Drive `pin` to `level`.
    ///
    /// Writes the set/clear alias of the data-out register, so bits driven
    /// by the RTU in the same module are never overwritten.
    ///
    /// # Errors
    /// `InvalidPin` for ids above 127.
    #[inline]
    pub fn set_output(&self, pin: u8, level: Level) -> HostResult<()> {
        if !is_valid_pin(pin) {
            return Err(HostError::InvalidPin(pin));
        }
        let register = if level.is_high() {
            gpio::SETDATAOUT
        } else {
            gpio::CLEARDATAOUT
        };
        self.gpio[module_of(pin)].write(register, 1 << bit_of(pin));
        Ok(())
    }

    /// Every message waiting in the ring buffer right now, oldest first.
    ///
    /// Never blocks. Messages arriving while the iterator is consumed are
    /// left for the next call.
    pub fn drain_ring_buffer(&mut self) -> Drain<'_> {
        self.consumer.drain()
    }

    /// Configured channels.
    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    /// Forget all configured channels. Hardware state is left as is.
    pub fn clear(&mut self) {
        self.registry.clear();
    }
}

fn write_state(path: &Path, direction: Direction) -> std::io::Result<()> {
    let mut file = OpenOptions::new().write(true).truncate(true).open(path)?;
    writeln!(file, "{direction}")
}
