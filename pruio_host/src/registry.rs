//! Pins and analog channels the host has already configured.

use pruio_common::consts::{MAX_ADC_CHANNELS, MAX_GPIO_CHANNELS};
use pruio_common::pins::Direction;

/// Used-pin and used-ADC-channel records of one session.
///
/// Indexed directly by pin id and channel id, so lookups and inserts are
/// O(1). Entries are only added; [`clear`](Self::clear) runs at teardown.
#[derive(Debug, Clone)]
pub struct ChannelRegistry {
    pins: [Option<Direction>; MAX_GPIO_CHANNELS],
    adc: u32,
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelRegistry {
    /// Empty registry.
    pub const fn new() -> Self {
        Self {
            pins: [None; MAX_GPIO_CHANNELS],
            adc: 0,
        }
    }

    /// Direction `pin` was configured with, if any.
    pub fn direction(&self, pin: u8) -> Option<Direction> {
        self.pins.get(pin as usize).copied().flatten()
    }

    /// Record `pin` as configured with `direction`.
    pub fn insert_pin(&mut self, pin: u8, direction: Direction) {
        if let Some(slot) = self.pins.get_mut(pin as usize) {
            *slot = Some(direction);
        }
    }

    /// Configured pins in ascending order.
    pub fn pins(&self) -> impl Iterator<Item = (u8, Direction)> + '_ {
        self.pins
            .iter()
            .enumerate()
            .filter_map(|(pin, direction)| direction.map(|d| (pin as u8, d)))
    }

    /// `true` if analog channel `channel` is registered.
    pub fn has_adc(&self, channel: u8) -> bool {
        (channel as usize) < MAX_ADC_CHANNELS && self.adc & (1 << channel) != 0
    }

    /// Record analog channel `channel`. Returns `false` if it already was.
    pub fn insert_adc(&mut self, channel: u8) -> bool {
        if (channel as usize) >= MAX_ADC_CHANNELS || self.has_adc(channel) {
            return false;
        }
        self.adc |= 1 << channel;
        true
    }

    /// Registered analog channels in ascending order.
    pub fn adc_channels(&self) -> impl Iterator<Item = u8> + '_ {
        (0..MAX_ADC_CHANNELS as u8).filter(|&channel| self.has_adc(channel))
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        *self = Self::new();
    }
}
