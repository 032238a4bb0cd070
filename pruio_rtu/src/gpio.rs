//! Digital input tracking.
//!
//! Pins are tracked in a slot table indexed by pin id, which makes
//! discovery O(1) and idempotent, plus a roster that keeps the discovery
//! order used when polling.

use heapless::Vec;
use pruio_common::consts::{GPIO_MODULES, MAX_GPIO_CHANNELS};
use pruio_common::message::{Level, Message};
use pruio_common::pins::{bit_of, module_of, pin_id};
use pruio_common::shm::interest::set_bit_positions;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Default)]
struct GpioSlot {
    tracked: bool,
    // `None` until the first poll, so the first level is always reported.
    last: Option<Level>,
}

/// RTU-side state of all monitored digital pins.
#[derive(Debug, Clone)]
pub struct GpioChannels {
    slots: [GpioSlot; MAX_GPIO_CHANNELS],
    roster: Vec<u8, MAX_GPIO_CHANNELS>,
}

impl Default for GpioChannels {
    fn default() -> Self {
        Self::new()
    }
}

impl GpioChannels {
    /// Empty table.
    pub fn new() -> Self {
        Self {
            slots: [GpioSlot::default(); MAX_GPIO_CHANNELS],
            roster: Vec::new(),
        }
    }

    /// Start tracking `pin`. Returns `true` if it was not tracked yet.
    pub fn track(&mut self, pin: u8) -> bool {
        let Some(slot) = self.slots.get_mut(pin as usize) else {
            return false;
        };
        if slot.tracked {
            return false;
        }
        if self.roster.push(pin).is_err() {
            warn!(pin, "GPIO channel table full");
            return false;
        }
        *slot = GpioSlot {
            tracked: true,
            last: None,
        };
        true
    }

    /// Track every pin whose bit is set in the interest word of `module`.
    ///
    /// Returns the number of newly tracked pins.
    pub fn discover(&mut self, module: usize, word: u32) -> usize {
        let mut added = 0;
        for bit in set_bit_positions(word) {
            let pin = pin_id(module, u32::from(bit));
            if self.track(pin) {
                debug!(pin, module, bit, "GPIO channel discovered");
                added += 1;
            }
        }
        added
    }

    /// `true` if `pin` is tracked.
    pub fn is_tracked(&self, pin: u8) -> bool {
        self.slots.get(pin as usize).is_some_and(|slot| slot.tracked)
    }

    /// Tracked pins in discovery order.
    pub fn pins(&self) -> &[u8] {
        &self.roster
    }

    /// Compare every tracked pin against its module's data-in word and
    /// pass a message to `emit` for each level change.
    ///
    /// `datain` is called at most once per module per poll.
    #[inline]
    pub fn poll(&mut self, mut datain: impl FnMut(usize) -> u32, mut emit: impl FnMut(Message)) {
        let mut words: [Option<u32>; GPIO_MODULES] = [None; GPIO_MODULES];
        for &pin in &self.roster {
            let module = module_of(pin);
            let word = *words[module].get_or_insert_with(|| datain(module));
            let level = Level::of_bit(word, bit_of(pin));
            let slot = &mut self.slots[pin as usize];
            if slot.last != Some(level) {
                slot.last = Some(level);
                emit(Message::gpio(pin, level));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poll(channels: &mut GpioChannels, datain: [u32; 4]) -> std::vec::Vec<Message> {
        let mut out = std::vec::Vec::new();
        channels.poll(|module| datain[module], |message| out.push(message));
        out
    }

    #[test]
    fn first_observation_is_always_reported() {
        let mut channels = GpioChannels::new();
        channels.track(11);
        assert_eq!(poll(&mut channels, [0; 4]), vec![Message::gpio(11, Level::Low)]);
        assert!(poll(&mut channels, [0; 4]).is_empty());
    }

    #[test]
    fn changes_are_reported_once() {
        let mut channels = GpioChannels::new();
        channels.track(11);
        poll(&mut channels, [0; 4]);

        let high = [1 << 11, 0, 0, 0];
        assert_eq!(poll(&mut channels, high), vec![Message::gpio(11, Level::High)]);
        assert!(poll(&mut channels, high).is_empty());
        assert_eq!(poll(&mut channels, [0; 4]), vec![Message::gpio(11, Level::Low)]);
    }

    #[test]
    fn discovery_is_idempotent_and_ordered() {
        let mut channels = GpioChannels::new();
        assert_eq!(channels.discover(1, (1 << 28) | (1 << 0)), 2);
        assert_eq!(channels.discover(0, 1 << 30), 1);
        assert_eq!(channels.discover(1, 1 << 28), 0);
        assert_eq!(channels.pins(), &[32, 60, 30]);
        assert!(channels.is_tracked(60));
        assert!(!channels.is_tracked(61));
    }

    #[test]
    fn each_module_is_read_once_per_poll() {
        let mut channels = GpioChannels::new();
        channels.discover(2, 0b111);
        let mut reads = [0usize; 4];
        channels.poll(
            |module| {
                reads[module] += 1;
                0
            },
            |_| {},
        );
        assert_eq!(reads, [0, 0, 1, 0]);
    }

    #[test]
    fn out_of_range_pins_are_ignored() {
        let mut channels = GpioChannels::new();
        assert!(!channels.track(200));
        assert!(channels.pins().is_empty());
    }
}
