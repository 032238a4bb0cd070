//! ADC step mapping and per-channel reporting state.
//!
//! One sweep converts seven steps. Steps 0–4 and 6 are wired to fixed
//! inputs; step 5 reads AIN6, which carries whichever external signal the
//! multiplexer currently selects. Channels 0–5 are therefore converted
//! every iteration ("fast") and channels 6–13 once per rotation ("slow").

use pruio_common::consts::{FAST_ADC_CHANNELS, MAX_ADC_CHANNELS, MUX_POSITIONS};
use pruio_common::message::Message;
use pruio_common::shm::interest::set_bit_positions;
use static_assertions::const_assert_eq;
use tracing::debug;

use crate::mux::MuxPosition;

/// Conversion steps per sweep.
pub const SWEEP_STEPS: usize = 7;

/// Analog input converted by each step (step id = index).
pub const SWEEP_INPUTS: [u32; SWEEP_STEPS] = [0, 1, 2, 3, 4, 6, 5];

/// Step id whose input is the multiplexer output.
pub const MUX_STEP: u8 = 5;

/// Logical channel of the directly wired steps; `None` for the mux step.
pub const STEP_CHANNELS: [Option<u8>; SWEEP_STEPS] =
    [Some(0), Some(1), Some(2), Some(3), Some(4), None, Some(5)];

/// Logical channel behind each multiplexer position.
pub const MUX_CHANNELS: [u8; MUX_POSITIONS] = [13, 6, 7, 8, 9, 10, 11, 12];

/// Bits dropped from fast-channel samples before averaging.
pub const FAST_SAMPLE_SHIFT: u32 = 5;

const_assert_eq!(SWEEP_INPUTS[MUX_STEP as usize], 6);
const_assert_eq!(MUX_CHANNELS.len() + FAST_ADC_CHANNELS, MAX_ADC_CHANNELS);

const WINDOW_FULL: u8 = u8::MAX;

/// Logical channel of a FIFO result tagged with `step_id`.
///
/// `None` for step ids outside the sweep.
#[inline]
pub fn logical_channel(step_id: u8, mux: MuxPosition) -> Option<u8> {
    if step_id == MUX_STEP {
        return Some(MUX_CHANNELS[mux.index()]);
    }
    STEP_CHANNELS.get(step_id as usize).copied().flatten()
}

/// `true` for channels 0–5.
#[inline]
pub const fn is_fast(channel: u8) -> bool {
    (channel as usize) < FAST_ADC_CHANNELS
}

#[derive(Debug, Clone, Copy, Default)]
struct AdcChannel {
    enabled: bool,
    last_reported: Option<u16>,
    window: [u16; MUX_POSITIONS],
    // Bit per mux position holding a sample of the current rotation.
    filled: u8,
}

/// RTU-side state of all logical ADC channels.
#[derive(Debug, Clone)]
pub struct AdcChannels {
    channels: [AdcChannel; MAX_ADC_CHANNELS],
}

impl Default for AdcChannels {
    fn default() -> Self {
        Self::new()
    }
}

impl AdcChannels {
    /// All channels disabled with nothing reported yet.
    pub fn new() -> Self {
        Self {
            channels: [AdcChannel::default(); MAX_ADC_CHANNELS],
        }
    }

    /// Start monitoring `channel`. Returns `true` if it was not yet enabled.
    pub fn enable(&mut self, channel: u8) -> bool {
        match self.channels.get_mut(channel as usize) {
            Some(state) if !state.enabled => {
                state.enabled = true;
                true
            }
            _ => false,
        }
    }

    /// Enable every channel whose bit is set in `word`.
    ///
    /// Returns the number of newly enabled channels.
    pub fn discover(&mut self, word: u32) -> usize {
        let mut added = 0;
        for channel in set_bit_positions(word) {
            if self.enable(channel) {
                debug!(channel, fast = is_fast(channel), "ADC channel discovered");
                added += 1;
            }
        }
        added
    }

    /// `true` if `channel` is monitored.
    pub fn is_enabled(&self, channel: u8) -> bool {
        self.channels
            .get(channel as usize)
            .is_some_and(|state| state.enabled)
    }

    /// Last value sent for `channel`.
    pub fn last_reported(&self, channel: u8) -> Option<u16> {
        self.channels
            .get(channel as usize)
            .and_then(|state| state.last_reported)
    }

    /// Feed one raw 12-bit conversion of `channel` taken at `mux`.
    ///
    /// Fast channels keep `raw >> 5` in the slot of the current mux
    /// position and report the 8-sample average when a rotation completes.
    /// Slow channels report the raw value as soon as it differs from the
    /// last one sent.
    #[inline]
    pub fn process(&mut self, channel: u8, raw: u16, mux: MuxPosition) -> Option<Message> {
        let state = self.channels.get_mut(channel as usize)?;
        if !state.enabled {
            return None;
        }

        let value = if is_fast(channel) {
            let position = mux.index();
            state.window[position] = raw >> FAST_SAMPLE_SHIFT;
            state.filled |= 1 << position;
            if !mux.is_last() || state.filled != WINDOW_FULL {
                return None;
            }
            state.filled = 0;
            let sum: u32 = state.window.iter().map(|&v| u32::from(v)).sum();
            (sum >> 3) as u16
        } else {
            raw
        };

        if state.last_reported == Some(value) {
            return None;
        }
        state.last_reported = Some(value);
        Some(Message::adc(channel, value))
    }
}
