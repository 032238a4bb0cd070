//! Channel-interest bitmaps.
//!
//! Word `GPIO_INTEREST_WORD + m` holds one bit per pin of GPIO module `m`;
//! `ADC_INTEREST_WORD` holds one bit per logical ADC channel. The host
//! only ever sets bits and the RTU only ever reads them, so a requested
//! channel stays monitored for the rest of the session.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use super::layout::{ADC_INTEREST_MASK, ADC_INTEREST_WORD, GPIO_INTEREST_WORD};
use super::region::Attachment;
use crate::consts::{GPIO_MODULES, MAX_ADC_CHANNELS};
use crate::pins::{bit_of, module_of};

/// Snapshot of all interest words.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InterestSnapshot {
    /// GPIO interest, one word per module.
    pub gpio: [u32; GPIO_MODULES],
    /// ADC interest, one bit per logical channel.
    pub adc: u32,
}

/// Host side: sets interest bits.
pub struct InterestWriter {
    link: Arc<Attachment>,
}

impl InterestWriter {
    pub(crate) fn new(link: Arc<Attachment>) -> Self {
        Self { link }
    }

    /// Request monitoring of GPIO pin `pin` (`module * 32 + bit`).
    ///
    /// Returns `true` if the bit was newly set.
    pub fn request_pin(&mut self, pin: u8) -> bool {
        self.set_bit(GPIO_INTEREST_WORD + module_of(pin), 1 << bit_of(pin))
    }

    /// Request monitoring of logical ADC channel `channel`.
    ///
    /// Returns `true` if the bit was newly set.
    pub fn request_adc(&mut self, channel: u8) -> bool {
        debug_assert!((channel as usize) < MAX_ADC_CHANNELS);
        self.set_bit(ADC_INTEREST_WORD, (1 << channel) & ADC_INTEREST_MASK)
    }

    /// Current interest word of GPIO module `module`.
    pub fn gpio_word(&self, module: usize) -> u32 {
        self.link
            .region()
            .load(GPIO_INTEREST_WORD + module, Ordering::Relaxed)
    }

    /// Current ADC interest word.
    pub fn adc_word(&self) -> u32 {
        self.link.region().load(ADC_INTEREST_WORD, Ordering::Relaxed)
    }

    // Sole writer of these words: a load followed by a store cannot lose
    // a bit.
    fn set_bit(&mut self, index: usize, mask: u32) -> bool {
        let region = self.link.region();
        let word = region.load(index, Ordering::Relaxed);
        if word & mask == mask {
            return false;
        }
        region.store(index, word | mask, Ordering::Release);
        true
    }
}

/// RTU side: reads interest bits.
pub struct InterestReader {
    link: Arc<Attachment>,
}

impl InterestReader {
    pub(crate) fn new(link: Arc<Attachment>) -> Self {
        Self { link }
    }

    /// Interest word of GPIO module `module`.
    #[inline]
    pub fn gpio_word(&self, module: usize) -> u32 {
        self.link
            .region()
            .load(GPIO_INTEREST_WORD + module, Ordering::Acquire)
    }

    /// ADC interest word, masked to the valid channels.
    #[inline]
    pub fn adc_word(&self) -> u32 {
        self.link.region().load(ADC_INTEREST_WORD, Ordering::Acquire) & ADC_INTEREST_MASK
    }

    /// All interest words at once.
    pub fn snapshot(&self) -> InterestSnapshot {
        InterestSnapshot {
            gpio: std::array::from_fn(|module| self.gpio_word(module)),
            adc: self.adc_word(),
        }
    }
}

/// Positions of the set bits of `word`, lowest first.
#[inline]
pub fn set_bit_positions(mut word: u32) -> impl Iterator<Item = u8> {
    std::iter::from_fn(move || {
        if word == 0 {
            return None;
        }
        let bit = word.trailing_zeros() as u8;
        word &= word - 1;
        Some(bit)
    })
}
