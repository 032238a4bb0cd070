//! Word layout of the PRU shared RAM.
//!
//! ```text
//! word 0 .. 1023   ring buffer slots
//! word 1024        read cursor  (host writes)
//! word 1025        write cursor (RTU writes)
//! word 1026..1029  GPIO interest, modules 0..3 (host writes)
//! word 1030        ADC interest (host writes)
//! ```
//!
//! Cursors run over `[0, 2 * RING_CAPACITY)`; the extra wrap bit tells a
//! full ring from an empty one without a fill counter.

use crate::consts::{GPIO_MODULES, MAX_ADC_CHANNELS};
use crate::regs::WindowId;
use static_assertions::const_assert;

/// Ring buffer slots.
pub const RING_CAPACITY: usize = 1024;

/// Mask applied to a cursor to obtain its slot.
pub const RING_SLOT_MASK: u32 = (RING_CAPACITY - 1) as u32;

/// Cursor wrap mask (`2 * capacity - 1`).
pub const RING_CURSOR_MASK: u32 = (2 * RING_CAPACITY - 1) as u32;

/// Read cursor word.
pub const HEAD_WORD: usize = 1024;

/// Write cursor word.
pub const TAIL_WORD: usize = 1025;

/// First GPIO interest word (module 0).
pub const GPIO_INTEREST_WORD: usize = 1026;

/// ADC interest word.
pub const ADC_INTEREST_WORD: usize = GPIO_INTEREST_WORD + GPIO_MODULES;

/// Words covered by the layout.
pub const LAYOUT_WORDS: usize = ADC_INTEREST_WORD + 1;

/// Words in the PRU shared RAM.
pub const SHARED_RAM_WORDS: usize = WindowId::SharedRam.region().len / 4;

/// Mask of the valid bits in the ADC interest word.
pub const ADC_INTEREST_MASK: u32 = (1 << MAX_ADC_CHANNELS) - 1;

const_assert!(RING_CAPACITY.is_power_of_two());
const_assert!(HEAD_WORD == RING_CAPACITY);
const_assert!(TAIL_WORD == HEAD_WORD + 1);
const_assert!(GPIO_INTEREST_WORD == TAIL_WORD + 1);
const_assert!(ADC_INTEREST_WORD == 1030);
const_assert!(LAYOUT_WORDS <= SHARED_RAM_WORDS);

/// Slot addressed by a cursor value.
#[inline]
pub const fn slot(cursor: u32) -> usize {
    (cursor & RING_SLOT_MASK) as usize
}

/// Cursor value following `cursor`.
#[inline]
pub const fn advance(cursor: u32) -> u32 {
    cursor.wrapping_add(1) & RING_CURSOR_MASK
}

/// `true` when a ring with these cursors holds `RING_CAPACITY` entries.
#[inline]
pub const fn is_full(head: u32, tail: u32) -> bool {
    tail == head ^ RING_CAPACITY as u32
}

/// Number of entries between the cursors.
#[inline]
pub const fn occupancy(head: u32, tail: u32) -> usize {
    (tail.wrapping_sub(head) & RING_CURSOR_MASK) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_wraps_at_twice_capacity() {
        assert_eq!(advance(2046), 2047);
        assert_eq!(advance(2047), 0);
        assert_eq!(slot(1024), 0);
        assert_eq!(slot(1500), 476);
    }

    #[test]
    fn full_and_empty_are_distinct() {
        assert!(!is_full(0, 0));
        assert_eq!(occupancy(0, 0), 0);
        assert!(is_full(0, 1024));
        assert_eq!(occupancy(0, 1024), RING_CAPACITY);
        assert!(is_full(1500, 476));
        assert_eq!(occupancy(1500, 476), RING_CAPACITY);
        assert_eq!(occupancy(2040, 3), 11);
    }

    #[test]
    fn shared_ram_is_twelve_kib() {
        assert_eq!(SHARED_RAM_WORDS, 3072);
        assert_eq!(ADC_INTEREST_MASK, 0x3fff);
    }
}
