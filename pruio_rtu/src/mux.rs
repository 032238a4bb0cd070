//! Analog multiplexer position.
//!
//! Three GPIO lines select which of eight external signals reaches ADC
//! input AIN6. The position cycles `0..=7` once per loop iteration.

use pruio_common::consts::MUX_POSITIONS;
use pruio_common::pins::{bit_of, module_of, MUX_SELECT_PINS};

/// Current selector position, `0..=7`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MuxPosition(u8);

impl MuxPosition {
    /// Last position of a rotation.
    pub const LAST: Self = Self(MUX_POSITIONS as u8 - 1);

    /// Position `index`, wrapped into `0..=7`.
    pub const fn new(index: u8) -> Self {
        Self(index % MUX_POSITIONS as u8)
    }

    /// Numeric position.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Following position; 7 wraps to 0.
    #[inline]
    pub const fn next(self) -> Self {
        if self.0 >= Self::LAST.0 { Self(0) } else { Self(self.0 + 1) }
    }

    /// `true` at position 7, where a fast-channel rotation completes.
    #[inline]
    pub const fn is_last(self) -> bool {
        self.0 == Self::LAST.0
    }

    /// Select line states, most significant bit first: `(module, bit, high)`.
    pub fn lines(self) -> [SelectLine; 3] {
        std::array::from_fn(|i| {
            let pin = MUX_SELECT_PINS[i];
            SelectLine {
                module: module_of(pin),
                bit: bit_of(pin),
                high: (self.0 >> (2 - i)) & 1 == 1,
            }
        })
    }
}

/// One multiplexer select line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectLine {
    /// GPIO module.
    pub module: usize,
    /// Bit within the module.
    pub bit: u32,
    /// Driven level.
    pub high: bool,
}

impl Default for MuxPosition {
    /// The loop starts at the last position so its first iteration selects 0.
    fn default() -> Self {
        Self::LAST
    }
}
