//! Header pin names and GPIO numbering.
//!
//! A pin id is `module * 32 + bit`, so module and bit are recovered with
//! a shift and a mask. Only the P9 pins wired for this board are named;
//! any other pin is addressed by number alone.

use crate::consts::{MAX_GPIO_CHANNELS, PINS_PER_MODULE};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pin direction requested by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Tri-stated, monitored by the RTU.
    Input,
    /// Driven by the host.
    Output,
}

impl Direction {
    /// String written to the pin mux `state` file.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// GPIO module holding `pin`.
#[inline]
pub const fn module_of(pin: u8) -> usize {
    (pin as usize) / PINS_PER_MODULE
}

/// Bit of `pin` inside its module registers.
#[inline]
pub const fn bit_of(pin: u8) -> u32 {
    (pin as u32) % PINS_PER_MODULE as u32
}

/// Pin id from module and bit.
#[inline]
pub const fn pin_id(module: usize, bit: u32) -> u8 {
    (module * PINS_PER_MODULE + bit as usize) as u8
}

/// `true` if `pin` belongs to one of the four GPIO modules.
#[inline]
pub const fn is_valid_pin(pin: u8) -> bool {
    (pin as usize) < MAX_GPIO_CHANNELS
}

/// Named P9 header pins and their GPIO numbers.
pub const P9_PINS: [(&str, u8); 19] = [
    ("P9_11", 30),
    ("P9_12", 60),
    ("P9_13", 31),
    ("P9_14", 50),
    ("P9_15", 48),
    ("P9_16", 51),
    ("P9_17", 5),
    ("P9_18", 4),
    ("P9_21", 3),
    ("P9_22", 2),
    ("P9_23", 49),
    ("P9_24", 15),
    ("P9_26", 14),
    ("P9_27", 115),
    ("P9_30", 112),
    ("P9_41A", 20),
    ("P9_41B", 116),
    ("P9_42A", 7),
    ("P9_42B", 114),
];

/// Multiplexer select lines, most significant bit first.
pub const MUX_SELECT_PINS: [u8; 3] = [115, 112, 7];

/// GPIO number of a header pin name.
pub fn gpio_number(name: &str) -> Option<u8> {
    P9_PINS.iter().find(|(n, _)| *n == name).map(|&(_, gpio)| gpio)
}

/// Header pin name of a GPIO number.
pub fn pin_name(gpio: u8) -> Option<&'static str> {
    P9_PINS.iter().find(|&&(_, g)| g == gpio).map(|&(name, _)| name)
}

/// Parse either a header name (`P9_11`) or a raw number (`30`).
pub fn parse_pin(text: &str) -> Option<u8> {
    gpio_number(text).or_else(|| text.parse::<u8>().ok().filter(|&p| is_valid_pin(p)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_and_bit_split() {
        assert_eq!(module_of(115), 3);
        assert_eq!(bit_of(115), 19);
        assert_eq!(module_of(7), 0);
        assert_eq!(bit_of(7), 7);
        assert_eq!(pin_id(3, 16), 112);
    }

    #[test]
    fn names_round_trip() {
        for (name, gpio) in P9_PINS {
            assert_eq!(gpio_number(name), Some(gpio));
            assert_eq!(pin_name(gpio), Some(name));
        }
        assert_eq!(gpio_number("P8_03"), None);
        assert_eq!(pin_name(11), None);
    }

    #[test]
    fn mux_pins_are_named() {
        assert_eq!(pin_name(MUX_SELECT_PINS[0]), Some("P9_27"));
        assert_eq!(pin_name(MUX_SELECT_PINS[1]), Some("P9_30"));
        assert_eq!(pin_name(MUX_SELECT_PINS[2]), Some("P9_42A"));
    }

    #[test]
    fn parse_accepts_names_and_numbers() {
        assert_eq!(parse_pin("P9_12"), Some(60));
        assert_eq!(parse_pin("11"), Some(11));
        assert_eq!(parse_pin("128"), None);
        assert_eq!(parse_pin("bogus"), None);
    }

    #[test]
    fn direction_strings() {
        assert_eq!(Direction::Input.to_string(), "input");
        assert_eq!(Direction::Output.as_str(), "output");
    }
}
