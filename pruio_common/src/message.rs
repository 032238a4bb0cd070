//! RTU → host message codec.
//!
//! Every ring buffer slot carries one 32-bit word, tagged by bit 31:
//!
//! ```text
//! GPIO  0rrr rrrr rrrr rrrr rrrr rrrL PPPP PPPP   P = pin id, L = level
//! ADC   1rrr rrrr rrrr rrrr VVVV VVVV VVVV CCCC   C = channel, V = value
//! ```
//!
//! `r` bits are reserved and written as zero. Decoding is permissive: the
//! reserved bits are ignored rather than rejected. The encoders do not
//! mask their inputs; values wider than the documented fields are a
//! producer bug and are caught by debug assertions only.
//!
//! [`Message::encode`] and [`Message::decode`] are the only places where
//! the tag bit is touched.

use serde::Serialize;

/// Tag bit distinguishing ADC samples from GPIO changes.
const ADC_TAG: u32 = 1 << 31;

const GPIO_PIN_MASK: u32 = 0xff;
const GPIO_LEVEL_SHIFT: u32 = 8;
const ADC_CHANNEL_MASK: u32 = 0x0f;
const ADC_VALUE_SHIFT: u32 = 4;
const ADC_VALUE_MASK: u32 = 0x0fff;

/// Digital pin level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Logic 0.
    Low = 0,
    /// Logic 1.
    High = 1,
}

impl Level {
    /// Level of `bit` within `word`.
    #[inline]
    pub const fn of_bit(word: u32, bit: u32) -> Self {
        if (word >> bit) & 1 == 1 { Self::High } else { Self::Low }
    }

    /// `true` for [`Level::High`].
    #[inline]
    pub const fn is_high(self) -> bool {
        matches!(self, Self::High)
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high { Self::High } else { Self::Low }
    }
}

/// One event carried through the ring buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Message {
    /// A monitored digital pin changed level.
    Gpio {
        /// Pin id (`module * 32 + bit`).
        pin: u8,
        /// New level.
        level: Level,
    },
    /// A monitored analog channel reported a new value.
    Adc {
        /// Logical channel (0–13 in practice, 4-bit field).
        channel: u8,
        /// Sample value (12-bit field).
        value: u16,
    },
}

impl Message {
    /// GPIO change message.
    #[inline]
    pub const fn gpio(pin: u8, level: Level) -> Self {
        Self::Gpio { pin, level }
    }

    /// ADC sample message.
    #[inline]
    pub const fn adc(channel: u8, value: u16) -> Self {
        Self::Adc { channel, value }
    }

    /// Pack into the 32-bit wire representation.
    #[inline]
    pub fn encode(self) -> u32 {
        match self {
            Self::Gpio { pin, level } => encode_gpio(pin, level),
            Self::Adc { channel, value } => encode_adc(channel, value),
        }
    }

    /// Unpack a wire word. Reserved bits are ignored.
    #[inline]
    pub const fn decode(word: u32) -> Self {
        if word & ADC_TAG != 0 {
            Self::Adc {
                channel: (word & ADC_CHANNEL_MASK) as u8,
                value: ((word >> ADC_VALUE_SHIFT) & ADC_VALUE_MASK) as u16,
            }
        } else {
            Self::Gpio {
                pin: (word & GPIO_PIN_MASK) as u8,
                level: Level::of_bit(word, GPIO_LEVEL_SHIFT),
            }
        }
    }
}

/// Encode a GPIO change. Bit 31 is always clear.
#[inline]
pub fn encode_gpio(pin: u8, level: Level) -> u32 {
    ((level as u32) << GPIO_LEVEL_SHIFT) | pin as u32
}

/// Encode an ADC sample. Bit 31 is always set.
#[inline]
pub fn encode_adc(channel: u8, value: u16) -> u32 {
    debug_assert!((channel as u32) <= ADC_CHANNEL_MASK, "ADC channel {channel} exceeds 4 bits");
    debug_assert!((value as u32) <= ADC_VALUE_MASK, "ADC value {value} exceeds 12 bits");
    ADC_TAG | ((value as u32) << ADC_VALUE_SHIFT) | channel as u32
}

/// Decode a wire word; alias of [`Message::decode`].
#[inline]
pub const fn decode(word: u32) -> Message {
    Message::decode(word)
}

impl From<Message> for u32 {
    fn from(message: Message) -> Self {
        message.encode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpio_layout() {
        assert_eq!(encode_gpio(11, Level::High), 0x0000_010b);
        assert_eq!(encode_gpio(255, Level::Low), 0x0000_00ff);
        assert_eq!(encode_gpio(0, Level::Low), 0);
    }

    #[test]
    fn adc_layout() {
        assert_eq!(encode_adc(13, 0x0fff), 0x8000_fffd);
        assert_eq!(encode_adc(0, 60), 0x8000_03c0);
    }

    #[test]
    fn decode_extremes() {
        assert_eq!(decode(0x8000_fffd), Message::adc(13, 4095));
        assert_eq!(decode(0x0000_01ff), Message::gpio(255, Level::High));
    }

    #[test]
    fn decode_ignores_reserved_bits() {
        // Bits 9–30 set on a GPIO word.
        assert_eq!(decode(0x7fff_fe0b), Message::gpio(11, Level::Low));
        // Bits 16–30 set on an ADC word.
        assert_eq!(decode(0xffff_0035), Message::adc(5, 3));
    }

    #[test]
    fn tag_is_the_only_discriminator() {
        assert!(matches!(decode(0x7fff_ffff), Message::Gpio { .. }));
        assert!(matches!(decode(0x8000_0000), Message::Adc { .. }));
    }

    #[test]
    fn level_from_bool() {
        assert_eq!(Level::from(true), Level::High);
        assert_eq!(Level::from(false), Level::Low);
        assert!(Level::of_bit(0b100, 2).is_high());
        assert!(!Level::of_bit(0b100, 1).is_high());
    }

    #[test]
    fn message_serializes_with_kind_tag() {
        let json = toml::to_string(&Message::gpio(11, Level::High)).unwrap();
        assert!(json.contains("kind = \"gpio\""));
        assert!(json.contains("level = \"high\""));
    }
}
