//! Property tests for the ring buffer and the message codec.
//!
//! - FIFO order with no loss while occupancy stays within capacity
//! - writes into a full ring are dropped, never evicting older entries
//! - GPIO / ADC encodings round-trip and never collide

use proptest::prelude::*;
use pruio_common::message::{self, Level, Message};
use pruio_common::shm::layout::RING_CAPACITY;
use pruio_common::shm::region::SharedRegion;
use pruio_common::shm::{attach_host, attach_rtu};
use std::collections::VecDeque;
use std::sync::Arc;

#[derive(Debug, Clone)]
enum Op {
    Write(Message),
    Read,
}

fn any_message() -> impl Strategy<Value = Message> {
    prop_oneof![
        (any::<u8>(), any::<bool>()).prop_map(|(pin, high)| Message::gpio(pin, Level::from(high))),
        (0u8..16, 0u16..=0x0fff).prop_map(|(channel, value)| Message::adc(channel, value)),
    ]
}

fn any_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => any_message().prop_map(Op::Write),
        2 => Just(Op::Read),
    ]
}

proptest! {
    #[test]
    fn interleaved_ops_match_a_bounded_queue(ops in prop::collection::vec(any_op(), 0..4000)) {
        let region = Arc::new(SharedRegion::allocate());
        let (mut producer, _reader) = attach_rtu(&region).unwrap();
        let (mut consumer, _writer) = attach_host(&region).unwrap();
        let mut model = VecDeque::new();

        for op in ops {
            match op {
                Op::Write(message) => {
                    let accepted = producer.write(message);
                    prop_assert_eq!(accepted, model.len() < RING_CAPACITY);
                    if accepted {
                        model.push_back(message);
                    }
                }
                Op::Read => prop_assert_eq!(consumer.read(), model.pop_front()),
            }
            prop_assert_eq!(consumer.len(), model.len());
        }
        prop_assert!(consumer.drain().eq(model.into_iter()));
    }

    #[test]
    fn overflow_keeps_the_earliest_entries(extra in 1usize..600) {
        let region = Arc::new(SharedRegion::allocate());
        let (mut producer, _reader) = attach_rtu(&region).unwrap();
        let (mut consumer, _writer) = attach_host(&region).unwrap();

        let total = RING_CAPACITY + extra;
        let accepted = (0..total)
            .filter(|&i| producer.write(Message::adc((i % 16) as u8, (i % 4096) as u16)))
            .count();
        prop_assert_eq!(accepted, RING_CAPACITY);

        for (i, message) in consumer.drain().enumerate() {
            prop_assert_eq!(message, Message::adc((i % 16) as u8, (i % 4096) as u16));
        }
        prop_assert!(consumer.is_empty());
    }

    #[test]
    fn gpio_round_trip(pin in any::<u8>(), high in any::<bool>()) {
        let level = Level::from(high);
        let word = message::encode_gpio(pin, level);
        prop_assert_eq!(word >> 31, 0);
        prop_assert_eq!(message::decode(word), Message::Gpio { pin, level });
    }

    #[test]
    fn adc_round_trip(channel in 0u8..16, value in 0u16..=0x0fff) {
        let word = message::encode_adc(channel, value);
        prop_assert_eq!(word >> 31, 1);
        prop_assert_eq!(message::decode(word), Message::Adc { channel, value });
    }

    #[test]
    fn tag_bit_alone_selects_the_variant(word in any::<u32>()) {
        let decoded = message::decode(word);
        if word & 0x8000_0000 == 0 {
            prop_assert!(matches!(decoded, Message::Gpio { .. }), "expected GPIO variant");
        } else {
            prop_assert!(matches!(decoded, Message::Adc { .. }), "expected ADC variant");
        }
    }
}
