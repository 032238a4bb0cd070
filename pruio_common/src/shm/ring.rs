//! Single-producer / single-consumer ring buffer in shared RAM.
//!
//! The RTU owns [`RingProducer`] and is the only writer of the write
//! cursor; the host owns [`RingConsumer`] and is the only writer of the
//! read cursor. Slot contents are published with a release store of the
//! write cursor and consumed after an acquire load of it, and the same
//! pairing runs in the opposite direction for freed slots.
//!
//! A write into a full ring is dropped. The producer never waits for the
//! consumer and never overwrites unread entries.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use super::layout::{self, HEAD_WORD, TAIL_WORD};
use super::region::Attachment;
use crate::message::Message;

/// RTU side of the ring: appends messages.
pub struct RingProducer {
    link: Arc<Attachment>,
}

impl RingProducer {
    pub(crate) fn new(link: Arc<Attachment>) -> Self {
        Self { link }
    }

    /// Reset both cursors to zero.
    ///
    /// Part of RTU initialisation, before the host starts draining.
    pub fn initialize(&mut self) {
        let region = self.link.region();
        region.store(HEAD_WORD, 0, Ordering::Relaxed);
        region.store(TAIL_WORD, 0, Ordering::Release);
    }

    /// Append `message`. Returns `false` if the ring was full and the
    /// message was dropped.
    #[inline]
    pub fn write(&mut self, message: Message) -> bool {
        self.write_word(message.encode())
    }

    #[inline]
    fn write_word(&mut self, word: u32) -> bool {
        let region = self.link.region();
        let head = region.load(HEAD_WORD, Ordering::Acquire);
        let tail = region.load(TAIL_WORD, Ordering::Relaxed);
        if layout::is_full(head, tail) {
            return false;
        }
        region.store(layout::slot(tail), word, Ordering::Relaxed);
        region.store(TAIL_WORD, layout::advance(tail), Ordering::Release);
        true
    }

    /// `true` if the next write would be dropped.
    pub fn is_full(&self) -> bool {
        let region = self.link.region();
        layout::is_full(
            region.load(HEAD_WORD, Ordering::Acquire),
            region.load(TAIL_WORD, Ordering::Relaxed),
        )
    }
}

/// Host side of the ring: removes messages in FIFO order.
pub struct RingConsumer {
    link: Arc<Attachment>,
}

impl RingConsumer {
    pub(crate) fn new(link: Arc<Attachment>) -> Self {
        Self { link }
    }

    /// Remove the oldest message, or `None` if the ring is empty.
    #[inline]
    pub fn read(&mut self) -> Option<Message> {
        let region = self.link.region();
        let tail = region.load(TAIL_WORD, Ordering::Acquire);
        let head = region.load(HEAD_WORD, Ordering::Relaxed);
        if head == tail {
            return None;
        }
        let word = region.load(layout::slot(head), Ordering::Relaxed);
        region.store(HEAD_WORD, layout::advance(head), Ordering::Release);
        Some(Message::decode(word))
    }

    /// Messages waiting to be read.
    pub fn len(&self) -> usize {
        let region = self.link.region();
        layout::occupancy(
            region.load(HEAD_WORD, Ordering::Relaxed),
            region.load(TAIL_WORD, Ordering::Acquire),
        )
    }

    /// `true` if nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lazily read every message available right now.
    ///
    /// The iterator is bounded by the occupancy seen when it is created,
    /// so a producer that keeps writing cannot make it run forever.
    /// Messages not consumed before the iterator is dropped stay queued.
    pub fn drain(&mut self) -> Drain<'_> {
        let remaining = self.len();
        Drain {
            consumer: self,
            remaining,
        }
    }
}

/// Iterator returned by [`RingConsumer::drain`].
pub struct Drain<'a> {
    consumer: &'a mut RingConsumer,
    remaining: usize,
}

impl Iterator for Drain<'_> {
    type Item = Message;

    fn next(&mut self) -> Option<Message> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        self.consumer.read()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Level;
    use crate::shm::layout::RING_CAPACITY;
    use crate::shm::region::SharedRegion;
    use crate::shm::{attach_host, attach_rtu};

    fn ring() -> (RingProducer, RingConsumer) {
        let region = Arc::new(SharedRegion::allocate());
        let (producer, _) = attach_rtu(&region).unwrap();
        let (consumer, _) = attach_host(&region).unwrap();
        (producer, consumer)
    }

    #[test]
    fn empty_ring_reads_none() {
        let (_producer, mut consumer) = ring();
        assert!(consumer.is_empty());
        assert_eq!(consumer.read(), None);
    }

    #[test]
    fn fifo_order() {
        let (mut producer, mut consumer) = ring();
        assert!(producer.write(Message::gpio(3, Level::High)));
        assert!(producer.write(Message::adc(2, 100)));
        assert!(producer.write(Message::gpio(3, Level::Low)));
        assert_eq!(consumer.len(), 3);

        assert_eq!(consumer.read(), Some(Message::gpio(3, Level::High)));
        assert_eq!(consumer.read(), Some(Message::adc(2, 100)));
        assert_eq!(consumer.read(), Some(Message::gpio(3, Level::Low)));
        assert_eq!(consumer.read(), None);
    }

    #[test]
    fn full_ring_drops_new_writes() {
        let (mut producer, mut consumer) = ring();
        for i in 0..RING_CAPACITY {
            assert!(producer.write(Message::adc((i % 14) as u8, i as u16 & 0x0fff)));
        }
        assert!(producer.is_full());
        assert!(!producer.write(Message::gpio(1, Level::High)));
        assert_eq!(consumer.len(), RING_CAPACITY);

        // Oldest entry survived, the rejected one never appears.
        assert_eq!(consumer.read(), Some(Message::adc(0, 0)));
        let rest: Vec<_> = consumer.drain().collect();
        assert_eq!(rest.len(), RING_CAPACITY - 1);
        assert!(!rest.contains(&Message::gpio(1, Level::High)));
    }

    #[test]
    fn space_is_reclaimed_after_reads() {
        let (mut producer, mut consumer) = ring();
        for _ in 0..RING_CAPACITY {
            producer.write(Message::gpio(0, Level::Low));
        }
        assert!(!producer.write(Message::gpio(1, Level::Low)));
        consumer.read();
        assert!(producer.write(Message::gpio(2, Level::High)));
        assert!(producer.is_full());
    }

    #[test]
    fn cursors_wrap_past_twice_capacity() {
        let (mut producer, mut consumer) = ring();
        for round in 0..5 * RING_CAPACITY {
            let message = Message::gpio((round % 128) as u8, Level::from(round % 2 == 0));
            assert!(producer.write(message));
            assert_eq!(consumer.read(), Some(message));
        }
        assert!(consumer.is_empty());
    }

    #[test]
    fn drain_is_bounded_by_snapshot() {
        let (mut producer, mut consumer) = ring();
        producer.write(Message::gpio(1, Level::High));
        producer.write(Message::gpio(2, Level::High));

        let mut drain = consumer.drain();
        assert_eq!(drain.next(), Some(Message::gpio(1, Level::High)));
        // Written after the drain started: left for the next call.
        producer.write(Message::gpio(3, Level::High));
        assert_eq!(drain.next(), Some(Message::gpio(2, Level::High)));
        assert_eq!(drain.next(), None);

        assert_eq!(consumer.drain().collect::<Vec<_>>(), vec![Message::gpio(3, Level::High)]);
    }

    #[test]
    fn initialize_empties_the_ring() {
        let (mut producer, consumer) = ring();
        producer.write(Message::adc(1, 1));
        producer.initialize();
        assert!(consumer.is_empty());
    }
}
