//! PRU I/O Common Library
//!
//! This crate holds everything the host process and the real-time unit
//! (RTU) must agree on bit-for-bit: the hardware register map, the 32-bit
//! message format, and the layout of the shared RAM that carries the ring
//! buffer and the channel-interest bitmaps.
//!
//! # Module Structure
//!
//! - [`regs`] - Physical register windows and sub-register offsets
//! - [`mmio`] - `RegisterWindow` trait and `/dev/mem` backed windows
//! - [`message`] - GPIO / ADC message codec
//! - [`shm`] - Shared RAM region, ring buffer halves, interest bitmaps
//! - [`pins`] - P9 header pin name table
//! - [`config`] - Configuration loading traits and types
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use pruio_common::prelude::*;
//!
//! let region = std::sync::Arc::new(SharedRegion::allocate());
//! let (mut producer, _reader) = attach_rtu(&region).unwrap();
//! let (mut consumer, _writer) = attach_host(&region).unwrap();
//!
//! producer.write(Message::gpio(11, Level::High));
//! assert_eq!(consumer.read(), Some(Message::gpio(11, Level::High)));
//! ```

pub mod config;
pub mod consts;
pub mod error;
pub mod message;
pub mod mmio;
pub mod pins;
pub mod prelude;
pub mod regs;
pub mod shm;
