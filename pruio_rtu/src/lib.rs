//! # PRU I/O Real-Time Unit
//!
//! The sampling loop that runs on the real-time unit, written against the
//! `RegisterWindow` seam so it can drive real PRU-visible registers or the
//! register-level simulator in [`sim`].
//!
//! # Module Structure
//!
//! - [`sampler`] - `Sampler` state machine, one iteration per timer period
//! - [`adc`] - Step-to-channel mapping, fast averaging, slow change detection
//! - [`gpio`] - Tracked digital pins and level change detection
//! - [`mux`] - Analog multiplexer position and select lines
//! - [`hw`] - Register-level init and per-cycle drivers
//! - [`sim`] - Simulated GPIO, ADC and IEP timer registers
//!
//! # Architecture
//!
//! ```text
//!   host                    shared RAM                     RTU
//! ┌────────┐  interest   ┌──────────────┐  interest   ┌──────────┐
//! │        │────────────►│ bitmaps      │────────────►│          │
//! │        │             ├──────────────┤             │ Sampler  │
//! │        │◄────────────│ ring buffer  │◄────────────│          │
//! └────────┘   messages  └──────────────┘   messages  └────┬─────┘
//!                                                          │ Peripherals<W>
//!                                              GPIO / ADC / IEP registers
//! ```

#![warn(missing_docs)]

pub mod adc;
pub mod gpio;
pub mod hw;
pub mod mux;
pub mod sampler;
pub mod sim;

pub use crate::hw::Peripherals;
pub use crate::sampler::{Sampler, SamplerState, SamplerStats};
pub use crate::sim::{SimBoard, SimWindow};
