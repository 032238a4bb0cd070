//! Common re-exports.
//!
//! ```rust
//! use pruio_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{MAX_ADC_CHANNELS, MAX_GPIO_CHANNELS};

// ─── Messages ───────────────────────────────────────────────────────
pub use crate::message::{Level, Message};

// ─── Pins ───────────────────────────────────────────────────────────
pub use crate::pins::Direction;

// ─── Registers ──────────────────────────────────────────────────────
pub use crate::mmio::{MappedWindow, RegisterWindow};
pub use crate::regs::WindowId;

// ─── Shared Memory ──────────────────────────────────────────────────
pub use crate::error::{ShmError, ShmResult};
pub use crate::shm::interest::{InterestReader, InterestWriter};
pub use crate::shm::region::SharedRegion;
pub use crate::shm::ring::{RingConsumer, RingProducer};
pub use crate::shm::{attach_host, attach_rtu};
