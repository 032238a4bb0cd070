//! # PRU I/O Host
//!
//! Host side of the PRU I/O system: brings up the board, starts the RTU,
//! configures pins and analog channels, drives outputs and drains the
//! messages the RTU produces.
//!
//! # Module Structure
//!
//! - [`session`] - Ordered bring-up and teardown
//! - [`manager`] - Channel/register manager (pin config, outputs, ring drain)
//! - [`registry`] - Configured pins and analog channels
//! - [`platform`] - Overlay, pin mux and RTU collaborators; real and simulated boards
//! - [`config`] - `pruio.toml` session configuration
//! - [`error`] - Host error taxonomy
//!
//! # Usage
//!
//! ```rust,no_run
//! use pruio_common::prelude::*;
//! use pruio_host::config::SessionConfig;
//! use pruio_host::platform::Simulation;
//! use pruio_host::session::Session;
//!
//! # fn main() -> Result<(), pruio_host::error::HostError> {
//! let config = SessionConfig::default();
//! let platform = Simulation::new(&config.simulation);
//! let mut session = Session::start(&platform, &config)?;
//!
//! session.configure_pin(60, Direction::Input)?;
//! session.register_adc_channel(0)?;
//! for message in session.drain_ring_buffer() {
//!     println!("{message:?}");
//! }
//! session.stop()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod manager;
pub mod platform;
pub mod registry;
pub mod session;

pub use crate::error::{HostError, HostResult};
pub use crate::manager::ChannelManager;
pub use crate::session::{Session, SessionState};
