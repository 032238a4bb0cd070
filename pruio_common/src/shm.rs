//! Shared RAM between host and RTU.
//!
//! This module contains:
//! - `layout`: bit-exact word positions of the ring and the bitmaps.
//! - `region`: the shared RAM itself (mapped or heap-backed).
//! - `ring`: producer (RTU) and consumer (host) halves of the ring buffer.
//! - `interest`: host-set, RTU-read channel-interest bitmaps.
//!
//! A region hands out exactly one host attachment and one RTU attachment
//! at a time. The host side gets the ring consumer plus the bitmap
//! writer; the RTU side gets the ring producer plus the bitmap reader.
//! Because each cursor and each bitmap word has a single writer, no lock
//! or read-modify-write atomic is ever needed.

pub mod interest;
pub mod layout;
pub mod region;
pub mod ring;

use std::sync::Arc;

use crate::error::ShmResult;
use interest::{InterestReader, InterestWriter};
use region::{Attachment, SharedRegion, Side};
use ring::{RingConsumer, RingProducer};

/// Attach the host end: ring consumer and interest bitmap writer.
///
/// # Errors
/// `ShmError::AlreadyAttached` while another host end is alive.
pub fn attach_host(region: &Arc<SharedRegion>) -> ShmResult<(RingConsumer, InterestWriter)> {
    let link = Attachment::claim(region, Side::Host)?;
    Ok((RingConsumer::new(Arc::clone(&link)), InterestWriter::new(link)))
}

/// Attach the RTU end: ring producer and interest bitmap reader.
///
/// # Errors
/// `ShmError::AlreadyAttached` while another RTU end is alive.
pub fn attach_rtu(region: &Arc<SharedRegion>) -> ShmResult<(RingProducer, InterestReader)> {
    let link = Attachment::claim(region, Side::Rtu)?;
    Ok((RingProducer::new(Arc::clone(&link)), InterestReader::new(link)))
}
