//! The shared RAM region.
//!
//! On hardware the region is the PRU-ICSS shared data RAM mapped from
//! `/dev/mem`; in simulation it is a zeroed heap allocation of the same
//! size. Either way it is viewed as a slice of `AtomicU32`, which has the
//! layout of `u32`. Only plain loads and stores are issued (never
//! read-modify-write), matching what the RTU can do on its side.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use memmap2::MmapMut;

use super::layout::{LAYOUT_WORDS, RING_CAPACITY, SHARED_RAM_WORDS};
use crate::error::{ShmError, ShmResult};
use crate::mmio::{map_region, open_memory_device};
use crate::regs::WindowId;

enum Backing {
    Owned(Box<[AtomicU32]>),
    Mapped {
        base: *const AtomicU32,
        words: usize,
        _map: MmapMut,
    },
}

/// Shared RAM visible to both the host and the RTU.
pub struct SharedRegion {
    backing: Backing,
    host_attached: AtomicBool,
    rtu_attached: AtomicBool,
}

// SAFETY: the mapped variant only exposes `&[AtomicU32]`, and the mapping
// lives as long as the region.
unsafe impl Send for SharedRegion {}
unsafe impl Sync for SharedRegion {}

impl SharedRegion {
    /// Zeroed heap-backed region with the shared RAM size.
    pub fn allocate() -> Self {
        let words: Box<[AtomicU32]> = (0..SHARED_RAM_WORDS).map(|_| AtomicU32::new(0)).collect();
        Self::with_backing(Backing::Owned(words))
    }

    /// Map the PRU shared data RAM through `device`.
    pub fn map(device: &Path) -> ShmResult<Self> {
        let id = WindowId::SharedRam;
        let region = id.region();
        let file = open_memory_device(device).map_err(|source| ShmError::Map {
            window: id.name(),
            base: region.base,
            len: region.len,
            source,
        })?;
        let mut map = map_region(&file, id, region)?;
        let words = map.len() / 4;
        if words < LAYOUT_WORDS {
            return Err(ShmError::TooSmall {
                words,
                required: LAYOUT_WORDS,
            });
        }
        let base = map.as_mut_ptr().cast::<AtomicU32>().cast_const();
        Ok(Self::with_backing(Backing::Mapped {
            base,
            words,
            _map: map,
        }))
    }

    fn with_backing(backing: Backing) -> Self {
        Self {
            backing,
            host_attached: AtomicBool::new(false),
            rtu_attached: AtomicBool::new(false),
        }
    }

    /// All words of the region.
    #[inline]
    pub fn words(&self) -> &[AtomicU32] {
        match &self.backing {
            Backing::Owned(words) => words,
            // SAFETY: `base` points at `words` page-aligned words kept
            // alive by `_map`.
            Backing::Mapped { base, words, .. } => unsafe {
                std::slice::from_raw_parts(*base, *words)
            },
        }
    }

    /// Word at `index` with the given ordering.
    #[inline]
    pub fn load(&self, index: usize, order: Ordering) -> u32 {
        self.words()[index].load(order)
    }

    /// Store `value` at `index` with the given ordering.
    #[inline]
    pub fn store(&self, index: usize, value: u32, order: Ordering) {
        self.words()[index].store(value, order);
    }

    /// Zero the cursors and interest bitmaps.
    ///
    /// Only valid while no RTU is running against the region; the host
    /// calls it during bring-up before the firmware starts.
    pub fn reset_control_words(&self) {
        for index in RING_CAPACITY..LAYOUT_WORDS {
            self.store(index, 0, Ordering::Relaxed);
        }
        std::sync::atomic::fence(Ordering::Release);
    }

    fn flag(&self, side: Side) -> &AtomicBool {
        match side {
            Side::Host => &self.host_attached,
            Side::Rtu => &self.rtu_attached,
        }
    }
}

/// Which end of the region an attachment represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side {
    Host,
    Rtu,
}

impl Side {
    const fn name(self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::Rtu => "rtu",
        }
    }
}

/// Exclusive claim on one side of a region, released on drop.
pub(crate) struct Attachment {
    region: Arc<SharedRegion>,
    side: Side,
}

impl Attachment {
    pub(crate) fn claim(region: &Arc<SharedRegion>, side: Side) -> ShmResult<Arc<Self>> {
        if region.flag(side).swap(true, Ordering::AcqRel) {
            return Err(ShmError::AlreadyAttached { side: side.name() });
        }
        Ok(Arc::new(Self {
            region: Arc::clone(region),
            side,
        }))
    }

    #[inline]
    pub(crate) fn region(&self) -> &SharedRegion {
        &self.region
    }
}

impl Drop for Attachment {
    fn drop(&mut self) {
        self.region.flag(self.side).store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shm::layout::{ADC_INTEREST_WORD, HEAD_WORD, TAIL_WORD};

    #[test]
    fn allocated_region_is_zeroed_and_full_size() {
        let region = SharedRegion::allocate();
        assert_eq!(region.words().len(), SHARED_RAM_WORDS);
        assert!(region.words().iter().all(|w| w.load(Ordering::Relaxed) == 0));
    }

    #[test]
    fn reset_clears_only_control_words() {
        let region = SharedRegion::allocate();
        region.store(0, 0xdead_beef, Ordering::Relaxed);
        region.store(HEAD_WORD, 7, Ordering::Relaxed);
        region.store(TAIL_WORD, 9, Ordering::Relaxed);
        region.store(ADC_INTEREST_WORD, 0x3, Ordering::Relaxed);

        region.reset_control_words();

        assert_eq!(region.load(0, Ordering::Relaxed), 0xdead_beef);
        assert_eq!(region.load(HEAD_WORD, Ordering::Relaxed), 0);
        assert_eq!(region.load(TAIL_WORD, Ordering::Relaxed), 0);
        assert_eq!(region.load(ADC_INTEREST_WORD, Ordering::Relaxed), 0);
    }

    #[test]
    fn mapping_without_device_fails() {
        let err = SharedRegion::map(Path::new("/nonexistent/mem")).err().unwrap();
        assert!(err.to_string().contains("shared_ram"));
    }
}
