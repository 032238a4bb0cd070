//! Memory-mapped register windows.
//!
//! [`RegisterWindow`] is the seam between register-level drivers and the
//! memory that backs them: [`MappedWindow`] maps a physical window from
//! `/dev/mem`, while simulators implement the trait with emulated
//! register semantics. All access is 32-bit and offset-relative.
//!
//! Register access takes `&self`. Hardware registers are shared state by
//! nature; the single-writer rules of the system are enforced by which
//! component holds which window, not by `&mut`.

use crate::error::{ShmError, ShmResult};
use crate::regs::{Region, WindowId};
use memmap2::{MmapMut, MmapOptions};
use std::fs::{File, OpenOptions};
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;
use std::ptr;

/// 32-bit register access into one hardware window.
pub trait RegisterWindow: Send + Sync {
    /// Window identity.
    fn id(&self) -> WindowId;

    /// Read the register at `offset` bytes.
    fn read(&self, offset: usize) -> u32;

    /// Write the register at `offset` bytes.
    fn write(&self, offset: usize, value: u32);

    /// Read-modify-write setting `mask`.
    #[inline]
    fn set_bits(&self, offset: usize, mask: u32) {
        let value = self.read(offset);
        self.write(offset, value | mask);
    }

    /// Read-modify-write clearing `mask`.
    #[inline]
    fn clear_bits(&self, offset: usize, mask: u32) {
        let value = self.read(offset);
        self.write(offset, value & !mask);
    }
}

/// Open the physical memory device for uncached, synchronous access.
pub fn open_memory_device(device: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .custom_flags(libc::O_SYNC)
        .open(device)
}

/// Map `region` of `file` read/write.
pub(crate) fn map_region(file: &File, id: WindowId, region: Region) -> ShmResult<MmapMut> {
    // SAFETY: the mapping covers device memory that is never truncated;
    // all accesses go through volatile reads and writes.
    unsafe { MmapOptions::new().offset(region.base).len(region.len).map_mut(file) }.map_err(
        |source| ShmError::Map {
            window: id.name(),
            base: region.base,
            len: region.len,
            source,
        },
    )
}

/// A register window mapped from the physical memory device.
pub struct MappedWindow {
    id: WindowId,
    base: *mut u8,
    len: usize,
    _map: MmapMut,
}

// SAFETY: the mapping is owned by the window and lives as long as it;
// every access is a single volatile 32-bit load or store.
unsafe impl Send for MappedWindow {}
unsafe impl Sync for MappedWindow {}

impl MappedWindow {
    /// Map window `id` through an already opened memory device.
    pub fn map(file: &File, id: WindowId) -> ShmResult<Self> {
        let region = id.region();
        let mut map = map_region(file, id, region)?;
        let base = map.as_mut_ptr();
        Ok(Self {
            id,
            base,
            len: region.len,
            _map: map,
        })
    }

    /// Open `device` and map window `id`.
    pub fn open(device: &Path, id: WindowId) -> ShmResult<Self> {
        let region = id.region();
        let file = open_memory_device(device).map_err(|source| ShmError::Map {
            window: id.name(),
            base: region.base,
            len: region.len,
            source,
        })?;
        Self::map(&file, id)
    }

    #[inline]
    fn register(&self, offset: usize) -> *mut u32 {
        debug_assert!(offset % 4 == 0, "unaligned register offset {offset:#x}");
        debug_assert!(offset + 4 <= self.len, "offset {offset:#x} outside {}", self.id.name());
        // SAFETY: offset is within the mapping (checked in debug builds).
        unsafe { self.base.add(offset).cast::<u32>() }
    }
}

impl RegisterWindow for MappedWindow {
    fn id(&self) -> WindowId {
        self.id
    }

    #[inline]
    fn read(&self, offset: usize) -> u32 {
        // SAFETY: aligned pointer into a live device mapping.
        unsafe { ptr::read_volatile(self.register(offset)) }
    }

    #[inline]
    fn write(&self, offset: usize, value: u32) {
        // SAFETY: aligned pointer into a live device mapping.
        unsafe { ptr::write_volatile(self.register(offset), value) }
    }
}

/// Map the four GPIO windows through one device handle.
pub fn map_gpio_windows(device: &Path) -> ShmResult<[MappedWindow; 4]> {
    let region = WindowId::Gpio0.region();
    let file = open_memory_device(device).map_err(|source| ShmError::Map {
        window: WindowId::Gpio0.name(),
        base: region.base,
        len: region.len,
        source,
    })?;
    Ok([
        MappedWindow::map(&file, WindowId::Gpio0)?,
        MappedWindow::map(&file, WindowId::Gpio1)?,
        MappedWindow::map(&file, WindowId::Gpio2)?,
        MappedWindow::map(&file, WindowId::Gpio3)?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Plain memory window for exercising the provided methods.
    struct MemWindow([AtomicU32; 8]);

    impl RegisterWindow for MemWindow {
        fn id(&self) -> WindowId {
            WindowId::Gpio0
        }
        fn read(&self, offset: usize) -> u32 {
            self.0[offset / 4].load(Ordering::Relaxed)
        }
        fn write(&self, offset: usize, value: u32) {
            self.0[offset / 4].store(value, Ordering::Relaxed)
        }
    }

    #[test]
    fn set_and_clear_bits_preserve_others() {
        let window = MemWindow(Default::default());
        window.write(8, 0b1010);
        window.set_bits(8, 0b0001);
        assert_eq!(window.read(8), 0b1011);
        window.clear_bits(8, 0b1000);
        assert_eq!(window.read(8), 0b0011);
        assert_eq!(window.read(4), 0);
    }

    #[test]
    fn mapping_a_missing_device_reports_the_window() {
        let err = MappedWindow::open(Path::new("/nonexistent/mem"), WindowId::Gpio2)
            .err()
            .expect("mapping must fail");
        match err {
            ShmError::Map { window, base, .. } => {
                assert_eq!(window, "gpio2");
                assert_eq!(base, 0x481a_c000);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn gpio_mapping_fails_cleanly_without_device() {
        assert!(map_gpio_windows(Path::new("/nonexistent/mem")).is_err());
    }
}
