//! Backing memory for the register file.
//!
//! A [`Region`] is the contiguous, byte-addressable view handed to the
//! channel by whoever mapped the shared memory. The channel never owns the
//! mapping policy; it only needs a base pointer and a length that stay valid
//! for as long as the region value lives.

use crate::ChannelConfig;
use std::alloc::{self, Layout};
use std::ptr::NonNull;
use std::sync::Arc;

/// Alignment of heap-allocated regions (matches the 128-byte cache padding
/// used for hot atomics).
const REGION_ALIGN: usize = 128;

/// A contiguous block of memory shared between the producer and consumer.
///
/// # Safety
///
/// Implementors guarantee that:
/// - `as_ptr()` is non-null, aligned to at least 4 bytes, and valid for
///   reads and writes of `len()` bytes for as long as `self` is alive;
/// - the memory is never accessed through `&mut` references while shared,
///   only through the atomic accessors in [`RegisterMap`](crate::RegisterMap).
pub unsafe trait Region {
    /// Base address of the region.
    fn as_ptr(&self) -> *mut u8;

    /// Length of the region in bytes.
    fn len(&self) -> usize;

    /// Returns true if the region spans zero bytes.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// SAFETY: forwards to the shared region, which stays alive while the Arc does.
unsafe impl<R: Region + ?Sized> Region for Arc<R> {
    #[inline]
    fn as_ptr(&self) -> *mut u8 {
        (**self).as_ptr()
    }

    #[inline]
    fn len(&self) -> usize {
        (**self).len()
    }
}

// SAFETY: the borrow keeps the underlying region alive.
unsafe impl<R: Region + ?Sized> Region for &R {
    #[inline]
    fn as_ptr(&self) -> *mut u8 {
        (**self).as_ptr()
    }

    #[inline]
    fn len(&self) -> usize {
        (**self).len()
    }
}

/// Zeroed, 128-byte aligned heap allocation standing in for a device BAR.
///
/// Used when both ends of the channel live in one process (tests, benches,
/// in-process bridges). Wrap it in an [`Arc`] to hand one copy to each side.
pub struct HeapRegion {
    ptr: NonNull<u8>,
    layout: Layout,
    len: usize,
}

// SAFETY: the allocation is only reached through atomic accesses.
unsafe impl Send for HeapRegion {}
unsafe impl Sync for HeapRegion {}

impl HeapRegion {
    /// Allocates `len` zeroed bytes.
    pub fn new(len: usize) -> Self {
        // Zero-sized layouts cannot be allocated; an empty region still gets
        // one aligned block so `as_ptr` is always valid.
        let layout = match Layout::from_size_align(len.max(1), REGION_ALIGN) {
            Ok(layout) => layout,
            Err(_) => panic!("region length {len} overflows the address space"),
        };

        // SAFETY: layout has non-zero size.
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let Some(ptr) = NonNull::new(raw) else {
            alloc::handle_alloc_error(layout);
        };

        Self { ptr, layout, len }
    }

    /// Allocates a region sized for `config`.
    pub fn for_config(config: &ChannelConfig) -> Self {
        Self::new(config.region_len())
    }
}

// SAFETY: ptr is valid for len bytes until drop, 128-byte aligned.
unsafe impl Region for HeapRegion {
    #[inline]
    fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    #[inline]
    fn len(&self) -> usize {
        self.len
    }
}

impl Drop for HeapRegion {
    fn drop(&mut self) {
        // SAFETY: allocated in `new` with exactly this layout.
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) };
    }
}

impl std::fmt::Debug for HeapRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeapRegion")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .finish()
    }
}

#[cfg(all(unix, feature = "mmap"))]
pub use self::mmap::{MappingError, MmapRegion};

#[cfg(all(unix, feature = "mmap"))]
mod mmap {
    use super::Region;
    use std::fs::{File, OpenOptions};
    use std::io;
    use std::os::fd::AsRawFd;
    use std::path::Path;
    use std::ptr::NonNull;
    use thiserror::Error;

    /// Failure to provide a mapping for the channel.
    #[derive(Debug, Error)]
    pub enum MappingError {
        /// Opening, sizing or mapping the backing file failed.
        #[error("failed to map shared region: {0}")]
        Io(#[from] io::Error),

        /// The backing file is empty.
        #[error("shared region {path} is empty")]
        Empty {
            /// Path of the backing file.
            path: String,
        },
    }

    /// File-backed `MAP_SHARED` mapping, e.g. under `/dev/shm`.
    ///
    /// Both processes map the same file; stores made through one mapping are
    /// visible through the other.
    #[derive(Debug)]
    pub struct MmapRegion {
        ptr: NonNull<u8>,
        len: usize,
        _file: File,
    }

    // SAFETY: the mapping is only reached through atomic accesses.
    unsafe impl Send for MmapRegion {}
    unsafe impl Sync for MmapRegion {}

    impl MmapRegion {
        /// Creates (or truncates) the backing file to `len` zeroed bytes and maps it.
        pub fn create(path: impl AsRef<Path>, len: usize) -> Result<Self, MappingError> {
            let path = path.as_ref();
            if len == 0 {
                return Err(MappingError::Empty {
                    path: path.display().to_string(),
                });
            }
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)?;
            file.set_len(len as u64)?;
            log::info!("created shared region {} ({} bytes)", path.display(), len);
            Self::map(file, len)
        }

        /// Maps an existing backing file at its current length.
        pub fn open(path: impl AsRef<Path>) -> Result<Self, MappingError> {
            let path = path.as_ref();
            let file = OpenOptions::new().read(true).write(true).open(path)?;
            let len = file.metadata()?.len() as usize;
            if len == 0 {
                return Err(MappingError::Empty {
                    path: path.display().to_string(),
                });
            }
            log::info!("opened shared region {} ({} bytes)", path.display(), len);
            Self::map(file, len)
        }

        fn map(file: File, len: usize) -> Result<Self, MappingError> {
            // SAFETY: fd is open read/write and spans `len` bytes; the mapping
            // is released in Drop.
            let raw = unsafe {
                libc::mmap(
                    std::ptr::null_mut(),
                    len,
                    libc::PROT_READ | libc::PROT_WRITE,
                    libc::MAP_SHARED,
                    file.as_raw_fd(),
                    0,
                )
            };
            if raw == libc::MAP_FAILED {
                return Err(io::Error::last_os_error().into());
            }
            let ptr = NonNull::new(raw.cast::<u8>())
                .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "mmap returned null"))?;

            Ok(Self {
                ptr,
                len,
                _file: file,
            })
        }
    }

    // SAFETY: page-aligned mapping valid for len bytes until munmap in Drop.
    unsafe impl Region for MmapRegion {
        #[inline]
        fn as_ptr(&self) -> *mut u8 {
            self.ptr.as_ptr()
        }

        #[inline]
        fn len(&self) -> usize {
            self.len
        }
    }

    impl Drop for MmapRegion {
        fn drop(&mut self) {
            // SAFETY: ptr/len describe the mapping created in `map`.
            let rc = unsafe { libc::munmap(self.ptr.as_ptr().cast(), self.len) };
            if rc != 0 {
                log::warn!("munmap failed: {}", io::Error::last_os_error());
            }
        }
    }
}
