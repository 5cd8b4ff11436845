//! Owned shared mapping of a file range.
//!
//! `SharedMapping` wraps the platform `mmap` module and guarantees that the mapping
//! is released exactly once: either explicitly through [`SharedMapping::unmap`],
//! which reports the OS result, or implicitly when the value is dropped.

use std::fs::File;

use crate::mmap;

/// A `MAP_SHARED`, read-write mapping of a page-aligned file range.
///
/// The mapping stays valid after the file handle used to create it is closed, but
/// callers that care about the handle's lifetime (e.g. `O_SYNC` semantics on
/// `/dev/mem`) typically keep both alive together.
pub struct SharedMapping {
    /// Start of the mapped range. Null once the mapping has been released.
    ptr: *mut u8,
    /// Length of the mapping in bytes.
    len: usize,
    /// File offset the mapping starts at.
    offset: u64,
}

impl SharedMapping {
    /// Returns the size of a regular memory page on the current system.
    pub fn page_size() -> usize {
        mmap::get_page_size()
    }

    /// Maps `len` bytes of `file` starting at the page-aligned file `offset`.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidInput` for a zero `len` or an unaligned `offset`, and with
    /// the OS error when the kernel rejects the mapping.
    pub fn map(file: &File, offset: u64, len: usize) -> std::io::Result<SharedMapping> {
        if len == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "zero-length mapping",
            ));
        }
        let ptr = mmap::map_shared(file, offset, len)?;
        Ok(SharedMapping {
            ptr: ptr as _,
            len,
            offset,
        })
    }

    /// Largest file offset (for `/dev/mem`, physical address) a mapping may start at.
    pub fn max_offset() -> u64 {
        mmap::max_offset()
    }

    /// Length of the mapping in bytes.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.len
    }

    /// Returns a raw pointer to the beginning of the mapping.
    ///
    /// The pointer is only valid while `self` is alive, and accesses must stay
    /// within `0..byte_len()`.
    #[inline]
    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr
    }

    /// Releases the mapping and reports the result of `munmap`.
    pub fn unmap(mut self) -> std::io::Result<()> {
        let ptr = std::mem::replace(&mut self.ptr, std::ptr::null_mut());
        unsafe { mmap::unmap(ptr as _, self.len) }
    }
}

impl Drop for SharedMapping {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            if let Err(e) = unsafe { mmap::unmap(self.ptr as _, self.len) } {
                log::warn!("failed to unmap {} bytes at {:#x}: {e}", self.len, self.offset);
            }
            self.ptr = std::ptr::null_mut();
        }
    }
}

// SAFETY: SharedMapping exclusively owns the mapped range and releases it on drop;
// moving it to another thread does not alias the memory.
unsafe impl Send for SharedMapping {}

impl std::fmt::Debug for SharedMapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedMapping")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .field("offset", &format_args!("{:#x}", self.offset))
            .finish()
    }
}
