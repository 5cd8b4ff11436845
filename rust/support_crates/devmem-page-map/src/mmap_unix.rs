use std::{fs::File, os::unix::io::AsRawFd, sync::OnceLock};

/// Maps `len` bytes of `file`, starting at the file offset `offset`, as a shared
/// read-write mapping.
///
/// Stores through the returned pointer land directly in the backing object. For
/// `/dev/mem` that means the physical address `offset`; for a regular file it means
/// the page cache of that file.
///
/// # Arguments
///
/// * `file` - An open handle with read and write access.
/// * `offset` - File offset of the mapping. Must be a multiple of [`get_page_size`].
/// * `len` - Length of the mapping in bytes. Must be non-zero.
///
/// # Errors
///
/// Returns `InvalidInput` if `offset` is not page aligned or does not fit `off_t`,
/// and the OS error reported by `mmap` otherwise (e.g. `EACCES`, `EINVAL`, `ENODEV`).
///
/// The returned pointer must be released with [`unmap`] using the same `len`.
pub fn map_shared(file: &File, offset: u64, len: usize) -> std::io::Result<*mut std::ffi::c_void> {
    let page_size = get_page_size();
    assert!(page_size.is_power_of_two());
    if offset & (page_size as u64 - 1) != 0 {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "mapping offset is not page aligned",
        ));
    }
    if offset > max_offset() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "mapping offset does not fit off_t",
        ));
    }
    let offset = offset as libc::off_t;

    let ptr = unsafe {
        libc::mmap(
            std::ptr::null_mut(),
            len,
            libc::PROT_READ | libc::PROT_WRITE,
            libc::MAP_SHARED,
            file.as_raw_fd(),
            offset,
        )
    };
    if ptr.is_null() || ptr == libc::MAP_FAILED {
        return Err(std::io::Error::last_os_error());
    }
    Ok(ptr)
}

/// Releases a mapping created by [`map_shared`].
///
/// # Safety
///
/// `ptr` and `len` must come from a single successful [`map_shared`] call, the
/// mapping must not have been released yet, and no references into it may outlive
/// this call.
pub unsafe fn unmap(ptr: *mut std::ffi::c_void, len: usize) -> std::io::Result<()> {
    let res = unsafe { libc::munmap(ptr, len) };
    if res < 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

/// Largest file offset `mmap` accepts on this target (`off_t::MAX`).
pub fn max_offset() -> u64 {
    libc::off_t::MAX as u64
}

/// Gets the system's standard page size in bytes.
///
/// The value is cached after the first call. If `sysconf(_SC_PAGESIZE)` fails,
/// 4KB is assumed.
pub fn get_page_size() -> usize {
    static SIZE: OnceLock<usize> = OnceLock::new();
    if let Some(&size) = SIZE.get() {
        size
    } else {
        match read_page_size() {
            Ok(size) => {
                let _ = SIZE.set(size);
                size
            }
            Err(_) => 4 * 1024,
        }
    }
}

fn read_page_size() -> std::io::Result<usize> {
    let res = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if res < 0 {
        return Err(std::io::Error::last_os_error());
    }
    assert!(res < i32::MAX as _);
    Ok(res as usize)
}
