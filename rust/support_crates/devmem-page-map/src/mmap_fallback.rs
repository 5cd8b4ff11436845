//! Shared file mappings are only implemented for Unix-like targets. Elsewhere every
//! mapping attempt reports `Unsupported`, which callers surface as an unavailable
//! backing resource.

use std::fs::File;

pub fn map_shared(
    _file: &File,
    _offset: u64,
    _len: usize,
) -> std::io::Result<*mut std::ffi::c_void> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "shared file mappings are not supported on this platform",
    ))
}

pub unsafe fn unmap(_ptr: *mut std::ffi::c_void, _len: usize) -> std::io::Result<()> {
    Ok(())
}

pub fn get_page_size() -> usize {
    4 * 1024
}

pub fn max_offset() -> u64 {
    i64::MAX as u64
}
