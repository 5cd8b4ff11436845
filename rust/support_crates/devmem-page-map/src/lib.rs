pub mod shared_mapping;

#[cfg_attr(unix, path = "mmap_unix.rs")]
#[cfg_attr(not(unix), path = "mmap_fallback.rs")]
pub mod mmap;

pub use shared_mapping::SharedMapping;
