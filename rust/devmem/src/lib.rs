//! Word-aligned read/write access to memory-mapped device registers.
//!
//! The crate maps an arbitrary, possibly unaligned, physical address range of a
//! backing resource (usually `/dev/mem`) and performs register accesses one word at a
//! time, so that peripherals which fault on sub-word or misaligned bus transactions
//! can be driven safely.
//!
//! # Key Types
//!
//! - [`AlignedRegion`] - Owns the page-aligned mapping and translates user offsets.
//! - [`RegionOptions`] - Construction parameters (length, backing path, word size, tracing).
//! - [`RegionLayout`] - The pure address arithmetic behind a region.
//! - [`WordBuffer`] - Immutable snapshot returned by a read, with hex dump rendering.
//! - [`TraceSink`] - Receiver of per-operation trace records when debugging is enabled.

pub mod buffer;
pub mod layout;
pub mod options;
pub mod region;
pub mod trace;
pub mod word;

pub use buffer::WordBuffer;
pub use devmem_common::{
    Result,
    error::{Error, ErrorKind},
};
pub use layout::RegionLayout;
pub use options::{DEFAULT_BACKING_PATH, RegionOptions};
pub use region::AlignedRegion;
pub use trace::{LogTraceSink, TraceEvent, TraceSink};
pub use word::WordSize;
