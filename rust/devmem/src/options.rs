use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use devmem_common::Result;

use crate::{
    region::AlignedRegion,
    trace::{LogTraceSink, TraceSink},
    word::WordSize,
};

/// Backing resource used when none is specified.
pub const DEFAULT_BACKING_PATH: &str = "/dev/mem";

/// Construction parameters of an [`AlignedRegion`].
///
/// ```no_run
/// use devmem::{RegionOptions, WordSize};
///
/// let region = RegionOptions::new()
///     .with_length(0x100)
///     .with_word_size(WordSize::Four)
///     .open(0x4A101000)?;
/// # Ok::<(), devmem_common::error::Error>(())
/// ```
#[derive(Clone)]
pub struct RegionOptions {
    length_in_words: usize,
    backing_path: PathBuf,
    word_size: WordSize,
    debug: bool,
    trace_sink: Arc<dyn TraceSink>,
}

impl RegionOptions {
    pub fn new() -> RegionOptions {
        RegionOptions {
            length_in_words: 1,
            backing_path: PathBuf::from(DEFAULT_BACKING_PATH),
            word_size: WordSize::default(),
            debug: false,
            trace_sink: Arc::new(LogTraceSink),
        }
    }

    /// Number of words the region must cover, starting at the base address.
    pub fn with_length(mut self, length_in_words: usize) -> Self {
        self.length_in_words = length_in_words;
        self
    }

    pub fn with_backing_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.backing_path = path.into();
        self
    }

    pub fn with_word_size(mut self, word_size: WordSize) -> Self {
        self.word_size = word_size;
        self
    }

    /// Enables emission of [`crate::TraceEvent`]s to the trace sink.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Replaces the default [`LogTraceSink`].
    pub fn with_trace_sink(mut self, sink: impl TraceSink + 'static) -> Self {
        self.trace_sink = Arc::new(sink);
        self
    }

    pub fn length_in_words(&self) -> usize {
        self.length_in_words
    }

    pub fn backing_path(&self) -> &Path {
        &self.backing_path
    }

    pub fn word_size(&self) -> WordSize {
        self.word_size
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub(crate) fn trace_sink(&self) -> &Arc<dyn TraceSink> {
        &self.trace_sink
    }

    /// Opens and maps the region starting at `base_addr`.
    pub fn open(&self, base_addr: u64) -> Result<AlignedRegion> {
        AlignedRegion::open_with_options(base_addr, self)
    }
}

impl Default for RegionOptions {
    fn default() -> Self {
        RegionOptions::new()
    }
}

impl std::fmt::Debug for RegionOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionOptions")
            .field("length_in_words", &self.length_in_words)
            .field("backing_path", &self.backing_path)
            .field("word_size", &self.word_size)
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}
