//! Word-granular access to a memory-mapped register range.

use std::{
    fs::{File, OpenOptions},
    path::{Path, PathBuf},
    sync::Arc,
};

use devmem_common::{Result, error::Error, verify_arg};
use devmem_page_map::SharedMapping;

use crate::{
    buffer::WordBuffer,
    layout::RegionLayout,
    options::RegionOptions,
    trace::{TraceEvent, TraceSink},
    word::WordSize,
};

/// An open, mapped register range of a backing resource.
///
/// The backing handle and the mapping are acquired together in [`AlignedRegion::open`]
/// and released together when the region is dropped or [`AlignedRegion::close`]d.
/// User offsets passed to [`read`](Self::read) and [`write`](Self::write) are relative
/// to the requested base address rounded down to a word boundary.
///
/// Accesses are volatile and issued one word at a time, never coalesced. Nothing
/// arbitrates between regions that map overlapping physical ranges; callers must
/// serialize such accesses themselves.
pub struct AlignedRegion {
    layout: RegionLayout,
    // Field order matters: the mapping is released before the handle is closed.
    mapping: SharedMapping,
    file: File,
    backing_path: PathBuf,
    debug: bool,
    trace_sink: Arc<dyn TraceSink>,
}

impl AlignedRegion {
    /// Opens `backing_path` and maps `length_in_words` words of `word_size` starting at
    /// `base_addr`.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if the requested span overflows the address space, or its
    ///   page-aligned base is beyond the largest offset the platform can map.
    /// - `ResourceUnavailable` if the backing resource cannot be opened for read and
    ///   write, or the range cannot be mapped.
    pub fn open(
        base_addr: u64,
        length_in_words: usize,
        backing_path: impl AsRef<Path>,
        word_size: WordSize,
    ) -> Result<AlignedRegion> {
        RegionOptions::new()
            .with_length(length_in_words)
            .with_backing_path(backing_path.as_ref())
            .with_word_size(word_size)
            .open(base_addr)
    }

    pub fn open_with_options(base_addr: u64, options: &RegionOptions) -> Result<AlignedRegion> {
        let layout = RegionLayout::compute(
            base_addr,
            options.length_in_words(),
            options.word_size(),
            SharedMapping::page_size(),
        )?;
        if layout.page_aligned_base() > SharedMapping::max_offset() {
            return Err(Error::invalid_arg(
                "base_addr",
                format!(
                    "{base_addr:#x} is beyond the largest mappable offset {:#x}",
                    SharedMapping::max_offset()
                ),
            ));
        }
        let backing_path = options.backing_path().to_path_buf();

        let file = open_sync(&backing_path)
            .map_err(|e| Error::resource_unavailable(&backing_path, e))?;
        // mmap rejects empty mappings; an empty span still maps a single page.
        let mapping = SharedMapping::map(
            &file,
            layout.page_aligned_base(),
            layout.mapped_length().max(1),
        )
        .map_err(|e| Error::resource_unavailable(&backing_path, e))?;

        let region = AlignedRegion {
            layout,
            mapping,
            file,
            backing_path,
            debug: options.debug(),
            trace_sink: options.trace_sink().clone(),
        };
        region.trace(|| TraceEvent::Mapped {
            path: region.backing_path.clone(),
            page_aligned_base: layout.page_aligned_base(),
            mapped_length: layout.mapped_length(),
        });
        Ok(region)
    }

    #[inline]
    pub fn layout(&self) -> &RegionLayout {
        &self.layout
    }

    #[inline]
    pub fn word_size(&self) -> WordSize {
        self.layout.word_size()
    }

    pub fn backing_path(&self) -> &Path {
        &self.backing_path
    }

    #[inline]
    pub fn requested_base(&self) -> u64 {
        self.layout.requested_base()
    }

    #[inline]
    pub fn page_aligned_base(&self) -> u64 {
        self.layout.page_aligned_base()
    }

    #[inline]
    pub fn base_offset(&self) -> usize {
        self.layout.base_offset()
    }

    #[inline]
    pub fn mapped_length(&self) -> usize {
        self.layout.mapped_length()
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Reads `length_in_words` words starting at the user `offset`.
    ///
    /// The returned buffer is labelled with the absolute address of `offset` and is
    /// independent of the region once returned.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` if the span does not lie entirely within the mapping; no
    /// memory is touched in that case.
    pub fn read(&self, offset: usize, length_in_words: usize) -> Result<WordBuffer> {
        let word_size = self.word_size();
        let word = word_size.bytes();
        let byte_count = length_in_words.checked_mul(word).ok_or_else(|| {
            Error::invalid_arg("length_in_words", "byte count overflows usize")
        })?;
        let position = self.layout.check_span(offset, byte_count)?;
        debug_assert!(position + byte_count <= self.mapping.byte_len());

        self.trace(|| TraceEvent::Read { offset, byte_count });

        let mut data = vec![0u8; byte_count];
        let aligned = word_size.is_aligned(position);
        for (i, chunk) in data.chunks_exact_mut(word).enumerate() {
            let value = unsafe {
                let ptr = self.mapping.as_ptr().add(position + i * word);
                if aligned {
                    load_word(ptr, word_size)
                } else {
                    load_word_bytewise(ptr, word_size)
                }
            };
            word_size.encode(value, chunk);
        }

        Ok(WordBuffer::from_parts(
            self.layout.absolute_address(offset),
            data,
            word_size,
        ))
    }

    /// Writes `words` in order starting at the user `offset`, one word-sized store per
    /// element.
    ///
    /// # Errors
    ///
    /// All checks happen before the first store:
    /// - `InvalidArgument` if `words` is empty or a value does not fit the word size.
    /// - `AlignmentViolation` if `offset` is not a multiple of the word size.
    /// - `OutOfRange` if the span does not lie entirely within the mapping.
    pub fn write(&mut self, offset: usize, words: &[u32]) -> Result<()> {
        verify_arg!(words, !words.is_empty());

        let word_size = self.word_size();
        let word = word_size.bytes();
        if !word_size.is_aligned(offset) {
            return Err(Error::alignment(offset, word));
        }
        if let Some(value) = words.iter().find(|&&v| v > word_size.max_value()) {
            return Err(Error::invalid_arg(
                "words",
                format!("value {value:#x} does not fit a {word}-byte word"),
            ));
        }
        let byte_count = words
            .len()
            .checked_mul(word)
            .ok_or_else(|| Error::invalid_arg("words", "byte count overflows usize"))?;
        let position = self.layout.check_span(offset, byte_count)?;
        debug_assert!(position + byte_count <= self.mapping.byte_len());

        self.trace(|| TraceEvent::Write { offset, byte_count });

        for (i, &value) in words.iter().enumerate() {
            let word_position = position + i * word;
            self.trace(|| TraceEvent::WordWritten {
                position: word_position,
                value,
            });
            unsafe {
                store_word(self.mapping.as_ptr().add(word_position), word_size, value);
            }
        }
        Ok(())
    }

    /// Reads the single word at the user `offset`.
    pub fn read_word(&self, offset: usize) -> Result<u32> {
        self.read(offset, 1)?.word_value(0)
    }

    /// Writes a single word at the user `offset`.
    pub fn write_word(&mut self, offset: usize, value: u32) -> Result<()> {
        self.write(offset, &[value])
    }

    /// Read-modify-write of the word at the user `offset`. Returns the value written.
    pub fn modify_word<F>(&mut self, offset: usize, f: F) -> Result<u32>
    where
        F: FnOnce(u32) -> u32,
    {
        let value = f(self.read_word(offset)?);
        self.write_word(offset, value)?;
        Ok(value)
    }

    /// Releases the mapping and closes the backing handle, reporting a failed unmap.
    ///
    /// Dropping the region releases the same resources but can only log failures.
    pub fn close(self) -> Result<()> {
        let AlignedRegion {
            mapping,
            file,
            backing_path,
            ..
        } = self;
        let res = mapping.unmap();
        drop(file);
        res.map_err(|e| Error::io(format!("unmap {}", backing_path.display()), e))
    }

    #[inline]
    fn trace<F>(&self, event: F)
    where
        F: FnOnce() -> TraceEvent,
    {
        if self.debug {
            self.trace_sink.record(&event());
        }
    }
}

impl std::fmt::Debug for AlignedRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlignedRegion")
            .field("layout", &self.layout)
            .field("mapping", &self.mapping)
            .field("file", &self.file)
            .field("backing_path", &self.backing_path)
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

/// Opens `path` for read and write with synchronous writes.
fn open_sync(path: &Path) -> std::io::Result<File> {
    let mut options = OpenOptions::new();
    options.read(true).write(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.custom_flags(libc::O_SYNC);
    }
    options.open(path)
}

/// Loads one word with a single volatile access of the word's width.
///
/// # Safety
///
/// `ptr` must be valid for reads of `word_size` bytes and aligned to `word_size`.
#[inline]
unsafe fn load_word(ptr: *const u8, word_size: WordSize) -> u32 {
    unsafe {
        match word_size {
            WordSize::One => std::ptr::read_volatile(ptr) as u32,
            WordSize::Two => std::ptr::read_volatile(ptr as *const u16) as u32,
            WordSize::Four => std::ptr::read_volatile(ptr as *const u32),
        }
    }
}

/// Loads one word from a position that is not word aligned, one byte at a time.
///
/// # Safety
///
/// `ptr` must be valid for reads of `word_size` bytes.
#[inline]
unsafe fn load_word_bytewise(ptr: *const u8, word_size: WordSize) -> u32 {
    let mut bytes = [0u8; 4];
    for (i, byte) in bytes.iter_mut().take(word_size.bytes()).enumerate() {
        *byte = unsafe { std::ptr::read_volatile(ptr.add(i)) };
    }
    word_size.decode_native(&bytes[..word_size.bytes()])
}

/// Stores one word with a single volatile access of the word's width.
///
/// # Safety
///
/// `ptr` must be valid for writes of `word_size` bytes and aligned to `word_size`, and
/// `value` must fit the word.
#[inline]
unsafe fn store_word(ptr: *mut u8, word_size: WordSize, value: u32) {
    unsafe {
        match word_size {
            WordSize::One => std::ptr::write_volatile(ptr, value as u8),
            WordSize::Two => std::ptr::write_volatile(ptr as *mut u16, value as u16),
            WordSize::Four => std::ptr::write_volatile(ptr as *mut u32, value),
        }
    }
}
