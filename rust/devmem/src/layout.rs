//! Address arithmetic mapping a requested register span onto a page-aligned mapping.
//!
//! The mapping call only accepts page-aligned file offsets, while callers ask for
//! arbitrary addresses. `RegionLayout` records both views and translates user
//! offsets (relative to the word-aligned requested base) into positions within the
//! mapping.
//!
//! ```text
//!  page_aligned_base        requested_base
//!  |                        |
//!  v                        v
//!  +------------------------+-----------------------------+---+
//!  |      base_offset       |  length_in_words * word_size | ^ |
//!  +------------------------+-----------------------------+---+
//!  <-------------------------- mapped_length ------------------>
//!                                                          word padding
//! ```

use devmem_common::{Result, error::Error, verify_arg};

use crate::word::WordSize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionLayout {
    requested_base: u64,
    page_aligned_base: u64,
    base_offset: usize,
    mapped_length: usize,
    word_size: WordSize,
    page_size: usize,
}

impl RegionLayout {
    /// Computes the layout for `length_in_words` words of `word_size` starting at
    /// `base_addr`, for a system with the given `page_size`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `page_size` is not a power of two, or if the end of
    /// the requested span overflows the address space.
    pub fn compute(
        base_addr: u64,
        length_in_words: usize,
        word_size: WordSize,
        page_size: usize,
    ) -> Result<RegionLayout> {
        verify_arg!(page_size, page_size.is_power_of_two());

        let page_aligned_base = base_addr & !(page_size as u64 - 1);
        let base_offset = (base_addr - page_aligned_base) as usize;

        let stop = length_in_words
            .checked_mul(word_size.bytes())
            .and_then(|len| base_addr.checked_add(len as u64))
            .and_then(|stop| word_size.align_up(stop))
            .ok_or_else(|| {
                Error::invalid_arg(
                    "length_in_words",
                    format!("span of {length_in_words} words at {base_addr:#x} overflows"),
                )
            })?;
        let mapped_length = usize::try_from(stop - page_aligned_base).map_err(|_| {
            Error::invalid_arg("length_in_words", "mapped length does not fit usize")
        })?;

        Ok(RegionLayout {
            requested_base: base_addr,
            page_aligned_base,
            base_offset,
            mapped_length,
            word_size,
            page_size,
        })
    }

    #[inline]
    pub fn requested_base(&self) -> u64 {
        self.requested_base
    }

    /// `requested_base` rounded down to the page size; the offset handed to `mmap`.
    #[inline]
    pub fn page_aligned_base(&self) -> u64 {
        self.page_aligned_base
    }

    /// Distance from `page_aligned_base` to `requested_base`, in `[0, page_size)`.
    #[inline]
    pub fn base_offset(&self) -> usize {
        self.base_offset
    }

    /// `base_offset` with its sub-word bits cleared. User offsets are relative to this
    /// point, so offset 0 is always a word boundary.
    #[inline]
    pub fn word_aligned_offset(&self) -> usize {
        self.word_size.align_down(self.base_offset)
    }

    #[inline]
    pub fn mapped_length(&self) -> usize {
        self.mapped_length
    }

    #[inline]
    pub fn word_size(&self) -> WordSize {
        self.word_size
    }

    #[inline]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Position within the mapping of the user `offset`, or `None` on overflow.
    #[inline]
    pub fn position(&self, offset: usize) -> Option<usize> {
        self.word_aligned_offset().checked_add(offset)
    }

    /// Absolute address of the user `offset`.
    #[inline]
    pub fn absolute_address(&self, offset: usize) -> u64 {
        self.page_aligned_base
            .wrapping_add(self.word_aligned_offset() as u64)
            .wrapping_add(offset as u64)
    }

    /// Validates that `byte_count` bytes starting at the user `offset` fall within the
    /// mapping, and returns the mapping position of the first byte.
    pub fn check_span(&self, offset: usize, byte_count: usize) -> Result<usize> {
        let position = self.position(offset);
        match position.and_then(|p| p.checked_add(byte_count).map(|end| (p, end))) {
            Some((position, end)) if end <= self.mapped_length => Ok(position),
            Some((_, end)) => Err(Error::out_of_range(
                "mapped span end",
                end,
                self.mapped_length,
            )),
            None => Err(Error::out_of_range(
                "mapped span end",
                usize::MAX,
                self.mapped_length,
            )),
        }
    }
}
