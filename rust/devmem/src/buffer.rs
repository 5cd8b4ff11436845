//! Immutable word-sized views over bytes returned by a region read.

use devmem_common::{Result, error::Error, verify_arg};

use crate::word::WordSize;

/// Snapshot of consecutive register words.
///
/// Words are stored most-significant byte first regardless of the platform's byte
/// order, so the bytes returned by [`WordBuffer::word_at`] read left to right as the
/// register value, and [`WordBuffer::render_hex`] prints the values as they appear on
/// the bus. A buffer never aliases the mapping it was read from; changing registers
/// requires [`crate::AlignedRegion::write`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WordBuffer {
    /// Absolute address of `data[0]`, used for display.
    base_addr: u64,
    data: Box<[u8]>,
    word_size: WordSize,
}

impl WordBuffer {
    /// Creates a buffer from raw word bytes (most-significant byte first).
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the data length is not a multiple of the word size.
    pub fn new(base_addr: u64, data: impl Into<Vec<u8>>, word_size: WordSize) -> Result<Self> {
        let data = data.into();
        verify_arg!(data, data.len() % word_size.bytes() == 0);
        Ok(WordBuffer::from_parts(base_addr, data, word_size))
    }

    /// Creates a buffer holding the given word values.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if a value does not fit the word size.
    pub fn from_words(base_addr: u64, words: &[u32], word_size: WordSize) -> Result<Self> {
        let word = word_size.bytes();
        let mut data = vec![0u8; words.len() * word];
        for (&value, chunk) in words.iter().zip(data.chunks_exact_mut(word)) {
            if value > word_size.max_value() {
                return Err(Error::invalid_arg(
                    "words",
                    format!("value {value:#x} does not fit a {word}-byte word"),
                ));
            }
            word_size.encode(value, chunk);
        }
        Ok(WordBuffer::from_parts(base_addr, data, word_size))
    }

    pub(crate) fn from_parts(base_addr: u64, data: Vec<u8>, word_size: WordSize) -> Self {
        debug_assert_eq!(data.len() % word_size.bytes(), 0);
        WordBuffer {
            base_addr,
            data: data.into_boxed_slice(),
            word_size,
        }
    }

    /// Number of whole words held.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len() / self.word_size.bytes()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn base_addr(&self) -> u64 {
        self.base_addr
    }

    #[inline]
    pub fn word_size(&self) -> WordSize {
        self.word_size
    }

    /// Returns the bytes of word `index`.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` if `index >= self.len()`.
    pub fn word_at(&self, index: usize) -> Result<&[u8]> {
        let word = self.word_size.bytes();
        match index
            .checked_add(1)
            .and_then(|n| n.checked_mul(word))
            .filter(|&end| end <= self.data.len())
        {
            Some(end) => Ok(&self.data[end - word..end]),
            None => Err(Error::out_of_range("word index", index, self.len())),
        }
    }

    /// Returns the value of word `index`.
    pub fn word_value(&self, index: usize) -> Result<u32> {
        self.word_at(index).map(|bytes| self.word_size.decode(bytes))
    }

    /// Iterates over the word values.
    pub fn words(&self) -> impl Iterator<Item = u32> + '_ {
        self.data
            .chunks_exact(self.word_size.bytes())
            .map(|bytes| self.word_size.decode(bytes))
    }

    /// Buffers are snapshots; in-place mutation always fails with `Unsupported`.
    pub fn set_word(&mut self, index: usize, value: u32) -> Result<()> {
        Err(Error::unsupported(format!(
            "set_word({index}, {value:#x}): WordBuffer is immutable"
        )))
    }

    /// Returns a copy of this buffer labelled with a different display address.
    pub fn with_base_addr(&self, base_addr: u64) -> WordBuffer {
        WordBuffer {
            base_addr,
            data: self.data.clone(),
            word_size: self.word_size,
        }
    }

    /// Returns the same memory regrouped into words of `word_size`.
    ///
    /// Bytes keep their address order, so on a little-endian host a 32-bit register
    /// holding `0x12345678` regroups into the 16-bit words `5678 1234`, exactly what
    /// two 16-bit loads at the same addresses would return.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the byte length is not a multiple of `word_size`.
    pub fn with_word_size(&self, word_size: WordSize) -> Result<WordBuffer> {
        if word_size == self.word_size {
            return Ok(self.clone());
        }
        verify_arg!(word_size, self.data.len() % word_size.bytes() == 0);

        let mut memory = vec![0u8; self.data.len()];
        for (src, dst) in self
            .data
            .chunks_exact(self.word_size.bytes())
            .zip(memory.chunks_exact_mut(self.word_size.bytes()))
        {
            self.word_size.encode_native(self.word_size.decode(src), dst);
        }
        for chunk in memory.chunks_exact_mut(word_size.bytes()) {
            let value = word_size.decode_native(chunk);
            word_size.encode(value, chunk);
        }
        Ok(WordBuffer::from_parts(self.base_addr, memory, word_size))
    }

    /// Renders the buffer as a hex dump with `words_per_row` words per line.
    ///
    /// Each line starts with the address of its first word, followed by the words as
    /// zero-padded hex of `2 * word_size` digits. The address column is 8 digits
    /// wide when every address in the buffer fits 32 bits and 16 digits otherwise,
    /// so all rows of one dump line up:
    ///
    /// ```text
    /// 0x4a101080: 00000001 0000002a
    /// ```
    ///
    /// Lines are joined with `\n` without a trailing newline; an empty buffer renders
    /// as an empty string.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `words_per_row` is zero.
    pub fn render_hex(&self, words_per_row: usize) -> Result<String> {
        verify_arg!(words_per_row, words_per_row > 0);
        let mut out = String::with_capacity(self.rendered_len_hint(words_per_row));
        // Writing into a String cannot fail.
        let _ = self.write_hex(&mut out, words_per_row);
        Ok(out)
    }

    fn write_hex(&self, out: &mut impl std::fmt::Write, words_per_row: usize) -> std::fmt::Result {
        let width = self.word_size.hex_width();
        let addr_width = self.address_width();
        let row_bytes = words_per_row.saturating_mul(self.word_size.bytes());
        for (row_index, row) in self.data.chunks(row_bytes).enumerate() {
            if row_index > 0 {
                out.write_char('\n')?;
            }
            let addr = self
                .base_addr
                .wrapping_add((row_index as u64).wrapping_mul(row_bytes as u64));
            write!(out, "0x{addr:0addr_width$x}:")?;
            for bytes in row.chunks_exact(self.word_size.bytes()) {
                write!(out, " {:0width$x}", self.word_size.decode(bytes))?;
            }
        }
        Ok(())
    }

    fn address_width(&self) -> usize {
        let last = self
            .base_addr
            .saturating_add((self.data.len() as u64).saturating_sub(1));
        if last <= u32::MAX as u64 { 8 } else { 16 }
    }

    fn rendered_len_hint(&self, words_per_row: usize) -> usize {
        let rows = self.len().div_ceil(words_per_row);
        rows * (self.address_width() + 5) + self.len() * (self.word_size.hex_width() + 1)
    }
}

impl std::fmt::Display for WordBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.write_hex(f, 4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_access() {
        let buf = WordBuffer::new(0x1000, vec![0, 0, 0, 1, 0xde, 0xad, 0xbe, 0xef], WordSize::Four)
            .unwrap();
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.byte_len(), 8);
        assert_eq!(buf.word_at(0).unwrap(), &[0, 0, 0, 1]);
        assert_eq!(buf.word_at(1).unwrap(), &[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(buf.word_value(1).unwrap(), 0xdeadbeef);
        assert!(buf.word_at(2).unwrap_err().is_out_of_range());
        assert!(buf.word_at(usize::MAX).unwrap_err().is_out_of_range());
        assert_eq!(buf.words().collect::<Vec<_>>(), vec![1, 0xdeadbeef]);
    }

    #[test]
    fn test_new_rejects_partial_word() {
        let err = WordBuffer::new(0, vec![1, 2, 3], WordSize::Two).unwrap_err();
        assert!(err.is_invalid_arg());
        assert!(WordBuffer::new(0, vec![1, 2, 3], WordSize::One).is_ok());
    }

    #[test]
    fn test_immutable() {
        let mut buf = WordBuffer::from_words(0, &[7], WordSize::Four).unwrap();
        assert!(buf.set_word(0, 1).unwrap_err().is_unsupported());
        assert_eq!(buf.word_value(0).unwrap(), 7);
    }

    #[test]
    fn test_from_words_checks_width() {
        let buf = WordBuffer::from_words(0x10, &[0xff, 0x1], WordSize::One).unwrap();
        assert_eq!(buf.as_bytes(), &[0xff, 0x01]);
        assert!(
            WordBuffer::from_words(0x10, &[0x100], WordSize::One)
                .unwrap_err()
                .is_invalid_arg()
        );
    }

    #[test]
    fn test_render_single_word() {
        let buf = WordBuffer::new(0x4A101080, vec![0x00, 0x00, 0x00, 0x2A], WordSize::Four).unwrap();
        let text = buf.render_hex(1).unwrap();
        assert_eq!(text, "0x4a101080: 0000002a");
        assert!(text.ends_with(" 0000002a"));
    }

    #[test]
    fn test_render_rows() {
        let words: Vec<u32> = (0..10).collect();
        let buf = WordBuffer::from_words(0x2000, &words, WordSize::Two).unwrap();
        let text = buf.render_hex(4).unwrap();
        assert_eq!(
            text,
            "0x00002000: 0000 0001 0002 0003\n\
             0x00002008: 0004 0005 0006 0007\n\
             0x00002010: 0008 0009"
        );
        assert_eq!(text.lines().count(), buf.len().div_ceil(4));
        assert!(!text.ends_with('\n'));
        assert_eq!(text, buf.render_hex(4).unwrap());
        assert_eq!(buf.to_string(), text);
    }

    #[test]
    fn test_render_byte_words() {
        let buf = WordBuffer::new(0x10, vec![0xa, 0xb, 0xc], WordSize::One).unwrap();
        assert_eq!(buf.render_hex(2).unwrap(), "0x00000010: 0a 0b\n0x00000012: 0c");
    }

    #[test]
    fn test_render_edge_cases() {
        let empty = WordBuffer::new(0x10, Vec::new(), WordSize::Four).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.render_hex(4).unwrap(), "");
        let buf = WordBuffer::from_words(0, &[1], WordSize::Four).unwrap();
        assert!(buf.render_hex(0).unwrap_err().is_invalid_arg());
    }

    #[test]
    fn test_address_column_above_4gib() {
        let buf = WordBuffer::from_words(0xffff_fff8, &[1, 2, 3], WordSize::Four).unwrap();
        assert_eq!(
            buf.render_hex(1).unwrap(),
            "0x00000000fffffff8: 00000001
             0x00000000fffffffc: 00000002
             0x0000000100000000: 00000003"
        );

        let buf = WordBuffer::from_words(0xffff_fff8, &[1, 2], WordSize::Four).unwrap();
        assert_eq!(buf.render_hex(2).unwrap(), "0xfffffff8: 00000001 00000002");
    }

    #[test]
    fn test_regroup_words() {
        let buf = WordBuffer::new(0x1000, vec![0xaa, 0xbb, 0xcc, 0xdd], WordSize::One).unwrap();
        let same = buf.with_word_size(WordSize::One).unwrap();
        assert_eq!(same, buf);

        // Address order is preserved through any number of regroupings.
        let back = buf
            .with_word_size(WordSize::Four)
            .unwrap()
            .with_word_size(WordSize::Two)
            .unwrap()
            .with_word_size(WordSize::One)
            .unwrap();
        assert_eq!(back, buf);
        assert_eq!(back.render_hex(4).unwrap(), "0x00001000: aa bb cc dd");

        let odd = WordBuffer::new(0x1000, vec![1, 2, 3], WordSize::One).unwrap();
        assert!(odd.with_word_size(WordSize::Two).unwrap_err().is_invalid_arg());
    }

    #[cfg(target_endian = "little")]
    #[test]
    fn test_regroup_register_value() {
        let buf = WordBuffer::from_words(0x1000, &[0x12345678], WordSize::Four).unwrap();
        let halves = buf.with_word_size(WordSize::Two).unwrap();
        assert_eq!(halves.words().collect::<Vec<_>>(), vec![0x5678, 0x1234]);
        assert_eq!(halves.render_hex(4).unwrap(), "0x00001000: 5678 1234");
        let bytes = buf.with_word_size(WordSize::One).unwrap();
        assert_eq!(bytes.to_string(), "0x00001000: 78 56 34 12");
    }

    #[test]
    fn test_with_base_addr() {
        let buf = WordBuffer::from_words(0x4A101080, &[0x1234], WordSize::Two).unwrap();
        let relabeled = buf.with_base_addr(0x3);
        assert_eq!(relabeled.base_addr(), 0x3);
        assert_eq!(buf.base_addr(), 0x4A101080);
        assert_eq!(relabeled.render_hex(1).unwrap(), "0x00000003: 1234");
    }
}
