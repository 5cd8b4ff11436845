//! Word granularity of register accesses.

use std::str::FromStr;

use byteorder::{BigEndian, ByteOrder, NativeEndian};
use devmem_common::{Result, error::Error};

/// Width of a single register access in bytes.
///
/// Every read and write performed through an [`crate::AlignedRegion`] is issued as
/// one bus transaction of exactly this width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[repr(u8)]
pub enum WordSize {
    One = 1,
    Two = 2,
    #[default]
    Four = 4,
}

impl WordSize {
    pub const ALL: [WordSize; 3] = [WordSize::One, WordSize::Two, WordSize::Four];

    #[inline]
    pub const fn bytes(self) -> usize {
        self as usize
    }

    /// Mask that clears the sub-word bits of an offset.
    #[inline]
    pub const fn mask(self) -> usize {
        !(self.bytes() - 1)
    }

    /// Number of hex digits needed to render one word.
    #[inline]
    pub const fn hex_width(self) -> usize {
        self.bytes() * 2
    }

    /// Largest value representable in one word.
    #[inline]
    pub const fn max_value(self) -> u32 {
        match self {
            WordSize::One => u8::MAX as u32,
            WordSize::Two => u16::MAX as u32,
            WordSize::Four => u32::MAX,
        }
    }

    #[inline]
    pub const fn is_aligned(self, offset: usize) -> bool {
        offset & !self.mask() == 0
    }

    #[inline]
    pub const fn align_down(self, offset: usize) -> usize {
        offset & self.mask()
    }

    /// Rounds `addr` up to the next word boundary, or `None` on overflow.
    #[inline]
    pub fn align_up(self, addr: u64) -> Option<u64> {
        let low = self.bytes() as u64 - 1;
        addr.checked_add(low).map(|a| a & !low)
    }

    /// Encodes `value` into `out` most-significant byte first.
    #[inline]
    pub(crate) fn encode(self, value: u32, out: &mut [u8]) {
        BigEndian::write_uint(out, value as u64, self.bytes());
    }

    /// Decodes a word stored most-significant byte first.
    #[inline]
    pub(crate) fn decode(self, bytes: &[u8]) -> u32 {
        BigEndian::read_uint(bytes, self.bytes()) as u32
    }

    /// Encodes `value` into `out` in the platform's in-memory byte order.
    #[inline]
    pub(crate) fn encode_native(self, value: u32, out: &mut [u8]) {
        NativeEndian::write_uint(out, value as u64, self.bytes());
    }

    /// Decodes a word laid out in the platform's in-memory byte order.
    #[inline]
    pub(crate) fn decode_native(self, bytes: &[u8]) -> u32 {
        NativeEndian::read_uint(bytes, self.bytes()) as u32
    }
}

impl TryFrom<usize> for WordSize {
    type Error = Error;

    fn try_from(value: usize) -> Result<Self> {
        match value {
            1 => Ok(WordSize::One),
            2 => Ok(WordSize::Two),
            4 => Ok(WordSize::Four),
            _ => Err(Error::invalid_arg(
                "word_size",
                format!("{value} is not one of 1, 2, 4"),
            )),
        }
    }
}

impl TryFrom<u8> for WordSize {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        WordSize::try_from(value as usize)
    }
}

impl FromStr for WordSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let value = s
            .trim()
            .parse::<usize>()
            .map_err(|e| Error::invalid_arg("word_size", format!("'{s}': {e}")))?;
        WordSize::try_from(value)
    }
}

impl std::fmt::Display for WordSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.bytes())
    }
}
