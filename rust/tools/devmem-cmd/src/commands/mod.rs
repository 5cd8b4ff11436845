//! Command implementations for the devmem tool

use std::io::Write;

use anyhow::Result;
use devmem::{RegionOptions, WordSize};

pub mod read;
pub mod write;

/// Words rendered per line of the hex dump.
pub const WORDS_PER_ROW: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read { addr: u64, count: usize },
    Write { addr: u64, value: u32 },
}

/// Runs `operation` against a region opened from `options`. Dumps are regrouped
/// into `display_word_size` words; the register accesses themselves use the word
/// size of `options`.
pub fn run(
    operation: Operation,
    options: &RegionOptions,
    display_word_size: WordSize,
    verbose: bool,
    out: &mut impl Write,
) -> Result<()> {
    match operation {
        Operation::Read { addr, count } => {
            read::run(addr, count, options, display_word_size, out)
        }
        Operation::Write { addr, value } => {
            write::run(addr, value, options, display_word_size, verbose, out)
        }
    }
}
