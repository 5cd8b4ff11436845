use std::io::Write;

use anyhow::{Context, Result};
use devmem::{RegionOptions, WordSize};

use crate::commands::WORDS_PER_ROW;

pub fn run(
    addr: u64,
    count: usize,
    options: &RegionOptions,
    display_word_size: WordSize,
    out: &mut impl Write,
) -> Result<()> {
    let region = options
        .clone()
        .with_length(count)
        .open(addr)
        .with_context(|| {
            format!(
                "Failed to map {count} words at {addr:#x} from {}",
                options.backing_path().display()
            )
        })?;

    let buf = region
        .read(0, count)
        .with_context(|| format!("Failed to read {count} words at {addr:#x}"))?
        .with_word_size(display_word_size)?;
    writeln!(out, "{}", buf.render_hex(WORDS_PER_ROW)?)?;
    Ok(())
}
