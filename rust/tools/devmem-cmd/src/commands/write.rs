use std::io::Write;

use anyhow::{Context, Result};
use devmem::{RegionOptions, WordSize};

use crate::commands::WORDS_PER_ROW;

pub fn run(
    addr: u64,
    value: u32,
    options: &RegionOptions,
    display_word_size: WordSize,
    verbose: bool,
    out: &mut impl Write,
) -> Result<()> {
    let mut region = options.clone().with_length(1).open(addr).with_context(|| {
        format!(
            "Failed to map {addr:#x} from {}",
            options.backing_path().display()
        )
    })?;

    if verbose {
        let before = region.read(0, 1)?.with_word_size(display_word_size)?;
        writeln!(out, "Value before write:\t{}", before.render_hex(WORDS_PER_ROW)?)?;
    }

    region
        .write(0, &[value])
        .with_context(|| format!("Failed to write {value:#x} at {addr:#x}"))?;

    if verbose {
        let after = region.read(0, 1)?.with_word_size(display_word_size)?;
        writeln!(out, "Value after write:\t{}", after.render_hex(WORDS_PER_ROW)?)?;
    }

    region.close()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use devmem::WordSize;
    use devmem_testkit::FakeMemory;

    #[test]
    fn test_write_verbose() {
        let mem = FakeMemory::new(0x4000).unwrap();
        mem.write_u32(0x1080, 0x1).unwrap();

        let mut out = Vec::new();
        super::run(0x1080, 0x2a, &mem.options(), WordSize::Four, true, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Value before write:\t0x00001080: 00000001\nValue after write:\t0x00001080: 0000002a\n"
        );
        assert_eq!(mem.read_u32(0x1080).unwrap(), 0x2a);
    }

    #[test]
    fn test_write_quiet() {
        let mem = FakeMemory::new(0x4000).unwrap();
        let mut out = Vec::new();
        super::run(0x2000, 0xcafe, &mem.options(), WordSize::Four, false, &mut out).unwrap();
        assert!(out.is_empty());
        assert_eq!(mem.read_u32(0x2000).unwrap(), 0xcafe);
    }

    #[test]
    fn test_write_full_word_with_byte_display() {
        let mem = FakeMemory::new(0x4000).unwrap();
        mem.write_bytes(0x2000, &[0xa5; 8]).unwrap();

        let mut out = Vec::new();
        super::run(0x2000, 0x12345678, &mem.options(), WordSize::One, true, &mut out).unwrap();
        assert_eq!(mem.read_u32(0x2000).unwrap(), 0x12345678);
        assert_eq!(mem.read_bytes(0x2004, 4).unwrap(), vec![0xa5; 4]);

        let expected_after = 0x12345678u32
            .to_ne_bytes()
            .iter()
            .map(|b| format!(" {b:02x}"))
            .collect::<String>();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!(
                "Value before write:\t0x00002000: a5 a5 a5 a5\n\
                 Value after write:\t0x00002000:{expected_after}\n"
            )
        );
    }
}
