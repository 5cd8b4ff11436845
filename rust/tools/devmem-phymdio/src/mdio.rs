//! MDIO controller access for TI CPSW-style Ethernet subsystems (Beaglebone, TI814x).
//!
//! The controller exposes a handful of status registers at the start of its window
//! and a USERACCESS register through which PHY (MII) registers are read: software
//! writes the register number together with the GO bit, and the controller clears GO
//! once the transaction has completed and the data field is valid.

use std::{
    io::Write,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use devmem::{AlignedRegion, RegionOptions, WordBuffer, WordSize};

/// MDIO controller base on AM335x.
pub const MDIO_BASE: u64 = 0x4A101000;

/// Words mapped starting at the controller base.
const MDIO_WINDOW_WORDS: usize = 0x100;

/// USERACCESS0 register offset.
const USERACCESS0: usize = 0x80;
const USERACCESS_GO: u32 = 1 << 31;
const USERACCESS_REGADDR_SHIFT: u32 = 21;
const USERACCESS_DATA_MASK: u32 = 0xffff;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(100);

pub const CPSW_REGISTER_NAMES: [&str; 4] = [
    "MDIO Version",
    "MDIO Control",
    "PHY Alive Status",
    "PHY Link Status",
];

pub const MII_REGISTER_NAMES: [&str; 32] = [
    "MII Basic Mode Control",
    "MII Basic Mode Status",
    "MII PHY ID 1",
    "MII PHY ID 2",
    "MII Advertisement Control",
    "MII Link Partner Ability",
    "MII Expansion",
    "MII Manf Specific",
    "MII Manf Specific",
    "MII 1000BASE-T Control",
    "MII 1000BASE-T Status",
    "MII Manf Specific",
    "MII Manf Specific",
    "MII Manf Specific",
    "MII Manf Specific",
    "MII Extended Status",
    "MII Manf Specific",
    "MII Manf Specific",
    "MII Disconnect Counter",
    "MII False Carrier Counter",
    "MII N-way Auto Neg Test",
    "MII Receive Error Counter",
    "MII Silicon Revision",
    "MII TPI Status for 10 Mbps",
    "MII Network Interface Config",
    "MII Manf Specific",
    "MII Manf Specific",
    "MII Manf Specific",
    "MII Manf Specific",
    "MII Manf Specific",
    "MII Manf Specific",
    "MII Manf Specific",
];

pub struct PhyMdio {
    region: AlignedRegion,
    timeout: Duration,
}

impl PhyMdio {
    /// Maps the controller window at `base_addr` through the backing resource named in
    /// `options`. Length and word size of `options` are overridden.
    pub fn open(base_addr: u64, options: &RegionOptions) -> Result<PhyMdio> {
        let region = options
            .clone()
            .with_length(MDIO_WINDOW_WORDS)
            .with_word_size(WordSize::Four)
            .open(base_addr)
            .with_context(|| format!("Failed to map MDIO controller at {base_addr:#x}"))?;
        Ok(PhyMdio {
            region,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reads controller status register `index` (0..4).
    pub fn cpsw_register(&self, index: usize) -> Result<WordBuffer> {
        anyhow::ensure!(
            index < CPSW_REGISTER_NAMES.len(),
            "CPSW register index {index} out of range"
        );
        Ok(self.region.read(index << 2, 1)?)
    }

    /// Reads PHY register `reg` (0..32) through USERACCESS0.
    ///
    /// The result is a single 16-bit word labelled with the register number.
    pub fn mii_register(&mut self, reg: u32) -> Result<WordBuffer> {
        anyhow::ensure!(
            (reg as usize) < MII_REGISTER_NAMES.len(),
            "MII register {reg} out of range"
        );
        self.region
            .write_word(USERACCESS0, USERACCESS_GO | (reg << USERACCESS_REGADDR_SHIFT))?;

        let deadline = Instant::now() + self.timeout;
        let mut value = self.region.read_word(USERACCESS0)?;
        while value & USERACCESS_GO != 0 {
            if Instant::now() >= deadline {
                anyhow::bail!(
                    "MDIO access to register {reg} did not complete within {:?}",
                    self.timeout
                );
            }
            std::thread::yield_now();
            value = self.region.read_word(USERACCESS0)?;
        }
        log::debug!("MII register {reg}: USERACCESS0 = {value:#010x}");

        Ok(WordBuffer::from_words(
            reg as u64,
            &[value & USERACCESS_DATA_MASK],
            WordSize::Two,
        )?)
    }

    /// Prints the controller status registers, a blank line, then all MII registers.
    pub fn dump(&mut self, out: &mut impl Write) -> Result<()> {
        for (index, name) in CPSW_REGISTER_NAMES.iter().enumerate() {
            let buf = self.cpsw_register(index)?;
            writeln!(out, "{:38} {}", format!("{name} Register:"), buf)?;
        }
        writeln!(out)?;
        for (reg, name) in MII_REGISTER_NAMES.iter().enumerate() {
            let buf = self.mii_register(reg as u32)?;
            writeln!(out, "{:38} {}", format!("{name} Register:"), buf)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use devmem_testkit::FakeMemory;

    use super::*;

    fn controller() -> FakeMemory {
        let mem = FakeMemory::covering(MDIO_BASE, 0x400).unwrap();
        mem.write_u32(MDIO_BASE, 0x00070104).unwrap();
        mem.write_u32(MDIO_BASE + 0x4, 0x40000059).unwrap();
        mem
    }

    #[test]
    fn test_cpsw_registers() {
        let mem = controller();
        let mdio = PhyMdio::open(MDIO_BASE, &mem.options()).unwrap();
        let version = mdio.cpsw_register(0).unwrap();
        assert_eq!(version.to_string(), "0x4a101000: 00070104");
        let control = mdio.cpsw_register(1).unwrap();
        assert_eq!(control.word_value(0).unwrap(), 0x40000059);
        assert!(mdio.cpsw_register(4).is_err());
    }

    #[test]
    fn test_mii_register_completes() {
        let mem = controller();
        let mut mdio = PhyMdio::open(MDIO_BASE, &mem.options())
            .unwrap()
            .with_timeout(Duration::from_secs(10));

        let buf = std::thread::scope(|s| {
            // Plays the controller: wait for GO, then complete the access.
            s.spawn(|| {
                let deadline = Instant::now() + Duration::from_secs(10);
                while Instant::now() < deadline {
                    let value = mem.read_u32(MDIO_BASE + 0x80).unwrap();
                    if value & USERACCESS_GO != 0 {
                        assert_eq!(value, USERACCESS_GO | (2 << 21));
                        mem.write_u32(MDIO_BASE + 0x80, (2 << 21) | 0x2000_0022)
                            .unwrap();
                        return;
                    }
                    std::thread::sleep(Duration::from_millis(1));
                }
            });
            mdio.mii_register(2).unwrap()
        });

        assert_eq!(buf.word_size(), WordSize::Two);
        assert_eq!(buf.word_value(0).unwrap(), 0x0022);
        assert_eq!(buf.to_string(), "0x00000002: 0022");
    }

    #[test]
    fn test_mii_register_times_out() {
        let mem = controller();
        let mut mdio = PhyMdio::open(MDIO_BASE, &mem.options())
            .unwrap()
            .with_timeout(Duration::from_millis(5));
        let err = mdio.mii_register(1).unwrap_err();
        assert!(err.to_string().contains("did not complete"));
        assert_eq!(
            mem.read_u32(MDIO_BASE + 0x80).unwrap(),
            USERACCESS_GO | (1 << 21)
        );
        assert!(mdio.mii_register(32).is_err());
    }

    #[test]
    fn test_dump() {
        let mem = controller();
        let mut mdio = PhyMdio::open(MDIO_BASE, &mem.options())
            .unwrap()
            .with_timeout(Duration::from_secs(10));

        let mut out = Vec::new();
        std::thread::scope(|s| {
            // Answers every PHY register read with the register number as data.
            s.spawn(|| {
                let deadline = Instant::now() + Duration::from_secs(30);
                let mut answered = 0;
                while answered < MII_REGISTER_NAMES.len() && Instant::now() < deadline {
                    let value = mem.read_u32(MDIO_BASE + 0x80).unwrap();
                    if value & USERACCESS_GO != 0 {
                        let reg = (value >> USERACCESS_REGADDR_SHIFT) & 0x1f;
                        mem.write_u32(MDIO_BASE + 0x80, (reg << USERACCESS_REGADDR_SHIFT) | reg)
                            .unwrap();
                        answered += 1;
                    } else {
                        std::thread::sleep(Duration::from_micros(100));
                    }
                }
            });
            mdio.dump(&mut out).unwrap();
        });

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4 + 1 + 32);
        assert_eq!(
            lines[0],
            format!("{:38} 0x4a101000: 00070104", "MDIO Version Register:")
        );
        assert_eq!(lines[4], "");
        assert_eq!(
            lines[5 + 3],
            format!("{:38} 0x00000003: 0003", "MII PHY ID 2 Register:")
        );
        assert!(lines[36].ends_with("0x0000001f: 001f"));
    }

    #[test]
    fn test_open_missing_backing_file() {
        let options = RegionOptions::new().with_backing_path("/nonexistent/devmem/backing");
        let err = PhyMdio::open(MDIO_BASE, &options).err().unwrap();
        assert!(
            err.downcast_ref::<devmem::Error>()
                .unwrap()
                .is_resource_unavailable()
        );
    }
}
