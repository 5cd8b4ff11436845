use std::{
    io::{Read, Seek, SeekFrom, Write},
    path::Path,
};

use devmem::RegionOptions;
use tempfile::NamedTempFile;

/// A sparse temporary file standing in for a physical address space.
///
/// File offset `n` corresponds to physical address `n`. Only touched pages consume
/// disk space, so a fake memory can span peripheral addresses in the GB range.
pub struct FakeMemory {
    file: NamedTempFile,
    size: u64,
}

impl FakeMemory {
    /// Creates a zero-filled fake memory of `size` bytes.
    pub fn new(size: u64) -> anyhow::Result<FakeMemory> {
        let file = NamedTempFile::new()?;
        file.as_file().set_len(size)?;
        Ok(FakeMemory { file, size })
    }

    /// Creates a fake memory large enough to map `len` bytes at `base_addr`, plus 64KB
    /// so that the largest common page size still fits past the end.
    pub fn covering(base_addr: u64, len: usize) -> anyhow::Result<FakeMemory> {
        let end = base_addr
            .checked_add(len as u64)
            .and_then(|end| end.checked_add(64 * 1024))
            .ok_or_else(|| anyhow::anyhow!("fake memory end overflows"))?;
        FakeMemory::new(end)
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Region options pointing at this fake memory.
    pub fn options(&self) -> RegionOptions {
        RegionOptions::new().with_backing_path(self.path())
    }

    /// Reads `len` raw bytes at `addr`, bypassing any mapping.
    pub fn read_bytes(&self, addr: u64, len: usize) -> anyhow::Result<Vec<u8>> {
        let mut file = self.file.as_file();
        file.seek(SeekFrom::Start(addr))?;
        let mut buf = vec![0u8; len];
        file.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Writes raw bytes at `addr`, bypassing any mapping.
    pub fn write_bytes(&self, addr: u64, data: &[u8]) -> anyhow::Result<()> {
        let mut file = self.file.as_file();
        file.seek(SeekFrom::Start(addr))?;
        file.write_all(data)?;
        file.flush()?;
        Ok(())
    }

    /// Reads the 32-bit word at `addr` in the platform's in-memory byte order.
    pub fn read_u32(&self, addr: u64) -> anyhow::Result<u32> {
        let bytes = self.read_bytes(addr, 4)?;
        Ok(u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Stores a 32-bit word at `addr` in the platform's in-memory byte order, the way
    /// a device would present a register value.
    pub fn write_u32(&self, addr: u64, value: u32) -> anyhow::Result<()> {
        self.write_bytes(addr, &value.to_ne_bytes())
    }
}

impl std::fmt::Debug for FakeMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeMemory")
            .field("path", &self.path())
            .field("size", &self.size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::FakeMemory;

    #[test]
    fn test_raw_access() {
        let mem = FakeMemory::new(0x4000).unwrap();
        assert_eq!(mem.size(), 0x4000);
        assert_eq!(mem.read_u32(0x1000).unwrap(), 0);
        mem.write_u32(0x1000, 0x12345678).unwrap();
        assert_eq!(mem.read_u32(0x1000).unwrap(), 0x12345678);
        mem.write_bytes(0x2000, &[1, 2, 3]).unwrap();
        assert_eq!(mem.read_bytes(0x2000, 3).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_covering_high_address() {
        let mem = FakeMemory::covering(0x4A101000, 0x400).unwrap();
        assert!(mem.size() >= 0x4A101400);
        assert_eq!(mem.read_u32(0x4A101080).unwrap(), 0);
    }
}
