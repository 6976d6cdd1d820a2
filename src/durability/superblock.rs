//! Superblock manager (§4.2).
//!
//! The superblock is the 24-byte generation record at device offset 0.
//! `format()` and `bump_generation()` are the only writers; everything
//! else reads it to decide whether a log block is still valid.

use crate::checksum::checksum;
use crate::device::BlockDevice;
use crate::durability::constants::{SUPERBLOCK_OFFSET, SUPERBLOCK_SIZE};
use crate::error::SuperblockError;

/// In-memory mirror of the on-disk superblock record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Superblock {
    pub checksum: u64,
    pub generation: u32,
    pub log_start: u32,
    pub log_size: u32,
}

impl Superblock {
    fn to_bytes(self) -> [u8; SUPERBLOCK_SIZE as usize] {
        let mut buf = [0u8; SUPERBLOCK_SIZE as usize];
        buf[0..8].copy_from_slice(&self.checksum.to_le_bytes());
        buf[8..12].copy_from_slice(&self.generation.to_le_bytes());
        buf[12..16].copy_from_slice(&self.log_start.to_le_bytes());
        buf[16..20].copy_from_slice(&self.log_size.to_le_bytes());
        // bytes [20..24) are padding to 8-byte alignment, always zero.
        buf
    }

    fn from_bytes(buf: &[u8; SUPERBLOCK_SIZE as usize]) -> Self {
        Superblock {
            checksum: u64::from_le_bytes(buf[0..8].try_into().unwrap()),
            generation: u32::from_le_bytes(buf[8..12].try_into().unwrap()),
            log_start: u32::from_le_bytes(buf[12..16].try_into().unwrap()),
            log_size: u32::from_le_bytes(buf[16..20].try_into().unwrap()),
        }
    }

    fn recompute_checksum(&mut self) {
        let mut buf = self.to_bytes();
        buf[0..8].copy_from_slice(&0u64.to_le_bytes());
        self.checksum = checksum(&buf);
    }

    fn is_valid(&self) -> bool {
        let mut zeroed = *self;
        zeroed.checksum = 0;
        let buf = zeroed.to_bytes();
        self.checksum == checksum(&buf)
    }
}

/// Namespace for the superblock's read/write/format/bump operations.
/// `Store` owns the actual in-memory `tail`/`generation` state; this
/// type carries no state of its own.
pub struct SuperblockManager;

impl SuperblockManager {
    /// Reads the superblock at offset 0. `IoError` on a short read.
    pub fn read(device: &mut BlockDevice) -> Result<Superblock, SuperblockError> {
        let mut buf = [0u8; SUPERBLOCK_SIZE as usize];
        device.read_at(SUPERBLOCK_OFFSET, &mut buf)?;
        Ok(Superblock::from_bytes(&buf))
    }

    pub fn validate(sb: &Superblock) -> bool {
        sb.is_valid()
    }

    /// Recomputes the checksum in place and writes the superblock.
    pub fn write(device: &mut BlockDevice, mut sb: Superblock) -> Result<Superblock, SuperblockError> {
        sb.recompute_checksum();
        device.write_at(SUPERBLOCK_OFFSET, &sb.to_bytes())?;
        device.sync()?;
        Ok(sb)
    }

    /// Implements `-f`: if the existing superblock is valid, bump its
    /// generation; otherwise initialize a fresh layout. Returns the
    /// written superblock and the tail to start from (always 0).
    pub fn format(
        device: &mut BlockDevice,
        log_size: u32,
    ) -> Result<(Superblock, u32), SuperblockError> {
        let existing = Self::read(device);
        let next = match existing {
            Ok(sb) if Self::validate(&sb) => Superblock {
                checksum: 0,
                generation: sb.generation + 1,
                log_start: sb.log_start,
                log_size: sb.log_size,
            },
            _ => Superblock {
                checksum: 0,
                generation: 0,
                log_start: 1,
                log_size,
            },
        };
        let written = Self::write(device, next)?;
        Ok((written, 0))
    }

    /// Called at checkpoint commit: increments the on-disk generation
    /// and resets `tail` to 0. The caller must have already read a
    /// valid superblock via normal startup.
    pub fn bump_generation(
        device: &mut BlockDevice,
        current: Superblock,
    ) -> Result<(Superblock, u32), SuperblockError> {
        let next = Superblock {
            checksum: 0,
            generation: current.generation + 1,
            log_start: current.log_start,
            log_size: current.log_size,
        };
        let written = Self::write(device, next)?;
        Ok((written, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn dev() -> BlockDevice {
        let tmp = NamedTempFile::new().unwrap();
        let mut d = BlockDevice::open(tmp.path(), false).unwrap();
        d.ensure_len(4096).unwrap();
        d
    }

    #[test]
    fn format_on_fresh_device_initializes_generation_zero() {
        let mut d = dev();
        let (sb, tail) = SuperblockManager::format(&mut d, 1_000).unwrap();
        assert_eq!(sb.generation, 0);
        assert_eq!(sb.log_start, 1);
        assert_eq!(tail, 0);
        assert!(SuperblockManager::validate(&sb));
    }

    #[test]
    fn format_on_valid_superblock_increments_generation() {
        let mut d = dev();
        let (first, _) = SuperblockManager::format(&mut d, 1_000).unwrap();
        assert_eq!(first.generation, 0);

        let (second, tail) = SuperblockManager::format(&mut d, 1_000).unwrap();
        assert_eq!(second.generation, 1);
        assert_eq!(tail, 0);
    }

    #[test]
    fn checksum_round_trip() {
        let mut d = dev();
        let (sb, _) = SuperblockManager::format(&mut d, 42).unwrap();
        let read_back = SuperblockManager::read(&mut d).unwrap();
        assert_eq!(read_back, sb);
        assert!(SuperblockManager::validate(&read_back));
    }

    #[test]
    fn bump_generation_resets_tail_and_increments() {
        let mut d = dev();
        let (sb, _) = SuperblockManager::format(&mut d, 42).unwrap();
        let (bumped, tail) = SuperblockManager::bump_generation(&mut d, sb).unwrap();
        assert_eq!(bumped.generation, sb.generation + 1);
        assert_eq!(tail, 0);
    }

    #[test]
    fn garbage_device_is_invalid_and_format_initializes() {
        let tmp = NamedTempFile::new().unwrap();
        let mut d = BlockDevice::open(tmp.path(), false).unwrap();
        d.ensure_len(4096).unwrap();
        d.write_at(0, &[0xAB; 24]).unwrap();

        let read = SuperblockManager::read(&mut d).unwrap();
        assert!(!SuperblockManager::validate(&read));

        let (sb, _) = SuperblockManager::format(&mut d, 7).unwrap();
        assert_eq!(sb.generation, 0);
    }
}
