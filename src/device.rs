//! Raw block device handle.
//!
//! Wraps a `File` opened on a raw device (or, for tests and small
//! deployments, a plain file standing in for one) and exposes
//! positioned reads/writes of fixed-size records. No buffering beyond
//! what the OS gives us — every operation is a `seek` + `read_exact`/
//! `write_all`, matching the blocking-I/O model in §5.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// A positioned-I/O handle onto the device. Owned exclusively by the
/// durability subsystem; never shared outside it.
pub struct BlockDevice {
    file: File,
}

impl BlockDevice {
    /// Opens `path` read/write, creating it if `create` is set (used by
    /// `-f` on a fresh device file). Returns `IoError` on failure.
    pub fn open(path: &Path, create: bool) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(create)
            .truncate(false)
            .open(path)?;
        Ok(BlockDevice { file })
    }

    /// Ensures the underlying file is at least `len` bytes, so fixed
    /// offsets past the current end are addressable.
    pub fn ensure_len(&mut self, len: u64) -> io::Result<()> {
        let current = self.file.metadata()?.len();
        if current < len {
            self.file.set_len(len)?;
        }
        Ok(())
    }

    pub fn len(&self) -> io::Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    /// Positioned read of exactly `buf.len()` bytes at `offset`. Fails
    /// with an `UnexpectedEof`-flavored error on a short read, which
    /// callers treat as absence (end-of-log) or corruption.
    pub fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(buf)
    }

    /// Positioned write of `buf` at `offset`.
    pub fn write_at(&mut self, offset: u64, buf: &[u8]) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(buf)
    }

    /// Forces pending writes to the physical device. `write_at` alone
    /// only guarantees the bytes reached the OS page cache; every
    /// durability-relevant write (superblock, log block, checkpoint
    /// image) calls this before its caller is allowed to acknowledge.
    pub fn sync(&mut self) -> io::Result<()> {
        self.file.sync_all()
    }
}
