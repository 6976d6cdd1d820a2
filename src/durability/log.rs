//! Log manager (§4.3).
//!
//! Append-only, generation-checked log blocks. `find_tail` walks the
//! log from block 0 during startup, replaying every valid block for
//! the current generation and stopping at the first invalid or
//! stale-generation block. `add_to_log` appends one entry, growing the
//! tail block or rolling over to the next one as it fills.

use crate::checksum::checksum;
use crate::device::BlockDevice;
use crate::durability::constants::{
    LOG_BLOCK_SIZE, LOG_ENTRY_SIZE, LOG_HEADER_SIZE, MAX_BLOCKS, N_ENTRIES, SUPERBLOCK_SIZE,
};
use crate::error::LogError;

/// Opcodes a log entry can carry (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    AddNode = 0,
    AddEdge = 1,
    RemoveNode = 2,
    RemoveEdge = 3,
}

impl Opcode {
    fn from_u32(v: u32) -> Option<Self> {
        match v {
            0 => Some(Opcode::AddNode),
            1 => Some(Opcode::AddEdge),
            2 => Some(Opcode::RemoveNode),
            3 => Some(Opcode::RemoveEdge),
            _ => None,
        }
    }
}

/// One decoded log entry, `(node_a, node_b, opcode)`. `node_b` is
/// meaningless for node-only ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogEntry {
    pub node_a: u64,
    pub node_b: u64,
    pub opcode: Opcode,
}

impl LogEntry {
    fn to_bytes(self) -> [u8; LOG_ENTRY_SIZE as usize] {
        let mut buf = [0u8; LOG_ENTRY_SIZE as usize];
        buf[0..8].copy_from_slice(&self.node_a.to_le_bytes());
        buf[8..16].copy_from_slice(&self.node_b.to_le_bytes());
        buf[16..20].copy_from_slice(&(self.opcode as u32).to_le_bytes());
        // bytes [20..24) pad the entry to 8-byte alignment.
        buf
    }

    fn from_bytes(buf: &[u8]) -> Option<Self> {
        debug_assert_eq!(buf.len(), LOG_ENTRY_SIZE as usize);
        let opcode = Opcode::from_u32(u32::from_le_bytes(buf[16..20].try_into().unwrap()))?;
        Some(LogEntry {
            node_a: u64::from_le_bytes(buf[0..8].try_into().unwrap()),
            node_b: u64::from_le_bytes(buf[8..16].try_into().unwrap()),
            opcode,
        })
    }
}

struct BlockHeader {
    checksum: u64,
    generation: u32,
    n_entries: u32,
}

impl BlockHeader {
    fn to_bytes(self) -> [u8; LOG_HEADER_SIZE as usize] {
        let mut buf = [0u8; LOG_HEADER_SIZE as usize];
        buf[0..8].copy_from_slice(&self.checksum.to_le_bytes());
        buf[8..12].copy_from_slice(&self.generation.to_le_bytes());
        buf[12..16].copy_from_slice(&self.n_entries.to_le_bytes());
        buf
    }

    fn from_bytes(buf: &[u8]) -> Self {
        debug_assert_eq!(buf.len(), LOG_HEADER_SIZE as usize);
        BlockHeader {
            checksum: u64::from_le_bytes(buf[0..8].try_into().unwrap()),
            generation: u32::from_le_bytes(buf[8..12].try_into().unwrap()),
            n_entries: u32::from_le_bytes(buf[12..16].try_into().unwrap()),
        }
    }
}

fn block_offset(index: u32) -> u64 {
    SUPERBLOCK_SIZE + index as u64 * LOG_BLOCK_SIZE
}

fn read_block(device: &mut BlockDevice, index: u32) -> Result<Vec<u8>, LogError> {
    let mut buf = vec![0u8; LOG_BLOCK_SIZE as usize];
    device.read_at(block_offset(index), &mut buf)?;
    Ok(buf)
}

fn write_block_header(device: &mut BlockDevice, index: u32, header: BlockHeader) -> Result<(), LogError> {
    device.write_at(block_offset(index), &header.to_bytes())?;
    Ok(())
}

fn decode_entries(block: &[u8], n_entries: u32) -> Vec<LogEntry> {
    let mut out = Vec::with_capacity(n_entries as usize);
    for i in 0..n_entries {
        let start = (LOG_HEADER_SIZE + i as u64 * LOG_ENTRY_SIZE) as usize;
        let end = start + LOG_ENTRY_SIZE as usize;
        if let Some(entry) = LogEntry::from_bytes(&block[start..end]) {
            out.push(entry);
        }
    }
    out
}

/// Result of tail discovery: the index to append to next, plus every
/// entry found in valid, current-generation blocks, in order.
pub struct TailScan {
    pub tail: u32,
    pub entries: Vec<LogEntry>,
}

/// Walks the log from block 0, replaying every valid current-generation
/// block, per §4.3 steps 1-5.
pub fn find_tail(device: &mut BlockDevice, generation: u32) -> Result<TailScan, LogError> {
    let mut entries = Vec::new();
    let mut index = 0u32;

    loop {
        let block = read_block(device, index)?;
        let header = BlockHeader::from_bytes(&block[..LOG_HEADER_SIZE as usize]);
        let valid_checksum = header.checksum == checksum(&block);

        if !valid_checksum {
            // Step 2: invalid block, log ends here.
            return Ok(TailScan { tail: index, entries });
        }

        if header.generation != generation {
            // Step 3: stale block from a prior generation. Erase its
            // header so the checksum fails, then stop.
            write_block_header(
                device,
                index,
                BlockHeader {
                    checksum: 0,
                    generation: header.generation,
                    n_entries: 0,
                },
            )?;
            return Ok(TailScan { tail: index, entries });
        }

        entries.extend(decode_entries(&block, header.n_entries));

        if header.n_entries < N_ENTRIES {
            // Step 4: partially filled tail block.
            return Ok(TailScan { tail: index, entries });
        }

        // Step 5: block is full; advance.
        if index + 1 == MAX_BLOCKS {
            return Ok(TailScan { tail: MAX_BLOCKS, entries });
        }
        index += 1;
    }
}

/// Appends one entry to the log at `tail`, returning the (possibly
/// advanced) new tail. Fails with `LogError::Full` if the log has no
/// room left; the caller must not apply the mutation in that case.
pub fn add_to_log(
    device: &mut BlockDevice,
    tail: u32,
    generation: u32,
    entry: LogEntry,
) -> Result<u32, LogError> {
    if tail == MAX_BLOCKS {
        return Err(LogError::Full);
    }

    let block = read_block(device, tail)?;
    let header = BlockHeader::from_bytes(&block[..LOG_HEADER_SIZE as usize]);
    let valid_checksum = header.checksum == checksum(&block);

    let n_entries = if !valid_checksum || header.generation != generation {
        // First use of this block in this generation.
        write_block_header(
            device,
            tail,
            BlockHeader {
                checksum: 0,
                generation,
                n_entries: 1,
            },
        )?;
        1
    } else {
        let n = header.n_entries + 1;
        write_block_header(
            device,
            tail,
            BlockHeader {
                checksum: 0,
                generation,
                n_entries: n,
            },
        )?;
        n
    };

    let entry_offset = block_offset(tail) + LOG_HEADER_SIZE + (n_entries - 1) as u64 * LOG_ENTRY_SIZE;
    device.write_at(entry_offset, &entry.to_bytes())?;

    // Recompute checksum over the whole block as it now stands on disk.
    let full_block = read_block(device, tail)?;
    let new_checksum = checksum(&full_block);
    write_block_header(
        device,
        tail,
        BlockHeader {
            checksum: new_checksum,
            generation,
            n_entries,
        },
    )?;
    device.sync()?;

    if n_entries == N_ENTRIES {
        Ok(tail + 1)
    } else {
        Ok(tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn dev() -> BlockDevice {
        let tmp = NamedTempFile::new().unwrap();
        let mut d = BlockDevice::open(tmp.path(), false).unwrap();
        d.ensure_len(crate::durability::constants::MIN_DEVICE_SIZE).unwrap();
        d
    }

    #[test]
    fn append_and_replay_single_entry() {
        let mut d = dev();
        let entry = LogEntry { node_a: 7, node_b: 0, opcode: Opcode::AddNode };
        let tail = add_to_log(&mut d, 0, 0, entry).unwrap();
        assert_eq!(tail, 0);

        let scan = find_tail(&mut d, 0).unwrap();
        assert_eq!(scan.tail, 0);
        assert_eq!(scan.entries.len(), 1);
        assert_eq!(scan.entries[0], entry);
    }

    #[test]
    fn append_rolls_over_when_block_fills() {
        let mut d = dev();
        let mut tail = 0u32;
        for i in 0..N_ENTRIES {
            let entry = LogEntry { node_a: i as u64, node_b: 0, opcode: Opcode::AddNode };
            tail = add_to_log(&mut d, tail, 0, entry).unwrap();
        }
        assert_eq!(tail, 1);

        let scan = find_tail(&mut d, 0).unwrap();
        assert_eq!(scan.entries.len() as u32, N_ENTRIES);
        assert_eq!(scan.tail, 1);
    }

    #[test]
    fn stale_generation_block_is_erased_and_invisible() {
        let mut d = dev();
        let entry = LogEntry { node_a: 1, node_b: 0, opcode: Opcode::AddNode };
        add_to_log(&mut d, 0, 0, entry).unwrap();

        // A restart at generation 1 (post-checkpoint) must not see gen-0 data.
        let scan = find_tail(&mut d, 1).unwrap();
        assert_eq!(scan.tail, 0);
        assert!(scan.entries.is_empty());

        // And the block is now actually invalid, not just generation-mismatched.
        let scan_again = find_tail(&mut d, 0).unwrap();
        assert!(scan_again.entries.is_empty());
    }

    #[test]
    fn log_full_rejects_append() {
        let mut d = dev();
        let tail = MAX_BLOCKS;
        let entry = LogEntry { node_a: 1, node_b: 0, opcode: Opcode::AddNode };
        let result = add_to_log(&mut d, tail, 0, entry);
        assert!(matches!(result, Err(LogError::Full)));
    }
}
