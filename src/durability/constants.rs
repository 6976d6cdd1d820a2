//! On-device layout constants (§3). Pinned to concrete values rather
//! than left symbolic — see SPEC_FULL.md §9 on `LOG_SIZE`.

/// Byte offset of the superblock (always 0) and its on-disk size.
pub const SUPERBLOCK_OFFSET: u64 = 0;
pub const SUPERBLOCK_SIZE: u64 = 24;

/// Size of one log block, including its header.
pub const LOG_BLOCK_SIZE: u64 = 4096;
/// Number of log blocks the log region holds.
pub const MAX_BLOCKS: u32 = 1024;
/// Total size of the log region in bytes.
pub const LOG_SIZE: u64 = LOG_BLOCK_SIZE * MAX_BLOCKS as u64;

/// Log block header: `(checksum: u64, generation: u32, n_entries: u32)`.
pub const LOG_HEADER_SIZE: u64 = 16;
/// On-disk size of one log entry, `(node_a: u64, node_b: u64, opcode: u32)`
/// padded to 8-byte alignment.
pub const LOG_ENTRY_SIZE: u64 = 24;
/// Entries that fit after the header in one log block.
pub const N_ENTRIES: u32 = ((LOG_BLOCK_SIZE - LOG_HEADER_SIZE) / LOG_ENTRY_SIZE) as u32;

/// Where the checkpoint region starts (immediately after the log region).
pub const CHECKPOINT_OFFSET: u64 = SUPERBLOCK_SIZE + LOG_SIZE;
/// Fixed size budget for the checkpoint region (§3, §9).
pub const CHECKPOINT_REGION_SIZE: u64 = 64 * 1024 * 1024;

/// On-disk size of one node id in the checkpoint.
pub const CHECKPOINT_NODE_SIZE: u64 = 8;
/// On-disk size of one edge (two node ids) in the checkpoint.
pub const CHECKPOINT_EDGE_SIZE: u64 = 16;
/// Size of the `(nsize, esize)` checkpoint header.
pub const CHECKPOINT_HEADER_SIZE: u64 = 16;

/// Minimum device size this layout requires.
pub const MIN_DEVICE_SIZE: u64 = SUPERBLOCK_SIZE + LOG_SIZE + CHECKPOINT_REGION_SIZE;

/// Vertex map bucket count (§3, §4.4).
pub const VERTEX_MAP_SIZE: usize = 100_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn n_entries_matches_spec_arithmetic() {
        assert_eq!(N_ENTRIES, 170);
    }

    #[test]
    fn log_size_is_whole_number_of_blocks() {
        assert_eq!(LOG_SIZE % LOG_BLOCK_SIZE, 0);
        assert_eq!(LOG_SIZE / LOG_BLOCK_SIZE, MAX_BLOCKS as u64);
    }

    #[test]
    fn checkpoint_region_starts_where_the_log_region_ends() {
        let last_log_block_end = SUPERBLOCK_SIZE + (MAX_BLOCKS - 1) as u64 * LOG_BLOCK_SIZE + LOG_BLOCK_SIZE;
        assert_eq!(CHECKPOINT_OFFSET, last_log_block_end);
    }
}
