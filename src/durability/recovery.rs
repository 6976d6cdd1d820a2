//! Recovery/startup (§4.6): validate superblock → load checkpoint →
//! replay log.

use crate::device::BlockDevice;
use crate::durability::checkpoint::{load_checkpoint, rebuild_graph};
use crate::durability::constants::{LOG_SIZE, MIN_DEVICE_SIZE};
use crate::durability::log::{find_tail, LogEntry, Opcode};
use crate::durability::superblock::{Superblock, SuperblockManager};
use crate::error::CoreError;
use crate::graph::Graph;

/// Whether `startup` is formatting the device (`-f`) or doing a normal
/// restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupMode {
    Format,
    Normal,
}

/// Everything `startup` reconstructs: the graph, plus the durability
/// state the store needs going forward.
pub struct RecoveredState {
    pub graph: Graph,
    pub superblock: Superblock,
    pub tail: u32,
}

/// Applies a log entry to `graph`, dispatching on opcode (§4.3 replay).
fn apply_entry(graph: &mut Graph, entry: &LogEntry) {
    match entry.opcode {
        Opcode::AddNode => {
            graph.add_vertex(entry.node_a);
        }
        Opcode::AddEdge => {
            graph.add_edge(entry.node_a, entry.node_b);
        }
        Opcode::RemoveNode => {
            graph.remove_vertex(entry.node_a);
        }
        Opcode::RemoveEdge => {
            graph.remove_edge(entry.node_a, entry.node_b);
        }
    }
}

/// Coordinates format vs normal startup.
pub fn startup(device: &mut BlockDevice, mode: StartupMode) -> Result<RecoveredState, CoreError> {
    device.ensure_len(MIN_DEVICE_SIZE).map_err(|e| {
        CoreError::Superblock(crate::error::SuperblockError::Io(e))
    })?;

    let (superblock, _) = match mode {
        StartupMode::Format => SuperblockManager::format(device, LOG_SIZE as u32)?,
        StartupMode::Normal => {
            let sb = SuperblockManager::read(device)?;
            if !SuperblockManager::validate(&sb) {
                return Err(CoreError::Superblock(crate::error::SuperblockError::Corrupt));
            }
            (sb, 0)
        }
    };

    let mut graph = match load_checkpoint(device)? {
        Some((nodes, edges)) if !nodes.is_empty() || !edges.is_empty() => {
            rebuild_graph(&nodes, &edges)?
        }
        _ => Graph::new(),
    };

    let scan = find_tail(device, superblock.generation)?;
    for entry in &scan.entries {
        apply_entry(&mut graph, entry);
    }

    Ok(RecoveredState { graph, superblock, tail: scan.tail })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::durability::log::{add_to_log, LogEntry};
    use tempfile::NamedTempFile;

    fn dev() -> (NamedTempFile, BlockDevice) {
        let tmp = NamedTempFile::new().unwrap();
        let d = BlockDevice::open(tmp.path(), false).unwrap();
        (tmp, d)
    }

    #[test]
    fn format_then_add_node_survives_restart() {
        let (_tmp, mut d) = dev();
        let recovered = startup(&mut d, StartupMode::Format).unwrap();
        assert_eq!(recovered.graph.nsize(), 0);

        let entry = LogEntry { node_a: 7, node_b: 0, opcode: Opcode::AddNode };
        add_to_log(&mut d, recovered.tail, recovered.superblock.generation, entry).unwrap();

        // Restart without formatting.
        let recovered2 = startup(&mut d, StartupMode::Normal).unwrap();
        assert!(recovered2.graph.get_node(7));
    }

    #[test]
    fn normal_startup_on_corrupt_superblock_aborts() {
        let (_tmp, mut d) = dev();
        d.ensure_len(MIN_DEVICE_SIZE).unwrap();
        d.write_at(0, &[0xFF; 24]).unwrap();

        let result = startup(&mut d, StartupMode::Normal);
        assert!(result.is_err());
    }

    #[test]
    fn checkpoint_invalidates_prior_log() {
        let (_tmp, mut d) = dev();
        let recovered = startup(&mut d, StartupMode::Format).unwrap();

        let entry = LogEntry { node_a: 1, node_b: 0, opcode: Opcode::AddNode };
        let tail = add_to_log(&mut d, recovered.tail, recovered.superblock.generation, entry).unwrap();
        assert_eq!(tail, 0);

        // Commit a checkpoint: write image, then bump generation.
        let mut g = recovered.graph;
        g.add_vertex(1);
        let (nodes, edges) = g.snapshot();
        crate::durability::checkpoint::write_checkpoint(&mut d, &nodes, &edges).unwrap();
        let (_sb2, _tail2) =
            SuperblockManager::bump_generation(&mut d, recovered.superblock).unwrap();

        // Inject a stale-generation block at index 0 with a plausible
        // checksum but the old generation.
        let stale_entry = LogEntry { node_a: 999, node_b: 0, opcode: Opcode::AddNode };
        // This append targets generation 0, which is now stale relative
        // to the bumped superblock; it simulates a leftover block.
        add_to_log(&mut d, 0, 0, stale_entry).unwrap();

        let recovered2 = startup(&mut d, StartupMode::Normal).unwrap();
        assert!(!recovered2.graph.get_node(999));
        assert!(recovered2.graph.get_node(1));
    }
}
