//! `Store`: the single owning value that ties the device, the graph,
//! and the in-memory durability state (`generation`, `tail`) together
//! (§9 "Global mutable durability state"). The HTTP adapter wraps one
//! `Store` in a `Mutex`; the store itself assumes serial access.

use tracing::{error, info, warn};

use crate::device::BlockDevice;
use crate::durability::checkpoint::write_checkpoint;
use crate::durability::log::{add_to_log, LogEntry, Opcode};
use crate::durability::recovery::{startup, StartupMode};
use crate::durability::superblock::SuperblockManager;
use crate::error::{CoreError, MutationOutcome};
use crate::graph::Graph;

/// Owns the device handle, the in-memory graph, and the durability
/// cursor (`generation`, `tail`) that the log manager needs on every
/// append.
pub struct Store {
    device: BlockDevice,
    graph: Graph,
    generation: u32,
    tail: u32,
}

impl Store {
    /// Opens `device` and brings the store up per `mode` (§4.6).
    pub fn open(mut device: BlockDevice, mode: StartupMode) -> Result<Self, CoreError> {
        let recovered = startup(&mut device, mode)?;
        info!(
            generation = recovered.superblock.generation,
            tail = recovered.tail,
            nsize = recovered.graph.nsize(),
            esize = recovered.graph.esize(),
            "store recovered"
        );
        Ok(Store {
            device,
            graph: recovered.graph,
            generation: recovered.superblock.generation,
            tail: recovered.tail,
        })
    }

    /// Appends `entry` to the log, then applies `apply` to the graph
    /// only if the append succeeded (log-then-apply, §9). Returns
    /// whatever `apply` returns.
    fn log_then_apply<T>(
        &mut self,
        entry: LogEntry,
        apply: impl FnOnce(&mut Graph) -> T,
    ) -> Result<T, CoreError> {
        let new_tail = add_to_log(&mut self.device, self.tail, self.generation, entry)
            .map_err(|e| {
                if matches!(e, crate::error::LogError::Full) {
                    warn!("log is full, mutation rejected");
                } else {
                    error!(error = %e, "log append failed");
                }
                CoreError::from(e)
            })?;
        self.tail = new_tail;
        Ok(apply(&mut self.graph))
    }

    pub fn add_vertex(&mut self, id: u64) -> Result<MutationOutcome, CoreError> {
        if self.graph.get_node(id) {
            return Ok(MutationOutcome::NoOp);
        }
        let entry = LogEntry { node_a: id, node_b: 0, opcode: Opcode::AddNode };
        self.log_then_apply(entry, |g| {
            g.add_vertex(id);
            MutationOutcome::Applied
        })
    }

    /// `400` if `id` doesn't exist — removing an absent vertex is not a
    /// no-op, it's invalid (§7).
    pub fn remove_vertex(&mut self, id: u64) -> Result<MutationOutcome, CoreError> {
        if !self.graph.get_node(id) {
            return Ok(MutationOutcome::BadRequest);
        }
        let entry = LogEntry { node_a: id, node_b: 0, opcode: Opcode::RemoveNode };
        self.log_then_apply(entry, |g| {
            g.remove_vertex(id);
            MutationOutcome::Applied
        })
    }

    pub fn add_edge(&mut self, a: u64, b: u64) -> Result<MutationOutcome, CoreError> {
        if a == b || !self.graph.get_node(a) || !self.graph.get_node(b) {
            return Ok(MutationOutcome::BadRequest);
        }
        if self.graph.get_edge(a, b) {
            return Ok(MutationOutcome::NoOp);
        }
        let entry = LogEntry { node_a: a, node_b: b, opcode: Opcode::AddEdge };
        self.log_then_apply(entry, |g| g.add_edge(a, b))
    }

    pub fn remove_edge(&mut self, a: u64, b: u64) -> Result<MutationOutcome, CoreError> {
        if !self.graph.get_node(a) && !self.graph.get_node(b) {
            return Ok(MutationOutcome::BadRequest);
        }
        if !self.graph.get_edge(a, b) {
            return Ok(MutationOutcome::NoOp);
        }
        let entry = LogEntry { node_a: a, node_b: b, opcode: Opcode::RemoveEdge };
        self.log_then_apply(entry, |g| g.remove_edge(a, b))
    }

    pub fn get_node(&self, id: u64) -> bool {
        self.graph.get_node(id)
    }

    pub fn get_edge(&self, a: u64, b: u64) -> bool {
        self.graph.get_edge(a, b)
    }

    pub fn get_neighbors(&self, id: u64) -> Option<Vec<u64>> {
        self.graph.get_neighbors(id)
    }

    pub fn shortest_path(&mut self, a: u64, b: u64) -> Option<i32> {
        if !self.graph.get_node(a) || !self.graph.get_node(b) {
            return None;
        }
        Some(self.graph.shortest_path(a, b))
    }

    /// Commit protocol (§4.5): write the checkpoint image, then bump the
    /// generation. The bump invalidates every existing log block.
    pub fn checkpoint(&mut self) -> Result<(), CoreError> {
        let (nodes, edges) = self.graph.snapshot();
        write_checkpoint(&mut self.device, &nodes, &edges)?;

        let current = SuperblockManager::read(&mut self.device)?;
        let (bumped, tail) = SuperblockManager::bump_generation(&mut self.device, current)?;
        self.generation = bumped.generation;
        self.tail = tail;

        info!(generation = self.generation, nsize = nodes.len(), esize = edges.len(), "checkpoint committed");
        Ok(())
    }
}
