//! In-memory graph store (§4.4): a fixed-bucket vertex map with
//! adjacency lists, plus BFS shortest path.
//!
//! Neighbors are stored as bare `u64` ids in an owned `Vec`, never as
//! pointers (SPEC_FULL.md §9) — a vertex is looked up by id whenever
//! its neighbor needs visiting, which keeps the whole structure
//! trivially serializable for the checkpoint format.

use crate::durability::constants::VERTEX_MAP_SIZE;
use crate::error::MutationOutcome;
use std::collections::VecDeque;

/// One vertex: its id, adjacency list, and BFS scratch state.
#[derive(Debug, Clone)]
struct Vertex {
    id: u64,
    adj: Vec<u64>,
    path: i32,
    visited: bool,
}

impl Vertex {
    fn new(id: u64) -> Self {
        Vertex { id, adj: Vec::new(), path: -1, visited: false }
    }
}

fn bucket_of(id: u64) -> usize {
    (id % VERTEX_MAP_SIZE as u64) as usize
}

/// The vertex hash table: `SIZE` buckets, each a chain of vertices.
pub struct Graph {
    buckets: Vec<Vec<Vertex>>,
    nsize: u64,
    esize: u64,
}

impl Graph {
    pub fn new() -> Self {
        Graph {
            buckets: (0..VERTEX_MAP_SIZE).map(|_| Vec::new()).collect(),
            nsize: 0,
            esize: 0,
        }
    }

    pub fn nsize(&self) -> u64 {
        self.nsize
    }

    pub fn esize(&self) -> u64 {
        self.esize
    }

    fn find(&self, id: u64) -> Option<&Vertex> {
        self.buckets[bucket_of(id)].iter().find(|v| v.id == id)
    }

    fn find_mut(&mut self, id: u64) -> Option<&mut Vertex> {
        self.buckets[bucket_of(id)].iter_mut().find(|v| v.id == id)
    }

    /// Inserts `id` if absent. Returns `true` if it was newly inserted.
    pub fn add_vertex(&mut self, id: u64) -> bool {
        if self.find(id).is_some() {
            return false;
        }
        self.buckets[bucket_of(id)].push(Vertex::new(id));
        self.nsize += 1;
        true
    }

    /// Removes `id` and every edge incident to it. Returns `true` if it
    /// existed.
    pub fn remove_vertex(&mut self, id: u64) -> bool {
        let bucket = bucket_of(id);
        let pos = match self.buckets[bucket].iter().position(|v| v.id == id) {
            Some(p) => p,
            None => return false,
        };
        let removed = self.buckets[bucket].swap_remove(pos);

        let mut edges_removed = 0u64;
        for &neighbor in &removed.adj {
            if let Some(n) = self.find_mut(neighbor) {
                let before = n.adj.len();
                n.adj.retain(|&w| w != id);
                edges_removed += (before - n.adj.len()) as u64;
            }
        }

        debug_assert!(
            edges_removed <= self.esize,
            "can't remove more edges than exist"
        );
        self.esize -= edges_removed;
        self.nsize -= 1;
        true
    }

    /// `400` on self-loop or missing endpoint, `204` if the edge
    /// already exists, `200` after inserting it into both adjacency
    /// lists.
    pub fn add_edge(&mut self, a: u64, b: u64) -> MutationOutcome {
        if a == b {
            return MutationOutcome::BadRequest;
        }
        if self.find(a).is_none() || self.find(b).is_none() {
            return MutationOutcome::BadRequest;
        }
        if self.find(a).unwrap().adj.contains(&b) {
            return MutationOutcome::NoOp;
        }

        self.find_mut(a).unwrap().adj.push(b);
        self.find_mut(b).unwrap().adj.push(a);
        self.esize += 1;
        MutationOutcome::Applied
    }

    /// `400` if neither endpoint exists, `204` if both exist but no
    /// edge was between them, `200` after removing it from both
    /// adjacency lists.
    pub fn remove_edge(&mut self, a: u64, b: u64) -> MutationOutcome {
        if self.find(a).is_none() && self.find(b).is_none() {
            return MutationOutcome::BadRequest;
        }

        let removed_from_a = self
            .find_mut(a)
            .map(|v| {
                let before = v.adj.len();
                v.adj.retain(|&w| w != b);
                before != v.adj.len()
            })
            .unwrap_or(false);
        let removed_from_b = self
            .find_mut(b)
            .map(|v| {
                let before = v.adj.len();
                v.adj.retain(|&w| w != a);
                before != v.adj.len()
            })
            .unwrap_or(false);

        if removed_from_a || removed_from_b {
            self.esize -= 1;
            MutationOutcome::Applied
        } else {
            MutationOutcome::NoOp
        }
    }

    pub fn get_node(&self, id: u64) -> bool {
        self.find(id).is_some()
    }

    pub fn get_edge(&self, a: u64, b: u64) -> bool {
        match (self.find(a), self.find(b)) {
            (Some(va), Some(_)) => va.adj.contains(&b),
            _ => false,
        }
    }

    /// Copy of `id`'s adjacency list. `None` if the vertex doesn't exist.
    pub fn get_neighbors(&self, id: u64) -> Option<Vec<u64>> {
        self.find(id).map(|v| v.adj.clone())
    }

    /// BFS from `a`; returns `path[b]`, `-1` if unreachable. Both
    /// endpoints must exist (checked by the caller via `get_node`).
    /// Scratch `path`/`visited` fields are reset before returning so
    /// the graph is logically unchanged across calls (§4.4).
    pub fn shortest_path(&mut self, a: u64, b: u64) -> i32 {
        let mut frontier: VecDeque<u64> = VecDeque::new();
        let mut touched: Vec<u64> = Vec::new();

        if let Some(root) = self.find_mut(a) {
            root.path = 0;
        } else {
            return -1;
        }
        frontier.push_back(a);
        touched.push(a);

        while let Some(current_id) = frontier.pop_front() {
            let current_path = self.find(current_id).map(|v| v.path).unwrap_or(-1);
            let neighbors = self.find(current_id).map(|v| v.adj.clone()).unwrap_or_default();
            for neighbor_id in neighbors {
                let unvisited = self.find(neighbor_id).map(|v| v.path == -1).unwrap_or(false);
                if unvisited {
                    if let Some(n) = self.find_mut(neighbor_id) {
                        n.path = current_path + 1;
                    }
                    touched.push(neighbor_id);
                    frontier.push_back(neighbor_id);
                }
            }
        }

        let result = self.find(b).map(|v| v.path).unwrap_or(-1);

        for id in touched {
            if let Some(v) = self.find_mut(id) {
                v.path = -1;
            }
        }

        result
    }

    fn set_visited(&mut self, id: u64, visited: bool) {
        if let Some(v) = self.find_mut(id) {
            v.visited = visited;
        }
    }

    fn all_ids(&self) -> Vec<u64> {
        self.buckets.iter().flatten().map(|v| v.id).collect()
    }

    /// Full checkpoint snapshot per §4.5: walk once marking `visited`
    /// and collecting nodes + not-yet-visited-neighbor edges, then walk
    /// again clearing `visited`.
    pub fn snapshot(&mut self) -> (Vec<u64>, Vec<(u64, u64)>) {
        let mut nodes = Vec::with_capacity(self.nsize as usize);
        let mut edges = Vec::with_capacity(self.esize as usize);

        for id in self.all_ids() {
            let adj = self.find(id).map(|v| v.adj.clone()).unwrap_or_default();
            for w in adj {
                if !self.find(w).map(|n| n.visited).unwrap_or(true) {
                    edges.push((id, w));
                }
            }
            nodes.push(id);
            self.set_visited(id, true);
        }

        for id in &nodes {
            self.set_visited(*id, false);
        }

        (nodes, edges)
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}
