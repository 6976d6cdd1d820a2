//! Checkpoint manager (§4.5).
//!
//! Serializes the whole graph to the fixed checkpoint region and
//! restores it on load. The commit protocol (write image, then bump
//! generation) lives in `Store`, which owns both the checkpoint writer
//! and the superblock manager; this module only knows about bytes.

use crate::device::BlockDevice;
use crate::durability::constants::{
    CHECKPOINT_EDGE_SIZE, CHECKPOINT_HEADER_SIZE, CHECKPOINT_NODE_SIZE, CHECKPOINT_OFFSET,
    CHECKPOINT_REGION_SIZE,
};
use crate::error::CheckpointError;
use crate::graph::Graph;

/// Writes `(nsize, esize, nodes[], edges[])` at `CHECKPOINT_OFFSET`.
/// Rejects images that would overflow the fixed checkpoint region
/// rather than silently truncating them.
pub fn write_checkpoint(
    device: &mut BlockDevice,
    nodes: &[u64],
    edges: &[(u64, u64)],
) -> Result<(), CheckpointError> {
    let nsize = nodes.len() as u64;
    let esize = edges.len() as u64;
    let image_size = CHECKPOINT_HEADER_SIZE + nsize * CHECKPOINT_NODE_SIZE + esize * CHECKPOINT_EDGE_SIZE;
    if image_size > CHECKPOINT_REGION_SIZE {
        return Err(CheckpointError::TooLarge { nsize, esize });
    }

    let mut buf = Vec::with_capacity(image_size as usize);
    buf.extend_from_slice(&nsize.to_le_bytes());
    buf.extend_from_slice(&esize.to_le_bytes());
    for &id in nodes {
        buf.extend_from_slice(&id.to_le_bytes());
    }
    for &(a, b) in edges {
        buf.extend_from_slice(&a.to_le_bytes());
        buf.extend_from_slice(&b.to_le_bytes());
    }

    device.write_at(CHECKPOINT_OFFSET, &buf)?;
    device.sync()?;
    Ok(())
}

/// Reads the checkpoint image, if one is present and complete. A short
/// read (fresh/never-checkpointed device) is `Ok(None)`, not an error —
/// the caller falls back to an empty graph plus full log replay.
pub fn load_checkpoint(device: &mut BlockDevice) -> Result<Option<(Vec<u64>, Vec<(u64, u64)>)>, CheckpointError> {
    let mut header = [0u8; CHECKPOINT_HEADER_SIZE as usize];
    if device.read_at(CHECKPOINT_OFFSET, &mut header).is_err() {
        return Ok(None);
    }
    let nsize = u64::from_le_bytes(header[0..8].try_into().unwrap());
    let esize = u64::from_le_bytes(header[8..16].try_into().unwrap());

    if nsize == 0 && esize == 0 {
        return Ok(Some((Vec::new(), Vec::new())));
    }

    let body_size = nsize
        .checked_mul(CHECKPOINT_NODE_SIZE)
        .and_then(|n| esize.checked_mul(CHECKPOINT_EDGE_SIZE).and_then(|e| n.checked_add(e)))
        .and_then(|b| b.checked_add(CHECKPOINT_HEADER_SIZE));
    let body_size = match body_size {
        Some(size) if size <= CHECKPOINT_REGION_SIZE => size - CHECKPOINT_HEADER_SIZE,
        _ => return Ok(None),
    };

    let mut body = vec![0u8; body_size as usize];
    if device
        .read_at(CHECKPOINT_OFFSET + CHECKPOINT_HEADER_SIZE, &mut body)
        .is_err()
    {
        return Ok(None);
    }

    let mut nodes = Vec::with_capacity(nsize as usize);
    let mut cursor = 0usize;
    for _ in 0..nsize {
        nodes.push(u64::from_le_bytes(body[cursor..cursor + 8].try_into().unwrap()));
        cursor += 8;
    }
    let mut edges = Vec::with_capacity(esize as usize);
    for _ in 0..esize {
        let a = u64::from_le_bytes(body[cursor..cursor + 8].try_into().unwrap());
        cursor += 8;
        let b = u64::from_le_bytes(body[cursor..cursor + 8].try_into().unwrap());
        cursor += 8;
        edges.push((a, b));
    }

    Ok(Some((nodes, edges)))
}

/// Rebuilds a `Graph` from a loaded checkpoint image. Rejects the
/// image (`CheckpointError::Truncated`) if the post-load node/edge
/// counts disagree with the header — the on-disk counts are the source
/// of truth per §4.5.
pub fn rebuild_graph(nodes: &[u64], edges: &[(u64, u64)]) -> Result<Graph, CheckpointError> {
    let mut graph = Graph::new();
    for &id in nodes {
        graph.add_vertex(id);
    }
    for &(a, b) in edges {
        graph.add_edge(a, b);
    }

    if graph.nsize() != nodes.len() as u64 || graph.esize() != edges.len() as u64 {
        return Err(CheckpointError::Truncated);
    }
    Ok(graph)
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
    fn round_trip_empty_graph() {
        let mut d = dev();
        write_checkpoint(&mut d, &[], &[]).unwrap();
        let loaded = load_checkpoint(&mut d).unwrap().unwrap();
        assert_eq!(loaded, (vec![], vec![]));
    }

    #[test]
    fn round_trip_graph_with_edges() {
        let mut g = Graph::new();
        g.add_vertex(1);
        g.add_vertex(2);
        g.add_vertex(3);
        g.add_edge(1, 2);
        g.add_edge(2, 3);
        let (nodes, edges) = g.snapshot();

        let mut d = dev();
        write_checkpoint(&mut d, &nodes, &edges).unwrap();
        let (loaded_nodes, loaded_edges) = load_checkpoint(&mut d).unwrap().unwrap();

        let rebuilt = rebuild_graph(&loaded_nodes, &loaded_edges).unwrap();
        assert_eq!(rebuilt.nsize(), 3);
        assert_eq!(rebuilt.esize(), 2);
        assert!(rebuilt.get_edge(1, 2));
        assert!(rebuilt.get_edge(2, 3));

        let _ = loaded_nodes;
        let _ = loaded_edges;
    }

    #[test]
    fn fresh_device_has_no_checkpoint_header_conflict() {
        // A freshly zeroed device reads nsize=0, esize=0: a valid empty
        // checkpoint, not a truncation error.
        let mut d = dev();
        let loaded = load_checkpoint(&mut d).unwrap();
        assert_eq!(loaded, Some((vec![], vec![])));
    }

    #[test]
    fn oversized_image_is_rejected() {
        let mut d = dev();
        let huge = crate::durability::constants::CHECKPOINT_REGION_SIZE;
        let result = write_checkpoint(&mut d, &[], &vec![(0, 0); (huge / 16) as usize + 1]);
        assert!(matches!(result, Err(CheckpointError::TooLarge { .. })));
    }
}
