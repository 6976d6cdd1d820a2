//! The durability subsystem: on-device layout, checksums, the
//! generation-numbered write-ahead log, the checkpoint format, and the
//! recovery protocol that ties them together (§4).

pub mod checkpoint;
pub mod constants;
pub mod log;
pub mod recovery;
pub mod superblock;
