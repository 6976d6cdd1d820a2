//! Durable, in-memory graph service backed by a raw block device.
//!
//! The durability subsystem (superblock, write-ahead log, checkpoint,
//! recovery) lives under [`durability`]; the in-memory graph under
//! [`graph`]; [`store::Store`] owns both and exposes log-then-apply
//! mutation methods to the [`http`] adapter.

pub mod checksum;
pub mod config;
pub mod device;
pub mod durability;
pub mod error;
pub mod graph;
pub mod http;
pub mod store;
