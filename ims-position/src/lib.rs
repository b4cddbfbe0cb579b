//! IMS-Position: the Position Engine (§4.4).
//!
//! Maintains current quantity and a forward settlement ladder per `(book, security)`, applying
//! trade executions, contract activity, and feed-sourced position updates idempotently. State is
//! partitioned by shard; each partition checkpoints itself periodically so it can recover by
//! loading the latest checkpoint and replaying the event log from the recorded offset, rather
//! than replaying from the beginning of time.

pub mod engine;
pub mod error;
pub mod ladder;
pub mod snapshot;

pub use engine::PositionEngine;
pub use error::PositionError;
pub use ladder::SettlementLadder;
pub use snapshot::{InMemorySnapshotStore, PartitionSnapshot, PositionSnapshot, SnapshotStore};
