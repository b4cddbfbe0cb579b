use crate::ladder::SettlementLadder;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ims_instrument::security::SecurityId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Per-`(book, security)` state maintained by the Position Engine (§4.4).
///
/// `last_applied_event_id` is the idempotency guard: re-applying an event whose id is `<=` this
/// value is a no-op (§8 invariant 4). `None` means no event has ever been applied for this key —
/// kept distinct from `Some(0)` so that an event-id of `0` (the first offset on a bus partition)
/// is still guarded against re-application.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PositionSnapshot {
    pub book: SmolStr,
    pub security: SecurityId,
    pub quantity_current: Decimal,
    pub ladder: SettlementLadder,
    pub last_applied_event_id: Option<u64>,
    pub updated_at: DateTime<Utc>,
}

impl PositionSnapshot {
    pub fn flat(book: SmolStr, security: SecurityId) -> Self {
        Self {
            book,
            security,
            quantity_current: Decimal::ZERO,
            ladder: SettlementLadder::new(),
            last_applied_event_id: None,
            updated_at: Utc::now(),
        }
    }
}

/// A point-in-time, checkpointed dump of every `PositionSnapshot` in a partition, tagged with the
/// bus offset it was taken at so recovery can resume the event log replay from exactly that
/// point (§4.4 Recovery).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PartitionSnapshot {
    pub shard: u32,
    pub offset: u64,
    pub checksum: u64,
    pub positions: Vec<PositionSnapshot>,
}

/// Object-storage-shaped persistence for [`PartitionSnapshot`]s, separating the interface from
/// the backing store the same way `ExecutionClient` separates a trading interface from its
/// mock/live implementations.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn put(&self, snapshot: PartitionSnapshot);
    async fn latest(&self, shard: u32) -> Option<PartitionSnapshot>;
}

/// Default in-memory [`SnapshotStore`], keeping only the most recent snapshot per shard.
#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    snapshots: parking_lot::Mutex<std::collections::HashMap<u32, PartitionSnapshot>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn put(&self, snapshot: PartitionSnapshot) {
        self.snapshots.lock().insert(snapshot.shard, snapshot);
    }

    async fn latest(&self, shard: u32) -> Option<PartitionSnapshot> {
        self.snapshots.lock().get(&shard).cloned()
    }
}

fn checksum_of(positions: &[PositionSnapshot]) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = fnv::FnvHasher::default();
    for position in positions {
        position.book.hash(&mut hasher);
        position.security.hash(&mut hasher);
        position.last_applied_event_id.hash(&mut hasher);
    }
    hasher.finish()
}

impl PartitionSnapshot {
    pub fn new(shard: u32, offset: u64, positions: Vec<PositionSnapshot>) -> Self {
        let checksum = checksum_of(&positions);
        Self {
            shard,
            offset,
            checksum,
            positions,
        }
    }
}
