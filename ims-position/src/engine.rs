use crate::{
    error::PositionError,
    snapshot::{PartitionSnapshot, PositionSnapshot, SnapshotStore},
};
use ims_data::event::{ContractActivity, PositionUpdate, TradeExecution};
use ims_macro::ComponentName;
use ims_metrics::{HealthCheck, HealthStatus};
use parking_lot::Mutex;
use std::{collections::HashMap, sync::Arc};

/// The Position Engine (§4.4), scoped to a single partition (shard). Maintains per-key
/// `(book, security) -> PositionSnapshot` state, applies trade executions and contract activity
/// idempotently via a last-applied-event-id guard, and checkpoints itself to a [`SnapshotStore`]
/// every `snapshot_every_n` applied events.
///
/// Run one instance per partition (consistent-hash sharded on `(book, security)`, per §5); the
/// single internal lock only ever serializes work already confined to one shard, so it never
/// becomes a cross-shard bottleneck.
#[derive(ComponentName)]
pub struct PositionEngine {
    shard: u32,
    positions: Mutex<HashMap<(smol_str::SmolStr, ims_instrument::security::SecurityId), PositionSnapshot>>,
    snapshot_store: Arc<dyn SnapshotStore>,
    snapshot_every_n: u32,
    events_since_snapshot: Mutex<u32>,
}

impl HealthCheck for PositionEngine {
    fn component_name(&self) -> &str {
        Self::COMPONENT_NAME
    }

    fn check(&self) -> HealthStatus {
        HealthStatus::Healthy
    }
}

impl PositionEngine {
    pub fn new(shard: u32, snapshot_store: Arc<dyn SnapshotStore>, snapshot_every_n: u32) -> Self {
        Self {
            shard,
            positions: Mutex::new(HashMap::new()),
            snapshot_store,
            snapshot_every_n,
            events_since_snapshot: Mutex::new(0),
        }
    }

    /// Restores state from the latest checkpoint and returns the bus offset the caller should
    /// resume replaying the event log from. Returns `0` (replay from the start of the partition)
    /// if no snapshot has ever been taken — the normal state for a fresh partition, not an error.
    pub async fn recover(&self) -> u64 {
        match self.snapshot_store.latest(self.shard).await {
            Some(snapshot) => {
                let mut positions = self.positions.lock();
                positions.clear();
                for position in snapshot.positions {
                    positions.insert((position.book.clone(), position.security), position);
                }
                snapshot.offset + 1
            }
            None => 0,
        }
    }

    /// Applies a trade execution, updating current quantity and the settlement ladder. A no-op
    /// (returns the unchanged snapshot) if `event_id` has already been applied for this key (§8
    /// invariant 4).
    pub async fn apply_trade(
        &self,
        event_id: u64,
        offset: u64,
        trade: &TradeExecution,
    ) -> Result<PositionSnapshot, PositionError> {
        let key = (trade.book.clone(), trade.security);
        let snapshot = {
            let mut positions = self.positions.lock();
            let position = positions
                .entry(key)
                .or_insert_with(|| PositionSnapshot::flat(trade.book.clone(), trade.security));

            if let Some(last_applied) = position.last_applied_event_id {
                if event_id <= last_applied {
                    return Err(PositionError::RejectedDuplicate {
                        trade_id: trade.trade_id.clone(),
                        event_id,
                        last_applied,
                    });
                }
            }

            position.quantity_current += trade.quantity;
            position.ladder.apply(trade.settlement_date, trade.quantity);
            position.last_applied_event_id = Some(event_id);
            position.updated_at = chrono::Utc::now();
            position.clone()
        };

        self.maybe_snapshot(offset).await;
        Ok(snapshot)
    }

    /// Applies contract/corporate-action activity, using the same idempotency and ladder-update
    /// path as a trade.
    pub async fn apply_contract(
        &self,
        event_id: u64,
        offset: u64,
        activity: &ContractActivity,
    ) -> Result<PositionSnapshot, PositionError> {
        let book: smol_str::SmolStr = "CONTRACTS".into();
        let key = (book.clone(), activity.security);
        let snapshot = {
            let mut positions = self.positions.lock();
            let position = positions
                .entry(key)
                .or_insert_with(|| PositionSnapshot::flat(book.clone(), activity.security));

            if let Some(last_applied) = position.last_applied_event_id {
                if event_id <= last_applied {
                    return Err(PositionError::RejectedDuplicate {
                        trade_id: activity.contract_id.clone(),
                        event_id,
                        last_applied,
                    });
                }
            }

            position
                .ladder
                .apply(activity.effective_date, activity.quantity_delta);
            position.quantity_current += activity.quantity_delta;
            position.last_applied_event_id = Some(event_id);
            position.updated_at = chrono::Utc::now();
            position.clone()
        };

        self.maybe_snapshot(offset).await;
        Ok(snapshot)
    }

    /// Applies a start-of-day position snapshot sourced directly from a feed (as opposed to a
    /// trade/contract event derived by the engine's own accounting). §3 models the SOD quantity
    /// and the forward settlement ladder as distinct carried values, so unlike
    /// [`Self::apply_trade`]/[`Self::apply_contract`] this only adjusts `quantity_current` — it
    /// never creates or shifts a ladder rung, since the SOD position is already-settled stock,
    /// not a projected future settlement.
    pub async fn apply_position_update(
        &self,
        event_id: u64,
        offset: u64,
        update: &PositionUpdate,
    ) -> Result<PositionSnapshot, PositionError> {
        let key = (update.book.clone(), update.security);
        let snapshot = {
            let mut positions = self.positions.lock();
            let position = positions
                .entry(key)
                .or_insert_with(|| PositionSnapshot::flat(update.book.clone(), update.security));

            if let Some(last_applied) = position.last_applied_event_id {
                if event_id <= last_applied {
                    return Err(PositionError::RejectedDuplicate {
                        trade_id: update.book.clone(),
                        event_id,
                        last_applied,
                    });
                }
            }

            position.quantity_current += update.quantity_delta;
            position.last_applied_event_id = Some(event_id);
            position.updated_at = chrono::Utc::now();
            position.clone()
        };

        self.maybe_snapshot(offset).await;
        Ok(snapshot)
    }

    pub fn snapshot(&self, book: &str, security: ims_instrument::security::SecurityId) -> Option<PositionSnapshot> {
        self.positions
            .lock()
            .get(&(smol_str::SmolStr::new(book), security))
            .cloned()
    }

    async fn maybe_snapshot(&self, offset: u64) {
        let should_snapshot = {
            let mut counter = self.events_since_snapshot.lock();
            *counter += 1;
            if *counter >= self.snapshot_every_n {
                *counter = 0;
                true
            } else {
                false
            }
        };

        if should_snapshot {
            self.snapshot_now(offset).await;
        }
    }

    /// Forces an immediate checkpoint regardless of the `snapshot_every_n` cadence (used by the
    /// operator `snapshot-now` CLI command, §`ims` system wiring).
    pub async fn snapshot_now(&self, offset: u64) {
        let positions: Vec<_> = self.positions.lock().values().cloned().collect();
        self.snapshot_store
            .put(PartitionSnapshot::new(self.shard, offset, positions))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::InMemorySnapshotStore;
    use chrono::NaiveDate;
    use ims_instrument::security::SecurityId;
    use rust_decimal_macros::dec;

    fn trade(trade_id: &str, security: SecurityId, quantity: rust_decimal::Decimal) -> TradeExecution {
        TradeExecution {
            trade_id: trade_id.into(),
            order_id: "O1".into(),
            execution_id: "E1".into(),
            security,
            book: "BOOK1".into(),
            quantity,
            settlement_date: NaiveDate::from_ymd_opt(2026, 7, 30).unwrap(),
        }
    }

    #[tokio::test]
    async fn applying_the_same_event_id_twice_is_rejected_as_duplicate() {
        let engine = PositionEngine::new(0, Arc::new(InMemorySnapshotStore::new()), 100);
        let t = trade("T1", SecurityId(1), dec!(100));

        engine.apply_trade(1, 1, &t).await.unwrap();
        let err = engine.apply_trade(1, 2, &t).await.unwrap_err();
        assert!(matches!(err, PositionError::RejectedDuplicate { .. }));

        let snapshot = engine.snapshot("BOOK1", SecurityId(1)).unwrap();
        assert_eq!(snapshot.quantity_current, dec!(100));
    }

    #[tokio::test]
    async fn snapshot_and_recover_round_trips_state() {
        let store = Arc::new(InMemorySnapshotStore::new());
        let engine = PositionEngine::new(0, store.clone(), 1);
        let t = trade("T1", SecurityId(1), dec!(50));
        engine.apply_trade(1, 10, &t).await.unwrap();

        let fresh = PositionEngine::new(0, store, 1);
        let resume_offset = fresh.recover().await;
        assert_eq!(resume_offset, 11);

        let snapshot = fresh.snapshot("BOOK1", SecurityId(1)).unwrap();
        assert_eq!(snapshot.quantity_current, dec!(50));
        assert_eq!(snapshot.last_applied_event_id, Some(1));
    }

    #[tokio::test]
    async fn sod_plus_forward_trades_keep_the_ladder_to_trade_deltas_only() {
        let engine = PositionEngine::new(0, Arc::new(InMemorySnapshotStore::new()), 100);
        let security = SecurityId(1);
        let sod_date = NaiveDate::from_ymd_opt(2026, 7, 28).unwrap();
        let t_plus_2 = NaiveDate::from_ymd_opt(2026, 7, 30).unwrap();

        let sod = PositionUpdate {
            book: "BOOK1".into(),
            security,
            quantity_delta: dec!(100_000),
            settlement_date: sod_date,
        };
        engine.apply_position_update(1, 1, &sod).await.unwrap();

        let buy = TradeExecution {
            trade_id: "T1".into(),
            order_id: "O1".into(),
            execution_id: "E1".into(),
            security,
            book: "BOOK1".into(),
            quantity: dec!(40_000),
            settlement_date: t_plus_2,
        };
        let sell = TradeExecution {
            trade_id: "T2".into(),
            order_id: "O2".into(),
            execution_id: "E2".into(),
            security,
            book: "BOOK1".into(),
            quantity: dec!(-25_000),
            settlement_date: t_plus_2,
        };
        engine.apply_trade(2, 2, &buy).await.unwrap();
        engine.apply_trade(3, 3, &sell).await.unwrap();

        let snapshot = engine.snapshot("BOOK1", security).unwrap();
        assert_eq!(snapshot.quantity_current, dec!(115_000));

        let rungs: Vec<_> = snapshot.ladder.rungs().collect();
        assert_eq!(rungs, vec![(t_plus_2, dec!(15_000))]);
    }
}
