use crate::{
    counter::LimitCounter,
    error::LimitError,
    idempotency::IdempotencyLedger,
    key::LimitKey,
    store::LimitCounterStore,
};
use chrono::{DateTime, Utc};
use ims_macro::ComponentName;
use ims_metrics::{HealthCheck, HealthStatus};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};

/// The outcome of `tryDecrement` (§4.7): either committed with the counter's new available
/// quantity, or rejected with the current available quantity at the time of rejection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DecrementOutcome {
    Committed { new_available: Decimal },
    Rejected { reason: String, current_available: Decimal },
}

struct Hold {
    key: LimitKey,
    quantity: Decimal,
    expires_at: DateTime<Utc>,
}

/// The Limit Service (§4.7): holds the short-sell-available and locate-available counters
/// consumed by the synchronous workflows, behind a compare-and-swap contract with bounded
/// retries on contention.
#[derive(ComponentName)]
pub struct LimitService {
    store: Arc<dyn LimitCounterStore>,
    idempotency: IdempotencyLedger,
    holds: Mutex<Vec<Hold>>,
    max_retries: u32,
}

impl HealthCheck for LimitService {
    fn component_name(&self) -> &str {
        Self::COMPONENT_NAME
    }

    fn check(&self) -> HealthStatus {
        HealthStatus::Healthy
    }
}

impl LimitService {
    pub fn new(store: Arc<dyn LimitCounterStore>, idempotency_window: Duration, max_retries: u32) -> Self {
        Self {
            store,
            idempotency: IdempotencyLedger::new(idempotency_window),
            holds: Mutex::new(Vec::new()),
            max_retries,
        }
    }

    /// Atomically decrements `key` by `quantity`, retrying on lost CAS races up to `max_retries`
    /// times before returning [`LimitError::Contended`]. `ttl` registers a locate-style hold that
    /// auto-replenishes via [`LimitService::expire_due`] once it elapses.
    pub async fn try_decrement(
        &self,
        key: LimitKey,
        quantity: Decimal,
        ttl: Option<Duration>,
        idempotency_key: &str,
    ) -> Result<DecrementOutcome, LimitError> {
        let now = Utc::now();
        if let Some(cached) = self.idempotency.lookup(key, idempotency_key, now) {
            return Ok(cached);
        }

        for attempt in 0..=self.max_retries {
            let current = self.store.load(&key).await;

            if quantity > current.available {
                let outcome = DecrementOutcome::Rejected {
                    reason: "insufficient-availability".into(),
                    current_available: current.available,
                };
                self.idempotency.record(key, idempotency_key, outcome.clone(), now);
                return Ok(outcome);
            }

            let updated = LimitCounter {
                available: current.available - quantity,
                reserved: current.reserved + ttl.map(|_| quantity).unwrap_or(Decimal::ZERO),
                decrement: current.decrement + quantity,
                version: current.version + 1,
            };

            if self.store.compare_and_swap(key, current.version, updated).await {
                if let Some(ttl) = ttl {
                    self.holds.lock().push(Hold {
                        key,
                        quantity,
                        expires_at: now + ttl,
                    });
                }
                let outcome = DecrementOutcome::Committed {
                    new_available: updated.available,
                };
                self.idempotency.record(key, idempotency_key, outcome.clone(), now);
                return Ok(outcome);
            }

            tracing::debug!(attempt, ?key, "limit counter CAS lost the race, retrying");
        }

        Err(LimitError::Contended {
            key,
            attempts: self.max_retries,
        })
    }

    /// Raises `key`'s available capacity (§4.7: "called by the Calculator when availability
    /// rises"). Not a hold release — does not touch `decrement`/`reserved`.
    pub async fn replenish(&self, key: LimitKey, quantity: Decimal) {
        loop {
            let current = self.store.load(&key).await;
            let updated = LimitCounter {
                available: current.available + quantity,
                version: current.version + 1,
                ..current
            };
            if self.store.compare_and_swap(key, current.version, updated).await {
                return;
            }
        }
    }

    /// Reverses an in-flight decrement (§4.9: "partial decrements are rolled back on
    /// cancellation"), restoring `available` and reversing `decrement`/`reserved` accounting done
    /// by [`LimitService::try_decrement`].
    pub async fn rollback(&self, key: LimitKey, quantity: Decimal, had_ttl: bool) -> Result<(), LimitError> {
        loop {
            let current = self.store.load(&key).await;
            let reserved = current.reserved - if had_ttl { quantity } else { Decimal::ZERO };
            let decrement = current.decrement - quantity;
            if reserved < Decimal::ZERO || decrement < Decimal::ZERO {
                return Err(LimitError::NegativeReserved { key });
            }
            let updated = LimitCounter {
                available: current.available + quantity,
                reserved,
                decrement,
                version: current.version + 1,
            };
            if self.store.compare_and_swap(key, current.version, updated).await {
                return Ok(());
            }
        }
    }

    pub async fn snapshot(&self, key: &LimitKey) -> (Decimal, Decimal, Decimal, u64) {
        self.store.load(key).await.snapshot()
    }

    /// Sweeps holds that have passed their TTL, replenishing each via [`LimitService::rollback`]
    /// (§4.7: "TTLs on decrements... expire asynchronously and replenish the counter"). Run as a
    /// periodic task on the event-processing worker pool (§9).
    pub async fn expire_due(&self, now: DateTime<Utc>) {
        let due: Vec<Hold> = {
            let mut holds = self.holds.lock();
            let (due, remaining): (Vec<_>, Vec<_>) = holds.drain(..).partition(|hold| hold.expires_at <= now);
            *holds = remaining;
            due
        };

        for hold in due {
            let _ = self.rollback(hold.key, hold.quantity, true).await;
        }
    }

    pub fn sweep_idempotency(&self, now: DateTime<Utc>) {
        self.idempotency.sweep_expired(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryLimitCounterStore;
    use ims_instrument::{aggregation_unit::AggregationUnitId, counterparty::CounterpartyId, security::SecurityId};
    use rust_decimal_macros::dec;

    fn key() -> LimitKey {
        LimitKey::new(CounterpartyId(1), AggregationUnitId(1), SecurityId(1))
    }

    async fn seeded(available: Decimal) -> LimitService {
        let store = Arc::new(InMemoryLimitCounterStore::new());
        store
            .compare_and_swap(
                key(),
                0,
                LimitCounter {
                    available,
                    ..LimitCounter::flat()
                },
            )
            .await;
        LimitService::new(store, Duration::from_secs(60), 3)
    }

    #[tokio::test]
    async fn decrement_within_availability_commits_and_reduces_available() {
        let service = seeded(dec!(100)).await;
        let outcome = service
            .try_decrement(key(), dec!(40), None, "order-1")
            .await
            .unwrap();
        assert_eq!(
            outcome,
            DecrementOutcome::Committed {
                new_available: dec!(60)
            }
        );
        assert_eq!(service.snapshot(&key()).await, (dec!(60), dec!(0), dec!(40), 1));
    }

    #[tokio::test]
    async fn decrement_beyond_availability_is_rejected_without_mutating_the_counter() {
        let service = seeded(dec!(10)).await;
        let outcome = service
            .try_decrement(key(), dec!(40), None, "order-2")
            .await
            .unwrap();
        assert!(matches!(outcome, DecrementOutcome::Rejected { .. }));
        assert_eq!(service.snapshot(&key()).await, (dec!(10), dec!(0), dec!(0), 0));
    }

    #[tokio::test]
    async fn replaying_the_same_idempotency_key_returns_the_original_outcome() {
        let service = seeded(dec!(100)).await;
        let first = service
            .try_decrement(key(), dec!(40), None, "order-3")
            .await
            .unwrap();
        let replay = service
            .try_decrement(key(), dec!(40), None, "order-3")
            .await
            .unwrap();
        assert_eq!(first, replay);
        // a replay never decrements twice
        assert_eq!(service.snapshot(&key()).await, (dec!(60), dec!(0), dec!(40), 1));
    }

    #[tokio::test]
    async fn a_ttl_decrement_reserves_quantity_and_expiry_replenishes_it() {
        let service = seeded(dec!(100)).await;
        let committed_at = Utc::now();
        service
            .try_decrement(key(), dec!(30), Some(Duration::from_secs(5)), "locate-1")
            .await
            .unwrap();
        assert_eq!(service.snapshot(&key()).await, (dec!(70), dec!(30), dec!(30), 1));

        service.expire_due(committed_at).await;
        assert_eq!(service.snapshot(&key()).await, (dec!(70), dec!(30), dec!(30), 1));

        service.expire_due(committed_at + Duration::from_secs(6)).await;
        assert_eq!(service.snapshot(&key()).await, (dec!(100), dec!(0), dec!(0), 2));
    }

    #[tokio::test]
    async fn rollback_reverses_a_permanent_decrement_for_cancellation() {
        let service = seeded(dec!(100)).await;
        service
            .try_decrement(key(), dec!(25), None, "order-4")
            .await
            .unwrap();
        service.rollback(key(), dec!(25), false).await.unwrap();
        assert_eq!(service.snapshot(&key()).await, (dec!(100), dec!(0), dec!(0), 2));
    }

    #[tokio::test]
    async fn replenish_raises_available_without_touching_decrement_or_reserved() {
        let service = seeded(dec!(100)).await;
        service
            .try_decrement(key(), dec!(25), None, "order-5")
            .await
            .unwrap();
        service.replenish(key(), dec!(10)).await;
        assert_eq!(service.snapshot(&key()).await, (dec!(85), dec!(0), dec!(25), 2));
    }
}
