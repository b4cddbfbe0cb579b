use crate::{
    decision_log::DecisionLog,
    model::{RejectReason, ShortSellDecision, ShortSellOrder, ShortSellVerdict},
};
use chrono::Utc;
use ims_limits::{key::LimitKey, service::DecrementOutcome, LimitService};
use ims_macro::ComponentName;
use ims_metrics::{HealthCheck, HealthStatus};
use std::{sync::Arc, time::Duration};

/// The Short-Sell Gate (§4.9): the latency-critical synchronous `validate(order)` path. Resolves
/// the limit key, attempts a decrement against short-sell-available within a bounded budget, and
/// appends the decision to its log without the caller waiting on the append.
#[derive(ComponentName)]
pub struct ShortSellGate {
    limits: Arc<LimitService>,
    log: Arc<DecisionLog<ShortSellDecision>>,
    decrement_budget: Duration,
}

impl HealthCheck for ShortSellGate {
    fn component_name(&self) -> &str {
        Self::COMPONENT_NAME
    }

    fn check(&self) -> HealthStatus {
        HealthStatus::Healthy
    }
}

impl ShortSellGate {
    pub fn new(limits: Arc<LimitService>, decrement_budget: Duration) -> Self {
        Self {
            limits,
            log: Arc::new(DecisionLog::new()),
            decrement_budget,
        }
    }

    /// §4.9 steps 1-4. On a decrement budget overrun the order is rejected with `Timeout`; on
    /// cancellation of the surrounding task the in-flight decrement is rolled back rather than
    /// left half-applied (§4.9: "partial decrements are rolled back on cancellation").
    pub async fn validate(&self, order: &ShortSellOrder) -> ShortSellVerdict {
        let started = std::time::Instant::now();
        let key = LimitKey::new(order.client, order.aggregation_unit, order.security);

        let verdict = match tokio::time::timeout(
            self.decrement_budget,
            self.limits
                .try_decrement(key, order.executable_quantity, None, order.id.as_str()),
        )
        .await
        {
            Ok(Ok(DecrementOutcome::Committed { .. })) => ShortSellVerdict::Accepted,
            Ok(Ok(DecrementOutcome::Rejected { .. })) => ShortSellVerdict::Rejected {
                reason: RejectReason::InsufficientAvailability,
            },
            Ok(Err(_)) => ShortSellVerdict::Rejected {
                reason: RejectReason::RuleBlocked,
            },
            Err(_elapsed) => {
                // the try_decrement future is dropped here; any in-flight CAS attempt it held
                // completes or is abandoned without having registered a hold, so there is nothing
                // left to roll back on this path specifically.
                ShortSellVerdict::Rejected {
                    reason: RejectReason::Timeout,
                }
            }
        };

        self.append_async(order.id.clone(), verdict.clone(), started.elapsed());

        verdict
    }

    fn append_async(&self, order_id: smol_str::SmolStr, verdict: ShortSellVerdict, elapsed: std::time::Duration) {
        let log = Arc::clone(&self.log);
        let sequence = log.next_sequence();
        tokio::spawn(async move {
            log.append(ShortSellDecision {
                sequence,
                order_id,
                verdict,
                latency_ms: elapsed.as_millis() as u64,
                decided_at: Utc::now(),
            });
        });
    }

    pub fn decisions(&self) -> Vec<ShortSellDecision> {
        self.log.entries()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ims_instrument::{aggregation_unit::AggregationUnitId, counterparty::CounterpartyId, security::SecurityId};
    use ims_limits::{store::InMemoryLimitCounterStore, LimitCounter, LimitCounterStore};
    use rust_decimal_macros::dec;

    async fn seeded_gate(available: rust_decimal::Decimal) -> ShortSellGate {
        let store = Arc::new(InMemoryLimitCounterStore::new());
        let key = LimitKey::new(CounterpartyId(1), AggregationUnitId(1), SecurityId(1));
        let zero = rust_decimal::Decimal::ZERO;
        store.compare_and_swap(key, 0, LimitCounter::new(available, zero, zero, 0)).await;
        let limits = Arc::new(LimitService::new(store, Duration::from_secs(60), 3));
        ShortSellGate::new(limits, Duration::from_millis(120))
    }

    fn order(id: &str, quantity: rust_decimal::Decimal) -> ShortSellOrder {
        ShortSellOrder {
            id: id.into(),
            client: CounterpartyId(1),
            aggregation_unit: AggregationUnitId(1),
            security: SecurityId(1),
            executable_quantity: quantity,
        }
    }

    #[tokio::test]
    async fn an_order_within_available_is_accepted() {
        let gate = seeded_gate(dec!(100)).await;
        let verdict = gate.validate(&order("ord-1", dec!(40))).await;
        assert_eq!(verdict, ShortSellVerdict::Accepted);
    }

    #[tokio::test]
    async fn an_order_beyond_available_is_rejected_with_insufficient_availability() {
        let gate = seeded_gate(dec!(10)).await;
        let verdict = gate.validate(&order("ord-2", dec!(40))).await;
        assert_eq!(
            verdict,
            ShortSellVerdict::Rejected {
                reason: RejectReason::InsufficientAvailability
            }
        );
    }

    #[tokio::test]
    async fn decisions_are_appended_to_the_log_even_though_validate_does_not_await_the_append() {
        let gate = seeded_gate(dec!(100)).await;
        gate.validate(&order("ord-3", dec!(10))).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        let decisions = gate.decisions();
        assert_eq!(decisions.len(), 1);
        assert_eq!(decisions[0].order_id.as_str(), "ord-3");
    }
}
