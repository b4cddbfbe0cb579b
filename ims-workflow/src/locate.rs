use crate::{
    decision_log::DecisionLog,
    error::WorkflowError,
    model::{LocateDecision, LocateOutcome, LocateRequest},
    policy::LocatePolicy,
};
use chrono::Utc;
use ims_instrument::{counterparty::CounterpartyStatus, security::SecurityStatus, store::ReferenceStore};
use ims_limits::{key::LimitKey, service::DecrementOutcome, LimitService};
use ims_macro::ComponentName;
use ims_metrics::{HealthCheck, HealthStatus};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::{collections::VecDeque, sync::Arc, time::Duration};

/// The Locate Workflow (§4.8): validates a locate request, consults policy for auto-approval,
/// attempts a decrement against locate-available, and falls back to a manual queue when the
/// policy doesn't auto-approve or availability is insufficient.
#[derive(ComponentName)]
pub struct LocateWorkflow {
    reference: Arc<ReferenceStore>,
    limits: Arc<LimitService>,
    policy: Arc<dyn LocatePolicy>,
    log: DecisionLog<LocateDecision>,
    manual_queue: Mutex<VecDeque<LocateRequest>>,
    hold_duration: Duration,
}

impl HealthCheck for LocateWorkflow {
    fn component_name(&self) -> &str {
        Self::COMPONENT_NAME
    }

    fn check(&self) -> HealthStatus {
        if self.manual_queue.lock().len() > 1_000 {
            HealthStatus::Degraded {
                reason: "manual locate queue backlog exceeds 1000 requests".into(),
            }
        } else {
            HealthStatus::Healthy
        }
    }
}

impl LocateWorkflow {
    pub fn new(
        reference: Arc<ReferenceStore>,
        limits: Arc<LimitService>,
        policy: Arc<dyn LocatePolicy>,
        hold_duration: Duration,
    ) -> Self {
        Self {
            reference,
            limits,
            policy,
            log: DecisionLog::new(),
            manual_queue: Mutex::new(VecDeque::new()),
            hold_duration,
        }
    }

    /// Step 1 of §4.8: security exists, client active, requested quantity > 0.
    async fn validate(&self, request: &LocateRequest) -> Result<(), WorkflowError> {
        if request.quantity <= Decimal::ZERO {
            return Err(WorkflowError::NonPositiveQuantity(request.quantity));
        }

        let security = self.reference.find_by_internal(request.security).await?;
        if security.status != SecurityStatus::Active {
            return Err(WorkflowError::UnknownSecurity(request.security));
        }

        let client = self.reference.find_counterparty(request.client).await?;
        if client.status != CounterpartyStatus::Active {
            return Err(WorkflowError::ClientNotActive(request.client));
        }

        Ok(())
    }

    /// Submits a locate request and drives it through §4.8's auto-approval/manual-queue flow.
    pub async fn submit(&self, request: LocateRequest) -> Result<LocateDecision, WorkflowError> {
        self.validate(&request).await?;

        let cap = self.policy.auto_approval_cap(&request.market, self.client_kind(&request).await?);

        let outcome = match cap {
            Some(cap) if request.quantity <= cap => self.attempt_decrement(&request).await?,
            _ => {
                self.manual_queue.lock().push_back(request.clone());
                LocateOutcome::Queued
            }
        };

        Ok(self.record(&request.id, outcome))
    }

    async fn client_kind(&self, request: &LocateRequest) -> Result<ims_instrument::counterparty::CounterpartyKind, WorkflowError> {
        Ok(self.reference.find_counterparty(request.client).await?.kind)
    }

    async fn attempt_decrement(&self, request: &LocateRequest) -> Result<LocateOutcome, WorkflowError> {
        let key = LimitKey::new(request.client, request.aggregation_unit, request.security);
        let idempotency_key = request.id.as_str();

        let outcome = self
            .limits
            .try_decrement(key, request.quantity, Some(self.hold_duration), idempotency_key)
            .await?;

        match outcome {
            DecrementOutcome::Committed { .. } => Ok(LocateOutcome::Approved {
                quantity: request.quantity,
                expires_at: Utc::now() + self.hold_duration,
            }),
            DecrementOutcome::Rejected { current_available, .. } => {
                if self.policy.allows_partial_approval(&request.market, self.client_kind(request).await?) && current_available > Decimal::ZERO {
                    let partial = self
                        .limits
                        .try_decrement(key, current_available, Some(self.hold_duration), &format!("{idempotency_key}-partial"))
                        .await?;
                    match partial {
                        DecrementOutcome::Committed { .. } => Ok(LocateOutcome::PartiallyApproved {
                            approved_quantity: current_available,
                            expires_at: Utc::now() + self.hold_duration,
                        }),
                        DecrementOutcome::Rejected { .. } => {
                            self.manual_queue.lock().push_back(request.clone());
                            Ok(LocateOutcome::Queued)
                        }
                    }
                } else {
                    self.manual_queue.lock().push_back(request.clone());
                    Ok(LocateOutcome::Queued)
                }
            }
        }
    }

    /// An operator approves a queued request, attempting the same decrement §4.8 step 3 performs.
    pub async fn approve_manual(&self, request_id: &str) -> Result<LocateDecision, WorkflowError> {
        let request = self.take_from_queue(request_id)?;
        let outcome = self.attempt_decrement(&request).await?;
        Ok(self.record(&request.id, outcome))
    }

    /// An operator rejects a queued request, recording the reason without touching the counter.
    pub fn reject_manual(&self, request_id: &str, reason: impl Into<String>) -> Result<LocateDecision, WorkflowError> {
        let request = self.take_from_queue(request_id)?;
        Ok(self.record(&request.id, LocateOutcome::Rejected { reason: reason.into() }))
    }

    fn take_from_queue(&self, request_id: &str) -> Result<LocateRequest, WorkflowError> {
        let mut queue = self.manual_queue.lock();
        let position = queue
            .iter()
            .position(|queued| queued.id.as_str() == request_id)
            .ok_or_else(|| WorkflowError::UnknownLocateRequest(request_id.into()))?;
        Ok(queue.remove(position).expect("position verified present"))
    }

    fn record(&self, request_id: &str, outcome: LocateOutcome) -> LocateDecision {
        let decision = LocateDecision {
            sequence: self.log.next_sequence(),
            request_id: request_id.into(),
            outcome,
            decided_at: Utc::now(),
        };
        self.log.append(decision.clone());
        decision
    }

    pub fn decisions(&self) -> Vec<LocateDecision> {
        self.log.entries()
    }

    pub fn manual_queue_len(&self) -> usize {
        self.manual_queue.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::TablePolicy;
    use ims_instrument::{
        aggregation_unit::AggregationUnitId,
        counterparty::{Counterparty, CounterpartyId, CounterpartyKind},
        market::Market,
        security::{Security, SecurityId, SecurityKind},
    };
    use ims_limits::{store::InMemoryLimitCounterStore, LimitCounterStore};
    use rust_decimal_macros::dec;

    async fn seeded_workflow(cap: Decimal, partial: bool) -> LocateWorkflow {
        let reference = Arc::new(ReferenceStore::new());
        reference
            .upsert_counterparty(Counterparty {
                id: CounterpartyId(1),
                name: "Acme Capital".into(),
                kind: CounterpartyKind::Client,
                status: CounterpartyStatus::Active,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
            .await;
        reference
            .upsert_security(Security {
                id: SecurityId(1),
                kind: SecurityKind::Equity,
                issuer: "Acme Corp".into(),
                currency: "USD".into(),
                market: Market::new("XLON", "EMEA"),
                identifiers: Vec::new(),
                status: SecurityStatus::Active,
                basket_type: None,
                constituents: Vec::new(),
            })
            .await
            .unwrap();

        let store = Arc::new(InMemoryLimitCounterStore::new());
        let key = LimitKey::new(CounterpartyId(1), AggregationUnitId(1), SecurityId(1));
        store
            .compare_and_swap(
                key,
                0,
                ims_limits::LimitCounter::new(dec!(100), Decimal::ZERO, Decimal::ZERO, 0),
            )
            .await;
        let limits = Arc::new(LimitService::new(store, Duration::from_secs(60), 3));

        let policy = Arc::new(
            TablePolicy::new()
                .with_cap("XLON", CounterpartyKind::Client, cap)
                .with_partial_approval("XLON", CounterpartyKind::Client, partial),
        );

        LocateWorkflow::new(reference, limits, policy, Duration::from_secs(60))
    }

    fn request(id: &str, quantity: Decimal) -> LocateRequest {
        LocateRequest {
            id: id.into(),
            client: CounterpartyId(1),
            aggregation_unit: AggregationUnitId(1),
            security: SecurityId(1),
            market: "XLON".into(),
            quantity,
            requested_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn a_request_within_the_auto_approval_cap_is_approved() {
        let workflow = seeded_workflow(dec!(50), false).await;
        let decision = workflow.submit(request("loc-1", dec!(30))).await.unwrap();
        assert!(matches!(decision.outcome, LocateOutcome::Approved { quantity, .. } if quantity == dec!(30)));
    }

    #[tokio::test]
    async fn a_request_above_the_cap_is_queued_for_manual_review() {
        let workflow = seeded_workflow(dec!(10), false).await;
        let decision = workflow.submit(request("loc-2", dec!(30))).await.unwrap();
        assert_eq!(decision.outcome, LocateOutcome::Queued);
        assert_eq!(workflow.manual_queue_len(), 1);
    }

    #[tokio::test]
    async fn insufficient_availability_without_partial_approval_is_queued() {
        let workflow = seeded_workflow(dec!(500), false).await;
        let decision = workflow.submit(request("loc-3", dec!(500))).await.unwrap();
        assert_eq!(decision.outcome, LocateOutcome::Queued);
    }

    #[tokio::test]
    async fn insufficient_availability_with_partial_approval_allowed_approves_the_remainder() {
        let workflow = seeded_workflow(dec!(500), true).await;
        let decision = workflow.submit(request("loc-4", dec!(500))).await.unwrap();
        assert!(matches!(
            decision.outcome,
            LocateOutcome::PartiallyApproved { approved_quantity, .. } if approved_quantity == dec!(100)
        ));
    }

    #[tokio::test]
    async fn an_operator_can_approve_a_queued_request() {
        let workflow = seeded_workflow(dec!(10), false).await;
        workflow.submit(request("loc-5", dec!(30))).await.unwrap();
        let decision = workflow.approve_manual("loc-5").await.unwrap();
        assert!(matches!(decision.outcome, LocateOutcome::Approved { .. }));
        assert_eq!(workflow.manual_queue_len(), 0);
    }

    #[tokio::test]
    async fn an_operator_can_reject_a_queued_request() {
        let workflow = seeded_workflow(dec!(10), false).await;
        workflow.submit(request("loc-6", dec!(30))).await.unwrap();
        let decision = workflow.reject_manual("loc-6", "stock loan desk declined").unwrap();
        assert!(matches!(decision.outcome, LocateOutcome::Rejected { .. }));
    }

    #[tokio::test]
    async fn a_nonpositive_quantity_is_rejected_before_touching_the_limit_service() {
        let workflow = seeded_workflow(dec!(50), false).await;
        let err = workflow.submit(request("loc-7", Decimal::ZERO)).await.unwrap_err();
        assert!(matches!(err, WorkflowError::NonPositiveQuantity(_)));
    }
}
