use crate::{
    channel::{Publisher, Subscription},
    model::{DecisionRecord, InventoryDelta, PositionDelta},
};
use ims_macro::ComponentName;
use ims_metrics::{HealthCheck, HealthStatus};

/// The Publisher (§4.10): fans out `InventoryAvailability` deltas, position deltas, and decision
/// records on three independent topics, each with its own subscriber set and buffer.
#[derive(Debug, ComponentName)]
pub struct ImsPublisher {
    inventory: Publisher<InventoryDelta>,
    position: Publisher<PositionDelta>,
    decisions: Publisher<DecisionRecord>,
}

impl HealthCheck for ImsPublisher {
    fn component_name(&self) -> &str {
        Self::COMPONENT_NAME
    }

    fn check(&self) -> HealthStatus {
        HealthStatus::Healthy
    }
}

impl ImsPublisher {
    pub fn new(buffer: usize) -> Self {
        Self {
            inventory: Publisher::new(buffer),
            position: Publisher::new(buffer),
            decisions: Publisher::new(buffer),
        }
    }

    pub fn publish_inventory_delta(&self, delta: InventoryDelta) {
        self.inventory.publish(delta);
    }

    pub fn publish_position_delta(&self, delta: PositionDelta) {
        self.position.publish(delta);
    }

    pub fn publish_decision(&self, decision: impl Into<DecisionRecord>) {
        self.decisions.publish(decision.into());
    }

    pub fn subscribe_inventory(&self) -> Subscription<InventoryDelta> {
        self.inventory.subscribe()
    }

    pub fn subscribe_position(&self) -> Subscription<PositionDelta> {
        self.position.subscribe()
    }

    pub fn subscribe_decisions(&self) -> Subscription<DecisionRecord> {
        self.decisions.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ims_workflow::model::{LocateDecision, LocateOutcome};
    use smol_str::SmolStr;

    #[tokio::test]
    async fn decisions_from_both_workflows_are_fanned_out_on_the_shared_topic() {
        let publisher = ImsPublisher::new(8);
        let mut subscription = publisher.subscribe_decisions();

        let locate = LocateDecision {
            sequence: 0,
            request_id: SmolStr::new("loc-1"),
            outcome: LocateOutcome::Queued,
            decided_at: Utc::now(),
        };
        publisher.publish_decision(locate.clone());

        let received = subscription.recv().await.unwrap();
        assert_eq!(received, DecisionRecord::Locate(locate));
    }
}
