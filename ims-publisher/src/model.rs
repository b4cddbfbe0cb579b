use ims_inventory::InventoryAvailability;
use ims_position::PositionSnapshot;
use ims_workflow::model::{LocateDecision, ShortSellDecision};
use serde::{Deserialize, Serialize};

/// A decision record fanned out alongside inventory and position deltas (§4.10).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum DecisionRecord {
    Locate(LocateDecision),
    ShortSell(ShortSellDecision),
}

impl From<LocateDecision> for DecisionRecord {
    fn from(decision: LocateDecision) -> Self {
        Self::Locate(decision)
    }
}

impl From<ShortSellDecision> for DecisionRecord {
    fn from(decision: ShortSellDecision) -> Self {
        Self::ShortSell(decision)
    }
}

pub type InventoryDelta = InventoryAvailability;
pub type PositionDelta = PositionSnapshot;
