use derive_more::Display;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display,
)]
pub struct AggregationUnitId(pub u64);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum AggregationUnitStatus {
    Active,
    Closed,
}

/// A regulatory grouping of positions for a market/region combination, used by the Position
/// Engine (§4.4) and Inventory Calculator (§4.5) to scope availability (§3).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AggregationUnit {
    pub id: AggregationUnitId,
    pub market: SmolStr,
    pub region: SmolStr,
    pub name: SmolStr,
    pub status: AggregationUnitStatus,
}
