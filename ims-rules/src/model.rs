use crate::condition::ConditionNode;
use chrono::{DateTime, Utc};
use derive_more::{Constructor, Display, From};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Stable identifier a rule keeps across its entire version lineage (§3).
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display, From)]
pub struct RuleId(pub SmolStr);

impl RuleId {
    pub fn new(id: impl Into<SmolStr>) -> Self {
        Self(id.into())
    }
}

/// The InventoryAvailability flavour a rule contributes to (§3, §4.5).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum CalculationType {
    Gross,
    Net,
    Available,
    Reserved,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize, Serialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum RuleStatus {
    Draft,
    Active,
    Superseded,
}

/// The wall-clock window a published rule version is eligible to be selected in (§4.6). `to ==
/// None` means "open-ended" — still in force.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize, Serialize, Constructor)]
pub struct EffectiveWindow {
    pub from: DateTime<Utc>,
    pub to: Option<DateTime<Utc>>,
}

impl EffectiveWindow {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from <= at && self.to.is_none_or(|to| at < to)
    }

    pub fn overlaps(&self, other: &EffectiveWindow) -> bool {
        let self_end = self.to.unwrap_or(DateTime::<Utc>::MAX_UTC);
        let other_end = other.to.unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.from < other_end && other.from < self_end
    }
}

/// Additive/subtractive security selection for a rule (§4.5 step 2): `include` conditions widen
/// the candidate set, `exclude` conditions narrow it, evaluated against the same attribute schema
/// as [`ConditionNode`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct Criteria {
    pub include: Vec<ConditionNode>,
    pub exclude: Vec<ConditionNode>,
}

/// What a matched rule contributes to the aggregated inventory number (§4.5 step 3).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum Action {
    IncludeInCalculation,
    ExcludeFromCalculation,
    MultiplyQuantity { factor: rust_decimal::Decimal },
    ReserveForPledge { quantity: rust_decimal::Decimal },
}

/// A versioned inventory rule (§3, §4.6).
///
/// Lifecycle: `Draft` -> `Active` -> `Superseded`; only [`crate::engine::RuleEngine::publish`]
/// moves a draft to active, and only one version of a given `(calculation_type, market,
/// rule_name)` may be active at a given wall-clock instant — enforced by non-overlapping
/// [`EffectiveWindow`]s, not by version number.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Rule {
    pub id: RuleId,
    pub version: u32,
    pub rule_name: SmolStr,
    pub market: SmolStr,
    pub calculation_type: CalculationType,
    pub priority: i32,
    pub effective_window: EffectiveWindow,
    pub criteria: Criteria,
    pub conditions: ConditionNode,
    pub actions: Vec<Action>,
    pub status: RuleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
