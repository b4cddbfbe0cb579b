use crate::key::InventoryKey;
use chrono::{DateTime, Utc};
use ims_rules::RuleId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Borrow-desirability classification (§3): general collateral vs. hard-to-borrow.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Temperature {
    Gc,
    Htb,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InventoryStatus {
    /// Computed from a matching rule.
    Computed,
    /// No active rule matched; the security is excluded from this calculation type.
    NoMatchingRule,
    /// An externally-sourced override (eg/ Ultumus basket-level availability) superseded the
    /// rule-computed value.
    ExternalOverride,
}

/// One versioned availability record (§3), keyed by [`InventoryKey`]. `available ≥ 0` and
/// `available + reserved + decrement ≤ gross` are invariants the [`crate::calculator`] upholds on
/// every write, never just checked after the fact.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct InventoryAvailability {
    pub key: InventoryKey,
    pub gross: Decimal,
    pub net: Decimal,
    pub available: Decimal,
    pub reserved: Decimal,
    pub decrement: Decimal,
    pub temperature: Temperature,
    pub borrow_rate: Decimal,
    pub rule_id: Option<RuleId>,
    pub rule_version: Option<u32>,
    pub external_source: Option<SmolStr>,
    pub status: InventoryStatus,
    pub version: u64,
    pub updated_at: DateTime<Utc>,
}

impl InventoryAvailability {
    /// Checks the invariants this record must hold at every observable moment (§8).
    pub fn invariants_hold(&self) -> bool {
        self.available >= Decimal::ZERO
            && self.available + self.reserved + self.decrement <= self.gross
    }
}
