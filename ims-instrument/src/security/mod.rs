use crate::market::Market;
use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Normalised, source-agnostic identifier value types (RIC, ISIN, CUSIP, ...).
pub mod identifier;

/// Normalised uppercase representation of an identifier value.
pub mod name;

pub use identifier::{IdentifierKind, SecurityIdentifier};

/// Stable, opaque internal identifier for a [`Security`] (§3).
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display,
)]
pub struct SecurityId(pub u64);

/// O(1) array-index lookup key assigned by the [`crate::index::ReferenceIndex`] (distinct from
/// the stable [`SecurityId`], which survives across index rebuilds).
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display,
)]
pub struct SecurityIndex(pub usize);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum SecurityKind {
    Equity,
    Bond,
    Etf,
    Index,
    Future,
    Option,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum SecurityStatus {
    Active,
    Suspended,
    Delisted,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum BasketType {
    Index,
    Etf,
}

/// Comprehensive Security model (§3), the root entity of the Reference Store (§4.3).
///
/// Invariants upheld by [`crate::store::ReferenceStore`], not by this type alone:
/// - `id` unique across the store,
/// - at most one [`SecurityIdentifier`] marked `is_primary`,
/// - basket securities (`basket_type.is_some()`) have at least one constituent,
/// - constituent links form an acyclic graph (§9).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Security {
    pub id: SecurityId,
    pub kind: SecurityKind,
    pub issuer: String,
    pub currency: String,
    pub market: Market,
    pub identifiers: Vec<SecurityIdentifier>,
    pub status: SecurityStatus,
    pub basket_type: Option<BasketType>,
    pub constituents: Vec<SecurityId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: u64,
}

impl Security {
    pub fn primary_identifier(&self) -> Option<&SecurityIdentifier> {
        self.identifiers.iter().find(|id| id.is_primary)
    }

    pub fn is_basket(&self) -> bool {
        self.basket_type.is_some()
    }
}
