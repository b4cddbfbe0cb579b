use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display,
)]
pub struct CounterpartyId(pub u64);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum CounterpartyKind {
    Broker,
    Custodian,
    Client,
    LendingAgent,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum CounterpartyStatus {
    Active,
    Suspended,
}

/// A trading counterparty (broker, custodian, client, lending agent, ...) referenced by trades,
/// locates, and limit allocations (§3). Names are free text, so unlike [`crate::security`]
/// identifiers they are not case-normalised.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Counterparty {
    pub id: CounterpartyId,
    pub name: String,
    pub kind: CounterpartyKind,
    pub status: CounterpartyStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
