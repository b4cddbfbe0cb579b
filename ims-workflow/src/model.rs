use chrono::{DateTime, Utc};
use ims_instrument::{
    aggregation_unit::AggregationUnitId, counterparty::CounterpartyId, security::SecurityId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// A request to approve a locate for a short-sell order (§4.8).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LocateRequest {
    pub id: SmolStr,
    pub client: CounterpartyId,
    pub aggregation_unit: AggregationUnitId,
    pub security: SecurityId,
    pub market: SmolStr,
    pub quantity: Decimal,
    pub requested_at: DateTime<Utc>,
}

/// Outcome recorded against a [`LocateRequest`] (§4.8).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum LocateOutcome {
    Approved {
        quantity: Decimal,
        expires_at: DateTime<Utc>,
    },
    PartiallyApproved {
        approved_quantity: Decimal,
        expires_at: DateTime<Utc>,
    },
    Queued,
    Rejected {
        reason: String,
    },
}

/// One append-only entry in the Locate Workflow's decision log (§4.8: "all outcomes are appended
/// to the decision log, append-only, monotonic sequence per queue").
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LocateDecision {
    pub sequence: u64,
    pub request_id: SmolStr,
    pub outcome: LocateOutcome,
    pub decided_at: DateTime<Utc>,
}

/// The order quantity a short-sell submission asks to execute against short-sell-available
/// (§4.9).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ShortSellOrder {
    pub id: SmolStr,
    pub client: CounterpartyId,
    pub aggregation_unit: AggregationUnitId,
    pub security: SecurityId,
    pub executable_quantity: Decimal,
}

/// The stable reason codes a Short-Sell Gate rejection carries (§7).
#[derive(Debug, Clone, Copy, Eq, PartialEq, Deserialize, Serialize)]
pub enum RejectReason {
    InsufficientAvailability,
    ClientLimit,
    RuleBlocked,
    Timeout,
    InvalidOrder,
}

/// The synchronous result of [`crate::short_sell::ShortSellGate::validate`] (§4.9).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum ShortSellVerdict {
    Accepted,
    Rejected { reason: RejectReason },
}

/// One append-only entry in the Short-Sell Gate's decision log (§4.9: "append a ShortSellDecision
/// record asynchronously; return the decision synchronously").
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ShortSellDecision {
    pub sequence: u64,
    pub order_id: SmolStr,
    pub verdict: ShortSellVerdict,
    pub latency_ms: u64,
    pub decided_at: DateTime<Utc>,
}
