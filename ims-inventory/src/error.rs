use ims_rules::RuleError;
use thiserror::Error;

/// Errors raised by the Inventory Calculator (§4.5, §7).
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("rule evaluation failed while recomputing availability: {0}")]
    RuleEvaluation(#[from] RuleError),

    #[error("recomputed availability would violate an invariant: {reason}")]
    InvariantViolated { reason: String },

    #[error("recompute rejected a stale base version: supplied {supplied}, current {current}")]
    StaleVersion { supplied: u64, current: u64 },
}
