use crate::security::{IdentifierKind, SecurityId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by the Reference Store (§4.3).
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize, Error)]
pub enum ReferenceError {
    #[error("security {0} is not present in the reference store")]
    SecurityNotFound(SecurityId),

    #[error("no security found for external identifier {kind:?}:{value}")]
    IdentifierNotFound { kind: IdentifierKind, value: String },

    #[error(
        "identifier {kind:?}:{value} is claimed by sources {} and {incoming_source}, neither resolvable by priority",
        existing_sources.join(", ")
    )]
    IdentifierConflict {
        kind: IdentifierKind,
        value: String,
        existing_sources: Vec<String>,
        incoming_source: String,
    },

    #[error("basket security {0} must declare at least one constituent")]
    EmptyBasket(SecurityId),

    #[error("adding constituent {constituent} to basket {basket} would create a cycle")]
    ConstituentCycle {
        basket: SecurityId,
        constituent: SecurityId,
    },

    #[error("counterparty {0} is not present in the reference store")]
    CounterpartyNotFound(u64),

    #[error("aggregation unit {0} is not present in the reference store")]
    AggregationUnitNotFound(u64),
}

impl ReferenceError {
    /// Whether this error represents a data conflict (§7 Conflict error class) rather than a
    /// plain not-found/validation failure.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            ReferenceError::IdentifierConflict { .. } | ReferenceError::ConstituentCycle { .. }
        )
    }
}
