use ims_instrument::error::ReferenceError;
use ims_limits::LimitError;
use thiserror::Error;

/// Errors raised by the Locate Workflow (§4.8) and Short-Sell Gate (§4.9).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkflowError {
    #[error("security {0:?} does not exist")]
    UnknownSecurity(ims_instrument::security::SecurityId),

    #[error("client {0:?} is not active")]
    ClientNotActive(ims_instrument::counterparty::CounterpartyId),

    #[error("requested quantity must be positive, got {0}")]
    NonPositiveQuantity(rust_decimal::Decimal),

    #[error("reference lookup failed: {0}")]
    Reference(#[from] ReferenceError),

    #[error("limit service error: {0}")]
    Limit(#[from] LimitError),

    #[error("gate exceeded its {budget_ms} ms decision budget")]
    Timeout { budget_ms: u64 },

    #[error("no queued locate request with id {0}")]
    UnknownLocateRequest(smol_str::SmolStr),
}
