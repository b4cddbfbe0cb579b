use crate::key::LimitKey;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by the Limit Service (§4.7, §7).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LimitError {
    #[error("decrement rejected for {key:?}: requested {requested} exceeds available {available}")]
    InsufficientAvailability {
        key: LimitKey,
        requested: Decimal,
        available: Decimal,
    },

    #[error("decrement contended for {key:?} after {attempts} retries")]
    Contended { key: LimitKey, attempts: u32 },

    #[error("decrement for {key:?} timed out waiting for the CAS budget")]
    Timeout { key: LimitKey },

    #[error("replenish for {key:?} would drive reserved below zero")]
    NegativeReserved { key: LimitKey },
}
