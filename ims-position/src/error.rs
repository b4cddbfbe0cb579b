use ims_instrument::security::SecurityId;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use thiserror::Error;

/// Errors raised by the Position Engine (§4.4, §7).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Error)]
pub enum PositionError {
    #[error("trade {trade_id} rejected as a duplicate: event {event_id} <= last-applied {last_applied}")]
    RejectedDuplicate {
        trade_id: SmolStr,
        event_id: u64,
        last_applied: u64,
    },

    #[error("no snapshot found for shard {shard}, starting from a flat state")]
    NoSnapshot { shard: u32 },

    #[error("quantity delta would breach an invariant for ({book}, {security:?}): {reason}")]
    InvalidDelta {
        book: SmolStr,
        security: SecurityId,
        reason: String,
    },
}
