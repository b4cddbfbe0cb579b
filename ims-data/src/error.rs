use crate::source::SourceTag;
use ims_instrument::error::ReferenceError;
use ims_integration::error::BusError;
use thiserror::Error;

/// All errors generated in `ims-data` (§4.2, §7).
///
/// Not `Clone`/`Serialize`: [`BusError::Serialise`]/[`BusError::Deserialise`] wrap a
/// non-`Clone` `serde_json::Error`.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("record from {source} failed schema validation: {reason}")]
    SchemaInvalid { source: SourceTag, reason: String },

    #[error("record from {source} references unresolvable identifier: {identifier}")]
    IdentifierUnresolved {
        source: SourceTag,
        identifier: String,
    },

    #[error("duplicate record within batch: (external_id={external_id}, kind={identifier_kind:?}, source={source})")]
    Duplicate {
        source: SourceTag,
        external_id: String,
        identifier_kind: String,
    },

    #[error("reference store conflict: {0}")]
    ReferenceConflict(#[from] ReferenceError),

    #[error("bus error while publishing canonical event: {0}")]
    Bus(#[from] BusError),
}

impl DataError {
    /// Whether this error should fail an individual record (counted in
    /// [`crate::batch::BatchReport::errors`]) without aborting the rest of the batch.
    pub fn is_record_scoped(&self) -> bool {
        !matches!(self, DataError::Bus(_))
    }
}
