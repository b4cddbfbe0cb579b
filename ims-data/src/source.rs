use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Identifies which upstream feed a [`crate::event::CanonicalEvent`] or
/// [`crate::error::DataError`] originated from (§4.2). Used both for per-source normalizer
/// dispatch and as the tie-break input to the Reference Store's conflict resolution (§4.3, §9).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum SourceTag {
    Reuters,
    Bloomberg,
    MarkIt,
    Ultumus,
    Rimes,
    TradeContract,
}

impl SourceTag {
    /// Default configured priority, higher wins a conflicting `upsertSecurity` (§4.3, §9).
    /// Operator configuration may override this per-deployment; this is the fallback.
    pub fn default_priority(self) -> u8 {
        match self {
            SourceTag::Reuters => 100,
            SourceTag::Bloomberg => 90,
            SourceTag::MarkIt => 70,
            SourceTag::Rimes => 60,
            SourceTag::Ultumus => 50,
            SourceTag::TradeContract => 10,
        }
    }
}
