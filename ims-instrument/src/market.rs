use derive_more::Display;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Market/venue a [`crate::security::Security`] is primarily listed or traded on (eg/ `XLON`,
/// `XNYS` MIC codes), and the region it belongs to for aggregation-unit purposes (§3).
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display)]
#[display("{mic}")]
pub struct Market {
    pub mic: SmolStr,
    pub region: SmolStr,
}

impl Market {
    pub fn new<M, R>(mic: M, region: R) -> Self
    where
        M: Into<SmolStr>,
        R: Into<SmolStr>,
    {
        Self {
            mic: mic.into(),
            region: region.into(),
        }
    }
}
