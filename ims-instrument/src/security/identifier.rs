use super::name::IdentifierValue;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// The scheme a [`SecurityIdentifier::value`] is expressed in.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierKind {
    Ric,
    Isin,
    Cusip,
    Sedol,
    Bloomberg,
    Internal,
}

/// A single external-system identifier attached to a [`crate::security::Security`] (§3), tagged
/// with the source feed it arrived from and that source's priority for conflict resolution
/// (§4.3, §9).
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct SecurityIdentifier {
    pub kind: IdentifierKind,
    pub value: IdentifierValue,
    pub source: SmolStr,
    pub priority: u8,
    pub is_primary: bool,
}

impl SecurityIdentifier {
    pub fn new<V, S>(kind: IdentifierKind, value: V, source: S, priority: u8) -> Self
    where
        V: Into<IdentifierValue>,
        S: Into<SmolStr>,
    {
        Self {
            kind,
            value: value.into(),
            source: source.into(),
            priority,
            is_primary: false,
        }
    }
}
