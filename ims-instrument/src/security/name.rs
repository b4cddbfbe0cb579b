use derive_more::Display;
use serde::Serialize;
use smol_str::{SmolStr, StrExt};
use std::borrow::Borrow;

/// Normalised uppercase `SmolStr` representation of a [`SecurityIdentifier`](super::identifier::SecurityIdentifier)
/// value (RIC, ISIN, CUSIP, SEDOL, ...).
///
/// Source feeds are inconsistent about casing (eg/ `vod.l` vs `VOD.L`); normalising at
/// construction keeps `findByExternal` lookups (§4.3) stable regardless of source formatting.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Display)]
pub struct IdentifierValue(SmolStr);

impl IdentifierValue {
    pub fn new<S>(value: S) -> Self
    where
        S: Into<SmolStr>,
    {
        let value = value.into();
        if value.chars().all(char::is_uppercase) {
            Self(value)
        } else {
            Self(value.to_uppercase_smolstr())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for IdentifierValue {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for IdentifierValue {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl Borrow<str> for IdentifierValue {
    fn borrow(&self) -> &str {
        self.0.borrow()
    }
}

impl AsRef<str> for IdentifierValue {
    fn as_ref(&self) -> &str {
        self.0.as_ref()
    }
}

impl<'de> serde::de::Deserialize<'de> for IdentifierValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::de::Deserializer<'de>,
    {
        let value = std::borrow::Cow::<'de, str>::deserialize(deserializer)?;
        Ok(IdentifierValue::new(value))
    }
}
