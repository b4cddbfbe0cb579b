#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    clippy::unused_self,
    clippy::useless_let_if_seq,
    missing_debug_implementations,
    rust_2018_idioms
)]
#![allow(clippy::type_complexity, clippy::too_many_arguments, type_alias_bounds)]

//! # IMS-Instrument
//! Core Reference Store (§4.3) data structures: [`security::Security`], its external
//! [`security::SecurityIdentifier`]s, [`counterparty::Counterparty`], and
//! [`aggregation_unit::AggregationUnit`], plus the [`store::ReferenceStore`] that owns them.
//!
//! The store is the single source of truth for internal-to-external identifier resolution
//! consumed by Feed Normalizers (§4.2) and every downstream component that needs to translate a
//! source-specific code into a stable internal [`security::SecurityId`].

use derive_more::Constructor;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// [`aggregation_unit::AggregationUnit`] data structures.
pub mod aggregation_unit;

/// [`counterparty::Counterparty`] data structures.
pub mod counterparty;

/// Errors raised by the Reference Store.
pub mod error;

/// O(1) in-memory lookup index underpinning the [`store::ReferenceStore`].
pub mod index;

/// [`market::Market`] (venue/region) data structures.
pub mod market;

/// [`security::Security`] and [`security::SecurityIdentifier`] data structures.
pub mod security;

/// The [`store::ReferenceStore`] component itself.
pub mod store;

pub use store::ReferenceStore;

/// A keyed value.
///
/// eg/ `Keyed<SecurityIndex, Security>`
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Constructor,
)]
pub struct Keyed<Key, Value> {
    pub key: Key,
    pub value: Value,
}

impl<Key, Value> AsRef<Value> for Keyed<Key, Value> {
    fn as_ref(&self) -> &Value {
        &self.value
    }
}

impl<Key, Value> Display for Keyed<Key, Value>
where
    Key: Display,
    Value: Display,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.key, self.value)
    }
}
