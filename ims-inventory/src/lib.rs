//! IMS-Inventory: the Inventory Calculator (§4.5).
//!
//! Re-evaluates `InventoryAvailability` whenever a position or contract change is observed:
//! selects the active rule set for the security's `(market, calculation_type)` from the Rule
//! Engine (cached and invalidated on rule publish, §4.5), evaluates each candidate rule's
//! criteria and conditions in priority order, and composes the first match's actions into a new
//! availability record.

pub mod cache;
pub mod calculator;
pub mod error;
pub mod key;
pub mod model;

pub use cache::RuleSetCache;
pub use calculator::{CalculationInput, InventoryCalculator};
pub use error::InventoryError;
pub use key::InventoryKey;
pub use model::{InventoryAvailability, InventoryStatus, Temperature};
