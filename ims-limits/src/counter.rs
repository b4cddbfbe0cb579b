use derive_more::Constructor;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The consumable counter the Limit Service holds per [`crate::key::LimitKey`] (§4.7).
///
/// `decrement` is everything currently consumed (short-sell and locate); `reserved` is the subset
/// of `decrement` carrying a TTL (locate holds) that will auto-replenish on expiry. A permanent
/// short-sell consumption is `decrement` without a matching `reserved` contribution.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize, Serialize, Constructor)]
pub struct LimitCounter {
    pub available: Decimal,
    pub reserved: Decimal,
    pub decrement: Decimal,
    pub version: u64,
}

impl LimitCounter {
    pub fn flat() -> Self {
        Self {
            available: Decimal::ZERO,
            reserved: Decimal::ZERO,
            decrement: Decimal::ZERO,
            version: 0,
        }
    }

    /// The `(available, reserved, decrement, version)` tuple `snapshot(key)` returns (§4.7).
    pub fn snapshot(&self) -> (Decimal, Decimal, Decimal, u64) {
        (self.available, self.reserved, self.decrement, self.version)
    }
}
