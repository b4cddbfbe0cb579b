use ims_instrument::counterparty::CounterpartyKind;
use rust_decimal::Decimal;
use smol_str::SmolStr;
use std::collections::HashMap;

/// Decides whether a locate is auto-approvable for `(market, client kind)` (§4.8: "auto-approve
/// permitted for (market, client-type, requested ≤ cap)"), and whether a partial approval is
/// allowed when full quantity is unavailable.
pub trait LocatePolicy: Send + Sync {
    fn auto_approval_cap(&self, market: &str, client_kind: CounterpartyKind) -> Option<Decimal>;

    fn allows_partial_approval(&self, market: &str, client_kind: CounterpartyKind) -> bool;
}

/// A static table-driven [`LocatePolicy`] keyed by `(market, client kind)`.
#[derive(Debug, Default)]
pub struct TablePolicy {
    caps: HashMap<(SmolStr, CounterpartyKind), Decimal>,
    partial_allowed: HashMap<(SmolStr, CounterpartyKind), bool>,
}

impl TablePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cap(mut self, market: impl Into<SmolStr>, kind: CounterpartyKind, cap: Decimal) -> Self {
        self.caps.insert((market.into(), kind), cap);
        self
    }

    pub fn with_partial_approval(mut self, market: impl Into<SmolStr>, kind: CounterpartyKind, allowed: bool) -> Self {
        self.partial_allowed.insert((market.into(), kind), allowed);
        self
    }
}

impl LocatePolicy for TablePolicy {
    fn auto_approval_cap(&self, market: &str, client_kind: CounterpartyKind) -> Option<Decimal> {
        self.caps.get(&(SmolStr::new(market), client_kind)).copied()
    }

    fn allows_partial_approval(&self, market: &str, client_kind: CounterpartyKind) -> bool {
        self.partial_allowed
            .get(&(SmolStr::new(market), client_kind))
            .copied()
            .unwrap_or(false)
    }
}
