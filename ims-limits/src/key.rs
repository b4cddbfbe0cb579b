use ims_instrument::{aggregation_unit::AggregationUnitId, counterparty::CounterpartyId, security::SecurityId};
use serde::{Deserialize, Serialize};

/// Identifies one consumable counter held by the Limit Service (§4.7): a client's short-sell or
/// locate availability for a security within an aggregation unit.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
pub struct LimitKey {
    pub client: CounterpartyId,
    pub aggregation_unit: AggregationUnitId,
    pub security: SecurityId,
}

impl LimitKey {
    pub fn new(client: CounterpartyId, aggregation_unit: AggregationUnitId, security: SecurityId) -> Self {
        Self {
            client,
            aggregation_unit,
            security,
        }
    }
}
