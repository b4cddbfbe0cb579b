use chrono::NaiveDate;
use ims_instrument::{aggregation_unit::AggregationUnitId, security::SecurityId};
use ims_rules::CalculationType;
use serde::{Deserialize, Serialize};

/// Identifies one `InventoryAvailability` record (§3): a security's availability for a given
/// aggregation unit, business date, and calculation type.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
pub struct InventoryKey {
    pub security: SecurityId,
    pub aggregation_unit: AggregationUnitId,
    pub business_date: NaiveDate,
    pub calculation_type: CalculationType,
}

impl InventoryKey {
    pub fn new(
        security: SecurityId,
        aggregation_unit: AggregationUnitId,
        business_date: NaiveDate,
        calculation_type: CalculationType,
    ) -> Self {
        Self {
            security,
            aggregation_unit,
            business_date,
            calculation_type,
        }
    }
}
