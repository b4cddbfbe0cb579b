use crate::model::{CalculationType, RuleId};
use smol_str::SmolStr;
use thiserror::Error;

/// Errors raised by the Rule Engine (§4.6, §7).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuleError {
    #[error("no rule {id} version {version}")]
    VersionNotFound { id: RuleId, version: u32 },

    #[error("edit of rule {id} based on stale version {base_version} (current is {current_version})")]
    StaleBaseVersion {
        id: RuleId,
        base_version: u32,
        current_version: u32,
    },

    #[error(
        "publishing {id} v{version} would leave two active versions for \
         (market={market}, calculation_type={calculation_type}, rule_name={rule_name})"
    )]
    ActiveWindowConflict {
        id: RuleId,
        version: u32,
        market: SmolStr,
        calculation_type: CalculationType,
        rule_name: SmolStr,
    },

    #[error("rule {id} has no draft version to publish")]
    NoDraft { id: RuleId },

    #[error("condition references unknown attribute: {attribute}")]
    UnknownAttribute { attribute: SmolStr },

    #[error("condition applies operator {operator:?} to a value of the wrong type for attribute {attribute}")]
    TypeMismatch { attribute: SmolStr, operator: String },
}
