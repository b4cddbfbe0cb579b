//! IMS-Rules: the Rule Engine (§4.6).
//!
//! Stores versioned, market-scoped rules and evaluates them against a fixed attribute schema.
//! A rule's lineage is append-only: `create` starts it at version 1, `edit` appends a draft,
//! `publish` promotes the newest draft to active (superseding whatever was previously active for
//! the same `(calculation_type, market, rule_name)`), and `revert_to` republishes an earlier
//! version's body as a brand-new version rather than rewriting history.

pub mod condition;
pub mod engine;
pub mod error;
pub mod model;

pub use condition::{AttributeValue, ConditionNode, EvaluationContext, Operator};
pub use engine::{RuleEngine, RuleTrace};
pub use error::RuleError;
pub use model::{Action, CalculationType, Criteria, EffectiveWindow, Rule, RuleId, RuleStatus};
