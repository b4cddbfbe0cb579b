use crate::error::RuleError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::collections::HashMap;

/// The operator set conditions may apply to an attribute (§4.6).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    Equals,
    NotEquals,
    Gt,
    Ge,
    Lt,
    Le,
    In,
    NotIn,
    StartsWith,
    Matches,
}

/// A value an attribute may hold or a condition may compare against.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Text(String),
    Number(Decimal),
    List(Vec<String>),
}

/// The fixed schema of evaluable attributes a condition is resolved against (§4.6): a snapshot of
/// the security/position/market facts relevant to one inventory calculation, assembled by the
/// Inventory Calculator before rule evaluation.
#[derive(Debug, Clone, Default)]
pub struct EvaluationContext {
    attributes: HashMap<SmolStr, AttributeValue>,
}

impl EvaluationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, attribute: impl Into<SmolStr>, value: AttributeValue) -> Self {
        self.attributes.insert(attribute.into(), value);
        self
    }

    pub fn get(&self, attribute: &str) -> Option<&AttributeValue> {
        self.attributes.get(attribute)
    }
}

/// An explicit AND/OR tree, resolving the Open Question left by a flat condition list with
/// ambiguous precedence (§9). Evaluation is exhaustive, not short-circuiting: every leaf is
/// visited and traced regardless of an earlier sibling's result, so `Rule.Test` always returns a
/// complete trace of the whole tree rather than stopping at the first deciding leaf.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum ConditionNode {
    Leaf {
        attribute: SmolStr,
        operator: Operator,
        value: AttributeValue,
    },
    And(Vec<ConditionNode>),
    Or(Vec<ConditionNode>),
}

/// One evaluated leaf, recorded by [`ConditionNode::evaluate_traced`] so `Rule.Test` (§4.6,
/// §6) can return a human-readable trace instead of a bare boolean.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeafTrace {
    pub attribute: SmolStr,
    pub operator: Operator,
    pub matched: bool,
}

impl ConditionNode {
    pub fn evaluate(&self, ctx: &EvaluationContext) -> Result<bool, RuleError> {
        let mut trace = Vec::new();
        self.evaluate_traced(ctx, &mut trace)
    }

    pub fn evaluate_traced(
        &self,
        ctx: &EvaluationContext,
        trace: &mut Vec<LeafTrace>,
    ) -> Result<bool, RuleError> {
        match self {
            ConditionNode::Leaf {
                attribute,
                operator,
                value,
            } => {
                let actual = ctx.get(attribute).ok_or_else(|| RuleError::UnknownAttribute {
                    attribute: attribute.clone(),
                })?;
                let matched = apply_operator(attribute, *operator, actual, value)?;
                trace.push(LeafTrace {
                    attribute: attribute.clone(),
                    operator: *operator,
                    matched,
                });
                Ok(matched)
            }
            ConditionNode::And(children) => {
                let mut result = true;
                for child in children {
                    result &= child.evaluate_traced(ctx, trace)?;
                }
                Ok(result)
            }
            ConditionNode::Or(children) => {
                let mut result = false;
                for child in children {
                    result |= child.evaluate_traced(ctx, trace)?;
                }
                Ok(result)
            }
        }
    }
}

fn apply_operator(
    attribute: &SmolStr,
    operator: Operator,
    actual: &AttributeValue,
    expected: &AttributeValue,
) -> Result<bool, RuleError> {
    use AttributeValue::*;
    use Operator::*;

    let type_error = || RuleError::TypeMismatch {
        attribute: attribute.clone(),
        operator: format!("{operator:?}"),
    };

    match operator {
        Equals => Ok(actual == expected),
        NotEquals => Ok(actual != expected),
        Gt | Ge | Lt | Le => {
            let (Number(a), Number(b)) = (actual, expected) else {
                return Err(type_error());
            };
            Ok(match operator {
                Gt => a > b,
                Ge => a >= b,
                Lt => a < b,
                Le => a <= b,
                _ => unreachable!(),
            })
        }
        In | NotIn => {
            let (Text(a), List(list)) = (actual, expected) else {
                return Err(type_error());
            };
            let contains = list.iter().any(|item| item == a);
            Ok(if operator == In { contains } else { !contains })
        }
        StartsWith => {
            let (Text(a), Text(prefix)) = (actual, expected) else {
                return Err(type_error());
            };
            Ok(a.starts_with(prefix.as_str()))
        }
        Matches => {
            let (Text(a), Text(pattern)) = (actual, expected) else {
                return Err(type_error());
            };
            Ok(glob_match(pattern, a))
        }
    }
}

/// Minimal `*`/`?` glob matcher for the `MATCHES` operator — no regex dependency needed for the
/// wildcard-only patterns this attribute schema supports.
fn glob_match(pattern: &str, text: &str) -> bool {
    fn inner(pattern: &[u8], text: &[u8]) -> bool {
        match (pattern.first(), text.first()) {
            (None, None) => true,
            (Some(b'*'), _) => {
                inner(&pattern[1..], text) || (!text.is_empty() && inner(pattern, &text[1..]))
            }
            (Some(b'?'), Some(_)) => inner(&pattern[1..], &text[1..]),
            (Some(p), Some(t)) if p == t => inner(&pattern[1..], &text[1..]),
            _ => false,
        }
    }
    inner(pattern.as_bytes(), text.as_bytes())
}
