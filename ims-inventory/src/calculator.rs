use crate::{
    cache::RuleSetCache,
    error::InventoryError,
    key::InventoryKey,
    model::{InventoryAvailability, InventoryStatus, Temperature},
};
use chrono::Utc;
use ims_macro::ComponentName;
use ims_metrics::{HealthCheck, HealthStatus};
use ims_rules::{Action, EvaluationContext, RuleEngine};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::{collections::HashMap, sync::Arc};

/// The position/contract change that triggers a recomputation (§4.5), plus the attribute context
/// rule conditions are evaluated against and the inputs not owned by the Rule Engine (the current
/// externally-tracked decrement, temperature, and borrow rate).
#[derive(Debug, Clone)]
pub struct CalculationInput {
    pub key: InventoryKey,
    pub market: String,
    pub quantity_gross: Decimal,
    pub decrement: Decimal,
    pub temperature: Temperature,
    pub borrow_rate: Decimal,
    pub context: EvaluationContext,
}

/// The Inventory Calculator (§4.5): re-evaluates an `InventoryAvailability` record whenever a
/// position or contract change is observed, selecting the highest-priority matching rule for the
/// target `(market, calculation_type)` and composing its actions into the new record.
///
/// Partitioned by security per §5 ("per-key serializability (partition by security)"); the
/// internal lock here only ever guards one partition's slice of state in a real deployment, same
/// as [`ims_position::PositionEngine`].
#[derive(ComponentName)]
pub struct InventoryCalculator {
    rule_engine: Arc<RuleEngine>,
    rule_cache: RuleSetCache,
    state: Mutex<HashMap<InventoryKey, InventoryAvailability>>,
}

impl HealthCheck for InventoryCalculator {
    fn component_name(&self) -> &str {
        Self::COMPONENT_NAME
    }

    fn check(&self) -> HealthStatus {
        HealthStatus::Healthy
    }
}

impl InventoryCalculator {
    pub fn new(rule_engine: Arc<RuleEngine>) -> Self {
        Self {
            rule_engine,
            rule_cache: RuleSetCache::new(),
            state: Mutex::new(HashMap::new()),
        }
    }

    pub fn rule_cache(&self) -> &RuleSetCache {
        &self.rule_cache
    }

    pub fn current(&self, key: &InventoryKey) -> Option<InventoryAvailability> {
        self.state.lock().get(key).cloned()
    }

    /// Runs §4.5 steps 1-4: select ordered active rules, evaluate the first whose criteria and
    /// conditions match, compose its actions, and atomically install the new version.
    pub async fn recompute(&self, input: CalculationInput) -> Result<InventoryAvailability, InventoryError> {
        let rules = self
            .rule_cache
            .get_or_select(&self.rule_engine, &input.market, input.key.calculation_type)
            .await;

        let mut matched = None;
        for rule in rules.iter() {
            let included = if rule.criteria.include.is_empty() {
                true
            } else {
                let mut any = false;
                for condition in &rule.criteria.include {
                    any |= condition.evaluate(&input.context)?;
                }
                any
            };
            if !included {
                continue;
            }

            let mut excluded = false;
            for condition in &rule.criteria.exclude {
                excluded |= condition.evaluate(&input.context)?;
            }
            if excluded {
                continue;
            }

            if rule.conditions.evaluate(&input.context)? {
                matched = Some(rule);
                break;
            }
        }

        let previous_version = self.current(&input.key).map(|record| record.version).unwrap_or(0);

        let record = match matched {
            Some(rule) => {
                let mut gross = input.quantity_gross;
                let mut reserved = Decimal::ZERO;
                let mut excluded = false;

                for action in &rule.actions {
                    match action {
                        Action::IncludeInCalculation => {}
                        Action::ExcludeFromCalculation => excluded = true,
                        Action::MultiplyQuantity { factor } => gross *= factor,
                        Action::ReserveForPledge { quantity } => reserved += quantity,
                    }
                }

                if excluded {
                    InventoryAvailability {
                        key: input.key,
                        gross: Decimal::ZERO,
                        net: Decimal::ZERO,
                        available: Decimal::ZERO,
                        reserved: Decimal::ZERO,
                        decrement: Decimal::ZERO,
                        temperature: input.temperature,
                        borrow_rate: input.borrow_rate,
                        rule_id: Some(rule.id.clone()),
                        rule_version: Some(rule.version),
                        external_source: None,
                        status: InventoryStatus::Computed,
                        version: previous_version + 1,
                        updated_at: Utc::now(),
                    }
                } else {
                    let net = gross - input.decrement;
                    let reserved = reserved.clamp(Decimal::ZERO, net.max(Decimal::ZERO));
                    let available = net - reserved;
                    InventoryAvailability {
                        key: input.key,
                        gross,
                        net,
                        available,
                        reserved,
                        decrement: input.decrement,
                        temperature: input.temperature,
                        borrow_rate: input.borrow_rate,
                        rule_id: Some(rule.id.clone()),
                        rule_version: Some(rule.version),
                        external_source: None,
                        status: InventoryStatus::Computed,
                        version: previous_version + 1,
                        updated_at: Utc::now(),
                    }
                }
            }
            None => InventoryAvailability {
                key: input.key,
                gross: Decimal::ZERO,
                net: Decimal::ZERO,
                available: Decimal::ZERO,
                reserved: Decimal::ZERO,
                decrement: Decimal::ZERO,
                temperature: input.temperature,
                borrow_rate: input.borrow_rate,
                rule_id: None,
                rule_version: None,
                external_source: None,
                status: InventoryStatus::NoMatchingRule,
                version: previous_version + 1,
                updated_at: Utc::now(),
            },
        };

        if !record.invariants_hold() {
            return Err(InventoryError::InvariantViolated {
                reason: format!(
                    "available={} reserved={} decrement={} gross={}",
                    record.available, record.reserved, record.decrement, record.gross
                ),
            });
        }

        self.state.lock().insert(input.key, record.clone());
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ims_instrument::{aggregation_unit::AggregationUnitId, security::SecurityId};
    use ims_rules::{
        AttributeValue, CalculationType, ConditionNode, Criteria, EffectiveWindow, Operator, Rule,
        RuleId, RuleStatus,
    };
    use rust_decimal_macros::dec;

    fn key() -> InventoryKey {
        InventoryKey::new(
            SecurityId(1),
            AggregationUnitId(1),
            NaiveDate::from_ymd_opt(2026, 7, 28).unwrap(),
            CalculationType::Available,
        )
    }

    fn rule(id: &str, priority: i32, factor: Decimal) -> Rule {
        Rule {
            id: RuleId::new(id),
            version: 0,
            rule_name: "default".into(),
            market: "XLON".into(),
            calculation_type: CalculationType::Available,
            priority,
            effective_window: EffectiveWindow::new(Utc::now(), None),
            criteria: Criteria::default(),
            conditions: ConditionNode::Leaf {
                attribute: "market".into(),
                operator: Operator::Equals,
                value: AttributeValue::Text("XLON".into()),
            },
            actions: vec![Action::MultiplyQuantity { factor }],
            status: RuleStatus::Draft,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn input() -> CalculationInput {
        CalculationInput {
            key: key(),
            market: "XLON".into(),
            quantity_gross: dec!(100_000),
            decrement: Decimal::ZERO,
            temperature: Temperature::Gc,
            borrow_rate: dec!(0.01),
            context: EvaluationContext::new().with("market", AttributeValue::Text("XLON".into())),
        }
    }

    #[tokio::test]
    async fn higher_priority_matching_rule_wins_and_its_factor_is_applied() {
        let engine = Arc::new(RuleEngine::new());
        let a = engine.create(rule("A", 100, dec!(1.0))).await;
        engine.publish(&a.id).await.unwrap();
        let b = engine.create(rule("B", 200, dec!(0.5))).await;
        engine.publish(&b.id).await.unwrap();

        let calculator = InventoryCalculator::new(engine);
        let record = calculator.recompute(input()).await.unwrap();

        assert_eq!(record.rule_id, Some(RuleId::new("B")));
        assert_eq!(record.gross, dec!(50_000));
    }

    #[tokio::test]
    async fn cache_invalidation_picks_up_a_newly_published_higher_priority_rule() {
        let engine = Arc::new(RuleEngine::new());
        let a = engine.create(rule("A", 100, dec!(1.0))).await;
        engine.publish(&a.id).await.unwrap();

        let calculator = InventoryCalculator::new(engine.clone());
        let first = calculator.recompute(input()).await.unwrap();
        assert_eq!(first.gross, dec!(100_000));

        let b = engine.create(rule("B", 200, dec!(0.5))).await;
        engine.publish(&b.id).await.unwrap();
        calculator.rule_cache().invalidate("XLON", CalculationType::Available);

        let second = calculator.recompute(input()).await.unwrap();
        assert_eq!(second.rule_id, Some(RuleId::new("B")));
        assert_eq!(second.gross, dec!(50_000));
    }

    #[tokio::test]
    async fn no_matching_rule_yields_a_zeroed_record_not_an_error() {
        let engine = Arc::new(RuleEngine::new());
        let calculator = InventoryCalculator::new(engine);
        let record = calculator.recompute(input()).await.unwrap();
        assert_eq!(record.status, InventoryStatus::NoMatchingRule);
        assert_eq!(record.available, Decimal::ZERO);
    }

    #[tokio::test]
    async fn available_never_goes_negative_even_when_reserve_exceeds_gross() {
        let engine = Arc::new(RuleEngine::new());
        let mut big_reserve = rule("A", 100, dec!(1.0));
        big_reserve.actions.push(Action::ReserveForPledge {
            quantity: dec!(1_000_000),
        });
        let a = engine.create(big_reserve).await;
        engine.publish(&a.id).await.unwrap();

        let calculator = InventoryCalculator::new(engine);
        let record = calculator.recompute(input()).await.unwrap();
        assert_eq!(record.available, Decimal::ZERO);
    }
}
