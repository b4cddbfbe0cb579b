use crate::{
    condition::{EvaluationContext, LeafTrace},
    error::RuleError,
    model::{CalculationType, Rule, RuleId, RuleStatus},
};
use chrono::Utc;
use ims_macro::ComponentName;
use ims_metrics::{HealthCheck, HealthStatus};
use parking_lot::Mutex;
use std::collections::HashMap;

/// The result of `Rule.Test` (§4.6, §6): whether the rule's criteria/conditions matched, plus the
/// per-leaf trace that produced the verdict.
#[derive(Debug, Clone)]
pub struct RuleTrace {
    pub included: bool,
    pub excluded: bool,
    pub condition_matched: bool,
    pub leaves: Vec<LeafTrace>,
}

/// Every version ever created for a [`RuleId`], newest last. Publishing moves the newest `Draft`
/// to `Active` and, if an older version was `Active`, closes its [`crate::model::EffectiveWindow`]
/// and marks it `Superseded` — version history is never rewritten, only appended to.
struct Lineage {
    versions: Vec<Rule>,
}

impl Lineage {
    fn latest_version(&self) -> u32 {
        self.versions.last().map(|rule| rule.version).unwrap_or(0)
    }

    fn version(&self, version: u32) -> Option<&Rule> {
        self.versions.iter().find(|rule| rule.version == version)
    }

    fn version_mut(&mut self, version: u32) -> Option<&mut Rule> {
        self.versions.iter_mut().find(|rule| rule.version == version)
    }
}

struct State {
    lineages: HashMap<RuleId, Lineage>,
}

/// The Rule Engine (§4.6): versioned rule storage with an explicit lineage per [`RuleId`], plus
/// selection of the active rule set for a `(market, calculation_type)` pair (§4.5 step 1).
///
/// Read-mostly: per §5, this cache is swapped on version change rather than guarded with reader
/// locks in the steady state; the single [`Mutex`] here only ever serializes the (rare)
/// create/edit/publish/revert write path, never ordinary lookups, which is why
/// [`RuleEngine::select_active`] takes a read lock only long enough to clone the matching rules.
#[derive(ComponentName)]
pub struct RuleEngine {
    state: Mutex<State>,
}

impl HealthCheck for RuleEngine {
    fn component_name(&self) -> &str {
        Self::COMPONENT_NAME
    }

    fn check(&self) -> HealthStatus {
        HealthStatus::Healthy
    }
}

impl RuleEngine {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                lineages: HashMap::new(),
            }),
        }
    }

    /// Creates a brand-new rule lineage at version 1, status `Draft`.
    pub async fn create(&self, mut draft: Rule) -> Rule {
        draft.version = 1;
        draft.status = RuleStatus::Draft;
        draft.created_at = Utc::now();
        draft.updated_at = Utc::now();

        let mut state = self.state.lock();
        state.lineages.insert(
            draft.id.clone(),
            Lineage {
                versions: vec![draft.clone()],
            },
        );
        draft
    }

    /// Appends a new draft version on top of `base_version`, rejecting the edit if a newer
    /// version has since been created (optimistic concurrency over the lineage).
    pub async fn edit(&self, mut draft: Rule, base_version: u32) -> Result<Rule, RuleError> {
        let mut state = self.state.lock();
        let lineage = state
            .lineages
            .get_mut(&draft.id)
            .ok_or_else(|| RuleError::VersionNotFound {
                id: draft.id.clone(),
                version: base_version,
            })?;

        let current_version = lineage.latest_version();
        if current_version != base_version {
            return Err(RuleError::StaleBaseVersion {
                id: draft.id.clone(),
                base_version,
                current_version,
            });
        }

        draft.version = current_version + 1;
        draft.status = RuleStatus::Draft;
        draft.updated_at = Utc::now();
        lineage.versions.push(draft.clone());
        Ok(draft)
    }

    /// Publishes the newest draft version, enforcing §4.6's invariant: at most one active version
    /// per `(calculation_type, market, rule_name)` at any wall-clock time. Any currently-active
    /// version of the same lineage is superseded; a conflicting active version belonging to a
    /// *different* lineage is rejected rather than silently shadowed.
    pub async fn publish(&self, id: &RuleId) -> Result<Rule, RuleError> {
        let mut state = self.state.lock();

        let (market, calculation_type, rule_name, window, draft_version) = {
            let lineage = state.lineages.get(id).ok_or_else(|| RuleError::NoDraft { id: id.clone() })?;
            let draft = lineage
                .versions
                .iter()
                .rev()
                .find(|rule| rule.status == RuleStatus::Draft)
                .ok_or_else(|| RuleError::NoDraft { id: id.clone() })?;
            (
                draft.market.clone(),
                draft.calculation_type,
                draft.rule_name.clone(),
                draft.effective_window,
                draft.version,
            )
        };

        for (other_id, lineage) in state.lineages.iter() {
            if other_id == id {
                continue;
            }
            for rule in &lineage.versions {
                if rule.status == RuleStatus::Active
                    && rule.market == market
                    && rule.calculation_type == calculation_type
                    && rule.rule_name == rule_name
                    && rule.effective_window.overlaps(&window)
                {
                    return Err(RuleError::ActiveWindowConflict {
                        id: id.clone(),
                        version: draft_version,
                        market,
                        calculation_type,
                        rule_name,
                    });
                }
            }
        }

        let lineage = state.lineages.get_mut(id).expect("checked above");
        for rule in lineage.versions.iter_mut() {
            if rule.status == RuleStatus::Active {
                rule.status = RuleStatus::Superseded;
                rule.updated_at = Utc::now();
            }
        }
        let published = lineage
            .version_mut(draft_version)
            .expect("draft version located above");
        published.status = RuleStatus::Active;
        published.updated_at = Utc::now();
        Ok(published.clone())
    }

    /// Evaluates `rule` against `sample` without persisting anything, returning a trace suitable
    /// for an operator reviewing a draft before publishing.
    pub fn test(&self, rule: &Rule, sample: &EvaluationContext) -> Result<RuleTrace, RuleError> {
        let mut leaves = Vec::new();

        let mut included = rule.criteria.include.is_empty();
        for condition in &rule.criteria.include {
            included |= condition.evaluate_traced(sample, &mut leaves)?;
        }

        let mut excluded = false;
        for condition in &rule.criteria.exclude {
            excluded |= condition.evaluate_traced(sample, &mut leaves)?;
        }

        let condition_matched = rule.conditions.evaluate_traced(sample, &mut leaves)?;

        Ok(RuleTrace {
            included,
            excluded,
            condition_matched,
            leaves,
        })
    }

    /// Reverts a lineage to an earlier version by republishing its body as a brand-new version —
    /// history is append-only, so reverting never deletes the version being reverted away from
    /// (§4.6: "reversion produces a new version").
    pub async fn revert_to(&self, id: &RuleId, version: u32) -> Result<Rule, RuleError> {
        let restored_body = {
            let state = self.state.lock();
            let lineage = state.lineages.get(id).ok_or_else(|| RuleError::VersionNotFound {
                id: id.clone(),
                version,
            })?;
            lineage
                .version(version)
                .ok_or_else(|| RuleError::VersionNotFound {
                    id: id.clone(),
                    version,
                })?
                .clone()
        };

        let current_version = {
            let state = self.state.lock();
            state.lineages[id].latest_version()
        };

        let mut new_draft = restored_body;
        let draft = self.edit(new_draft.clone(), current_version).await?;
        new_draft = draft;
        self.publish(&new_draft.id).await
    }

    /// Selects the active rules for `(market, calculation_type)`, ordered by `(priority desc,
    /// version desc, rule-id lexicographic)` per §4.5 step 1.
    pub async fn select_active(&self, market: &str, calculation_type: CalculationType) -> Vec<Rule> {
        let state = self.state.lock();
        let mut selected: Vec<Rule> = state
            .lineages
            .values()
            .flat_map(|lineage| lineage.versions.iter())
            .filter(|rule| {
                rule.status == RuleStatus::Active
                    && rule.market == market
                    && rule.calculation_type == calculation_type
            })
            .cloned()
            .collect();

        selected.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| b.version.cmp(&a.version))
                .then_with(|| a.id.0.cmp(&b.id.0))
        });
        selected
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{AttributeValue, ConditionNode, Operator};
    use crate::model::{Action, Criteria, EffectiveWindow};
    use chrono::Utc;

    fn draft(id: &str, market: &str, priority: i32) -> Rule {
        Rule {
            id: RuleId::new(id),
            version: 0,
            rule_name: "default".into(),
            market: market.into(),
            calculation_type: CalculationType::Available,
            priority,
            effective_window: EffectiveWindow::new(Utc::now(), None),
            criteria: Criteria::default(),
            conditions: ConditionNode::And(vec![]),
            actions: vec![Action::IncludeInCalculation],
            status: RuleStatus::Draft,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn publish_then_higher_priority_rule_wins_selection() {
        let engine = RuleEngine::new();
        let a = engine.create(draft("A", "XLON", 100)).await;
        engine.publish(&a.id).await.unwrap();

        let b = engine.create(draft("B", "XLON", 200)).await;
        engine.publish(&b.id).await.unwrap();

        let selected = engine.select_active("XLON", CalculationType::Available).await;
        assert_eq!(selected[0].id, RuleId::new("B"));
        assert_eq!(selected[1].id, RuleId::new("A"));
    }

    #[tokio::test]
    async fn revert_to_restores_prior_behaviour_as_a_new_version() {
        let engine = RuleEngine::new();
        let a = engine.create(draft("A", "XLON", 100)).await;
        engine.publish(&a.id).await.unwrap();

        let mut edited = a.clone();
        edited.priority = 999;
        let edited = engine.edit(edited, 1).await.unwrap();
        engine.publish(&edited.id).await.unwrap();

        let reverted = engine.revert_to(&a.id, 1).await.unwrap();
        assert_eq!(reverted.priority, 100);
        assert_eq!(reverted.version, 3);
    }

    #[tokio::test]
    async fn test_reports_a_per_leaf_trace_without_persisting_anything() {
        let engine = RuleEngine::new();
        let mut rule = draft("A", "XLON", 100);
        rule.conditions = ConditionNode::Leaf {
            attribute: "market".into(),
            operator: Operator::Equals,
            value: AttributeValue::Text("XLON".into()),
        };

        let sample = EvaluationContext::new().with("market", AttributeValue::Text("XLON".into()));
        let trace = engine.test(&rule, &sample).unwrap();
        assert!(trace.condition_matched);
        assert_eq!(trace.leaves.len(), 1);
    }

    #[tokio::test]
    async fn edit_against_a_stale_base_version_is_rejected() {
        let engine = RuleEngine::new();
        let a = engine.create(draft("A", "XLON", 100)).await;
        engine.edit(a.clone(), 1).await.unwrap();

        let err = engine.edit(a, 1).await.unwrap_err();
        assert!(matches!(err, RuleError::StaleBaseVersion { .. }));
    }
}
