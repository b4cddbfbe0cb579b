use ims_rules::{CalculationType, Rule, RuleEngine};
use parking_lot::Mutex;
use smol_str::SmolStr;
use std::{collections::HashMap, sync::Arc};

/// Per-`(market, calculation_type)` selected rule set, cached across recomputations (§4.5: "hot
/// paths cache the selected rule set per (market, type) and invalidate on rule version changes").
/// The cache itself never decides staleness; it is read-mostly and swapped wholesale by
/// [`RuleSetCache::invalidate`] whenever the caller learns a rule in that bucket published or
/// reverted, mirroring the copy-on-write posture §5 prescribes for Rule Engine caches.
pub struct RuleSetCache {
    entries: Mutex<HashMap<(SmolStr, CalculationType), Arc<Vec<Rule>>>>,
}

impl RuleSetCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get_or_select(
        &self,
        rule_engine: &RuleEngine,
        market: &str,
        calculation_type: CalculationType,
    ) -> Arc<Vec<Rule>> {
        let key = (SmolStr::new(market), calculation_type);
        if let Some(cached) = self.entries.lock().get(&key).cloned() {
            return cached;
        }

        let selected = Arc::new(rule_engine.select_active(market, calculation_type).await);
        self.entries.lock().insert(key, selected.clone());
        selected
    }

    /// Drops the cached rule set for `(market, calculation_type)` so the next lookup re-selects
    /// from the Rule Engine. Called by the system's rule-publish hook (the `reload-rules`
    /// operator command, or directly after a successful `publish`/`revert_to`).
    pub fn invalidate(&self, market: &str, calculation_type: CalculationType) {
        self.entries.lock().remove(&(SmolStr::new(market), calculation_type));
    }

    pub fn invalidate_all(&self) {
        self.entries.lock().clear();
    }
}

impl Default for RuleSetCache {
    fn default() -> Self {
        Self::new()
    }
}
