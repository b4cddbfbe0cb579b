use crate::{
    aggregation_unit::{AggregationUnit, AggregationUnitId},
    counterparty::{Counterparty, CounterpartyId},
    error::ReferenceError,
    index::ReferenceIndex,
    security::{IdentifierKind, Security, SecurityId, SecurityIdentifier},
};
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;

/// A detected conflict between two sources claiming the same external identifier for different
/// securities (§4.3, §9). Surfaced via [`ReferenceStore::list_conflicts`] for manual review;
/// resolvable automatically only when source priority strictly orders the claimants.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ReferenceConflict {
    pub kind: IdentifierKind,
    pub value: String,
    pub incumbent: SecurityId,
    pub incumbent_source: String,
    pub incumbent_priority: u8,
    pub challenger: SecurityId,
    pub challenger_source: String,
    pub challenger_priority: u8,
    pub detected_at: chrono::DateTime<Utc>,
}

#[derive(Debug, Default)]
struct State {
    index: ReferenceIndex,
    counterparties: HashMap<CounterpartyId, Counterparty>,
    aggregation_units: HashMap<AggregationUnitId, AggregationUnit>,
    conflicts: Vec<ReferenceConflict>,
}

/// The Reference Store (§4.3): authoritative security master, counterparty, and aggregation-unit
/// data, with `findByExternal`/`findByInternal` lookups and source-priority conflict resolution.
///
/// All mutation is serialized per-security via a single internal lock, matching the teacher's
/// "Reference Store and Rule Engine caches are read-mostly" concurrency posture: reads never
/// block each other in spirit (the lock is held only for the duration of a lookup/clone), and
/// writes to unrelated securities never race destructively.
#[derive(Debug, Default)]
pub struct ReferenceStore {
    state: Mutex<State>,
}

impl ReferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new [`Security`] or applies an update to an existing one (matched by
    /// [`SecurityId`]), resolving any identifier conflicts by source priority (§9): the
    /// highest-priority claimant wins the `(kind, value)` binding; ties or an unresolvable
    /// challenge are recorded via [`ReferenceConflict`] rather than silently overwritten.
    ///
    /// Returns [`ReferenceError::EmptyBasket`] if `security.basket_type` is set with no
    /// constituents, and [`ReferenceError::ConstituentCycle`] if a constituent link would close
    /// a cycle in the basket graph.
    pub async fn upsert_security(&self, security: Security) -> Result<Security, ReferenceError> {
        if security.is_basket() && security.constituents.is_empty() {
            return Err(ReferenceError::EmptyBasket(security.id));
        }

        let mut state = self.state.lock();

        for &constituent in &security.constituents {
            if state.index.would_cycle(security.id, constituent) {
                return Err(ReferenceError::ConstituentCycle {
                    basket: security.id,
                    constituent,
                });
            }
        }

        for incoming in &security.identifiers {
            if let Ok(existing) =
                state
                    .index
                    .find_by_external(incoming.kind, incoming.value.as_str())
            {
                if existing.id != security.id {
                    if let Some(existing_identifier) = existing
                        .identifiers
                        .iter()
                        .find(|id| id.kind == incoming.kind && id.value == incoming.value)
                    {
                        if incoming.priority <= existing_identifier.priority {
                            state.conflicts.push(ReferenceConflict {
                                kind: incoming.kind,
                                value: incoming.value.as_str().to_owned(),
                                incumbent: existing.id,
                                incumbent_source: existing_identifier.source.to_string(),
                                incumbent_priority: existing_identifier.priority,
                                challenger: security.id,
                                challenger_source: incoming.source.to_string(),
                                challenger_priority: incoming.priority,
                                detected_at: Utc::now(),
                            });
                        }
                    }
                }
            }
        }

        state.index.put(security.clone());
        Ok(security)
    }

    pub async fn find_by_internal(&self, id: SecurityId) -> Result<Security, ReferenceError> {
        self.state.lock().index.find_by_internal(id).cloned()
    }

    pub async fn find_by_external(
        &self,
        kind: IdentifierKind,
        value: &str,
    ) -> Result<Security, ReferenceError> {
        self.state.lock().index.find_by_external(kind, value).cloned()
    }

    pub async fn primary_identifier_of(
        &self,
        id: SecurityId,
    ) -> Result<SecurityIdentifier, ReferenceError> {
        self.state
            .lock()
            .index
            .find_by_internal(id)?
            .primary_identifier()
            .cloned()
            .ok_or(ReferenceError::SecurityNotFound(id))
    }

    pub async fn list_conflicts(&self) -> Vec<ReferenceConflict> {
        self.state.lock().conflicts.clone()
    }

    pub async fn upsert_counterparty(&self, counterparty: Counterparty) {
        self.state
            .lock()
            .counterparties
            .insert(counterparty.id, counterparty);
    }

    pub async fn find_counterparty(
        &self,
        id: CounterpartyId,
    ) -> Result<Counterparty, ReferenceError> {
        self.state
            .lock()
            .counterparties
            .get(&id)
            .cloned()
            .ok_or(ReferenceError::CounterpartyNotFound(id.0))
    }

    pub async fn upsert_aggregation_unit(&self, unit: AggregationUnit) {
        self.state
            .lock()
            .aggregation_units
            .insert(unit.id, unit);
    }

    pub async fn find_aggregation_unit(
        &self,
        id: AggregationUnitId,
    ) -> Result<AggregationUnit, ReferenceError> {
        self.state
            .lock()
            .aggregation_units
            .get(&id)
            .cloned()
            .ok_or(ReferenceError::AggregationUnitNotFound(id.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        market::Market,
        security::{SecurityKind, SecurityStatus},
    };

    fn security(id: u64, ric: &str, source: &str, priority: u8) -> Security {
        let now = Utc::now();
        Security {
            id: SecurityId(id),
            kind: SecurityKind::Equity,
            issuer: "Acme".into(),
            currency: "GBP".into(),
            market: Market::new("XLON", "EMEA"),
            identifiers: vec![SecurityIdentifier {
                is_primary: true,
                ..SecurityIdentifier::new(IdentifierKind::Ric, ric, source, priority)
            }],
            status: SecurityStatus::Active,
            basket_type: None,
            constituents: vec![],
            created_at: now,
            updated_at: now,
            version: 1,
        }
    }

    #[tokio::test]
    async fn upsert_then_find_round_trips() {
        let store = ReferenceStore::new();
        store
            .upsert_security(security(1, "vod.l", "reuters", 10))
            .await
            .unwrap();

        let found = store.find_by_internal(SecurityId(1)).await.unwrap();
        assert_eq!(found.id, SecurityId(1));

        let found = store
            .find_by_external(IdentifierKind::Ric, "VOD.L")
            .await
            .unwrap();
        assert_eq!(found.id, SecurityId(1));

        let primary = store.primary_identifier_of(SecurityId(1)).await.unwrap();
        assert_eq!(primary.value.as_str(), "VOD.L");
    }

    #[tokio::test]
    async fn empty_basket_is_rejected() {
        let store = ReferenceStore::new();
        let mut basket = security(1, "idx1", "reuters", 10);
        basket.basket_type = Some(crate::security::BasketType::Index);

        let err = store.upsert_security(basket).await.unwrap_err();
        assert!(matches!(err, ReferenceError::EmptyBasket(_)));
    }

    #[tokio::test]
    async fn lower_priority_claim_is_recorded_as_conflict_not_overwrite() {
        let store = ReferenceStore::new();
        store
            .upsert_security(security(1, "vod.l", "reuters", 10))
            .await
            .unwrap();

        // a lower-priority source claims the same RIC for a different security
        store
            .upsert_security(security(2, "vod.l", "bloomberg", 1))
            .await
            .unwrap();

        let conflicts = store.list_conflicts().await;
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].incumbent, SecurityId(1));
        assert_eq!(conflicts[0].challenger, SecurityId(2));

        // the incumbent mapping still wins the lookup
        let found = store
            .find_by_external(IdentifierKind::Ric, "VOD.L")
            .await
            .unwrap();
        assert_eq!(found.id, SecurityId(1));
    }

    #[tokio::test]
    async fn constituent_cycle_is_rejected() {
        let store = ReferenceStore::new();
        let mut basket = security(1, "idx1", "reuters", 10);
        basket.basket_type = Some(crate::security::BasketType::Index);
        basket.constituents = vec![SecurityId(2)];
        store.upsert_security(basket).await.unwrap();
        store
            .upsert_security(security(2, "vod.l", "reuters", 10))
            .await
            .unwrap();

        let mut cyclic = security(2, "vod.l", "reuters", 10);
        cyclic.basket_type = Some(crate::security::BasketType::Index);
        cyclic.constituents = vec![SecurityId(1)];

        let err = store.upsert_security(cyclic).await.unwrap_err();
        assert!(matches!(err, ReferenceError::ConstituentCycle { .. }));
    }
}
