use crate::{
    error::ReferenceError,
    security::{IdentifierKind, Security, SecurityId, SecurityIndex},
};
use std::collections::HashMap;

/// O(1) in-memory lookup index over a set of [`Security`] records, keyed by stable
/// [`SecurityId`] and by external `(IdentifierKind, value)` pairs (§4.3).
///
/// This is a plain, non-thread-safe data structure; [`crate::store::ReferenceStore`] guards a
/// single instance behind a lock and owns the write path (upsert/conflict resolution).
#[derive(Debug, Clone, Default)]
pub struct ReferenceIndex {
    securities: Vec<Security>,
    by_id: HashMap<SecurityId, SecurityIndex>,
    by_identifier: HashMap<(IdentifierKind, String), SecurityId>,
}

impl ReferenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.securities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.securities.is_empty()
    }

    pub fn securities(&self) -> &[Security] {
        &self.securities
    }

    /// Inserts a new [`Security`], or overwrites an existing one with the same [`SecurityId`],
    /// rebuilding that security's identifier entries. An identifier already claimed by a
    /// *different* security at an equal or higher priority keeps pointing at its existing owner —
    /// the caller (`ReferenceStore::upsert_security`) has already recorded that claim as a
    /// conflict rather than a win, and the lookup index must agree with it.
    pub fn put(&mut self, security: Security) {
        for identifier in &security.identifiers {
            let key = (identifier.kind, identifier.value.as_str().to_owned());
            if let Some(&existing_owner) = self.by_identifier.get(&key) {
                if existing_owner != security.id {
                    let existing_priority = self
                        .find_by_internal(existing_owner)
                        .ok()
                        .and_then(|owner| {
                            owner
                                .identifiers
                                .iter()
                                .find(|id| id.kind == identifier.kind && id.value == identifier.value)
                        })
                        .map(|id| id.priority);

                    if let Some(existing_priority) = existing_priority {
                        if identifier.priority <= existing_priority {
                            continue;
                        }
                    }
                }
            }

            self.by_identifier.insert(key, security.id);
        }

        match self.by_id.get(&security.id).copied() {
            Some(SecurityIndex(idx)) => self.securities[idx] = security,
            None => {
                let idx = SecurityIndex(self.securities.len());
                self.by_id.insert(security.id, idx);
                self.securities.push(security);
            }
        }
    }

    pub fn find_by_internal(&self, id: SecurityId) -> Result<&Security, ReferenceError> {
        self.by_id
            .get(&id)
            .map(|SecurityIndex(idx)| &self.securities[*idx])
            .ok_or(ReferenceError::SecurityNotFound(id))
    }

    pub fn find_by_external(
        &self,
        kind: IdentifierKind,
        value: &str,
    ) -> Result<&Security, ReferenceError> {
        let id = self
            .by_identifier
            .get(&(kind, value.to_uppercase()))
            .copied()
            .ok_or_else(|| ReferenceError::IdentifierNotFound {
                kind,
                value: value.to_owned(),
            })?;
        self.find_by_internal(id)
    }

    /// `true` if `constituent` is reachable from `basket` via existing constituent links, ie/
    /// adding `basket -> constituent` would close a cycle (§9).
    pub fn would_cycle(&self, basket: SecurityId, constituent: SecurityId) -> bool {
        if basket == constituent {
            return true;
        }

        let mut stack = vec![constituent];
        let mut seen = std::collections::HashSet::new();
        while let Some(next) = stack.pop() {
            if next == basket {
                return true;
            }
            if !seen.insert(next) {
                continue;
            }
            if let Ok(security) = self.find_by_internal(next) {
                stack.extend(security.constituents.iter().copied());
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        market::Market,
        security::{IdentifierKind, SecurityIdentifier, SecurityKind, SecurityStatus},
    };
    use chrono::Utc;

    fn security(id: u64, ric: &str) -> Security {
        let now = Utc::now();
        Security {
            id: SecurityId(id),
            kind: SecurityKind::Equity,
            issuer: "Acme".into(),
            currency: "GBP".into(),
            market: Market::new("XLON", "EMEA"),
            identifiers: vec![SecurityIdentifier::new(IdentifierKind::Ric, ric, "reuters", 1)],
            status: SecurityStatus::Active,
            basket_type: None,
            constituents: vec![],
            created_at: now,
            updated_at: now,
            version: 1,
        }
    }

    #[test]
    fn put_then_find_by_internal_and_external() {
        let mut index = ReferenceIndex::new();
        index.put(security(1, "vod.l"));

        let found = index.find_by_internal(SecurityId(1)).unwrap();
        assert_eq!(found.id, SecurityId(1));

        let found = index
            .find_by_external(IdentifierKind::Ric, "VOD.L")
            .unwrap();
        assert_eq!(found.id, SecurityId(1));

        // lowercase lookup also resolves, since identifiers normalise to uppercase
        let found = index
            .find_by_external(IdentifierKind::Ric, "vod.l")
            .unwrap();
        assert_eq!(found.id, SecurityId(1));
    }

    #[test]
    fn put_does_not_let_a_lower_priority_claim_overwrite_the_lookup() {
        let mut index = ReferenceIndex::new();
        let mut incumbent = security(1, "vod.l");
        incumbent.identifiers = vec![SecurityIdentifier::new(IdentifierKind::Ric, "vod.l", "reuters", 100)];
        index.put(incumbent);

        let mut challenger = security(2, "vod.l");
        challenger.identifiers = vec![SecurityIdentifier::new(IdentifierKind::Ric, "vod.l", "bloomberg", 1)];
        index.put(challenger);

        let found = index
            .find_by_external(IdentifierKind::Ric, "VOD.L")
            .unwrap();
        assert_eq!(found.id, SecurityId(1));
    }

    #[test]
    fn find_by_external_missing_returns_not_found() {
        let index = ReferenceIndex::new();
        let err = index
            .find_by_external(IdentifierKind::Ric, "VOD.L")
            .unwrap_err();
        assert!(matches!(err, ReferenceError::IdentifierNotFound { .. }));
    }

    #[test]
    fn would_cycle_detects_self_and_transitive_cycles() {
        let mut index = ReferenceIndex::new();
        let mut basket = security(1, "idx1");
        basket.basket_type = Some(crate::security::BasketType::Index);
        basket.constituents = vec![SecurityId(2)];
        index.put(basket);
        index.put(security(2, "vod.l"));

        assert!(index.would_cycle(SecurityId(1), SecurityId(1)));
        // SecurityId(2) is a constituent of basket 1; linking 2 -> 1 would cycle back.
        assert!(index.would_cycle(SecurityId(2), SecurityId(1)));
        assert!(!index.would_cycle(SecurityId(1), SecurityId(3)));
    }
}
