use crate::{
    batch::{BatchId, BatchReport, DuplicateDetector},
    error::DataError,
    event::{CanonicalEvent, Envelope, ReferenceDataUpdate},
    normalizer::SourceNormalizer,
    record::{parse_fields, require},
    source::SourceTag,
};
use async_trait::async_trait;
use chrono::Utc;
use fnv::FnvHasher;
use ims_instrument::{
    ReferenceStore,
    market::Market,
    security::{IdentifierKind, Security, SecurityId, SecurityIdentifier, SecurityKind, SecurityStatus},
};
use std::{
    hash::{Hash, Hasher},
    sync::Arc,
};

/// Shared implementation behind every reference-data source normalizer (Reuters, Bloomberg,
/// MarkIT, Ultumus, RIMES). Each source emits the same [`ReferenceDataUpdate`] shape but tags
/// its identifiers with a different default [`IdentifierKind`], carries a distinct [`SourceTag`]
/// and its configured priority through to the Reference Store's conflict resolution (§4.3, §9),
/// and upserts the resolved [`Security`] into the store as part of normalizing each record.
#[derive(Debug)]
pub struct ReferenceDataNormalizer {
    source: SourceTag,
    identifier_kind: IdentifierKind,
    priority: u8,
    reference: Arc<ReferenceStore>,
}

impl ReferenceDataNormalizer {
    pub fn new(
        source: SourceTag,
        identifier_kind: IdentifierKind,
        priority: u8,
        reference: Arc<ReferenceStore>,
    ) -> Self {
        Self {
            source,
            identifier_kind,
            priority,
            reference,
        }
    }

    fn normalize_line(&self, line: &str) -> Result<ReferenceDataUpdate, DataError> {
        let fields = parse_fields(self.source, line)?;

        Ok(ReferenceDataUpdate {
            external_id: require(self.source, &fields, "id")?.into(),
            identifier_kind: self.identifier_kind,
            issuer: require(self.source, &fields, "issuer")?.to_owned(),
            currency: require(self.source, &fields, "currency")?.to_owned(),
            market_mic: require(self.source, &fields, "mic")?.into(),
        })
    }

    /// Derives the internal [`SecurityId`] a fresh `(identifier_kind, external_id)` claim should
    /// get. Deterministic so re-upserting the same external id always targets the same security
    /// rather than minting a new one every time the feed resends it.
    fn security_id_for(&self, external_id: &str) -> SecurityId {
        let mut hasher = FnvHasher::default();
        self.identifier_kind.hash(&mut hasher);
        external_id.hash(&mut hasher);
        SecurityId(hasher.finish())
    }

    /// Resolves `update` against the Reference Store: updates the existing [`Security`] this
    /// identifier already resolves to, or mints a new one keyed by [`Self::security_id_for`].
    /// Conflict resolution against other sources happens inside
    /// [`ReferenceStore::upsert_security`] itself.
    async fn upsert(&self, update: &ReferenceDataUpdate) -> Result<(), DataError> {
        let existing = self
            .reference
            .find_by_external(update.identifier_kind, update.external_id.as_str())
            .await
            .ok();

        let id = existing
            .as_ref()
            .map(|security| security.id)
            .unwrap_or_else(|| self.security_id_for(update.external_id.as_str()));
        let version = existing.as_ref().map(|security| security.version + 1).unwrap_or(1);
        let region = existing
            .as_ref()
            .map(|security| security.market.region.clone())
            .unwrap_or_default();
        let now = Utc::now();

        let security = Security {
            id,
            kind: existing
                .as_ref()
                .map(|security| security.kind)
                .unwrap_or(SecurityKind::Equity),
            issuer: update.issuer.clone(),
            currency: update.currency.clone(),
            market: Market::new(update.market_mic.clone(), region),
            identifiers: vec![SecurityIdentifier {
                is_primary: true,
                ..SecurityIdentifier::new(
                    update.identifier_kind,
                    update.external_id.as_str(),
                    self.source.to_string(),
                    self.priority,
                )
            }],
            status: existing
                .as_ref()
                .map(|security| security.status)
                .unwrap_or(SecurityStatus::Active),
            basket_type: existing.as_ref().and_then(|security| security.basket_type),
            constituents: existing
                .as_ref()
                .map(|security| security.constituents.clone())
                .unwrap_or_default(),
            created_at: existing.as_ref().map(|security| security.created_at).unwrap_or(now),
            updated_at: now,
            version,
        };

        self.reference.upsert_security(security).await?;
        Ok(())
    }
}

#[async_trait]
impl SourceNormalizer for ReferenceDataNormalizer {
    fn source(&self) -> SourceTag {
        self.source
    }

    async fn process_batch(
        &self,
        batch_id: BatchId,
        batch: Vec<String>,
    ) -> (BatchReport, Vec<Envelope<CanonicalEvent>>) {
        let mut detector = DuplicateDetector::new();
        let mut events = Vec::new();
        let source = self.source;
        let mut report = BatchReport::empty(batch_id, source);

        for line in batch {
            report.total += 1;

            let update = match self.normalize_line(&line) {
                Ok(update) => update,
                Err(error) => {
                    report.errors.push(error.to_string());
                    continue;
                }
            };

            if !detector.observe(
                update.external_id.as_str(),
                &format!("{:?}", update.identifier_kind),
                source,
            ) {
                report.duplicates += 1;
                continue;
            }

            match self.upsert(&update).await {
                Ok(()) => {
                    report.processed += 1;
                    events.push(Envelope::new(
                        source,
                        Utc::now(),
                        Utc::now(),
                        CanonicalEvent::ReferenceData(update),
                    ));
                }
                Err(error) => report.errors.push(error.to_string()),
            }
        }

        (report, events)
    }

    async fn handle_realtime(&self, message: String) -> Result<Envelope<CanonicalEvent>, DataError> {
        let update = self.normalize_line(&message)?;
        self.upsert(&update).await?;
        Ok(Envelope::new(
            self.source,
            Utc::now(),
            Utc::now(),
            CanonicalEvent::ReferenceData(update),
        ))
    }
}

pub fn reuters(priority: u8, reference: Arc<ReferenceStore>) -> Arc<ReferenceDataNormalizer> {
    Arc::new(ReferenceDataNormalizer::new(
        SourceTag::Reuters,
        IdentifierKind::Ric,
        priority,
        reference,
    ))
}

pub fn bloomberg(priority: u8, reference: Arc<ReferenceStore>) -> Arc<ReferenceDataNormalizer> {
    Arc::new(ReferenceDataNormalizer::new(
        SourceTag::Bloomberg,
        IdentifierKind::Bloomberg,
        priority,
        reference,
    ))
}

pub fn markit(priority: u8, reference: Arc<ReferenceStore>) -> Arc<ReferenceDataNormalizer> {
    Arc::new(ReferenceDataNormalizer::new(
        SourceTag::MarkIt,
        IdentifierKind::Cusip,
        priority,
        reference,
    ))
}

pub fn ultumus(priority: u8, reference: Arc<ReferenceStore>) -> Arc<ReferenceDataNormalizer> {
    Arc::new(ReferenceDataNormalizer::new(
        SourceTag::Ultumus,
        IdentifierKind::Isin,
        priority,
        reference,
    ))
}

pub fn rimes(priority: u8, reference: Arc<ReferenceStore>) -> Arc<ReferenceDataNormalizer> {
    Arc::new(ReferenceDataNormalizer::new(
        SourceTag::Rimes,
        IdentifierKind::Sedol,
        priority,
        reference,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn process_batch_emits_one_event_per_unique_record() {
        let normalizer = reuters(100, Arc::new(ReferenceStore::new()));
        let (report, events) = normalizer
            .process_batch(
                BatchId::new("b1"),
                vec![
                    "id=VOD.L|issuer=Vodafone|currency=GBP|mic=XLON".to_owned(),
                    "id=VOD.L|issuer=Vodafone|currency=GBP|mic=XLON".to_owned(),
                    "id=AAPL.O|issuer=Apple|currency=USD|mic=XNAS".to_owned(),
                ],
            )
            .await;

        assert_eq!(report.total, 3);
        assert_eq!(report.processed, 2);
        assert_eq!(report.duplicates, 1);
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn malformed_record_is_counted_as_an_error_not_a_fatal_batch_failure() {
        let normalizer = reuters(100, Arc::new(ReferenceStore::new()));
        let (report, events) = normalizer
            .process_batch(
                BatchId::new("b1"),
                vec![
                    "id=VOD.L|issuer=Vodafone|currency=GBP|mic=XLON".to_owned(),
                    "not-a-valid-record".to_owned(),
                ],
            )
            .await;

        assert_eq!(report.total, 2);
        assert_eq!(report.processed, 1);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn process_batch_upserts_the_resolved_security_into_the_reference_store() {
        let reference = Arc::new(ReferenceStore::new());
        let normalizer = reuters(100, reference.clone());

        normalizer
            .process_batch(
                BatchId::new("b1"),
                vec!["id=VOD.L|issuer=Vodafone|currency=GBP|mic=XLON".to_owned()],
            )
            .await;

        let found = reference
            .find_by_external(IdentifierKind::Ric, "VOD.L")
            .await
            .unwrap();
        assert_eq!(found.issuer, "Vodafone");
    }

    #[tokio::test]
    async fn reupserting_the_same_external_id_updates_the_same_security() {
        let reference = Arc::new(ReferenceStore::new());
        let normalizer = reuters(100, reference.clone());

        normalizer
            .process_batch(
                BatchId::new("b1"),
                vec!["id=VOD.L|issuer=Vodafone|currency=GBP|mic=XLON".to_owned()],
            )
            .await;
        normalizer
            .process_batch(
                BatchId::new("b2"),
                vec!["id=VOD.L|issuer=Vodafone PLC|currency=GBP|mic=XLON".to_owned()],
            )
            .await;

        let found = reference
            .find_by_external(IdentifierKind::Ric, "VOD.L")
            .await
            .unwrap();
        assert_eq!(found.issuer, "Vodafone PLC");
        assert_eq!(found.version, 2);
    }
}
