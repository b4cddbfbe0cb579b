use crate::{
    batch::{BatchId, BatchReport, DuplicateDetector, fold_batch},
    error::DataError,
    event::{CanonicalEvent, ContractActivity, Envelope, TradeExecution},
    normalizer::SourceNormalizer,
    record::{parse_fields, require, require_date, require_decimal},
    source::SourceTag,
};
use async_trait::async_trait;
use chrono::Utc;
use ims_instrument::{ReferenceStore, security::IdentifierKind};
use std::sync::Arc;

/// Normalizes trade executions and contract lifecycle activity (§4.2). Resolves the record's
/// external security identifier against the Reference Store before emitting a canonical event,
/// and deduplicates trades within a batch by `(trade_id, order_id, execution_id)` — the first
/// occurrence is applied, every subsequent duplicate is tombstoned and reported (§9 Open
/// Question: resolved as keep-first, not reject-the-batch).
#[derive(Debug)]
pub struct TradeContractNormalizer {
    store: Arc<ReferenceStore>,
}

impl TradeContractNormalizer {
    pub fn new(store: Arc<ReferenceStore>) -> Self {
        Self { store }
    }

    async fn normalize_trade(&self, fields: &std::collections::HashMap<String, String>) -> Result<TradeExecution, DataError> {
        let external_id = require(SourceTag::TradeContract, fields, "security_ric")?;
        let security = self
            .store
            .find_by_external(IdentifierKind::Ric, external_id)
            .await?
            .id;

        Ok(TradeExecution {
            trade_id: require(SourceTag::TradeContract, fields, "trade_id")?.into(),
            order_id: require(SourceTag::TradeContract, fields, "order_id")?.into(),
            execution_id: require(SourceTag::TradeContract, fields, "execution_id")?.into(),
            security,
            book: require(SourceTag::TradeContract, fields, "book")?.into(),
            quantity: require_decimal(SourceTag::TradeContract, fields, "quantity")?,
            settlement_date: require_date(SourceTag::TradeContract, fields, "settlement_date")?,
        })
    }

    async fn normalize_contract(&self, fields: &std::collections::HashMap<String, String>) -> Result<ContractActivity, DataError> {
        let external_id = require(SourceTag::TradeContract, fields, "security_ric")?;
        let security = self
            .store
            .find_by_external(IdentifierKind::Ric, external_id)
            .await?
            .id;

        Ok(ContractActivity {
            contract_id: require(SourceTag::TradeContract, fields, "contract_id")?.into(),
            security,
            quantity_delta: require_decimal(SourceTag::TradeContract, fields, "quantity_delta")?,
            effective_date: require_date(SourceTag::TradeContract, fields, "effective_date")?,
        })
    }

    async fn normalize_line(&self, line: &str) -> Result<CanonicalEvent, DataError> {
        let fields = parse_fields(SourceTag::TradeContract, line)?;

        match require(SourceTag::TradeContract, &fields, "record_type")? {
            "trade" => Ok(CanonicalEvent::Trade(self.normalize_trade(&fields).await?)),
            "contract" => Ok(CanonicalEvent::Contract(self.normalize_contract(&fields).await?)),
            other => Err(DataError::SchemaInvalid {
                source: SourceTag::TradeContract,
                reason: format!("unknown record_type '{other}'"),
            }),
        }
    }
}

#[async_trait]
impl SourceNormalizer for TradeContractNormalizer {
    fn source(&self) -> SourceTag {
        SourceTag::TradeContract
    }

    async fn process_batch(
        &self,
        batch_id: BatchId,
        batch: Vec<String>,
    ) -> (BatchReport, Vec<Envelope<CanonicalEvent>>) {
        let mut detector = DuplicateDetector::new();
        let mut events = Vec::new();
        let mut report = BatchReport::empty(batch_id, SourceTag::TradeContract);

        for line in batch {
            report.total += 1;

            let fields = match parse_fields(SourceTag::TradeContract, &line) {
                Ok(fields) => fields,
                Err(error) => {
                    report.errors.push(error.to_string());
                    continue;
                }
            };

            if let (Ok(trade_id), Ok(order_id), Ok(execution_id)) = (
                require(SourceTag::TradeContract, &fields, "trade_id"),
                require(SourceTag::TradeContract, &fields, "order_id"),
                require(SourceTag::TradeContract, &fields, "execution_id"),
            ) {
                let key = format!("{trade_id}:{order_id}:{execution_id}");
                if !detector.observe(&key, "trade_key", SourceTag::TradeContract) {
                    report.duplicates += 1;
                    continue;
                }
            }

            match self.normalize_line(&line).await {
                Ok(event) => {
                    report.processed += 1;
                    events.push(Envelope::new(
                        SourceTag::TradeContract,
                        Utc::now(),
                        Utc::now(),
                        event,
                    ));
                }
                Err(error) => report.errors.push(error.to_string()),
            }
        }

        (report, events)
    }

    async fn handle_realtime(&self, message: String) -> Result<Envelope<CanonicalEvent>, DataError> {
        let event = self.normalize_line(&message).await?;
        Ok(Envelope::new(SourceTag::TradeContract, Utc::now(), Utc::now(), event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ims_instrument::security::{Security, SecurityId, SecurityIdentifier, SecurityKind, SecurityStatus};
    use ims_instrument::market::Market;

    async fn store_with_security() -> Arc<ReferenceStore> {
        let store = Arc::new(ReferenceStore::new());
        let now = Utc::now();
        store
            .upsert_security(Security {
                id: SecurityId(1),
                kind: SecurityKind::Equity,
                issuer: "Vodafone".into(),
                currency: "GBP".into(),
                market: Market::new("XLON", "EMEA"),
                identifiers: vec![SecurityIdentifier::new(IdentifierKind::Ric, "VOD.L", "reuters", 100)],
                status: SecurityStatus::Active,
                basket_type: None,
                constituents: vec![],
                created_at: now,
                updated_at: now,
                version: 1,
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn duplicate_trade_key_within_batch_is_tombstoned_not_rejected() {
        let normalizer = TradeContractNormalizer::new(store_with_security().await);
        let line = "record_type=trade|trade_id=T1|order_id=O1|execution_id=E1|security_ric=VOD.L|book=BK1|quantity=100|settlement_date=2026-07-30".to_owned();

        let (report, events) = normalizer
            .process_batch(BatchId::new("b1"), vec![line.clone(), line])
            .await;

        assert_eq!(report.total, 2);
        assert_eq!(report.processed, 1);
        assert_eq!(report.duplicates, 1);
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn unresolvable_security_is_a_record_scoped_error() {
        let normalizer = TradeContractNormalizer::new(store_with_security().await);
        let line = "record_type=trade|trade_id=T1|order_id=O1|execution_id=E1|security_ric=UNKNOWN.L|book=BK1|quantity=100|settlement_date=2026-07-30".to_owned();

        let (report, events) = normalizer.process_batch(BatchId::new("b1"), vec![line]).await;

        assert_eq!(report.errors.len(), 1);
        assert!(events.is_empty());
    }
}
