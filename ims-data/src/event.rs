use crate::source::SourceTag;
use chrono::{DateTime, NaiveDate, Utc};
use derive_more::{Constructor, From};
use ims_instrument::security::SecurityId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Wraps a normalised payload with the provenance/timing metadata every canonical event carries
/// (§4.2): which source produced it, when the source observed it, and when this normalizer
/// received it. Every event published to the bus is an `Envelope<CanonicalEvent>`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Constructor)]
pub struct Envelope<T> {
    pub source: SourceTag,
    pub time_source: DateTime<Utc>,
    pub time_received: DateTime<Utc>,
    pub payload: T,
}

impl<T> Envelope<T> {
    pub fn map<F, O>(self, op: F) -> Envelope<O>
    where
        F: FnOnce(T) -> O,
    {
        Envelope {
            source: self.source,
            time_source: self.time_source,
            time_received: self.time_received,
            payload: op(self.payload),
        }
    }
}

/// The five canonical event kinds a Feed Normalizer emits (§4.2).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, From)]
pub enum CanonicalEvent {
    ReferenceData(ReferenceDataUpdate),
    Position(PositionUpdate),
    Trade(TradeExecution),
    Contract(ContractActivity),
    MarketData(MarketDataTick),
}

/// A security master update sourced from a reference-data feed (Reuters, Bloomberg, MarkIT,
/// Ultumus, RIMES), destined for [`ims_instrument::ReferenceStore::upsert_security`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ReferenceDataUpdate {
    pub external_id: SmolStr,
    pub identifier_kind: ims_instrument::security::IdentifierKind,
    pub issuer: String,
    pub currency: String,
    pub market_mic: SmolStr,
}

/// A start-of-day position snapshot or intraday activity line, destined for the Position Engine
/// (§4.4).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PositionUpdate {
    pub book: SmolStr,
    pub security: SecurityId,
    pub quantity_delta: Decimal,
    pub settlement_date: NaiveDate,
}

/// A single trade execution, deduplicated within a batch by
/// `(trade_id, order_id, execution_id)` (§4.2, §9).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TradeExecution {
    pub trade_id: SmolStr,
    pub order_id: SmolStr,
    pub execution_id: SmolStr,
    pub security: SecurityId,
    pub book: SmolStr,
    pub quantity: Decimal,
    pub settlement_date: NaiveDate,
}

/// Corporate-action / contract lifecycle activity (eg/ a basket rebalance or a lending recall)
/// affecting a security's position ladder.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ContractActivity {
    pub contract_id: SmolStr,
    pub security: SecurityId,
    pub quantity_delta: Decimal,
    pub effective_date: NaiveDate,
}

/// A market-data tick (price/reference rate) relevant to inventory valuation.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MarketDataTick {
    pub security: SecurityId,
    pub price: Decimal,
    pub currency: String,
}
