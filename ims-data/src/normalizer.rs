use crate::{
    batch::{BatchId, BatchReport},
    error::DataError,
    event::{CanonicalEvent, Envelope},
    source::SourceTag,
};
use async_trait::async_trait;

/// One implementation per upstream source (§4.2): Reuters, Bloomberg, MarkIT, Ultumus, RIMES and
/// trade/contract feeds each schema-validate, resolve external identifiers against the
/// Reference Store, and emit [`CanonicalEvent`]s.
///
/// `processBatch` handles bulk/file-based ingestion; `handleRealtime` handles a single
/// already-framed message from a live feed. Both paths funnel through the same per-source
/// identifier-resolution and duplicate-detection logic, so behaviour is identical regardless of
/// transport. Both are `async` because identifier resolution suspends on the Reference Store
/// (§5 suspension points).
#[async_trait]
pub trait SourceNormalizer: Send + Sync {
    fn source(&self) -> SourceTag;

    /// Schema-validates and resolves every record in `batch`, returning a [`BatchReport`] plus
    /// the canonical events produced for applied records. Never fails the whole batch on a
    /// single bad record — record-scoped errors are accumulated into the report instead (§4.2).
    async fn process_batch(
        &self,
        batch_id: BatchId,
        batch: Vec<String>,
    ) -> (BatchReport, Vec<Envelope<CanonicalEvent>>);

    /// Schema-validates and resolves a single realtime message.
    async fn handle_realtime(&self, message: String) -> Result<Envelope<CanonicalEvent>, DataError>;
}
