use crate::{error::DataError, source::SourceTag};
use derive_more::{Constructor, Display};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::collections::HashSet;

#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display)]
pub struct BatchId(pub SmolStr);

impl BatchId {
    pub fn new<S: Into<SmolStr>>(id: S) -> Self {
        Self(id.into())
    }
}

/// Result of a single `processBatch` call (§4.2): how many records were seen, how many were
/// applied, and the per-record errors/duplicates encountered along the way.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Constructor)]
pub struct BatchReport {
    pub batch_id: BatchId,
    pub source: SourceTag,
    pub total: usize,
    pub processed: usize,
    pub errors: Vec<String>,
    pub duplicates: usize,
}

impl BatchReport {
    pub fn empty(batch_id: BatchId, source: SourceTag) -> Self {
        Self {
            batch_id,
            source,
            total: 0,
            processed: 0,
            errors: Vec::new(),
            duplicates: 0,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.duplicates == 0
    }
}

/// Selector used to drive reprocessing of a previously failed batch, by batch-id (§4.2).
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct BatchSelector {
    pub batch_id: BatchId,
    pub source: SourceTag,
}

/// Tracks `(externalId, identifierType, source)` triples seen so far within a single batch, to
/// detect duplicates per §4.2. Scoped to one `processBatch` call; a fresh detector is created per
/// invocation, so duplicates are only suppressed *within* a batch, never across batches.
#[derive(Debug, Default)]
pub struct DuplicateDetector {
    seen: HashSet<(SmolStr, SmolStr, SourceTag)>,
}

impl DuplicateDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if this is the first time `(external_id, identifier_kind, source)` has
    /// been observed in this batch; `false` (and records it) otherwise.
    pub fn observe(&mut self, external_id: &str, identifier_kind: &str, source: SourceTag) -> bool {
        self.seen
            .insert((SmolStr::new(external_id), SmolStr::new(identifier_kind), source))
    }
}

/// Drives a `processBatch` loop over `records`, applying `apply` to each and folding the outcome
/// into a [`BatchReport`]. `apply` returns `Ok(true)` for an applied record, `Ok(false)` for a
/// record suppressed as a within-batch duplicate (already counted by the caller via
/// [`DuplicateDetector`]), or `Err` for a record-scoped failure.
pub fn fold_batch<I, F>(batch_id: BatchId, source: SourceTag, records: I, mut apply: F) -> BatchReport
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Result<bool, DataError>,
{
    let mut report = BatchReport::empty(batch_id, source);

    for record in records {
        report.total += 1;
        match apply(record) {
            Ok(true) => report.processed += 1,
            Ok(false) => report.duplicates += 1,
            Err(DataError::Duplicate { .. }) => report.duplicates += 1,
            Err(error) => report.errors.push(error.to_string()),
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_detector_flags_repeat_within_batch() {
        let mut detector = DuplicateDetector::new();
        assert!(detector.observe("T1", "trade_id", SourceTag::TradeContract));
        assert!(!detector.observe("T1", "trade_id", SourceTag::TradeContract));
        // a different source claiming the same external id is not a duplicate
        assert!(detector.observe("T1", "trade_id", SourceTag::Reuters));
    }

    #[test]
    fn fold_batch_counts_processed_errors_and_duplicates() {
        let report = fold_batch(
            BatchId::new("batch-1"),
            SourceTag::Reuters,
            vec![1, 2, 3, 4],
            |item| match item {
                1 => Ok(true),
                2 => Err(DataError::SchemaInvalid {
                    source: SourceTag::Reuters,
                    reason: "bad".into(),
                }),
                3 => Err(DataError::Duplicate {
                    source: SourceTag::Reuters,
                    external_id: "x".into(),
                    identifier_kind: "ric".into(),
                }),
                _ => Ok(true),
            },
        );

        assert_eq!(report.total, 4);
        assert_eq!(report.processed, 2);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.duplicates, 1);
    }
}
