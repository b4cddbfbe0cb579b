use crate::subscription::Topic;
use thiserror::Error;

/// All errors generated by the `ims-integration` Event Bus Adapter and its shared primitives.
///
/// Variants map onto the error taxonomy of spec §7: [`BusError::Unavailable`] is a
/// Dependency failure retried by callers with exponential backoff (jitter 10%, cap 30s, see
/// [`crate::bus::retry_backoff`]); [`BusError::Serialise`]/[`BusError::DeserialiseBinary`] are
/// fatal for the offending record and routed to a dead-letter topic alongside its original
/// headers rather than retried.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("event bus unavailable: {0}")]
    Unavailable(String),

    #[error("serialising payload for topic '{topic}' failed: {error}")]
    Serialise {
        topic: Topic,
        error: serde_json::Error,
    },

    #[error("deserialising payload from topic '{topic}' failed: {error} for payload: {payload}")]
    Deserialise {
        topic: Topic,
        error: serde_json::Error,
        payload: String,
    },

    #[error("no committed offset found for topic '{topic}' group '{group}'")]
    OffsetNotFound { topic: Topic, group: String },

    #[error("consumer group '{group}' is not subscribed to topic '{topic}'")]
    NotSubscribed { topic: Topic, group: String },

    #[error("consumed unidentifiable message with key: {0}")]
    Unidentifiable(String),
}

impl BusError {
    /// Whether this error is retryable by the caller (§7 Dependency classification), as opposed
    /// to fatal for the individual record (§7 Validation/Fatal classification), which is instead
    /// routed to a dead-letter topic.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BusError::Unavailable(_))
    }
}
