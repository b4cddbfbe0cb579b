use thiserror::Error;

/// Why a subscription to a [`crate::channel::Publisher`] ended (§4.10).
#[derive(Debug, Clone, Copy, Eq, PartialEq, Error)]
pub enum PublisherError {
    /// The subscriber fell far enough behind that the bounded buffer overwrote unread entries.
    /// The subscriber must resubscribe and reconcile from a fresh snapshot.
    #[error("subscriber lagged behind the publisher buffer by {skipped} entries")]
    Lagging { skipped: u64 },

    /// Every sender for this topic has been dropped; no further entries will arrive.
    #[error("publisher closed")]
    Closed,
}
