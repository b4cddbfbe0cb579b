use crate::error::PublisherError;
use tokio::sync::broadcast;

/// Fans out values of type `T` to many subscribers, each tracking its own read cursor (§4.10:
/// "per-subscriber cursor, at-least-once, backpressure-aware"). Built on
/// [`tokio::sync::broadcast`]: a slow subscriber's cursor falls behind a bounded ring buffer and,
/// once entries it hasn't read are overwritten, its next read surfaces
/// [`PublisherError::Lagging`] rather than silently skipping data (§4.10: "slow subscribers are
/// served from a bounded buffer, then disconnected with a Lagging reason").
#[derive(Debug)]
pub struct Publisher<T> {
    tx: broadcast::Sender<T>,
}

impl<T: Clone> Publisher<T> {
    pub fn new(buffer: usize) -> Self {
        let (tx, _rx) = broadcast::channel(buffer);
        Self { tx }
    }

    /// Publishes `value` to every current subscriber. A subscriber that never reads still
    /// receives the value (at-least-once) until it falls far enough behind to lag.
    pub fn publish(&self, value: T) {
        // No subscribers is not an error: the Publisher outlives any individual consumer.
        let _ = self.tx.send(value);
    }

    pub fn subscribe(&self) -> Subscription<T> {
        Subscription {
            rx: self.tx.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// One subscriber's view of a [`Publisher`], with its own read cursor.
#[derive(Debug)]
pub struct Subscription<T> {
    rx: broadcast::Receiver<T>,
}

impl<T: Clone> Subscription<T> {
    /// Awaits the next entry. Returns [`PublisherError::Lagging`] once this subscriber's cursor
    /// has fallen behind the buffer's oldest retained entry, and [`PublisherError::Closed`] once
    /// every [`Publisher`] sender has dropped.
    pub async fn recv(&mut self) -> Result<T, PublisherError> {
        match self.rx.recv().await {
            Ok(value) => Ok(value),
            Err(broadcast::error::RecvError::Lagged(skipped)) => Err(PublisherError::Lagging { skipped }),
            Err(broadcast::error::RecvError::Closed) => Err(PublisherError::Closed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn a_subscriber_receives_every_published_value_at_least_once() {
        let publisher = Publisher::new(8);
        let mut subscription = publisher.subscribe();

        publisher.publish(1);
        publisher.publish(2);

        assert_eq!(subscription.recv().await.unwrap(), 1);
        assert_eq!(subscription.recv().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn each_subscriber_tracks_its_own_cursor() {
        let publisher = Publisher::new(8);
        let mut early = publisher.subscribe();
        publisher.publish("first");
        let mut late = publisher.subscribe();
        publisher.publish("second");

        assert_eq!(early.recv().await.unwrap(), "first");
        assert_eq!(early.recv().await.unwrap(), "second");
        assert_eq!(late.recv().await.unwrap(), "second");
    }

    #[tokio::test]
    async fn a_subscriber_that_falls_behind_the_buffer_is_told_it_is_lagging() {
        let publisher = Publisher::new(2);
        let mut subscription = publisher.subscribe();

        for value in 0..5 {
            publisher.publish(value);
        }

        let err = subscription.recv().await.unwrap_err();
        assert!(matches!(err, PublisherError::Lagging { .. }));
    }

    #[tokio::test]
    async fn dropping_the_publisher_closes_outstanding_subscriptions() {
        let publisher = Publisher::new(4);
        let mut subscription = publisher.subscribe();
        drop(publisher);

        let err = subscription.recv().await.unwrap_err();
        assert_eq!(err, PublisherError::Closed);
    }
}
