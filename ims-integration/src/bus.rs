use crate::{error::BusError, subscription::ConsumerGroup, subscription::Topic};
use fnv::FnvHasher;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::{
    collections::{HashMap, VecDeque},
    hash::{Hash, Hasher},
    sync::Arc,
    time::Duration,
};

/// Monotonically increasing position of a [`Record`] within a single partition.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default, Deserialize, Serialize,
)]
pub struct Offset(pub u64);

impl Offset {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Zero-indexed partition within a [`Topic`]. Partition assignment is a consistent-hash of the
/// record key, giving per-key FIFO ordering without requiring a global order across keys (§5).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
pub struct Partition(pub u32);

/// Arbitrary header bag carried alongside a record payload. Always carries a stable `event_id`
/// header so consumers can de-duplicate at-least-once deliveries (§4.1).
pub type Headers = HashMap<String, String>;

pub const HEADER_EVENT_ID: &str = "event_id";

/// A single durable-log record as handed to a consumer: `(offset, key, payload, timestamp,
/// headers)` per §4.1.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub offset: Offset,
    pub partition: Partition,
    pub key: String,
    pub payload: Vec<u8>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub headers: Headers,
}

impl Record {
    pub fn event_id(&self) -> Option<&str> {
        self.headers.get(HEADER_EVENT_ID).map(String::as_str)
    }
}

/// Consistent-hash partition assignment on a record key, giving per-key FIFO ordering (§4.1, §5).
pub fn partition_for_key(key: &str, partitions: u32) -> Partition {
    let mut hasher = FnvHasher::default();
    key.hash(&mut hasher);
    Partition((hasher.finish() % partitions as u64) as u32)
}

/// Exponential backoff with jitter for retrying a [`BusError::Unavailable`] operation, per the
/// §4.1 contract: jitter 10%, capped at 30s.
pub fn retry_backoff(attempt: u32) -> Duration {
    const BASE_MS: u64 = 50;
    const CAP_MS: u64 = 30_000;
    let exp = BASE_MS.saturating_mul(1u64 << attempt.min(16));
    let capped = exp.min(CAP_MS);
    let jitter = (capped as f64 * 0.10 * rand::random::<f64>()) as u64;
    Duration::from_millis(capped + jitter)
}

/// Event Bus Adapter contract (§4.1): ordered, at-least-once delivery to/from a durable log,
/// partitioned by key, with explicit offset checkpointing.
///
/// Implementors commit to:
/// - per-key FIFO ordering via [`partition_for_key`] partition assignment,
/// - at-least-once delivery — consumers de-duplicate via the `event_id` header,
/// - explicit `commit` so a restart resumes from the last committed offset.
#[async_trait::async_trait]
pub trait Bus: Send + Sync {
    /// Publish `payload` keyed by `key` onto `topic`, returning the assigned [`Offset`].
    async fn publish(
        &self,
        topic: &Topic,
        key: &str,
        payload: Vec<u8>,
        headers: Headers,
    ) -> Result<Offset, BusError>;

    /// Fetch the next batch of records for `group` on `topic`, resuming from the last committed
    /// offset (or the beginning, if none has been committed).
    async fn poll(
        &self,
        topic: &Topic,
        group: &ConsumerGroup,
        max_records: usize,
    ) -> Result<Vec<Record>, BusError>;

    /// Durably checkpoint that `group` has processed up to and including `offset` on `topic`.
    async fn commit(
        &self,
        topic: &Topic,
        group: &ConsumerGroup,
        offset: Offset,
    ) -> Result<(), BusError>;

    /// Route a record that failed deserialisation (fatal, §7) to the dead-letter topic,
    /// preserving its original headers.
    async fn dead_letter(&self, topic: &Topic, record: Record) -> Result<(), BusError>;
}

#[derive(Default)]
struct TopicLog {
    partitions: Vec<VecDeque<Record>>,
    committed: HashMap<ConsumerGroup, HashMap<Partition, Offset>>,
}

/// In-process, in-memory [`Bus`] implementation used by tests and as the default wiring for a
/// single-process deployment. Durability is process-lifetime only; a real deployment backs
/// this trait with a partitioned durable log (eg/ Kafka-compatible broker) per §6.
pub struct InMemoryBus {
    partitions_per_topic: u32,
    topics: Mutex<HashMap<Topic, TopicLog>>,
    dead_letters: Mutex<HashMap<Topic, Vec<Record>>>,
}

impl InMemoryBus {
    pub fn new(partitions_per_topic: u32) -> Self {
        Self {
            partitions_per_topic,
            topics: Mutex::new(HashMap::new()),
            dead_letters: Mutex::new(HashMap::new()),
        }
    }

    pub fn dead_letters(&self, topic: &Topic) -> Vec<Record> {
        self.dead_letters
            .lock()
            .get(topic)
            .cloned()
            .unwrap_or_default()
    }
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new(16)
    }
}

#[async_trait::async_trait]
impl Bus for InMemoryBus {
    async fn publish(
        &self,
        topic: &Topic,
        key: &str,
        payload: Vec<u8>,
        headers: Headers,
    ) -> Result<Offset, BusError> {
        let partition = partition_for_key(key, self.partitions_per_topic);

        let mut topics = self.topics.lock();
        let log = topics.entry(topic.clone()).or_insert_with(|| TopicLog {
            partitions: (0..self.partitions_per_topic)
                .map(|_| VecDeque::new())
                .collect(),
            committed: HashMap::new(),
        });

        let queue = &mut log.partitions[partition.0 as usize];
        let offset = Offset(queue.len() as u64);
        queue.push_back(Record {
            offset,
            partition,
            key: key.to_owned(),
            payload,
            timestamp: chrono::Utc::now(),
            headers,
        });
        Ok(offset)
    }

    async fn poll(
        &self,
        topic: &Topic,
        group: &ConsumerGroup,
        max_records: usize,
    ) -> Result<Vec<Record>, BusError> {
        let topics = self.topics.lock();
        let Some(log) = topics.get(topic) else {
            return Ok(Vec::new());
        };

        let committed = log.committed.get(group);
        let mut out = Vec::with_capacity(max_records);

        for (idx, queue) in log.partitions.iter().enumerate() {
            let partition = Partition(idx as u32);
            let start = committed
                .and_then(|c| c.get(&partition))
                .map(|o| o.next().0)
                .unwrap_or(0);

            for record in queue.iter().skip(start as usize) {
                if out.len() >= max_records {
                    return Ok(out);
                }
                out.push(record.clone());
            }
        }
        Ok(out)
    }

    async fn commit(
        &self,
        topic: &Topic,
        group: &ConsumerGroup,
        offset: Offset,
    ) -> Result<(), BusError> {
        let mut topics = self.topics.lock();
        let log = topics
            .get_mut(topic)
            .ok_or_else(|| BusError::NotSubscribed {
                topic: topic.clone(),
                group: group.to_string(),
            })?;

        // Commit advances the offset for whichever partition produced it; since the in-memory
        // poll already flattens all partitions, we track the max seen offset per partition that
        // contains it.
        for (idx, queue) in log.partitions.iter().enumerate() {
            if queue.iter().any(|r| r.offset == offset) {
                log.committed
                    .entry(group.clone())
                    .or_default()
                    .insert(Partition(idx as u32), offset);
            }
        }
        Ok(())
    }

    async fn dead_letter(&self, topic: &Topic, record: Record) -> Result<(), BusError> {
        self.dead_letters
            .lock()
            .entry(topic.clone())
            .or_default()
            .push(record);
        Ok(())
    }
}

/// Shared handle to a [`Bus`] implementation, cloned across worker shards.
pub type SharedBus = Arc<dyn Bus>;

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with_event_id(id: &str) -> Headers {
        let mut h = Headers::new();
        h.insert(HEADER_EVENT_ID.to_string(), id.to_string());
        h
    }

    #[tokio::test]
    async fn publish_then_poll_preserves_per_key_order() {
        let bus = InMemoryBus::new(4);
        let topic = Topic::from("trades");

        for i in 0..5 {
            bus.publish(
                &topic,
                "book-a/security-1",
                format!("payload-{i}").into_bytes(),
                headers_with_event_id(&format!("evt-{i}")),
            )
            .await
            .unwrap();
        }

        let group = ConsumerGroup::from("position-engine");
        let records = bus.poll(&topic, &group, 100).await.unwrap();
        assert_eq!(records.len(), 5);
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.payload, format!("payload-{i}").into_bytes());
        }
    }

    #[tokio::test]
    async fn commit_then_restart_resumes_after_committed_offset() {
        let bus = InMemoryBus::new(1);
        let topic = Topic::from("contracts");
        let group = ConsumerGroup::from("ims");

        for i in 0..3 {
            bus.publish(
                &topic,
                "ctr-1",
                vec![i],
                headers_with_event_id(&format!("evt-{i}")),
            )
            .await
            .unwrap();
        }

        let first_batch = bus.poll(&topic, &group, 100).await.unwrap();
        assert_eq!(first_batch.len(), 3);

        bus.commit(&topic, &group, first_batch[1].offset)
            .await
            .unwrap();

        let resumed = bus.poll(&topic, &group, 100).await.unwrap();
        assert_eq!(resumed.len(), 1);
        assert_eq!(resumed[0].offset, first_batch[2].offset);
    }

    #[tokio::test]
    async fn dead_letter_preserves_original_headers() {
        let bus = InMemoryBus::new(1);
        let topic = Topic::from("market-data");
        let record = Record {
            offset: Offset(0),
            partition: Partition(0),
            key: "sec-1".to_string(),
            payload: vec![0xFF],
            timestamp: chrono::Utc::now(),
            headers: headers_with_event_id("evt-bad"),
        };

        bus.dead_letter(&topic, record.clone()).await.unwrap();
        let dead = bus.dead_letters(&topic);
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].event_id(), Some("evt-bad"));
    }

    #[test]
    fn partition_for_key_is_stable() {
        let a = partition_for_key("book-1/sec-1", 8);
        let b = partition_for_key("book-1/sec-1", 8);
        assert_eq!(a, b);
    }

    #[test]
    fn retry_backoff_is_capped_and_monotonic_ish() {
        let small = retry_backoff(0);
        let large = retry_backoff(20);
        assert!(small.as_millis() < large.as_millis());
        assert!(large.as_millis() <= 33_000);
    }
}
