use crate::{key::LimitKey, service::DecrementOutcome};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use smol_str::SmolStr;
use std::{collections::HashMap, time::Duration};

#[derive(Debug, Clone)]
struct Entry {
    outcome: DecrementOutcome,
    recorded_at: DateTime<Utc>,
}

/// Remembers `tryDecrement` outcomes by `(key, idempotencyKey)` for a configurable window (§4.7):
/// a replay within the window returns the original result instead of decrementing again.
pub struct IdempotencyLedger {
    window: Duration,
    entries: Mutex<HashMap<(LimitKey, SmolStr), Entry>>,
}

impl IdempotencyLedger {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn lookup(&self, key: LimitKey, idempotency_key: &str, now: DateTime<Utc>) -> Option<DecrementOutcome> {
        let entries = self.entries.lock();
        let entry = entries.get(&(key, SmolStr::new(idempotency_key)))?;
        let elapsed = (now - entry.recorded_at).to_std().ok()?;
        (elapsed <= self.window).then(|| entry.outcome.clone())
    }

    pub fn record(&self, key: LimitKey, idempotency_key: &str, outcome: DecrementOutcome, now: DateTime<Utc>) {
        self.entries.lock().insert(
            (key, SmolStr::new(idempotency_key)),
            Entry {
                outcome,
                recorded_at: now,
            },
        );
    }

    /// Sweeps entries older than the configured window. Run periodically on the same
    /// worker-pool fabric as event processing (§9: "'Scheduled' housekeeping... model as periodic
    /// tasks").
    pub fn sweep_expired(&self, now: DateTime<Utc>) {
        self.entries.lock().retain(|_, entry| {
            (now - entry.recorded_at)
                .to_std()
                .map(|elapsed| elapsed <= self.window)
                .unwrap_or(false)
        });
    }
}
