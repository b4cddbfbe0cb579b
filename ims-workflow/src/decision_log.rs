use parking_lot::Mutex;

/// Append-only log assigning a monotonic sequence number per queue (§4.8, §4.9). Shared by the
/// Locate Workflow's and Short-Sell Gate's decision records, which differ only in payload shape.
#[derive(Debug, Default)]
pub struct DecisionLog<T> {
    entries: Mutex<Vec<T>>,
    next_sequence: Mutex<u64>,
}

impl<T: Clone> DecisionLog<T> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            next_sequence: Mutex::new(0),
        }
    }

    /// Reserves the next sequence number. Callers stamp their record with it before [`append`].
    pub fn next_sequence(&self) -> u64 {
        let mut next = self.next_sequence.lock();
        let sequence = *next;
        *next += 1;
        sequence
    }

    pub fn append(&self, entry: T) {
        self.entries.lock().push(entry);
    }

    pub fn entries(&self) -> Vec<T> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
