use std::collections::VecDeque;

use tokio::sync::{Mutex, Notify};

use super::models::ShareRecord;

/// Unordered hand-off point between finder tasks and the drain loop.
///
/// Many producers push concurrently; the single consumer takes records
/// non-blockingly and parks on [`ResultQueue::arrival`] when there is nothing
/// to do. `notify_one` stores a permit when nobody is waiting, so a push that
/// lands between the consumer's emptiness check and its wait is never lost.
pub struct ResultQueue {
    records: Mutex<VecDeque<ShareRecord>>,
    arrival: Notify,
}

impl ResultQueue {
    pub fn new() -> Self {
        ResultQueue {
            records: Mutex::new(VecDeque::new()),
            arrival: Notify::new(),
        }
    }

    pub async fn push(&self, record: ShareRecord) {
        self.records.lock().await.push_back(record);
        self.arrival.notify_one();
    }

    /// Take one record if any is present. Never waits for one to arrive.
    pub async fn try_take(&self) -> Option<ShareRecord> {
        self.records.lock().await.pop_front()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }

    #[allow(dead_code)]
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub fn arrival(&self) -> &Notify {
        &self.arrival
    }
}

impl Default for ResultQueue {
    fn default() -> Self {
        Self::new()
    }
}
