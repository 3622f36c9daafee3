//! Poll timers for subscribed queries.
//!
//! Each timer is a one-shot task: it sleeps for the query's refresh
//! interval, emits a single [`AppEvent::PollTick`], and exits. The event
//! loop re-arms the timer when the resulting fetch resolves, so the
//! interval always measures from resolution, not from dispatch. A slow
//! response therefore delays the next poll instead of stacking on it.

use crate::events::AppEvent;
use revdeck_query::QueryKey;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub struct PollScheduler {
    sender: mpsc::Sender<AppEvent>,
    timers: HashMap<QueryKey, JoinHandle<()>>,
}

impl PollScheduler {
    pub fn new(sender: mpsc::Sender<AppEvent>) -> Self {
        Self {
            sender,
            timers: HashMap::new(),
        }
    }

    /// Arm (or re-arm) the timer for a key. An existing timer is aborted
    /// first, so at most one timer per key is ever pending.
    pub fn arm(&mut self, key: &QueryKey, interval: Duration) {
        self.stop(key);
        let sender = self.sender.clone();
        let tick_key = key.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(interval).await;
            let _ = sender.send(AppEvent::PollTick(tick_key)).await;
        });
        self.timers.insert(key.clone(), handle);
    }

    pub fn stop(&mut self, key: &QueryKey) {
        if let Some(handle) = self.timers.remove(key) {
            handle.abort();
        }
    }

    pub fn is_armed(&self, key: &QueryKey) -> bool {
        self.timers.contains_key(key)
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        for handle in self.timers.values() {
            handle.abort();
        }
    }
}
