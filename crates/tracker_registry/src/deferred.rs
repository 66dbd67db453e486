//! Cancellable delayed updates.
//!
//! Each delayed pose/data update becomes a tokio task that sleeps for its
//! offset and then sends the update back over a channel. The registry drains
//! the channel on its own tick, so it stays the only mutator of tracker state.
//! Updates with different offsets may land out of order; last write wins.

use std::time::Duration;

use contracts::{TrackerData, TrackerPose};
use slab::Slab;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Mutation waiting for its offset to elapse
#[derive(Debug, Clone, PartialEq)]
pub enum DeferredUpdate {
    Pose { id: usize, pose: TrackerPose },
    Data { id: usize, data: TrackerData },
}

/// Timer-backed task queue owned by the registry
#[derive(Debug)]
pub struct DeferredQueue {
    tasks: Slab<JoinHandle<()>>,
    tx: mpsc::UnboundedSender<(usize, DeferredUpdate)>,
    rx: mpsc::UnboundedReceiver<(usize, DeferredUpdate)>,
}

impl Default for DeferredQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl DeferredQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tasks: Slab::new(),
            tx,
            rx,
        }
    }

    /// Schedule `update` after `delay`; must be called inside a tokio runtime
    pub fn schedule(&mut self, delay: Duration, update: DeferredUpdate) -> usize {
        let entry = self.tasks.vacant_entry();
        let key = entry.key();
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Receiver gone means the registry shut down
            let _ = tx.send((key, update));
        });
        entry.insert(handle);
        debug!(key, delay_ms = delay.as_millis() as u64, "deferred update scheduled");
        key
    }

    /// Updates whose delay has elapsed, in arrival order
    pub fn drain(&mut self) -> Vec<DeferredUpdate> {
        let mut ready = Vec::new();
        while let Ok((key, update)) = self.rx.try_recv() {
            self.tasks.try_remove(key);
            ready.push(update);
        }
        ready
    }

    /// Scheduled but not yet drained
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Abort every pending task and discard anything already delivered
    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.tasks.len();
        for handle in self.tasks.drain() {
            handle.abort();
        }
        while self.rx.try_recv().is_ok() {}
        cancelled
    }
}

impl Drop for DeferredQueue {
    fn drop(&mut self) {
        for (_, handle) in self.tasks.iter() {
            handle.abort();
        }
    }
}
