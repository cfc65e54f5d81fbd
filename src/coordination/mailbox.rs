//! One-shot config mailbox.
//!
//! A single slot: `put` overwrites, `take` empties. An empty slot says
//! nothing about whether a config was ever set.

use tokio::sync::Mutex;

#[derive(Debug)]
pub struct OneShotMailbox<T> {
    slot: Mutex<Option<T>>,
}

impl<T> Default for OneShotMailbox<T> {
    fn default() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }
}

impl<T> OneShotMailbox<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value, returning any unconsumed one it replaced
    pub async fn put(&self, value: T) -> Option<T> {
        self.slot.lock().await.replace(value)
    }

    /// Atomically read and clear the slot
    pub async fn take(&self) -> Option<T> {
        self.slot.lock().await.take()
    }

    pub async fn is_loaded(&self) -> bool {
        self.slot.lock().await.is_some()
    }
}
