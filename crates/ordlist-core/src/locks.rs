//! Per-key async mutual exclusion.
//!
//! `KeyedLocks` hands out one `tokio::sync::Mutex` per key, created on first
//! use and dropped again once no task holds or waits for it, so the table
//! only ever contains keys with in-flight work.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Slot = Arc<AsyncMutex<()>>;

#[derive(Default)]
pub(crate) struct KeyedLocks {
    slots: Mutex<HashMap<String, Slot>>,
}

impl KeyedLocks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Wait until no other task holds `key`, then hold it until the returned
    /// guard is dropped. Dropping the future while it waits releases its slot.
    pub(crate) async fn lock(&self, key: &str) -> KeyGuard<'_> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(key.to_owned()).or_default())
        };
        // Holds the slot while waiting so a cancelled wait still runs the
        // cleanup in `Drop`. `acquire` is declared later and dropped first.
        let mut key_guard = KeyGuard {
            locks: self,
            key: key.to_owned(),
            slot,
            guard: None,
        };
        let acquire = Arc::clone(&key_guard.slot).lock_owned();
        key_guard.guard = Some(acquire.await);
        key_guard
    }

    #[cfg(test)]
    fn live_keys(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

pub(crate) struct KeyGuard<'a> {
    locks: &'a KeyedLocks,
    key: String,
    slot: Slot,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut slots = self
            .locks
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // The table and this guard are the only owners left: nobody waits.
        if Arc::strong_count(&self.slot) == 2 {
            slots.remove(&self.key);
        }
    }
}
