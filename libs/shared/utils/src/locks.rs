use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;
use uuid::Uuid;

/// In-process scheduling locks keyed by doctor or patient id.
///
/// A booking holds the locks for every id it touches from its first read to
/// its commit, so two requests for the same doctor (or the same patient)
/// cannot interleave their validate-then-insert sequences.
#[derive(Default)]
pub struct KeyedLocks {
    locks: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

/// Releases every held key on drop.
pub struct KeyedLockGuard {
    _guards: Vec<OwnedMutexGuard<()>>,
}

#[cfg(test)]
impl KeyedLockGuard {
    fn held(&self) -> usize {
        self._guards.len()
    }
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires all `keys`. Keys are taken in sorted order so overlapping
    /// acquisitions cannot deadlock.
    pub async fn acquire(&self, keys: &[Uuid]) -> KeyedLockGuard {
        let mut keys = keys.to_vec();
        keys.sort();
        keys.dedup();

        let mutexes: Vec<Arc<AsyncMutex<()>>> = {
            let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            // Entries nobody holds or waits on
            locks.retain(|_, mutex| Arc::strong_count(mutex) > 1);
            keys.iter()
                .map(|key| locks.entry(*key).or_default().clone())
                .collect()
        };

        let mut guards = Vec::with_capacity(mutexes.len());
        for (key, mutex) in keys.iter().zip(mutexes) {
            let guard = match mutex.clone().try_lock_owned() {
                Ok(guard) => guard,
                Err(_) => {
                    debug!("Waiting for scheduling lock on {}", key);
                    mutex.lock_owned().await
                }
            };
            guards.push(guard);
        }

        KeyedLockGuard { _guards: guards }
    }

    #[cfg(test)]
    fn tracked_keys(&self) -> usize {
        self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }
}
