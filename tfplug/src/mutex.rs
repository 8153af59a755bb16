//! Per-key mutual exclusion
//!
//! Some API sequences are only correct when nothing else touches the same
//! remote object in between (list, create, list again). [`KeyedMutex`] hands
//! out one async lock per key; unrelated keys never block each other.
//!
//! The registry is owned by whoever constructs it and is passed to resources
//! through provider data.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OwnedMutexGuard;
use tracing::trace;

type Registry = Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>;

/// Entries exist only while a key is held or awaited.
#[derive(Debug, Default)]
pub struct KeyedMutex {
    locks: Registry,
}

/// Held lock for one key; released on drop.
#[derive(Debug)]
pub struct KeyedGuard {
    key: String,
    guard: OwnedMutexGuard<()>,
    registry: Registry,
}

impl KeyedGuard {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for KeyedGuard {
    fn drop(&mut self) {
        let mut locks = lock_registry(&self.registry);
        // One reference in the map, one in this guard: nobody is waiting.
        if Arc::strong_count(OwnedMutexGuard::mutex(&self.guard)) == 2 {
            locks.remove(&self.key);
        }
        trace!(key = %self.key, "Unlocked");
    }
}

fn lock_registry(
    registry: &Registry,
) -> std::sync::MutexGuard<'_, HashMap<String, Arc<tokio::sync::Mutex<()>>>> {
    registry
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl KeyedMutex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no one else holds `key`, then returns the guard.
    pub async fn lock(&self, key: &str) -> KeyedGuard {
        let lock = self.entry(key);
        trace!(key, "Locking");
        let guard = lock.lock_owned().await;
        trace!(key, "Locked");

        KeyedGuard {
            key: key.to_string(),
            guard,
            registry: self.locks.clone(),
        }
    }

    /// Returns the guard only if `key` is free right now.
    pub fn try_lock(&self, key: &str) -> Option<KeyedGuard> {
        let lock = self.entry(key);
        let guard = lock.try_lock_owned().ok()?;
        Some(KeyedGuard {
            key: key.to_string(),
            guard,
            registry: self.locks.clone(),
        })
    }

    /// Number of keys currently held or awaited.
    pub fn len(&self) -> usize {
        lock_registry(&self.locks).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entry(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = lock_registry(&self.locks);
        locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn same_key_is_exclusive() {
        let locks = KeyedMutex::new();

        let guard = locks.lock("576965").await;
        assert_eq!(guard.key(), "576965");
        assert!(locks.try_lock("576965").is_none());

        drop(guard);
        assert!(locks.try_lock("576965").is_some());
    }

    #[tokio::test]
    async fn different_keys_do_not_block() {
        let locks = KeyedMutex::new();

        let _a = locks.lock("a").await;
        let b = tokio::time::timeout(Duration::from_secs(1), locks.lock("b")).await;

        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn holders_of_one_key_run_one_at_a_time() {
        let locks = Arc::new(KeyedMutex::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = locks.clone();
            let inside = inside.clone();
            let max_inside = max_inside.clone();
            handles.push(tokio::spawn(async move {
                let _guard = locks.lock("instance").await;
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_inside.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn waiter_wakes_when_holder_drops() {
        use tokio_test::{assert_pending, assert_ready, task};

        let locks = KeyedMutex::new();
        let held = locks.try_lock("576965");
        assert!(held.is_some());

        let mut waiter = task::spawn(locks.lock("576965"));
        assert_pending!(waiter.poll());

        drop(held);
        assert!(waiter.is_woken());
        let guard = assert_ready!(waiter.poll());
        assert_eq!(guard.key(), "576965");
    }

    #[tokio::test]
    async fn released_keys_leave_the_registry() {
        let locks = KeyedMutex::new();

        for id in ["576965", "576966", "576967"] {
            let _guard = locks.lock(id).await;
            assert_eq!(locks.len(), 1);
        }
        assert!(locks.is_empty());

        assert!(locks.try_lock("576965").is_some());
        assert!(locks.is_empty());
    }

    #[test]
    fn entry_survives_while_someone_waits() {
        use tokio_test::{assert_pending, assert_ready, task};

        let locks = KeyedMutex::new();
        let held = locks.try_lock("576965");
        let mut waiter = task::spawn(locks.lock("576965"));
        assert_pending!(waiter.poll());

        drop(held);
        assert_eq!(locks.len(), 1);

        let guard = assert_ready!(waiter.poll());
        drop(guard);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn guard_is_released_on_error_paths() {
        async fn failing(locks: &KeyedMutex) -> Result<(), &'static str> {
            let _guard = locks.lock("k").await;
            Err("create failed")
        }

        let locks = KeyedMutex::new();
        assert!(failing(&locks).await.is_err());
        assert!(locks.try_lock("k").is_some());
    }
}
