//! Per-key async locks

use dashmap::DashMap;
use std::fs::File;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of one async mutex per key
///
/// Holders of the same key are serialized; different keys never contend.
/// An entry lives only while someone holds or waits for it.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`
    pub async fn lock(&self, key: &str) -> KeyedGuard<'_> {
        let mutex = Arc::clone(
            &*self
                .locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        );
        let guard = mutex.lock_owned().await;

        KeyedGuard {
            locks: self,
            key: key.to_string(),
            guard: Some(guard),
        }
    }

    /// Number of keys currently held or awaited
    pub fn active_keys(&self) -> usize {
        self.locks.len()
    }
}

/// Exclusive access to one key, released on drop
#[derive(Debug)]
pub struct KeyedGuard<'a> {
    locks: &'a KeyedLocks,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl KeyedGuard<'_> {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for KeyedGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        // Only the map still references the mutex: nobody is waiting
        self.locks
            .locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

/// Exclusive right to read, transition and write back one instance
///
/// Holds the in-process key lock and, for stores shared between processes,
/// an advisory file lock. Both are released on drop, the file lock first.
#[derive(Debug)]
pub struct InstanceGuard<'a> {
    _file: Option<File>,
    key: KeyedGuard<'a>,
}

impl<'a> InstanceGuard<'a> {
    pub fn new(key: KeyedGuard<'a>) -> Self {
        Self { _file: None, key }
    }

    /// Also hold `file`, which must already carry an exclusive lock
    pub fn with_file(mut self, file: File) -> Self {
        self._file = Some(file);
        self
    }

    pub fn key(&self) -> &str {
        self.key.key()
    }
}
