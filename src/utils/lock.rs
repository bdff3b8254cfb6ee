//! Named exclusive locks shared by every writer in the process.
//!
//! A writer asks the registry for the lock registered under a name (the
//! target file path) and holds the returned guard for its whole
//! read-modify-write cycle. Dropping the guard releases the lock on every
//! exit path, including early returns through `?`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Clone, Default)]
pub struct NamedLocks {
    inner: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl NamedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the lock registered under `name`, creating it on first use.
    pub fn get(&self, name: &str) -> Arc<Mutex<()>> {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        map.entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Acquire `lock`, recovering it if a previous holder panicked.
///
/// The protected data is `()`, so a poisoned lock carries no broken state.
pub fn acquire(lock: &Mutex<()>) -> MutexGuard<'_, ()> {
    lock.lock().unwrap_or_else(PoisonError::into_inner)
}
