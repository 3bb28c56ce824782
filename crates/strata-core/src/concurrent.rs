//! Shared keyspace for multi-threaded access.
//!
//! Every command runs under a single mutex, so each one (including the
//! multi-key store commands) is observed by other threads either fully
//! applied or not at all.

use std::sync::{Mutex, MutexGuard};

use crate::keyspace::{Keyspace, KeyspaceConfig};

/// A keyspace that can be shared between threads behind an `Arc`.
#[derive(Debug, Default)]
pub struct SharedKeyspace {
    inner: Mutex<Keyspace>,
}

impl SharedKeyspace {
    pub fn new(config: KeyspaceConfig) -> Self {
        Self {
            inner: Mutex::new(Keyspace::with_config(config)),
        }
    }

    /// Runs `f` with exclusive access to the keyspace.
    pub fn execute<T>(&self, f: impl FnOnce(&mut Keyspace) -> T) -> T {
        let mut guard = self.lock();
        f(&mut guard)
    }

    /// Current keyspace config.
    pub fn config(&self) -> KeyspaceConfig {
        *self.lock().config()
    }

    /// Replaces the config used for sorted sets created from now on.
    pub fn set_config(&self, config: KeyspaceConfig) {
        self.lock().set_config(config);
    }

    fn lock(&self) -> MutexGuard<'_, Keyspace> {
        // a panic mid-command can't leave the map itself inconsistent
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
