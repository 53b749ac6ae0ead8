//! Duplicate-submission guard.
//!
//! A mutation on a (user, product) pair holds an [`InFlightGuard`] until it
//! finishes. A second mutation on the same pair fails fast instead of queuing
//! behind the first. Dropping the guard (including by cancelling the future
//! that holds it) releases the key.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use zone7_core::{ProductId, UserId};

type Key = (UserId, ProductId);

/// Registry of pending mutations. Clones share the same registry.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    keys: Arc<Mutex<HashSet<Key>>>,
}

impl InFlight {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a key, or `None` if a mutation on it is already running.
    #[must_use]
    pub fn try_acquire(&self, user_id: UserId, product_id: ProductId) -> Option<InFlightGuard> {
        let key = (user_id, product_id);
        let inserted = self
            .keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key);

        inserted.then(|| InFlightGuard {
            keys: Arc::clone(&self.keys),
            key,
        })
    }

    /// Whether a mutation on the key is currently running.
    #[must_use]
    pub fn is_pending(&self, user_id: UserId, product_id: ProductId) -> bool {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&(user_id, product_id))
    }
}

/// Releases its key on drop.
#[derive(Debug)]
pub struct InFlightGuard {
    keys: Arc<Mutex<HashSet<Key>>>,
    key: Key,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}
