//! Per-product mutual exclusion.

use std::collections::HashMap;
use std::sync::Arc;

use common::ProductId;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// A table of per-product locks, created lazily on first use.
///
/// Each product key maps to one async mutex so all mutations against a
/// product are totally ordered while different products proceed
/// independently. tokio's mutex grants the lock to waiters in FIFO
/// order and wakes the next waiter through the scheduler, never inline
/// from the releasing call stack. The lock is not reentrant: a second
/// acquire for the same key waits.
#[derive(Debug, Default)]
pub struct ProductLocks {
    locks: Mutex<HashMap<ProductId, Arc<Mutex<()>>>>,
}

impl ProductLocks {
    /// Creates an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock for a product, waiting behind earlier callers.
    ///
    /// Dropping the returned guard releases the lock and hands it to
    /// the next waiter.
    pub async fn acquire(&self, product_id: &ProductId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(product_id.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Drops every lock in the table.
    ///
    /// An in-flight holder keeps its own handle and runs to
    /// completion; the key gets a fresh lock on next use.
    pub async fn clear(&self) {
        self.locks.lock().await.clear();
    }

    /// Number of product keys with lock state.
    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }

    /// Returns true if no product key has lock state.
    pub async fn is_empty(&self) -> bool {
        self.locks.lock().await.is_empty()
    }
}
