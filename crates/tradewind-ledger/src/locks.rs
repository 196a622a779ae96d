//! Per-resource lock table
//!
//! Serializes mutations on a single resource (wallet, contract). Pair
//! acquisition always locks in ascending key order, so two operations
//! touching the same two wallets from opposite directions cannot
//! deadlock. Every acquisition is bounded; expiry surfaces as
//! `ConcurrencyTimeout` rather than a hung request.

use std::fmt::Display;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::timeout;
use tradewind_types::{DomainError, Result};

/// Default bound on lock acquisition
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// A guard over one resource; mutations are legal only while held
pub type ResourceGuard = OwnedMutexGuard<()>;

/// Lock table keyed by resource id
pub struct LockTable<K> {
    locks: DashMap<K, Arc<Mutex<()>>>,
    lock_timeout: Duration,
}

impl<K> LockTable<K>
where
    K: Eq + Hash + Ord + Clone + Display,
{
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            locks: DashMap::new(),
            lock_timeout,
        }
    }

    fn slot(&self, key: &K) -> Arc<Mutex<()>> {
        self.locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Acquire the lock for one resource
    pub async fn acquire(&self, key: &K) -> Result<ResourceGuard> {
        let slot = self.slot(key);
        timeout(self.lock_timeout, slot.lock_owned())
            .await
            .map_err(|_| DomainError::ConcurrencyTimeout {
                resource: key.to_string(),
            })
    }

    /// Acquire the locks for two distinct resources, in ascending key
    /// order regardless of argument order
    pub async fn acquire_pair(&self, a: &K, b: &K) -> Result<(ResourceGuard, ResourceGuard)> {
        debug_assert!(a != b, "acquire_pair requires distinct keys");
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        let first_guard = self.acquire(first).await?;
        let second_guard = self.acquire(second).await?;
        Ok((first_guard, second_guard))
    }
}

impl<K> Default for LockTable<K>
where
    K: Eq + Hash + Ord + Clone + Display,
{
    fn default() -> Self {
        Self::new(DEFAULT_LOCK_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradewind_types::WalletId;

    #[tokio::test]
    async fn same_key_serializes() {
        let table = LockTable::new(Duration::from_millis(50));
        let key = WalletId::new();

        let guard = table.acquire(&key).await.unwrap();
        let err = table.acquire(&key).await.unwrap_err();
        assert_eq!(err.code(), "CONCURRENCY_TIMEOUT");

        drop(guard);
        table.acquire(&key).await.unwrap();
    }

    #[tokio::test]
    async fn distinct_keys_do_not_block() {
        let table = LockTable::default();
        let a = WalletId::new();
        let b = WalletId::new();

        let _ga = table.acquire(&a).await.unwrap();
        let _gb = table.acquire(&b).await.unwrap();
    }

    #[tokio::test]
    async fn opposing_pairs_cannot_deadlock() {
        let table = Arc::new(LockTable::new(Duration::from_secs(1)));
        let a = WalletId::new();
        let b = WalletId::new();

        // Both directions repeatedly; ordered acquisition means this
        // finishes rather than deadlocking.
        let t1 = {
            let table = table.clone();
            tokio::spawn(async move {
                for _ in 0..100 {
                    let _g = table.acquire_pair(&a, &b).await.unwrap();
                }
            })
        };
        let t2 = {
            let table = table.clone();
            tokio::spawn(async move {
                for _ in 0..100 {
                    let _g = table.acquire_pair(&b, &a).await.unwrap();
                }
            })
        };
        t1.await.unwrap();
        t2.await.unwrap();
    }
}
