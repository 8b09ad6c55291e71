//! Keyed mutual exclusion for read-modify-write cycles.
//!
//! Scoring reads a cohort's verified scores, ranks against them and writes
//! results back. Two such cycles on the same cohort must not interleave or
//! the persisted aggregate loses an update. The same holds for a user's
//! points and profile. Different keys proceed in parallel.

use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::sync::Arc;

use talentscope_common::CohortKey;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::debug;
use uuid::Uuid;

/// One lock per cohort key.
pub type CohortLocks = KeyedLocks<CohortKey>;

/// One lock per user id.
pub type UserLocks = KeyedLocks<Uuid>;

pub struct KeyedLocks<K> {
    locks: RwLock<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self { locks: RwLock::new(HashMap::new()) }
    }
}

impl<K> std::fmt::Debug for KeyedLocks<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyedLocks").finish_non_exhaustive()
    }
}

impl<K: Copy + Eq + Hash + Display> KeyedLocks<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`. Released when the guard drops.
    pub async fn acquire(&self, key: K) -> OwnedMutexGuard<()> {
        self.lock_for(key).await.lock_owned().await
    }

    async fn lock_for(&self, key: K) -> Arc<Mutex<()>> {
        {
            let locks = self.locks.read().await;
            if let Some(lock) = locks.get(&key) {
                return Arc::clone(lock);
            }
        }

        let mut locks = self.locks.write().await;
        let lock = locks.entry(key).or_insert_with(|| {
            debug!(key = %key, "Created lock");
            Arc::new(Mutex::new(()))
        });
        Arc::clone(lock)
    }

    pub async fn len(&self) -> usize {
        self.locks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.locks.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use talentscope_common::{AgeGroup, Gender, TestType};

    fn key(gender: Gender) -> CohortKey {
        CohortKey::new(TestType::ShuttleRun, AgeGroup::Under16, gender)
    }

    #[tokio::test]
    async fn test_same_cohort_is_exclusive() {
        let locks = CohortLocks::new();
        let _held = locks.acquire(key(Gender::Male)).await;

        let second = tokio::time::timeout(Duration::from_millis(50), locks.acquire(key(Gender::Male))).await;
        assert!(second.is_err());
    }

    #[tokio::test]
    async fn test_other_cohorts_not_blocked() {
        let locks = CohortLocks::new();
        let _held = locks.acquire(key(Gender::Male)).await;

        let other = tokio::time::timeout(Duration::from_millis(50), locks.acquire(key(Gender::Female))).await;
        assert!(other.is_ok());
        assert_eq!(locks.len().await, 2);
    }

    #[tokio::test]
    async fn test_released_on_drop() {
        let locks = CohortLocks::new();
        drop(locks.acquire(key(Gender::Other)).await);
        let again = tokio::time::timeout(Duration::from_millis(50), locks.acquire(key(Gender::Other))).await;
        assert!(again.is_ok());
        assert_eq!(locks.len().await, 1);
    }

    #[tokio::test]
    async fn test_user_locks_are_per_user() {
        let locks = UserLocks::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let _held = locks.acquire(a).await;

        assert!(tokio::time::timeout(Duration::from_millis(50), locks.acquire(a)).await.is_err());
        assert!(tokio::time::timeout(Duration::from_millis(50), locks.acquire(b)).await.is_ok());
    }
}
