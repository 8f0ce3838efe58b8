use crate::request::Region;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockKey = (Region, String);

/// Serializes deploys of the same function issued by this process.
#[derive(Debug, Default)]
pub struct DeployLocks {
    enabled: bool,
    locks: DashMap<LockKey, Arc<Mutex<()>>>,
}

/// Held while a deploy runs. Dropping the last holder of a lock forgets it.
#[derive(Debug)]
pub struct DeployGuard<'a> {
    locks: &'a DashMap<LockKey, Arc<Mutex<()>>>,
    key: LockKey,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for DeployGuard<'_> {
    fn drop(&mut self) {
        // The owned guard keeps its own reference to the mutex.
        drop(self.guard.take());

        self.locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl DeployLocks {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            locks: DashMap::new(),
        }
    }

    /// Waits for the lock of `(region, function_name)`. Returns `None` when locking is disabled.
    pub async fn acquire(&self, region: Region, function_name: &str) -> Option<DeployGuard<'_>> {
        if !self.enabled {
            return None;
        }

        let key = (region, function_name.to_string());
        let lock = self.locks.entry(key.clone()).or_default().clone();

        Some(DeployGuard {
            locks: &self.locks,
            key,
            guard: Some(lock.lock_owned().await),
        })
    }

    /// Number of functions with a deploy running or waiting.
    pub fn tracked(&self) -> usize {
        self.locks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_function_is_serialized() {
        let locks = Arc::new(DeployLocks::new(true));

        let guard = locks.acquire(Region::CnHangzhou, "my-func").await;
        assert!(guard.is_some());

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move { locks.acquire(Region::CnHangzhou, "my-func").await.is_some() })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!contender.is_finished());

        drop(guard);
        assert!(contender.await.unwrap());
    }

    #[tokio::test]
    async fn test_other_functions_do_not_wait() {
        let locks = DeployLocks::new(true);

        let _guard = locks.acquire(Region::CnHangzhou, "my-func").await;
        let other_region = locks.acquire(Region::CnShanghai, "my-func").await;
        let other_function = locks.acquire(Region::CnHangzhou, "other").await;

        assert!(other_region.is_some());
        assert!(other_function.is_some());
    }

    #[tokio::test]
    async fn test_released_locks_are_forgotten() {
        let locks = Arc::new(DeployLocks::new(true));

        let guard = locks.acquire(Region::CnHangzhou, "my-func").await;
        let other = locks.acquire(Region::CnHangzhou, "other").await;
        assert_eq!(locks.tracked(), 2);

        drop(other);
        assert_eq!(locks.tracked(), 1);

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(Region::CnHangzhou, "my-func").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        drop(guard);
        assert_eq!(locks.tracked(), 1);

        contender.await.unwrap();
        assert_eq!(locks.tracked(), 0);
    }

    #[tokio::test]
    async fn test_disabled_locks() {
        let locks = DeployLocks::new(false);

        let _first = locks.acquire(Region::CnHangzhou, "my-func").await;
        assert!(locks.acquire(Region::CnHangzhou, "my-func").await.is_none());
    }
}
