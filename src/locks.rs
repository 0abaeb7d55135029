//! Per-tenant locks shared by the indexer and the searcher.
//!
//! Each tenant has two locks:
//!
//! | Lock | Held by | Across |
//! |------|---------|--------|
//! | `rebuild` | the indexer | a whole ingest (load, append, represent, commit) |
//! | `publish` (write) | the indexer | the artifact and corpus publishes |
//! | `publish` (read) | the searcher | the corpus and artifact loads |
//!
//! A search therefore never observes one file of a generation without the
//! other, and is only delayed for the duration of a commit, not a rebuild.
//! Map entries are dropped once no task holds a handle for the tenant.
//! The locks are in-process only.

use std::collections::HashMap;
use std::ops::Deref;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

#[derive(Default)]
pub struct TenantLock {
    pub rebuild: Mutex<()>,
    /// Shared so a commit task can own its write guard.
    pub publish: Arc<RwLock<()>>,
}

#[derive(Default)]
pub struct TenantLocks {
    entries: parking_lot::Mutex<HashMap<String, Arc<TenantLock>>>,
}

impl TenantLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self, tenant: &str) -> LockHandle<'_> {
        let lock = self
            .entries
            .lock()
            .entry(tenant.to_string())
            .or_default()
            .clone();
        LockHandle {
            owner: self,
            tenant: tenant.to_string(),
            lock,
        }
    }
}

/// A tenant's locks, kept registered while the handle lives.
pub struct LockHandle<'a> {
    owner: &'a TenantLocks,
    tenant: String,
    lock: Arc<TenantLock>,
}

impl Deref for LockHandle<'_> {
    type Target = TenantLock;

    fn deref(&self) -> &TenantLock {
        &self.lock
    }
}

impl Drop for LockHandle<'_> {
    fn drop(&mut self) {
        let mut entries = self.owner.entries.lock();
        // Only the map and this handle remain.
        if Arc::strong_count(&self.lock) == 2 {
            entries.remove(&self.tenant);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_released_with_last_handle() {
        let locks = TenantLocks::new();
        let first = locks.handle("a");
        let second = locks.handle("a");
        let other = locks.handle("b");
        assert!(Arc::ptr_eq(&first.lock, &second.lock));
        assert_eq!(locks.entries.lock().len(), 2);

        drop(first);
        assert_eq!(locks.entries.lock().len(), 2);
        drop(second);
        assert_eq!(locks.entries.lock().len(), 1);
        drop(other);
        assert!(locks.entries.lock().is_empty());
    }

    #[tokio::test]
    async fn test_publish_write_excludes_readers() {
        let locks = TenantLocks::new();
        let writer = locks.handle("a");
        let guard = writer.publish.clone().write_owned().await;

        let reader = locks.handle("a");
        assert!(reader.publish.try_read().is_err());
        drop(guard);
        assert!(reader.publish.try_read().is_ok());
    }
}
