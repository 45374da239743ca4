//! In-memory record store.
//!
//! Values are held in an `Arc<Mutex<..>>` so clones share state: a test can
//! keep one handle, hand another to a ledger, and inspect or sabotage the
//! store from outside.

use super::RecordStore;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug)]
struct Inner<T> {
    value: Option<T>,
    fail_writes: bool,
    writes: usize,
}

/// Thread-safe, ephemeral store for a single value.
#[derive(Debug)]
pub struct InMemoryRecordStore<T> {
    inner: Arc<Mutex<Inner<T>>>,
}

impl<T> Clone for InMemoryRecordStore<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for InMemoryRecordStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> InMemoryRecordStore<T> {
    /// An empty store.
    pub fn new() -> Self {
        Self::seeded(None)
    }

    /// A store that already holds `value`.
    pub fn with_value(value: T) -> Self {
        Self::seeded(Some(value))
    }

    fn seeded(value: Option<T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                value,
                fail_writes: false,
                writes: 0,
            })),
        }
    }

    /// Make subsequent writes fail (or succeed again).
    pub async fn set_fail_writes(&self, fail: bool) {
        self.inner.lock().await.fail_writes = fail;
    }

    /// Number of successful writes so far.
    pub async fn write_count(&self) -> usize {
        self.inner.lock().await.writes
    }
}

impl<T: Clone> InMemoryRecordStore<T> {
    /// A copy of the stored value.
    pub async fn snapshot(&self) -> Option<T> {
        self.inner.lock().await.value.clone()
    }
}

#[async_trait]
impl<T> RecordStore<T> for InMemoryRecordStore<T>
where
    T: Clone + Send + Sync,
{
    async fn load(&self) -> Result<Option<T>> {
        Ok(self.inner.lock().await.value.clone())
    }

    async fn save(&self, value: &T) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if inner.fail_writes {
            return Err(Error::Persistence(
                "in-memory store is rejecting writes".to_string(),
            ));
        }
        inner.value = Some(value.clone());
        inner.writes += 1;
        Ok(())
    }
}
