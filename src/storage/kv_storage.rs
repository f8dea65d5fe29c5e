use std::sync::Arc;

use anyhow::Result;

/// A flat string key-value store. Version histories and current-version
/// pointers are persisted through this trait so the store never depends on
/// a particular backend.
pub trait KvStorage: Send + Sync {
    /// Returns `Ok(None)` when the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Deleting an absent key is not an error.
    fn delete(&self, key: &str) -> Result<()>;
    /// Full keys beginning with `prefix`, sorted.
    fn list(&self, prefix: &str) -> Result<Vec<String>>;
}

// KvStorage trait wrapper to allow Arc<dyn KvStorage> to implement KvStorage
#[derive(Clone)]
pub struct ArcStorage {
    inner: Arc<dyn KvStorage>,
}

impl ArcStorage {
    pub fn new(target: Arc<dyn KvStorage>) -> Self {
        Self { inner: target }
    }
}

impl KvStorage for ArcStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.inner.set(key, value)
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.inner.delete(key)
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        self.inner.list(prefix)
    }
}
