use std::{collections::HashMap, sync::{Arc, RwLock}};

use anyhow::Result;

use crate::storage::KvStorage;

/// Process-local storage. Clones share the same underlying map.
pub struct InMemoryStorage {
    data: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl KvStorage for InMemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        log::debug!("STORAGE GET: key='{}'", key);
        let data = self
            .data
            .read()
            .map_err(|_| anyhow::anyhow!("Failed to acquire read lock"))?;
        let value = data.get(key).cloned();
        log::debug!(
            "STORAGE GET RESULT: {}",
            value.as_ref().map_or("absent".to_string(), |v| format!("{} bytes", v.len()))
        );
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        log::debug!("STORAGE SET: key='{}', size={} bytes", key, value.len());
        let mut data = self
            .data
            .write()
            .map_err(|_| anyhow::anyhow!("Failed to acquire write lock"))?;
        data.insert(key.to_string(), value.to_string());
        log::debug!("STORAGE SET RESULT: success");
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        log::debug!("STORAGE DELETE: key='{}'", key);
        let mut data = self
            .data
            .write()
            .map_err(|_| anyhow::anyhow!("Failed to acquire write lock"))?;
        let existed = data.remove(key).is_some();
        log::debug!("STORAGE DELETE RESULT: existed={}", existed);
        Ok(())
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        log::debug!("STORAGE LIST: prefix='{}'", prefix);
        let data = self
            .data
            .read()
            .map_err(|_| anyhow::anyhow!("Failed to acquire read lock"))?;
        let mut results: Vec<String> = data
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();

        results.sort();
        log::debug!("STORAGE LIST RESULT: {} items", results.len());
        Ok(results)
    }
}

impl Clone for InMemoryStorage {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
        }
    }
}
