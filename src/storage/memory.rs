use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::AppError;
use crate::storage::KeyValueStore;

/// Session scoped storage: lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> AppError {
    AppError::Persistence("session storage lock poisoned".to_string())
}

#[async_trait]
impl KeyValueStore for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{get_json, set_json};

    #[tokio::test]
    async fn test_missing_key_reads_none() {
        let storage = MemoryStorage::new();
        let value: Option<String> = get_json(&storage, "token").await.unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_set_get_remove() {
        let storage = MemoryStorage::new();
        set_json(&storage, "token", "abc").await.unwrap();
        let value: Option<String> = get_json(&storage, "token").await.unwrap();
        assert_eq!(value.as_deref(), Some("abc"));

        storage.remove("token").await.unwrap();
        assert!(storage.get("token").await.unwrap().is_none());
    }
}
