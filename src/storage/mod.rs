//! Key-value storage behind the local task store, the theme and the session.
//!
//! Values are JSON encoded and kept under a handful of fixed keys. Reading a
//! key that was never written yields `None`.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

use crate::error::AppError;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

pub const TASKS_KEY: &str = "tasks";
pub const THEME_COLOR_KEY: &str = "theme-color";
pub const TOKEN_KEY: &str = "token";

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), AppError>;
    async fn remove(&self, key: &str) -> Result<(), AppError>;
}

pub async fn get_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, AppError> {
    match store.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

pub async fn set_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), AppError> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw).await
}
