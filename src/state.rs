use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use sqlx::SqlitePool;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub sessions: Sessions,
}

/// Bearer token → username for the task API.
#[derive(Clone, Default)]
pub struct Sessions {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl Sessions {
    pub fn from_users<I>(users: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let map = users
            .into_iter()
            .map(|(username, token)| (token, username))
            .collect();
        Self {
            inner: Arc::new(RwLock::new(map)),
        }
    }

    pub fn user_for(&self, token: &str) -> Option<String> {
        self.inner.read().ok()?.get(token).cloned()
    }

    pub fn revoke(&self, token: &str) -> bool {
        match self.inner.write() {
            Ok(mut map) => map.remove(token).is_some(),
            Err(_) => false,
        }
    }
}
