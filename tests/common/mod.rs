#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpListener;

use todo_sync::api::router;
use todo_sync::client::ApiClient;
use todo_sync::config::RemoteConfig;
use todo_sync::db;
use todo_sync::error::AppError;
use todo_sync::session::Session;
use todo_sync::state::{AppState, Sessions};
use todo_sync::storage::{KeyValueStore, MemoryStorage};
use todo_sync::store::RemoteTaskStore;

pub const ALICE_TOKEN: &str = "alice-token";
pub const BOB_TOKEN: &str = "bob-token";

/// Serves the task API on an ephemeral port and returns its base URL.
pub async fn spawn_api() -> String {
    let pool = db::connect_in_memory()
        .await
        .expect("Failed to create database");
    let sessions = Sessions::from_users([
        ("alice".to_string(), ALICE_TOKEN.to_string()),
        ("bob".to_string(), BOB_TOKEN.to_string()),
    ]);
    let app = router(AppState { db: pool, sessions });

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind listener");
    let addr = listener.local_addr().expect("Failed to read local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server error");
    });

    format!("http://{}", addr)
}

pub fn remote_config(api_url: &str, timeout: Duration) -> RemoteConfig {
    RemoteConfig {
        api_url: api_url.to_string(),
        token: None,
        timeout,
    }
}

/// Remote store and session sharing one session storage. Signs in when a
/// token is given.
pub async fn remote_store(api_url: &str, token: Option<&str>) -> (Arc<RemoteTaskStore>, Session) {
    let session_storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStorage::new());
    let api = ApiClient::new(&remote_config(api_url, Duration::from_secs(5)), session_storage)
        .expect("Failed to build api client");
    let session = Session::new(api.clone());
    if let Some(token) = token {
        session.sign_in(token).await.expect("Failed to store token");
    }
    (Arc::new(RemoteTaskStore::new(api)), session)
}

/// Storage whose writes can be switched to fail.
#[derive(Default)]
pub struct FlakyStorage {
    inner: MemoryStorage,
    fail_writes: AtomicBool,
}

impl FlakyStorage {
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl KeyValueStore for FlakyStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Persistence("storage quota exceeded".to_string()));
        }
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        self.inner.remove(key).await
    }
}
