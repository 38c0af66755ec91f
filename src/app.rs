//! Client lifecycle: build the configured backend, load and render the task
//! list, restore the theme. Torn down with [`App::shutdown`].

use std::sync::{Arc, Mutex};

use sqlx::SqlitePool;
use tracing::info;

use crate::client::ApiClient;
use crate::config::{AppConfig, BackendKind};
use crate::db;
use crate::dispatcher::Dispatcher;
use crate::error::AppError;
use crate::session::Session;
use crate::storage::{KeyValueStore, MemoryStorage, SqliteStorage};
use crate::store::{LocalTaskStore, RemoteTaskStore, TaskStore};
use crate::theme::{Theme, ThemeColor};
use crate::view::ListView;

pub struct App {
    pub dispatcher: Dispatcher<ListView>,
    pub theme: Theme,
    pub theme_color: Option<ThemeColor>,
    /// Present for the remote backend only.
    pub session: Option<Session>,
    db: Option<SqlitePool>,
}

impl App {
    pub async fn start(config: &AppConfig) -> Result<Self, AppError> {
        let pool = db::connect(&config.database_url).await?;
        let storage: Arc<dyn KeyValueStore> = Arc::new(SqliteStorage::new(pool.clone()));
        let mut app = Self::start_with(config, storage).await?;
        app.db = Some(pool);
        Ok(app)
    }

    /// Starts against an explicit local storage.
    pub async fn start_with(
        config: &AppConfig,
        storage: Arc<dyn KeyValueStore>,
    ) -> Result<Self, AppError> {
        let (store, session): (Arc<dyn TaskStore>, Option<Session>) = match config.backend {
            BackendKind::Local => (Arc::new(LocalTaskStore::new(storage.clone())), None),
            BackendKind::Remote => {
                let session_storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStorage::new());
                let api = ApiClient::new(&config.remote, session_storage)?;
                let session = Session::new(api.clone());
                if let Some(token) = &config.remote.token {
                    session.sign_in(token).await?;
                }
                (Arc::new(RemoteTaskStore::new(api)), Some(session))
            }
        };

        let tasks = store.load().await?;
        let dispatcher = Dispatcher::new(store, Arc::new(Mutex::new(ListView::new())));
        dispatcher.render_all(&tasks);

        let theme = Theme::new(storage);
        let theme_color = theme.current().await?;

        info!(
            "started with {:?} backend, {} tasks",
            config.backend,
            tasks.len()
        );
        Ok(Self {
            dispatcher,
            theme,
            theme_color,
            session,
            db: None,
        })
    }

    pub async fn shutdown(self) {
        if let Some(pool) = self.db {
            pool.close().await;
        }
        info!("shut down");
    }
}
