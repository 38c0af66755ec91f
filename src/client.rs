//! HTTP plumbing for the task API: base URL, timeout, bearer credential.

use std::sync::Arc;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use tracing::debug;

use crate::config::RemoteConfig;
use crate::error::AppError;
use crate::storage::{KeyValueStore, TOKEN_KEY, get_json};

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Arc<dyn KeyValueStore>,
}

impl ApiClient {
    pub fn new(config: &RemoteConfig, session: Arc<dyn KeyValueStore>) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Remote(format!("Failed to build http client: {}", e)))?;
        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn session(&self) -> &Arc<dyn KeyValueStore> {
        &self.session
    }

    /// Token stored in session storage; `Unauthorized` when absent.
    pub async fn bearer(&self) -> Result<String, AppError> {
        let token: Option<String> = get_json(self.session.as_ref(), TOKEN_KEY).await?;
        token.filter(|t| !t.is_empty()).ok_or(AppError::Unauthorized)
    }

    /// Starts an authenticated request against `path`.
    pub async fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, AppError> {
        let token = self.bearer().await?;
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);
        Ok(self
            .client
            .request(method, url)
            .header("Authorization", format!("Bearer {}", token)))
    }

    /// Maps non-success statuses onto the error taxonomy. `id` names the task
    /// a 404 refers to.
    pub async fn check(response: Response, id: Option<i64>) -> Result<Response, AppError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        match (status, id) {
            (StatusCode::UNAUTHORIZED, _) => Err(AppError::Unauthorized),
            (StatusCode::NOT_FOUND, Some(id)) => Err(AppError::NotFound(id)),
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(AppError::Remote(format!("task API error {}: {}", status, body)))
            }
        }
    }
}
