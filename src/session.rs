//! Session bootstrap and teardown for the remote backend.

use reqwest::Method;
use tracing::info;

use crate::api::dto::MeResponse;
use crate::client::ApiClient;
use crate::error::AppError;
use crate::storage::{TOKEN_KEY, set_json};

pub struct Session {
    api: ApiClient,
}

impl Session {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Stores the bearer credential in session storage.
    pub async fn sign_in(&self, token: &str) -> Result<(), AppError> {
        set_json(self.api.session().as_ref(), TOKEN_KEY, token).await
    }

    pub async fn is_signed_in(&self) -> bool {
        self.api.bearer().await.is_ok()
    }

    pub async fn me(&self) -> Result<MeResponse, AppError> {
        let response = self.api.request(Method::POST, "/me").await?.send().await?;
        let me: MeResponse = ApiClient::check(response, None).await?.json().await?;
        Ok(me)
    }

    /// Revokes the credential on the server and forgets it locally. A token
    /// the server already rejects is forgotten as well.
    pub async fn log_out(&self) -> Result<(), AppError> {
        let response = self.api.request(Method::POST, "/log-out").await?.send().await?;
        match ApiClient::check(response, None).await {
            Ok(_) | Err(AppError::Unauthorized) => {}
            Err(e) => return Err(e),
        }
        self.api.session().remove(TOKEN_KEY).await?;
        info!("logged out");
        Ok(())
    }
}
