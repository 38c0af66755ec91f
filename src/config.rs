use std::env;
use std::time::Duration;

use crate::error::AppError;

const DEFAULT_DATABASE_URL: &str = "sqlite://todo.db?mode=rwc";
const DEFAULT_API_URL: &str = "http://127.0.0.1:3000";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    Local,
    Remote,
}

impl BackendKind {
    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(BackendKind::Local),
            "remote" => Ok(BackendKind::Remote),
            other => Err(AppError::Validation(format!(
                "TODO_BACKEND must be 'local' or 'remote', got '{}'",
                other
            ))),
        }
    }
}

#[derive(Clone, Debug)]
pub struct RemoteConfig {
    pub api_url: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub backend: BackendKind,
    pub database_url: String,
    pub remote: RemoteConfig,
    pub bind_addr: String,
    /// `(username, token)` pairs accepted by the task API server.
    pub api_users: Vec<(String, String)>,
}

impl AppConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let backend = match env::var("TODO_BACKEND") {
            Ok(value) => BackendKind::parse(&value)?,
            Err(_) => BackendKind::Local,
        };

        let timeout_secs = match env::var("TODO_API_TIMEOUT_SECS") {
            Ok(value) => value.trim().parse::<u64>().map_err(|_| {
                AppError::Validation(format!("TODO_API_TIMEOUT_SECS is not a number: {}", value))
            })?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        let api_users = match env::var("TODO_API_USERS") {
            Ok(value) => parse_users(&value)?,
            Err(_) => Vec::new(),
        };

        Ok(Self {
            backend,
            database_url: env_or("DATABASE_URL", DEFAULT_DATABASE_URL),
            remote: RemoteConfig {
                api_url: env_or("TODO_API_URL", DEFAULT_API_URL),
                token: env::var("TODO_API_TOKEN").ok().filter(|t| !t.is_empty()),
                timeout: Duration::from_secs(timeout_secs),
            },
            bind_addr: env_or("TODO_BIND_ADDR", DEFAULT_BIND_ADDR),
            api_users,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parses `name:token,name:token`.
pub fn parse_users(value: &str) -> Result<Vec<(String, String)>, AppError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once(':') {
            Some((name, token)) if !name.trim().is_empty() && !token.trim().is_empty() => {
                Ok((name.trim().to_string(), token.trim().to_string()))
            }
            _ => Err(AppError::Validation(format!(
                "TODO_API_USERS entry must be name:token, got '{}'",
                entry
            ))),
        })
        .collect()
}
