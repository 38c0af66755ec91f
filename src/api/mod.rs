//! HTTP task API the remote store talks to.

pub mod dto;

use axum::Json;
use axum::extract::{FromRequest, FromRequestParts, Path};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::routing::{delete, post, put};
use axum::{Router, extract::State, http::StatusCode, routing::get};
use tracing::info;

use crate::db::repository;
use crate::error::AppError;
use crate::models::{DEFAULT_DESCRIPTION, Task};
use crate::state::AppState;
use dto::{CreateTaskRequest, CreateTaskResponse, MeResponse, UpdateTaskRequest};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/create-task", post(create_task))
        .route("/get-tasks", get(get_tasks))
        .route("/update-task/{id}", put(update_task))
        .route("/remove-task/{id}", delete(remove_task))
        .route("/me", post(me))
        .route("/log-out", post(log_out))
        .with_state(state)
}

/// JSON body whose rejections are reported as `AppError`, so malformed
/// bodies get a 400 with the usual `{error, message}` body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// Caller resolved from the `Authorization: Bearer <token>` header.
pub struct CurrentUser {
    pub username: String,
    pub token: String,
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AppError::Unauthorized)?;

        let username = state.sessions.user_for(token).ok_or(AppError::Unauthorized)?;
        Ok(Self {
            username,
            token: token.to_string(),
        })
    }
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

async fn create_task(
    State(state): State<AppState>,
    user: CurrentUser,
    JsonBody(mut req): JsonBody<CreateTaskRequest>,
) -> Result<Json<CreateTaskResponse>, AppError> {
    req.title = required_title(&req.title)?;
    if req.description.trim().is_empty() {
        req.description = DEFAULT_DESCRIPTION.to_string();
    }
    let created = repository::insert_task(&state.db, &user.username, &req).await?;
    info!("created task {} for {}", created.id, user.username);
    Ok(Json(created))
}

async fn get_tasks(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<Task>>, AppError> {
    let tasks = repository::fetch_tasks(&state.db, &user.username).await?;
    Ok(Json(tasks))
}

async fn update_task(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    JsonBody(mut req): JsonBody<UpdateTaskRequest>,
) -> Result<Json<Task>, AppError> {
    if let Some(title) = &req.title {
        req.title = Some(required_title(title)?);
    }
    let task = repository::update_task(&state.db, &user.username, id, &req)
        .await?
        .ok_or(AppError::NotFound(id))?;
    Ok(Json(task))
}

async fn remove_task(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let ok = repository::delete_task(&state.db, &user.username, id).await?;
    if ok {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(id))
    }
}

async fn me(user: CurrentUser) -> Json<MeResponse> {
    Json(MeResponse {
        username: user.username,
    })
}

async fn log_out(State(state): State<AppState>, user: CurrentUser) -> StatusCode {
    state.sessions.revoke(&user.token);
    info!("{} logged out", user.username);
    StatusCode::NO_CONTENT
}

fn required_title(title: &str) -> Result<String, AppError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("title is required".to_string()));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::state::Sessions;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    async fn test_app() -> Router {
        let pool = db::connect_in_memory().await.expect("Failed to create test db");
        let sessions = Sessions::from_users([("alice".to_string(), "secret".to_string())]);
        router(AppState { db: pool, sessions })
    }

    #[tokio::test]
    async fn test_requests_without_token_are_rejected() {
        let app = test_app().await;
        let response = app
            .oneshot(Request::get("/get-tasks").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_blank_title_is_bad_request() {
        let app = test_app().await;
        let response = app
            .oneshot(
                Request::post("/create-task")
                    .header("Authorization", "Bearer secret")
                    .header("Content-Type", "application/json")
                    .body(Body::from(r#"{"title":"  ","description":"","status":"pending"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    async fn post_create_task(body: &'static str) -> (StatusCode, serde_json::Value) {
        let app = test_app().await;
        let response = app
            .oneshot(
                Request::post("/create-task")
                    .header("Authorization", "Bearer secret")
                    .header("Content-Type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).expect("error body is JSON");
        (status, json)
    }

    #[tokio::test]
    async fn test_malformed_bodies_are_bad_request_with_json_error() {
        for body in [r#"{"description":"x"}"#, r#"{"title":5}"#, "not json"] {
            let (status, json) = post_create_task(body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
            assert_eq!(json["error"], "400 Bad Request");
            assert!(json["message"].as_str().is_some_and(|m| !m.is_empty()));
        }
    }

    #[tokio::test]
    async fn test_update_with_malformed_body_is_bad_request() {
        let app = test_app().await;
        let response = app
            .oneshot(
                Request::put("/update-task/1")
                    .header("Authorization", "Bearer secret")
                    .header("Content-Type", "application/json")
                    .body(Body::from(r#"{"status":"archived"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_remove_unknown_task_is_not_found() {
        let app = test_app().await;
        let response = app
            .oneshot(
                Request::delete("/remove-task/99")
                    .header("Authorization", "Bearer secret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
