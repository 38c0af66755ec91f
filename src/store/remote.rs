use async_trait::async_trait;
use reqwest::Method;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::api::dto::{CreateTaskRequest, CreateTaskResponse, UpdateTaskRequest};
use crate::client::ApiClient;
use crate::error::AppError;
use crate::models::{NewTask, Task, TaskStatus, TaskUpdate, DEFAULT_DESCRIPTION, now_timestamp};
use crate::store::{TaskStore, find};

/// Task store backed by the task API. The local list is a cache of the last
/// server responses; the lock is never held across a request, so concurrent
/// gestures race and the last response to arrive wins.
pub struct RemoteTaskStore {
    api: ApiClient,
    tasks: Mutex<Vec<Task>>,
}

impl RemoteTaskStore {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            tasks: Mutex::new(Vec::new()),
        }
    }

    async fn ensure_known(&self, id: i64) -> Result<(), AppError> {
        let tasks = self.tasks.lock().await;
        find(&tasks, id).map(|_| ())
    }

    async fn forget(&self, id: i64) {
        let mut tasks = self.tasks.lock().await;
        tasks.retain(|t| t.id != id);
    }

    async fn replace(&self, task: Task) {
        let mut tasks = self.tasks.lock().await;
        match tasks.iter_mut().find(|t| t.id == task.id) {
            Some(slot) => *slot = task,
            None => tasks.push(task),
        }
    }

    async fn put(&self, id: i64, body: &UpdateTaskRequest) -> Result<Task, AppError> {
        let response = self
            .api
            .request(Method::PUT, &format!("/update-task/{}", id))
            .await?
            .json(body)
            .send()
            .await?;
        let response = match ApiClient::check(response, Some(id)).await {
            Ok(response) => response,
            Err(AppError::NotFound(id)) => {
                warn!("task {} vanished on the server", id);
                self.forget(id).await;
                return Err(AppError::NotFound(id));
            }
            Err(e) => return Err(e),
        };
        let task: Task = response.json().await?;
        self.replace(task.clone()).await;
        Ok(task)
    }
}

#[async_trait]
impl TaskStore for RemoteTaskStore {
    async fn load(&self) -> Result<Vec<Task>, AppError> {
        let response = self.api.request(Method::GET, "/get-tasks").await?.send().await?;
        let fetched: Vec<Task> = ApiClient::check(response, None).await?.json().await?;
        info!("fetched {} tasks from the task API", fetched.len());

        let mut tasks = self.tasks.lock().await;
        *tasks = fetched.clone();
        Ok(fetched)
    }

    async fn add(&self, req: NewTask) -> Result<Task, AppError> {
        let req = req.normalized()?;
        let body = CreateTaskRequest {
            title: req.title,
            description: req
                .description
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            status: TaskStatus::Pending,
        };

        let response = self
            .api
            .request(Method::POST, "/create-task")
            .await?
            .json(&body)
            .send()
            .await?;
        let created: CreateTaskResponse = ApiClient::check(response, None).await?.json().await?;

        let task = Task {
            id: created.id,
            title: body.title,
            description: body.description,
            status: TaskStatus::Pending,
            created_at: created.created_at,
            completed_at: None,
        };
        self.replace(task.clone()).await;
        Ok(task)
    }

    async fn update(&self, id: i64, fields: TaskUpdate) -> Result<Task, AppError> {
        self.ensure_known(id).await?;
        let fields = fields.normalized()?;
        let body = UpdateTaskRequest {
            title: fields.title,
            description: fields.description,
            ..Default::default()
        };
        self.put(id, &body).await
    }

    async fn remove(&self, id: i64) -> Result<(), AppError> {
        self.ensure_known(id).await?;
        let response = self
            .api
            .request(Method::DELETE, &format!("/remove-task/{}", id))
            .await?
            .send()
            .await?;
        match ApiClient::check(response, Some(id)).await {
            Ok(_) => {}
            Err(AppError::NotFound(id)) => {
                self.forget(id).await;
                return Err(AppError::NotFound(id));
            }
            Err(e) => return Err(e),
        }
        self.forget(id).await;
        Ok(())
    }

    async fn set_completion(&self, id: i64, completed: bool) -> Result<Task, AppError> {
        self.ensure_known(id).await?;
        let body = if completed {
            UpdateTaskRequest {
                status: Some(TaskStatus::Completed),
                completed_at: Some(now_timestamp()),
                ..Default::default()
            }
        } else {
            UpdateTaskRequest {
                status: Some(TaskStatus::Pending),
                ..Default::default()
            }
        };
        self.put(id, &body).await
    }

    async fn get(&self, id: i64) -> Result<Task, AppError> {
        let tasks = self.tasks.lock().await;
        let index = find(&tasks, id)?;
        Ok(tasks[index].clone())
    }

    async fn list(&self) -> Vec<Task> {
        self.tasks.lock().await.clone()
    }
}
