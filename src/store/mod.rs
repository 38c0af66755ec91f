//! The task store: canonical task collection plus its persistence.
//!
//! Two backends implement [`TaskStore`]: [`LocalTaskStore`] mirrors the
//! collection into key-value storage, [`RemoteTaskStore`] pushes every change
//! to the task API. Callers always await the result, whichever backend is in
//! use. A failed write leaves the collection exactly as it was.

pub mod local;
pub mod remote;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{NewTask, Task, TaskUpdate};

pub use local::LocalTaskStore;
pub use remote::RemoteTaskStore;

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Re-reads the persisted collection, replacing the in-memory copy.
    async fn load(&self) -> Result<Vec<Task>, AppError>;

    async fn add(&self, req: NewTask) -> Result<Task, AppError>;

    /// Merges title/description. `NotFound` when the id is unknown.
    async fn update(&self, id: i64, fields: TaskUpdate) -> Result<Task, AppError>;

    async fn remove(&self, id: i64) -> Result<(), AppError>;

    /// Sets status and `completed_at` together.
    async fn set_completion(&self, id: i64, completed: bool) -> Result<Task, AppError>;

    async fn get(&self, id: i64) -> Result<Task, AppError>;

    /// Insertion order for local storage, server order for the remote API.
    async fn list(&self) -> Vec<Task>;
}

pub(crate) fn find(tasks: &[Task], id: i64) -> Result<usize, AppError> {
    tasks
        .iter()
        .position(|t| t.id == id)
        .ok_or(AppError::NotFound(id))
}
