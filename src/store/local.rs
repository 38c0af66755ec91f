use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::AppError;
use crate::models::{NewTask, Task, TaskUpdate};
use crate::storage::{KeyValueStore, TASKS_KEY, get_json, set_json};
use crate::store::{TaskStore, find};

pub struct LocalTaskStore {
    storage: Arc<dyn KeyValueStore>,
    tasks: Mutex<Vec<Task>>,
}

impl LocalTaskStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            storage,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Creates the store and reads whatever was saved before.
    pub async fn open(storage: Arc<dyn KeyValueStore>) -> Result<Self, AppError> {
        let store = Self::new(storage);
        store.load().await?;
        Ok(store)
    }

    /// Persists `next` and only then swaps it in.
    async fn commit(&self, current: &mut Vec<Task>, next: Vec<Task>) -> Result<(), AppError> {
        set_json(self.storage.as_ref(), TASKS_KEY, &next).await?;
        *current = next;
        Ok(())
    }
}

fn next_id(tasks: &[Task]) -> i64 {
    tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1
}

#[async_trait]
impl TaskStore for LocalTaskStore {
    async fn load(&self) -> Result<Vec<Task>, AppError> {
        let stored: Option<Vec<Task>> = get_json(self.storage.as_ref(), TASKS_KEY).await?;
        let stored = stored.unwrap_or_default();
        info!("loaded {} tasks from storage", stored.len());

        let mut tasks = self.tasks.lock().await;
        *tasks = stored.clone();
        Ok(stored)
    }

    async fn add(&self, req: NewTask) -> Result<Task, AppError> {
        let req = req.normalized()?;
        let mut tasks = self.tasks.lock().await;

        let task = Task::create(next_id(&tasks), req);
        let mut next = tasks.clone();
        next.push(task.clone());
        self.commit(&mut tasks, next).await?;

        debug!("added task {}", task.id);
        Ok(task)
    }

    async fn update(&self, id: i64, fields: TaskUpdate) -> Result<Task, AppError> {
        let mut tasks = self.tasks.lock().await;
        let index = find(&tasks, id)?;
        let fields = fields.normalized()?;

        let mut next = tasks.clone();
        next[index].apply(&fields);
        let task = next[index].clone();
        self.commit(&mut tasks, next).await?;
        Ok(task)
    }

    async fn remove(&self, id: i64) -> Result<(), AppError> {
        let mut tasks = self.tasks.lock().await;
        let index = find(&tasks, id)?;

        let mut next = tasks.clone();
        next.remove(index);
        self.commit(&mut tasks, next).await?;

        debug!("removed task {}", id);
        Ok(())
    }

    async fn set_completion(&self, id: i64, completed: bool) -> Result<Task, AppError> {
        let mut tasks = self.tasks.lock().await;
        let index = find(&tasks, id)?;

        let mut next = tasks.clone();
        next[index].set_completed(completed);
        let task = next[index].clone();
        self.commit(&mut tasks, next).await?;
        Ok(task)
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
