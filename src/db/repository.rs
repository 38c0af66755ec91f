use sqlx::SqlitePool;

use crate::api::dto::{CreateTaskRequest, CreateTaskResponse, UpdateTaskRequest};
use crate::models::{Task, TaskStatus, now_timestamp};

pub async fn fetch_tasks(db: &SqlitePool, owner: &str) -> Result<Vec<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(
        r#"
        SELECT id, title, description, status, created_at, completed_at
        FROM tasks
        WHERE owner = ?1
        ORDER BY id ASC
        "#,
    )
    .bind(owner)
    .fetch_all(db)
    .await
}

pub async fn find_task_by_id(
    db: &SqlitePool,
    owner: &str,
    id: i64,
) -> Result<Option<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(
        "SELECT id, title, description, status, created_at, completed_at FROM tasks WHERE owner = ? AND id = ?",
    )
    .bind(owner)
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn insert_task(
    db: &SqlitePool,
    owner: &str,
    req: &CreateTaskRequest,
) -> Result<CreateTaskResponse, sqlx::Error> {
    let now = now_timestamp();
    let completed_at = match req.status {
        TaskStatus::Completed => Some(now.clone()),
        TaskStatus::Pending => None,
    };

    let id = sqlx::query(
        r#"
        INSERT INTO tasks
            (owner, title, description, status, created_at, completed_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(owner)
    .bind(&req.title)
    .bind(&req.description)
    .bind(req.status)
    .bind(&now)
    .bind(completed_at)
    .execute(db)
    .await?
    .last_insert_rowid();

    Ok(CreateTaskResponse { id, created_at: now })
}

/// Merges the provided fields into the stored row. Returns `None` when the
/// task does not exist for this owner.
pub async fn update_task(
    db: &SqlitePool,
    owner: &str,
    id: i64,
    req: &UpdateTaskRequest,
) -> Result<Option<Task>, sqlx::Error> {
    let mut current = match find_task_by_id(db, owner, id).await? {
        Some(t) => t,
        None => return Ok(None),
    };

    if let Some(title) = &req.title {
        current.title = title.clone();
    }
    if let Some(description) = &req.description {
        current.description = description.clone();
    }
    match req.status {
        Some(TaskStatus::Completed) => {
            current.status = TaskStatus::Completed;
            current.completed_at = Some(req.completed_at.clone().unwrap_or_else(now_timestamp));
        }
        Some(TaskStatus::Pending) => {
            current.status = TaskStatus::Pending;
            current.completed_at = None;
        }
        None => {}
    }

    sqlx::query(
        r#"
        UPDATE tasks
        SET title = ?1,
            description = ?2,
            status = ?3,
            completed_at = ?4
        WHERE owner = ?5 AND id = ?6
        "#,
    )
    .bind(&current.title)
    .bind(&current.description)
    .bind(current.status)
    .bind(&current.completed_at)
    .bind(owner)
    .bind(id)
    .execute(db)
    .await?;

    Ok(Some(current))
}

pub async fn delete_task(db: &SqlitePool, owner: &str, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM tasks WHERE owner = ?1 AND id = ?2")
        .bind(owner)
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    async fn setup_test_db() -> SqlitePool {
        db::connect_in_memory().await.expect("Failed to create test db")
    }

    fn create_req(title: &str) -> CreateTaskRequest {
        CreateTaskRequest {
            title: title.to_string(),
            description: "(edit task for description)".to_string(),
            status: TaskStatus::Pending,
        }
    }

    #[tokio::test]
    async fn test_insert_and_fetch_task() {
        let pool = setup_test_db().await;

        let created = insert_task(&pool, "alice", &create_req("Buy milk"))
            .await
            .expect("Failed to insert task");

        let tasks = fetch_tasks(&pool, "alice").await.expect("Failed to fetch tasks");
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, created.id);
        assert_eq!(tasks[0].created_at, created.created_at);
        assert_eq!(tasks[0].status, TaskStatus::Pending);
        assert!(tasks[0].completed_at.is_none());
    }

    #[tokio::test]
    async fn test_tasks_are_scoped_by_owner() {
        let pool = setup_test_db().await;

        let created = insert_task(&pool, "alice", &create_req("Buy milk"))
            .await
            .expect("Failed to insert task");

        assert!(fetch_tasks(&pool, "bob").await.unwrap().is_empty());
        assert!(find_task_by_id(&pool, "bob", created.id).await.unwrap().is_none());
        assert!(!delete_task(&pool, "bob", created.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_task_status_round_trip() {
        let pool = setup_test_db().await;
        let created = insert_task(&pool, "alice", &create_req("Buy milk"))
            .await
            .expect("Failed to insert task");

        let done = update_task(
            &pool,
            "alice",
            created.id,
            &UpdateTaskRequest {
                status: Some(TaskStatus::Completed),
                ..Default::default()
            },
        )
        .await
        .expect("Failed to update task")
        .expect("Task not found");
        assert_eq!(done.status, TaskStatus::Completed);
        assert!(done.completed_at.is_some());
        assert_eq!(done.title, "Buy milk");

        let undone = update_task(
            &pool,
            "alice",
            created.id,
            &UpdateTaskRequest {
                status: Some(TaskStatus::Pending),
                ..Default::default()
            },
        )
        .await
        .expect("Failed to update task")
        .expect("Task not found");
        assert!(undone.completed_at.is_none());
        assert_eq!(undone.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_update_missing_task_returns_none() {
        let pool = setup_test_db().await;
        let result = update_task(&pool, "alice", 42, &UpdateTaskRequest::default())
            .await
            .expect("Failed to update task");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_delete_task() {
        let pool = setup_test_db().await;
        let created = insert_task(&pool, "alice", &create_req("Buy milk"))
            .await
            .expect("Failed to insert task");

        assert!(delete_task(&pool, "alice", created.id).await.unwrap());
        assert!(fetch_tasks(&pool, "alice").await.unwrap().is_empty());
    }
}
