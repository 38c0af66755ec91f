//! Turns user gestures into task store operations and view updates.
//!
//! Every gesture is handled on its own: resolve the command, check its
//! preconditions, call the store, then update the view with the store's
//! result. Errors stop here; the view is only touched on success, except for
//! the input flag and the alert used to report the failure.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{error, info, warn};

use crate::error::{AppError, ErrorKind};
use crate::models::{NewTask, Task, TaskUpdate};
use crate::store::TaskStore;
use crate::view::TaskView;

/// What the clicked element does, keyed by its class name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    AddButton,
    EditIcon,
    DoneIcon,
    DoneButton,
    UndoIcon,
    DeleteIcon,
}

impl Role {
    pub fn from_class(class: &str) -> Option<Self> {
        match class {
            "add-todo-btn" => Some(Role::AddButton),
            "fa-edit" => Some(Role::EditIcon),
            "done-span" => Some(Role::DoneIcon),
            "done-btn" => Some(Role::DoneButton),
            "fa-undo" => Some(Role::UndoIcon),
            "fa-times" => Some(Role::DeleteIcon),
            _ => None,
        }
    }
}

/// A click: the element's role and the task entry enclosing it, if any.
#[derive(Debug, Clone, Copy)]
pub struct Gesture {
    pub role: Role,
    pub task_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub enum Command {
    Add { title: String, description: Option<String> },
    Edit { id: i64, fields: TaskUpdate },
    Complete(i64),
    Uncomplete(i64),
    Delete(i64),
}

impl Command {
    fn action(&self) -> &'static str {
        match self {
            Command::Add { .. } => "add task",
            Command::Edit { .. } => "edit task",
            Command::Complete(_) => "complete task",
            Command::Uncomplete(_) => "undo task",
            Command::Delete(_) => "delete task",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The store accepted the change and the view was updated.
    Applied(Option<Task>),
    /// Preconditions failed; the input was flagged.
    Rejected(String),
    /// The task id is unknown; logged only.
    Missing(i64),
    /// Persistence or the remote API failed; an alert was shown.
    Failed(String),
    /// The gesture does not map to a store operation (e.g. opening the modal).
    Ignored,
}

/// Contents of the edit modal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditModal {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub completed: bool,
}

pub struct Dispatcher<V: TaskView> {
    store: Arc<dyn TaskStore>,
    view: Arc<Mutex<V>>,
    modal: Mutex<Option<i64>>,
}

impl<V: TaskView> Dispatcher<V> {
    pub fn new(store: Arc<dyn TaskStore>, view: Arc<Mutex<V>>) -> Self {
        Self {
            store,
            view,
            modal: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &Arc<dyn TaskStore> {
        &self.store
    }

    pub fn view(&self) -> MutexGuard<'_, V> {
        self.view.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Renders a freshly loaded collection, completed tasks included.
    pub fn render_all(&self, tasks: &[Task]) {
        let mut view = self.view();
        for task in tasks {
            view.render_task(task);
            if task.is_completed() {
                show_completion(&mut *view, task);
            }
        }
    }

    /// Resolves a click into a command. `input` is the add-task input text.
    pub async fn click(&self, gesture: Gesture, input: &str) -> DispatchOutcome {
        let command = match (gesture.role, gesture.task_id) {
            (Role::AddButton, _) => Command::Add {
                title: input.to_string(),
                description: None,
            },
            (Role::EditIcon, Some(id)) => {
                return match self.edit(id).await {
                    Ok(_) => DispatchOutcome::Ignored,
                    Err(outcome) => outcome,
                };
            }
            (Role::DoneIcon | Role::DoneButton, Some(id)) => Command::Complete(id),
            (Role::UndoIcon, Some(id)) => Command::Uncomplete(id),
            (Role::DeleteIcon, Some(id)) => Command::Delete(id),
            (role, None) => {
                warn!("{:?} clicked outside of a task", role);
                return DispatchOutcome::Rejected("no task selected".to_string());
            }
        };
        self.dispatch(command).await
    }

    pub async fn dispatch(&self, command: Command) -> DispatchOutcome {
        let action = command.action();
        match self.run(command).await {
            Ok(task) => DispatchOutcome::Applied(task),
            Err(e) => self.report(action, e),
        }
    }

    async fn run(&self, command: Command) -> Result<Option<Task>, AppError> {
        match command {
            Command::Add { title, description } => {
                if title.trim().is_empty() {
                    return Err(AppError::Validation("task title is required".to_string()));
                }
                let task = self.store.add(NewTask::new(title, description)).await?;
                let mut view = self.view();
                view.render_task(&task);
                view.reset_input();
                info!("task {} added", task.id);
                Ok(Some(task))
            }
            Command::Edit { id, fields } => {
                let task = self.store.update(id, fields).await?;
                self.view().update_task(id, &task.title, &task.description);
                Ok(Some(task))
            }
            Command::Complete(id) => {
                let task = self.store.set_completion(id, true).await?;
                show_completion(&mut *self.view(), &task);
                Ok(Some(task))
            }
            Command::Uncomplete(id) => {
                let task = self.store.set_completion(id, false).await?;
                show_completion(&mut *self.view(), &task);
                Ok(Some(task))
            }
            Command::Delete(id) => {
                self.store.remove(id).await?;
                self.view().remove_task(id);
                info!("task {} removed", id);
                Ok(None)
            }
        }
    }

    /// Opens the edit modal with the store's record of the task.
    pub async fn open_edit(&self, id: i64) -> Result<EditModal, AppError> {
        let task = self.store.get(id).await?;
        *self.modal_slot() = Some(id);
        let completed = task.is_completed();
        Ok(EditModal {
            id: task.id,
            title: task.title,
            description: task.description,
            completed,
        })
    }

    /// Like [`Dispatcher::open_edit`], with failures reported the way any
    /// other gesture's are.
    pub async fn edit(&self, id: i64) -> Result<EditModal, DispatchOutcome> {
        self.open_edit(id)
            .await
            .map_err(|e| self.report("open task", e))
    }

    pub fn edit_open_for(&self) -> Option<i64> {
        *self.modal_slot()
    }

    pub fn close_edit(&self) {
        *self.modal_slot() = None;
    }

    /// Applies the modal: title and description first, then the status
    /// checkbox when it differs from the stored state. The modal stays open
    /// when the store refuses the change.
    pub async fn save_edit(&self, form: EditModal) -> DispatchOutcome {
        if self.edit_open_for() != Some(form.id) {
            return DispatchOutcome::Rejected("edit modal is not open for this task".to_string());
        }

        let fields = TaskUpdate {
            title: Some(form.title.clone()),
            description: Some(form.description.clone()),
        };
        let task = match self.dispatch(Command::Edit { id: form.id, fields }).await {
            DispatchOutcome::Applied(Some(task)) => task,
            other => return other,
        };

        let outcome = if task.is_completed() == form.completed {
            DispatchOutcome::Applied(Some(task))
        } else if form.completed {
            self.dispatch(Command::Complete(form.id)).await
        } else {
            self.dispatch(Command::Uncomplete(form.id)).await
        };

        if matches!(outcome, DispatchOutcome::Applied(_)) {
            self.close_edit();
        }
        outcome
    }

    fn modal_slot(&self) -> MutexGuard<'_, Option<i64>> {
        self.modal.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn report(&self, action: &str, err: AppError) -> DispatchOutcome {
        match err.kind() {
            ErrorKind::Validation => {
                warn!("{} rejected: {}", action, err);
                self.view().flag_input(true);
                DispatchOutcome::Rejected(err.to_string())
            }
            ErrorKind::NotFound => {
                warn!("{} skipped: {}", action, err);
                match err {
                    AppError::NotFound(id) => DispatchOutcome::Missing(id),
                    _ => DispatchOutcome::Failed(err.to_string()),
                }
            }
            ErrorKind::Remote | ErrorKind::Persistence => {
                error!("{} failed: {}", action, err);
                let message = format!("Failed to {}: {}", action, err);
                self.view().show_alert(&message);
                DispatchOutcome::Failed(message)
            }
        }
    }
}

fn show_completion<V: TaskView + ?Sized>(view: &mut V, task: &Task) {
    match &task.completed_at {
        Some(completed_at) if task.is_completed() => view.mark_completed(task.id, completed_at),
        _ => view.mark_uncompleted(task.id, &task.created_at),
    }
}
