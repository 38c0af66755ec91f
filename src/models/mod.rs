pub mod task;

pub use task::{NewTask, Task, TaskStatus, TaskUpdate, DEFAULT_DESCRIPTION, now_timestamp};
