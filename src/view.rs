//! The rendered task list.
//!
//! [`ListView`] is a headless model of the list markup: one entry per rendered
//! task, the add-task input state and a dismissible alert. It never reads from
//! or writes to the task store.

use std::fmt;

use crate::models::Task;

pub trait TaskView: Send {
    /// Appends an entry. Rendering the same id twice yields two entries.
    fn render_task(&mut self, task: &Task);
    fn update_task(&mut self, id: i64, title: &str, description: &str);
    fn remove_task(&mut self, id: i64);
    fn mark_completed(&mut self, id: i64, completed_at: &str);
    fn mark_uncompleted(&mut self, id: i64, created_at: &str);
    fn show_alert(&mut self, message: &str);
    fn flag_input(&mut self, invalid: bool);
    fn reset_input(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caption {
    Created(String),
    Completed(String),
}

impl fmt::Display for Caption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Caption::Created(at) => write!(f, "Created: {}", at),
            Caption::Completed(at) => write!(f, "Completed: {}", at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskEntry {
    pub id: i64,
    pub title: String,
    pub description: String,
    /// Strike-through plus the undo icon in place of the check icon.
    pub completed: bool,
    pub caption: Caption,
}

impl TaskEntry {
    /// Action icon classes, in display order.
    pub fn action_icons(&self) -> [&'static str; 3] {
        let toggle = if self.completed { "fa-undo" } else { "done-span" };
        ["fa-edit", toggle, "fa-times"]
    }
}

#[derive(Debug, Default)]
pub struct ListView {
    entries: Vec<TaskEntry>,
    alert: Option<String>,
    input_invalid: bool,
    input: String,
}

impl ListView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[TaskEntry] {
        &self.entries
    }

    pub fn entry(&self, id: i64) -> Option<&TaskEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    fn entry_mut(&mut self, id: i64) -> Option<&mut TaskEntry> {
        self.entries.iter_mut().find(|e| e.id == id)
    }

    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    pub fn is_input_invalid(&self) -> bool {
        self.input_invalid
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn to_html(&self) -> String {
        let mut html = String::from("<div class=\"todo\">\n");
        for entry in &self.entries {
            let done = if entry.completed { " doneTask" } else { "" };
            let strike = if entry.completed { " strike" } else { "" };
            let icons: Vec<String> = entry
                .action_icons()
                .iter()
                .map(|icon| format!("<span class=\"{}\"></span>", icon))
                .collect();
            html.push_str(&format!(
                "  <div class=\"task{}\" data-task-id=\"{}\">\n    <div class=\"task-actions\">{}</div>\n    <div class=\"task-title{}\">{}</div>\n    <div class=\"task-desc{}\">{}</div>\n    <div class=\"task-info\">{}</div>\n  </div>\n",
                done,
                entry.id,
                icons.join(""),
                strike,
                escape_html(&entry.title),
                strike,
                escape_html(&entry.description),
                escape_html(&entry.caption.to_string()),
            ));
        }
        html.push_str("</div>\n");
        html
    }
}

impl TaskView for ListView {
    fn render_task(&mut self, task: &Task) {
        self.entries.push(TaskEntry {
            id: task.id,
            title: task.title.clone(),
            description: task.description.clone(),
            completed: false,
            caption: Caption::Created(task.created_at.clone()),
        });
    }

    fn update_task(&mut self, id: i64, title: &str, description: &str) {
        if let Some(entry) = self.entry_mut(id) {
            entry.title = title.to_string();
            entry.description = description.to_string();
        }
    }

    fn remove_task(&mut self, id: i64) {
        self.entries.retain(|e| e.id != id);
    }

    fn mark_completed(&mut self, id: i64, completed_at: &str) {
        if let Some(entry) = self.entry_mut(id) {
            entry.completed = true;
            entry.caption = Caption::Completed(completed_at.to_string());
        }
    }

    fn mark_uncompleted(&mut self, id: i64, created_at: &str) {
        if let Some(entry) = self.entry_mut(id) {
            entry.completed = false;
            entry.caption = Caption::Created(created_at.to_string());
        }
    }

    fn show_alert(&mut self, message: &str) {
        self.alert = Some(message.to_string());
    }

    fn flag_input(&mut self, invalid: bool) {
        self.input_invalid = invalid;
    }

    fn reset_input(&mut self) {
        self.input.clear();
        self.input_invalid = false;
    }
}

impl fmt::Display for ListView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return writeln!(f, "No tasks.");
        }
        for entry in &self.entries {
            let mark = if entry.completed { "x" } else { " " };
            writeln!(f, "[{}] {:>3}  {}", mark, entry.id, entry.title)?;
            writeln!(f, "        {}", entry.description)?;
            writeln!(f, "        {}", entry.caption)?;
        }
        if let Some(alert) = &self.alert {
            writeln!(f, "! {}", alert)?;
        }
        Ok(())
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewTask;

    fn task(id: i64, title: &str) -> Task {
        Task::create(id, NewTask::new(title, None).normalized().unwrap())
    }

    #[test]
    fn test_render_twice_duplicates_entry() {
        let mut view = ListView::new();
        let t = task(1, "Buy milk");
        view.render_task(&t);
        view.render_task(&t);
        assert_eq!(view.entries().len(), 2);
    }

    #[test]
    fn test_missing_entries_are_ignored() {
        let mut view = ListView::new();
        view.render_task(&task(1, "Buy milk"));
        view.update_task(9, "x", "y");
        view.remove_task(9);
        view.mark_completed(9, "now");
        assert_eq!(view.entries().len(), 1);
        assert_eq!(view.entries()[0].title, "Buy milk");
        assert!(!view.entries()[0].completed);
    }

    #[test]
    fn test_completion_swaps_caption_and_icon() {
        let mut view = ListView::new();
        let t = task(1, "Buy milk");
        view.render_task(&t);

        view.mark_completed(1, "2024-05-01 10:00:00");
        let entry = view.entry(1).unwrap();
        assert_eq!(entry.caption, Caption::Completed("2024-05-01 10:00:00".to_string()));
        assert_eq!(entry.action_icons()[1], "fa-undo");

        view.mark_uncompleted(1, &t.created_at);
        let entry = view.entry(1).unwrap();
        assert_eq!(entry.caption, Caption::Created(t.created_at.clone()));
        assert_eq!(entry.action_icons()[1], "done-span");
    }

    #[test]
    fn test_html_escapes_user_text() {
        let mut view = ListView::new();
        view.render_task(&task(1, "<script>alert('x')</script>"));
        let html = view.to_html();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(&#039;x&#039;)&lt;/script&gt;"));
        assert!(html.contains("data-task-id=\"1\""));
    }
}
