//! Task operations
//!
//! Tasks always belong to a project. Unless `--project` says otherwise, a
//! new task goes into the current project and listings are scoped to it.

use crate::error::{PitError, Result};
use crate::format::{Align, Columns};
use crate::models::{
    bounded, filter_matches, parse_date, required, Priority, Task, NAME_MAX, STATUS_MAX,
};
use crate::session::Session;
use std::io::Write;

/// Fields a user can set, or filter by, on a task.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TaskFields {
    pub name: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub date: Option<String>,
    pub project: Option<i32>,
}

impl TaskFields {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.date.is_none()
            && self.project.is_none()
    }

    fn matches(&self, task: &Task) -> bool {
        filter_matches(self.name.as_deref(), &task.name)
            && filter_matches(self.status.as_deref(), &task.status)
            && filter_matches(self.priority.as_deref(), &task.priority)
            && filter_matches(self.date.as_deref(), task.date.as_deref().unwrap_or(""))
    }
}

/// Validated values ready to be written into a task.
#[derive(Debug, Default)]
struct Checked {
    name: Option<String>,
    status: Option<String>,
    priority: Option<Priority>,
    date: Option<String>,
}

impl Checked {
    fn from_fields(fields: &TaskFields) -> Result<Self> {
        Ok(Self {
            name: fields
                .name
                .as_deref()
                .map(|n| required("name", n, NAME_MAX))
                .transpose()?,
            status: fields
                .status
                .as_deref()
                .map(|s| bounded("status", s, STATUS_MAX))
                .transpose()?,
            priority: fields.priority.as_deref().map(str::parse).transpose()?,
            date: fields.date.as_deref().map(parse_date).transpose()?,
        })
    }
}

/// A fully resolved `pit task` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskCommand {
    List(TaskFields),
    Show(Option<i32>),
    Create { name: String, fields: TaskFields },
    Update { id: Option<i32>, fields: TaskFields },
    Delete(Option<i32>),
}

pub fn run<W: Write>(session: &mut Session, command: TaskCommand, out: &mut W) -> Result<()> {
    match command {
        TaskCommand::List(filter) => list(session, &filter, out),
        TaskCommand::Show(id) => show(session, id, out),
        TaskCommand::Create { name, fields } => {
            create(session, &name, &fields)?;
            report(session, out)
        }
        TaskCommand::Update { id, fields } => {
            update(session, id, &fields)?;
            report(session, out)
        }
        TaskCommand::Delete(id) => {
            delete(session, id)?;
            report(session, out)
        }
    }
}

fn report<W: Write>(session: &Session, out: &mut W) -> Result<()> {
    if let Some(action) = session.log().iter().last() {
        writeln!(out, "{}", action.message)?;
    }
    Ok(())
}

/// Create a task in `--project` or the current project and make it current.
pub fn create(session: &mut Session, name: &str, fields: &TaskFields) -> Result<i32> {
    let mut checked = Checked::from_fields(fields)?;
    checked.name = Some(required("name", name, NAME_MAX)?);

    session.load()?;
    let project_id = session.projects().resolve(fields.project)?;
    let config = session.config();
    let status = match checked.status {
        Some(status) => status,
        None => bounded("status", &config.task.default_status, STATUS_MAX)?,
    };
    let priority = match checked.priority {
        Some(priority) => priority,
        None => config.default_priority()?,
    };

    let mut task = Task::new(
        project_id,
        checked.name.unwrap_or_default(),
        status,
        priority,
        session.user().to_string(),
    );
    task.date = checked.date;
    let id = session.insert_task(task)?;

    let task = session.tasks().find(id)?;
    let message = format!(
        "created task {}: {} (status: {}, priority: {}, project: {})",
        id, task.name, task.status, task.priority, project_id
    );
    session.tasks_mut().mark(id);
    session.record(project_id, id, message);
    session.save()?;
    Ok(id)
}

/// Overwrite the supplied fields of a task (explicit id or current).
/// `--project` moves the task.
pub fn update(session: &mut Session, id: Option<i32>, fields: &TaskFields) -> Result<()> {
    if fields.is_empty() {
        return Err(PitError::NoOp);
    }
    let checked = Checked::from_fields(fields)?;

    session.load()?;
    let id = session.tasks().resolve(id)?;
    let moved = match fields.project {
        Some(project_id) => session.tasks().find(id)?.project_id != project_id,
        None => false,
    };
    if let Some(project_id) = fields.project {
        session.move_task(id, project_id)?;
    }

    let user = session.user().to_string();
    let changed = Changes {
        name: checked.name.is_some(),
        status: checked.status.is_some(),
        priority: checked.priority.is_some(),
        date: checked.date.is_some(),
        project: moved,
    };
    let task = session.tasks_mut().update(id, |t| {
        if let Some(name) = checked.name {
            t.name = name;
        }
        if let Some(status) = checked.status {
            t.status = status;
        }
        if let Some(priority) = checked.priority {
            t.priority = priority.to_string();
        }
        if let Some(date) = checked.date {
            t.date = Some(date);
        }
        t.username = user;
    })?;
    let message = changed.message(task);
    let project_id = task.project_id;

    session.tasks_mut().mark(id);
    session.record(project_id, id, message);
    session.save()
}

/// Which fields an update actually touched.
struct Changes {
    name: bool,
    status: bool,
    priority: bool,
    date: bool,
    project: bool,
}

impl Changes {
    fn message(&self, task: &Task) -> String {
        let mut parts = Vec::new();
        if self.name {
            parts.push(format!("name: {}", task.name));
        }
        if self.status {
            parts.push(format!("status: {}", task.status));
        }
        if self.priority {
            parts.push(format!("priority: {}", task.priority));
        }
        if self.date {
            parts.push(format!("date: {}", task.date.as_deref().unwrap_or("")));
        }
        if self.project {
            parts.push(format!("project: {}", task.project_id));
        }

        if parts.is_empty() {
            // Only --project naming the project it was already in
            format!("updated task {}: {}", task.id, task.name)
        } else if self.name {
            format!("updated task {}: ({})", task.id, parts.join(", "))
        } else {
            format!("updated task {}: {} ({})", task.id, task.name, parts.join(", "))
        }
    }
}

/// Delete a task (explicit id or current); its project's count drops by one.
pub fn delete(session: &mut Session, id: Option<i32>) -> Result<()> {
    session.load()?;
    let id = session.tasks().resolve(id)?;

    let task = session.remove_task(id)?;
    session.tasks_mut().mark(0);
    session.record(
        task.project_id,
        id,
        format!("deleted task {}: {}", id, task.name),
    );
    session.save()
}

fn row(task: &Task, current_id: i32) -> Vec<String> {
    let marker = if task.id == current_id { "*" } else { "" };
    let mut details = format!("({}, {}", task.status, task.priority);
    if let Some(date) = &task.date {
        details.push_str(", due ");
        details.push_str(date);
    }
    details.push(')');

    vec![
        marker.to_string(),
        format!("{}:", task.id),
        format!("({})", task.username),
        task.name.clone(),
        details,
    ]
}

/// Write the tasks of one project that pass `filter`.
pub fn list_for_project<W: Write>(
    session: &Session,
    project_id: i32,
    filter: &TaskFields,
    out: &mut W,
) -> Result<()> {
    write_rows(session, Some(project_id), filter, out)
}

fn write_rows<W: Write>(
    session: &Session,
    project_id: Option<i32>,
    filter: &TaskFields,
    out: &mut W,
) -> Result<()> {
    let tasks = session.tasks();
    let current_id = tasks.current_id();
    let mut columns = Columns::new(&[
        Align::Left,
        Align::Right,
        Align::Left,
        Align::Left,
        Align::Left,
    ]);
    for task in tasks.iter() {
        let in_scope = match project_id {
            Some(p) => task.project_id == p,
            None => true,
        };
        if in_scope && filter.matches(task) {
            columns.push(row(task, current_id));
        }
    }
    columns.flush(out)?;
    Ok(())
}

/// List tasks of `--project`, else of the current project, else all tasks.
pub fn list<W: Write>(session: &mut Session, filter: &TaskFields, out: &mut W) -> Result<()> {
    session.load()?;

    let scope = match filter.project {
        Some(id) => Some(session.projects().find(id)?.id),
        None => session.projects().current().ok().map(|p| p.id),
    };
    write_rows(session, scope, filter, out)
}

/// Print one task and make both it and its project current.
pub fn show<W: Write>(session: &mut Session, id: Option<i32>, out: &mut W) -> Result<()> {
    session.load()?;
    let id = session.tasks().resolve(id)?;

    let task = session.tasks().find(id)?;
    let mut line = format!(
        "* {}: ({}) {} (status: {}, priority: {}",
        task.id, task.username, task.name, task.status, task.priority
    );
    if let Some(date) = &task.date {
        line.push_str(", date: ");
        line.push_str(date);
    }
    line.push(')');
    writeln!(out, "{}", line)?;
    let project_id = task.project_id;

    session.tasks_mut().mark(id);
    session.projects_mut().mark(project_id);
    session.save()
}
