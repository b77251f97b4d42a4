//! One invocation's view of the store
//!
//! A `Session` owns the project table, the task table and the action log
//! for the lifetime of a command. It loads them at most once, keeps the
//! two tables consistent with each other (task counts, cascading deletes)
//! and writes everything back on `save`.

use crate::action::ActionLog;
use crate::config::Config;
use crate::db::Database;
use crate::error::{PitError, Result};
use crate::models::{Project, Task};
use crate::table::Table;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

pub struct Session {
    path: PathBuf,
    user: String,
    config: Config,
    db: Option<Database>,
    projects: Table<Project>,
    tasks: Table<Task>,
    log: ActionLog,
}

impl Session {
    /// A session against the store at `path`, acting as `user`.
    /// Nothing is read until [`load`](Self::load).
    pub fn new(path: impl Into<PathBuf>, user: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            user: user.into(),
            config: Config::default(),
            db: None,
            projects: Table::new(),
            tasks: Table::new(),
            log: ActionLog::default(),
        }
    }

    /// Defaults for new records and the log tail size.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn is_loaded(&self) -> bool {
        self.db.is_some()
    }

    /// Read the store. Later calls in the same session do nothing.
    pub fn load(&mut self) -> Result<()> {
        if self.db.is_some() {
            return Ok(());
        }

        let mut db = Database::open_at(&self.path)?;
        let tail = i64::try_from(self.config.log.tail).unwrap_or(i64::MAX);
        let snapshot = db.load(tail)?;
        check_integrity(&snapshot.projects, &snapshot.tasks)?;

        self.projects = snapshot.projects;
        self.tasks = snapshot.tasks;
        self.log = snapshot.log;
        self.db = Some(db);
        debug!(path = %self.path.display(), "session loaded");
        Ok(())
    }

    /// Write tables and new log entries back to the store.
    pub fn save(&mut self) -> Result<()> {
        let db = self.db.as_mut().ok_or(PitError::NotLoaded)?;
        db.save(&self.projects, &self.tasks, &mut self.log)
    }

    pub fn projects(&self) -> &Table<Project> {
        &self.projects
    }

    pub fn projects_mut(&mut self) -> &mut Table<Project> {
        &mut self.projects
    }

    pub fn tasks(&self) -> &Table<Task> {
        &self.tasks
    }

    pub fn tasks_mut(&mut self) -> &mut Table<Task> {
        &mut self.tasks
    }

    pub fn log(&self) -> &ActionLog {
        &self.log
    }

    /// Append an action log entry attributed to the session user.
    pub fn record(&mut self, project_id: i32, task_id: i32, message: String) {
        self.log.record(project_id, task_id, &self.user, message);
    }

    // ========================================================================
    // Cross-table operations
    // ========================================================================

    /// Insert a task and bump its project's task count.
    pub fn insert_task(&mut self, task: Task) -> Result<i32> {
        let project_id = task.project_id;
        self.projects.find(project_id)?;
        let id = self.tasks.insert(task)?.id;
        self.projects.find_mut(project_id)?.number_of_tasks += 1;
        Ok(id)
    }

    /// Delete a task and drop its project's task count.
    pub fn remove_task(&mut self, task_id: i32) -> Result<Task> {
        let project_id = self.tasks.find(task_id)?.project_id;
        self.projects.find_mut(project_id)?.number_of_tasks -= 1;
        self.tasks.delete(task_id)
    }

    /// Re-home a task, keeping both projects' counts right.
    pub fn move_task(&mut self, task_id: i32, project_id: i32) -> Result<()> {
        let from = self.tasks.find(task_id)?.project_id;
        if from == project_id {
            return Ok(());
        }
        self.projects.find(project_id)?;

        self.projects.find_mut(from)?.number_of_tasks -= 1;
        self.projects.find_mut(project_id)?.number_of_tasks += 1;
        self.tasks.find_mut(task_id)?.project_id = project_id;
        Ok(())
    }

    /// Delete a project together with every task it owns.
    ///
    /// Returns the removed project and how many tasks went with it. The
    /// project mark is cleared whichever project was current.
    pub fn remove_project(&mut self, project_id: i32) -> Result<(Project, usize)> {
        self.projects.find(project_id)?;

        let owned = self.tasks.ids_where(|t| t.project_id == project_id);
        for task_id in &owned {
            self.remove_task(*task_id)?;
        }

        let project = self.projects.delete(project_id)?;
        self.projects.mark(0);
        debug!(project_id, tasks = owned.len(), "removed project");
        Ok((project, owned.len()))
    }
}

/// Cross-table invariants the store must satisfy on load.
fn check_integrity(projects: &Table<Project>, tasks: &Table<Task>) -> Result<()> {
    let mut counts: HashMap<i32, i32> = HashMap::new();
    for task in tasks {
        if !projects.contains(task.project_id) {
            return Err(PitError::Corrupt(format!(
                "task {} belongs to missing project {}",
                task.id, task.project_id
            )));
        }
        *counts.entry(task.project_id).or_insert(0) += 1;
    }

    for project in projects {
        let actual = counts.get(&project.id).copied().unwrap_or(0);
        if project.number_of_tasks != actual {
            return Err(PitError::Corrupt(format!(
                "project {} claims {} tasks but owns {}",
                project.id, project.number_of_tasks, actual
            )));
        }
    }
    Ok(())
}
