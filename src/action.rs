//! Append-only action log
//!
//! Every successful create/update/delete leaves exactly one entry here.
//! Entries loaded from the store are kept apart from the ones written
//! during this invocation; only the latter are appended on save.

use crate::schema::actions;
use crate::table::timestamp;
use diesel::prelude::*;
use std::io::Write;

/// A logged mutation.
#[derive(Queryable, Selectable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = actions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Action {
    /// 0 until the entry has been saved.
    pub id: i32,
    pub project_id: i32,
    pub task_id: i32,
    pub username: String,
    pub message: String,
    pub created_at: String,
}

/// Insertable action
#[derive(Insertable)]
#[diesel(table_name = actions)]
pub struct NewAction<'a> {
    pub project_id: i32,
    pub task_id: i32,
    pub username: &'a str,
    pub message: &'a str,
    pub created_at: &'a str,
}

impl<'a> From<&'a Action> for NewAction<'a> {
    fn from(a: &'a Action) -> Self {
        Self {
            project_id: a.project_id,
            task_id: a.task_id,
            username: &a.username,
            message: &a.message,
            created_at: &a.created_at,
        }
    }
}

#[derive(Debug, Default)]
pub struct ActionLog {
    saved: Vec<Action>,
    pending: Vec<Action>,
}

impl ActionLog {
    /// Wrap the tail of the log as read from the store (oldest first).
    pub fn from_saved(saved: Vec<Action>) -> Self {
        Self {
            saved,
            pending: Vec::new(),
        }
    }

    /// Append an entry. It reaches the store on the next save.
    pub fn record(&mut self, project_id: i32, task_id: i32, username: &str, message: String) {
        tracing::info!(project_id, task_id, %message, "action");
        self.pending.push(Action {
            id: 0,
            project_id,
            task_id,
            username: username.to_string(),
            message,
            created_at: timestamp(),
        });
    }

    /// Entries not yet written to the store.
    pub fn pending(&self) -> &[Action] {
        &self.pending
    }

    /// Called by the store once the pending entries are committed.
    pub(crate) fn mark_saved(&mut self, first_id: i32) {
        let mut id = first_id;
        for mut action in self.pending.drain(..) {
            action.id = id;
            id += 1;
            self.saved.push(action);
        }
    }

    /// Everything known to this session, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.saved.iter().chain(self.pending.iter())
    }

    pub fn len(&self) -> usize {
        self.saved.len() + self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Print log entries, optionally restricted to one project, oldest first.
pub fn print_log<W: Write>(
    log: &ActionLog,
    project_id: Option<i32>,
    limit: usize,
    out: &mut W,
) -> std::io::Result<()> {
    let matching: Vec<&Action> = log
        .iter()
        .filter(|a| match project_id {
            Some(p) => a.project_id == p,
            None => true,
        })
        .collect();
    let skip = matching.len().saturating_sub(limit);

    for action in &matching[skip..] {
        writeln!(
            out,
            "{} ({}) {}",
            short_timestamp(&action.created_at),
            action.username,
            action.message
        )?;
    }
    Ok(())
}

/// "2026-10-19 14:03" from an RFC 3339 timestamp; raw text when unparseable.
pub fn short_timestamp(ts: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(ts)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| ts.to_string())
}
