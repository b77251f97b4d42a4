//! Project and task records
//!
//! Both are stored as plain rows and kept in memory as [`Table`] records.
//! Text fields are bounded: input that does not fit is rejected rather
//! than cut short, so what the user typed is never silently changed.
//!
//! [`Table`]: crate::table::Table

use crate::error::{PitError, Result};
use crate::schema::{projects, tasks};
use crate::table::Record;
use chrono::NaiveDate;
use diesel::prelude::*;
use std::fmt;
use std::str::FromStr;

pub const NAME_MAX: usize = 128;
pub const STATUS_MAX: usize = 32;
pub const USERNAME_MAX: usize = 32;

/// Accept `value` as-is if it fits in `max` characters.
pub fn bounded(field: &'static str, value: &str, max: usize) -> Result<String> {
    let len = value.chars().count();
    if len > max {
        return Err(PitError::FieldTooLong { field, len, max });
    }
    Ok(value.to_string())
}

/// Like [`bounded`], but blank values are rejected too.
pub fn required(field: &'static str, value: &str, max: usize) -> Result<String> {
    if value.trim().is_empty() {
        return Err(PitError::InvalidArgument(format!("{} can't be empty", field)));
    }
    bounded(field, value, max)
}

/// Validate a due date and return it in canonical `YYYY-MM-DD` form.
pub fn parse_date(value: &str) -> Result<String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .map_err(|_| {
            PitError::InvalidArgument(format!("invalid date: {} (expected YYYY-MM-DD)", value))
        })
}

/// Case-insensitive substring match.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// A filter that is unset lets everything through.
pub fn filter_matches(filter: Option<&str>, value: &str) -> bool {
    match filter {
        Some(needle) => contains_ignore_case(value, needle),
        None => true,
    }
}

/// Task priority, stored as lowercase text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = PitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "normal" => Ok(Priority::Normal),
            "high" => Ok(Priority::High),
            "urgent" => Ok(Priority::Urgent),
            other => Err(PitError::InvalidArgument(format!(
                "invalid priority: {} (expected low, normal, high or urgent)",
                other
            ))),
        }
    }
}

/// A project. Owns zero or more tasks.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = projects)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Project {
    pub id: i32,
    pub name: String,
    pub status: String,
    pub username: String,
    /// Denormalized; maintained by the session on task insert/delete/move.
    pub number_of_tasks: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl Project {
    /// A detached project, ready for [`Table::insert`](crate::table::Table::insert).
    pub fn new(name: String, status: String, username: String) -> Self {
        Self {
            id: 0,
            name,
            status,
            username,
            number_of_tasks: 0,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }
}

impl Record for Project {
    const KIND: &'static str = "project";

    fn id(&self) -> i32 {
        self.id
    }

    fn assign_id(&mut self, id: i32) {
        self.id = id;
    }

    fn stamp(&mut self, now: &str) {
        self.created_at = now.to_string();
        self.updated_at = now.to_string();
    }

    fn touch(&mut self, now: &str) {
        self.updated_at = now.to_string();
    }
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Task {
    pub id: i32,
    pub project_id: i32,
    pub name: String,
    pub status: String,
    pub priority: String,
    pub date: Option<String>,
    pub username: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Task {
    pub fn new(
        project_id: i32,
        name: String,
        status: String,
        priority: Priority,
        username: String,
    ) -> Self {
        Self {
            id: 0,
            project_id,
            name,
            status,
            priority: priority.to_string(),
            date: None,
            username,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }
}

impl Record for Task {
    const KIND: &'static str = "task";

    fn id(&self) -> i32 {
        self.id
    }

    fn assign_id(&mut self, id: i32) {
        self.id = id;
    }

    fn stamp(&mut self, now: &str) {
        self.created_at = now.to_string();
        self.updated_at = now.to_string();
    }

    fn touch(&mut self, now: &str) {
        self.updated_at = now.to_string();
    }
}

/// "1 task", "3 tasks"
pub fn plural(count: i32, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}
