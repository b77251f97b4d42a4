//! pit - personal issue tracker
//!
//! Projects, their tasks, and an action log recording every change.
//!
//! # Overview
//!
//! Records live in generic in-memory [`Table`]s: ids are handed out from a
//! counter that never goes backwards, and each table remembers one current
//! record so commands can omit the number. A [`Session`] loads the tables
//! from a local SQLite store, keeps them consistent with each other and
//! writes them back in a single transaction.
//!
//! | Record | Purpose |
//! |--------|---------|
//! | `project` | Named unit of work with a status |
//! | `task` | Belongs to one project; status, priority, optional due date |
//! | `action` | One line of history per create/edit/delete |
//!
//! # Quick Start
//!
//! ```no_run
//! use pit::{project, task, Database, Session, TaskFields};
//!
//! Database::create_at(".pit/pit.db", false).unwrap();
//! let mut session = Session::new(".pit/pit.db", "mike");
//!
//! // Becomes the current project
//! let id = project::create(&mut session, "Website", None).unwrap();
//!
//! // Lands in the current project
//! task::create(&mut session, "Pick a font", &TaskFields::default()).unwrap();
//!
//! let mut out = std::io::stdout();
//! project::show(&mut session, Some(id), &mut out).unwrap();
//! ```

pub mod action;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod init;
pub mod models;
pub mod project;
pub mod schema;
pub mod session;
pub mod table;
pub mod task;

pub use action::{Action, ActionLog};
pub use config::Config;
pub use db::{Database, StoreSchema, CURRENT_SCHEMA};
pub use error::{PitError, Result};
pub use models::{Priority, Project, Task};
pub use project::{ProjectCommand, ProjectFields};
pub use session::Session;
pub use table::{Record, Table};
pub use task::{TaskCommand, TaskFields};
