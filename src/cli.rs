//! Command-line surface
//!
//! clap parses the raw flags; `into_command` then turns a flag combination
//! into exactly one operation, rejecting combinations that mean nothing
//! (`-d` with `-n`, `-c` with a number, and so on).

use crate::error::{PitError, Result};
use crate::project::{ProjectCommand, ProjectFields};
use crate::task::{TaskCommand, TaskFields};
use clap::{ArgGroup, Args, Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser, Debug)]
#[command(name = "pit")]
#[command(author, version, about = "pit - personal issue tracker for projects and tasks")]
pub struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the store in .pit/ under the current directory
    Init {
        /// Wipe and recreate an existing store
        #[arg(long)]
        force: bool,
    },

    /// List, show, create, edit or delete projects
    Project(ProjectArgs),

    /// List, show, create, edit or delete tasks
    Task(TaskArgs),

    /// Print the most recent action log entries
    Log {
        /// How many entries to print (default: log.tail from config)
        #[arg(long)]
        limit: Option<usize>,

        /// Only entries about this project
        #[arg(long, value_parser = clap::value_parser!(i32).range(1..))]
        project: Option<i32>,
    },

    /// Generate shell completion scripts
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug, Default)]
#[command(group(ArgGroup::new("mode").args(["create", "edit", "delete", "query"])))]
pub struct ProjectArgs {
    /// Project number (defaults to the current project where one is needed)
    #[arg(value_parser = clap::value_parser!(i32).range(1..))]
    pub number: Option<i32>,

    /// Create a project with this name
    #[arg(short, long, value_name = "NAME")]
    pub create: Option<String>,

    /// Edit a project
    #[arg(short, long)]
    pub edit: bool,

    /// Delete a project and all of its tasks
    #[arg(short, long)]
    pub delete: bool,

    /// Show a project, or list the ones matching -n/-s
    #[arg(short, long)]
    pub query: bool,

    /// Name (new value with -e, substring filter with -q)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Status (new value with -c/-e, substring filter with -q)
    #[arg(short, long)]
    pub status: Option<String>,
}

impl ProjectArgs {
    pub fn into_command(self) -> Result<ProjectCommand> {
        let fields = ProjectFields {
            name: self.name,
            status: self.status,
        };

        if let Some(name) = self.create {
            if self.number.is_some() || fields.name.is_some() {
                return Err(invalid("-c takes the name itself; no number or -n"));
            }
            return Ok(ProjectCommand::Create {
                name,
                status: fields.status,
            });
        }
        if self.edit {
            return Ok(ProjectCommand::Update {
                id: self.number,
                fields,
            });
        }
        if self.delete {
            if !fields.is_empty() {
                return Err(invalid("-d does not take -n or -s"));
            }
            return Ok(ProjectCommand::Delete(self.number));
        }
        if self.query {
            return query(self.number, fields.is_empty(), ProjectCommand::Show, || {
                ProjectCommand::List(fields)
            });
        }

        match (self.number, fields.is_empty()) {
            (None, true) => Ok(ProjectCommand::List(ProjectFields::default())),
            (Some(id), true) => Ok(ProjectCommand::Show(Some(id))),
            (_, false) => Err(invalid("-n and -s need one of -c, -e or -q")),
        }
    }
}

#[derive(Args, Debug, Default)]
#[command(group(ArgGroup::new("mode").args(["create", "edit", "delete", "query"])))]
pub struct TaskArgs {
    /// Task number (defaults to the current task where one is needed)
    #[arg(value_parser = clap::value_parser!(i32).range(1..))]
    pub number: Option<i32>,

    /// Create a task with this name
    #[arg(short, long, value_name = "NAME")]
    pub create: Option<String>,

    /// Edit a task
    #[arg(short, long)]
    pub edit: bool,

    /// Delete a task
    #[arg(short, long)]
    pub delete: bool,

    /// Show a task, or list the ones matching the filters
    #[arg(short, long)]
    pub query: bool,

    #[arg(short, long)]
    pub name: Option<String>,

    #[arg(short, long)]
    pub status: Option<String>,

    /// low, normal, high or urgent
    #[arg(short, long)]
    pub priority: Option<String>,

    /// Due date, YYYY-MM-DD
    #[arg(long)]
    pub date: Option<String>,

    /// Owning project (create/move), or the project to list
    #[arg(long, value_parser = clap::value_parser!(i32).range(1..))]
    pub project: Option<i32>,
}

impl TaskArgs {
    pub fn into_command(self) -> Result<TaskCommand> {
        let fields = TaskFields {
            name: self.name,
            status: self.status,
            priority: self.priority,
            date: self.date,
            project: self.project,
        };

        if let Some(name) = self.create {
            if self.number.is_some() || fields.name.is_some() {
                return Err(invalid("-c takes the name itself; no number or -n"));
            }
            return Ok(TaskCommand::Create { name, fields });
        }
        if self.edit {
            return Ok(TaskCommand::Update {
                id: self.number,
                fields,
            });
        }
        if self.delete {
            if !fields.is_empty() {
                return Err(invalid("-d does not take field options"));
            }
            return Ok(TaskCommand::Delete(self.number));
        }
        if self.query {
            return query(self.number, fields.is_empty(), TaskCommand::Show, || {
                TaskCommand::List(fields)
            });
        }

        // `pit task --project N` lists that project's tasks
        let project_only = TaskFields {
            project: fields.project,
            ..Default::default()
        };
        match self.number {
            None if fields == project_only => Ok(TaskCommand::List(fields)),
            Some(id) if fields.is_empty() => Ok(TaskCommand::Show(Some(id))),
            _ => Err(invalid("field options need one of -c, -e or -q")),
        }
    }
}

/// `-q` shows one record by number, lists by filter, or shows the current one.
fn query<C>(
    number: Option<i32>,
    no_filters: bool,
    show: impl FnOnce(Option<i32>) -> C,
    list: impl FnOnce() -> C,
) -> Result<C> {
    match (number, no_filters) {
        (Some(_), false) => Err(invalid("-q takes a number or filters, not both")),
        (Some(id), true) => Ok(show(Some(id))),
        (None, false) => Ok(list()),
        (None, true) => Ok(show(None)),
    }
}

fn invalid(message: &str) -> PitError {
    PitError::InvalidArgument(message.to_string())
}
