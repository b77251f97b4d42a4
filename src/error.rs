//! Error type shared by the table engine, the store and the CLI operations

use std::path::PathBuf;
use thiserror::Error;

/// Everything that can stop a `pit` command.
///
/// There is no recovery path: `main` prints the message and exits non-zero.
#[derive(Error, Debug)]
pub enum PitError {
    #[error("could not find {kind} {id}")]
    NotFound { kind: &'static str, id: i32 },

    #[error("could not find current {0}")]
    NoCurrent(&'static str),

    #[error("{kind} with the same name already exists: {name}")]
    DuplicateName { kind: &'static str, name: String },

    #[error("nothing to update")]
    NoOp,

    #[error("{0}")]
    InvalidArgument(String),

    #[error("{field} is too long ({len} characters, at most {max} allowed)")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("no pit store at {}; run `pit init` first", .0.display())]
    StoreMissing(PathBuf),

    #[error("pit store already exists at {}; use `pit init --force` to recreate it", .0.display())]
    StoreExists(PathBuf),

    #[error("store was saved without being loaded")]
    NotLoaded,

    #[error("corrupt store: {0}")]
    Corrupt(String),

    #[error("query error: {0}")]
    Query(#[from] diesel::result::Error),

    #[error("connection error: {0}")]
    Connection(#[from] diesel::ConnectionError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, PitError>;
