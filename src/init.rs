//! Store initialization for pit
//!
//! `pit init` creates `.pit/pit.db` in the current directory (or wherever
//! `PIT_DB_PATH` points) plus a commented `config.toml` next to it.

use crate::db::Database;
use crate::error::Result;
use colored::Colorize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Starting config; every key is commented out so the built-in defaults apply
const CONFIG_TEMPLATE: &str = r#"# pit configuration
#
# [user]
# name = "mike"              # recorded on every create/edit (default: $USER)
#
# [project]
# default_status = "active"  # status for `pit project -c` without -s
#
# [task]
# default_status = "open"
# default_priority = "normal" # low, normal, high or urgent
#
# [log]
# tail = 20                  # entries loaded and printed by `pit log`
"#;

/// Where `init` puts the store. Unlike normal commands this never walks up:
/// a store in a parent directory must not stop a new one being created here.
pub fn store_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("PIT_DB_PATH") {
        return Ok(PathBuf::from(path));
    }
    Ok(std::env::current_dir()?.join(".pit").join("pit.db"))
}

/// Create the store at `path`, replacing an existing one only with `force`.
pub fn init_store<W: Write>(path: &Path, force: bool, out: &mut W) -> Result<()> {
    writeln!(out, "\n{}", "Initializing pit...".cyan().bold())?;

    let replaced = path.exists();
    Database::create_at(path, force)?;
    let verb = if replaced { "Replacing" } else { "Creating" };
    writeln!(out, "   {} {}", verb.green(), path.display())?;

    // Only a .pit directory is where config lookup will find it
    if let Some(dir) = path.parent().filter(|d| d.ends_with(".pit")) {
        write_file_if_missing(&dir.join("config.toml"), CONFIG_TEMPLATE, out)?;
    }

    writeln!(out, "\n{}", "pit initialized!".green().bold())?;
    writeln!(out, "\nNext steps:")?;
    writeln!(out, "  1. Run {} to create a project", "pit project -c <name>".cyan())?;
    writeln!(out, "  2. Run {} to add a task to it", "pit task -c <name>".cyan())?;
    writeln!(out)?;
    Ok(())
}

fn write_file_if_missing<W: Write>(path: &Path, content: &str, out: &mut W) -> Result<()> {
    if path.exists() {
        writeln!(out, "   {} {} (already exists)", "Skipping".yellow(), path.display())?;
    } else {
        fs::write(path, content)?;
        writeln!(out, "   {} {}", "Creating".green(), path.display())?;
    }
    Ok(())
}
