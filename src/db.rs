//! SQLite store with Diesel ORM
//!
//! Persists the project and task tables, their id counters and current
//! marks, and the action log. A save rewrites both tables and appends the
//! new log entries inside one transaction, so a crash mid-save leaves the
//! store exactly as the last successful save wrote it.

use crate::action::{Action, ActionLog, NewAction};
use crate::error::{PitError, Result};
use crate::models::{Project, Task};
use crate::schema::*;
use crate::table::{timestamp, Record, Table};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Walk up directory tree to find .pit folder (like git finds .git)
/// Can be overridden with PIT_DB_PATH env var
fn get_db_path() -> PathBuf {
    // Check env var first - always takes priority
    if let Ok(path) = std::env::var("PIT_DB_PATH") {
        return PathBuf::from(path);
    }

    if let Ok(current_dir) = std::env::current_dir() {
        let mut dir = current_dir.as_path();
        loop {
            let pit_dir = dir.join(".pit");
            if pit_dir.is_dir() {
                return pit_dir.join("pit.db");
            }
            match dir.parent() {
                Some(parent) => dir = parent,
                None => break,
            }
        }
    }

    // No .pit found - default to current directory
    // (pit init will create it here)
    PathBuf::from(".pit/pit.db")
}

/// Current store schema
pub const CURRENT_SCHEMA: StoreSchema = StoreSchema {
    major: 1,
    minor: 0,
    patch: 0,
    name: "pit-store",
    features: &["projects", "tasks", "actions", "table_meta"],
};

/// Describes the version and capabilities of the store layout
#[derive(Debug, Clone)]
pub struct StoreSchema {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub name: &'static str,
    pub features: &'static [&'static str],
}

impl StoreSchema {
    pub fn version_string(&self) -> String {
        format!("{}.{}.{}", self.major, self.minor, self.patch)
    }

    /// A stored version string is readable when its major version matches.
    pub fn accepts(&self, version: &str) -> bool {
        version
            .split('.')
            .next()
            .and_then(|major| major.parse::<u32>().ok())
            == Some(self.major)
    }
}

impl std::fmt::Display for StoreSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{} ({})", self.version_string(), self.name)
    }
}

// ============================================================================
// Diesel Models
// ============================================================================

/// Insertable schema version
#[derive(Insertable)]
#[diesel(table_name = schema_versions)]
struct NewSchemaVersion<'a> {
    version: &'a str,
    name: &'a str,
    features: &'a str,
    introduced_at: &'a str,
}

/// Queryable schema version
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema_versions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct StoredSchema {
    pub id: i32,
    pub version: String,
    pub name: String,
    pub features: String,
    pub introduced_at: String,
}

/// Id counter and current mark of one record table
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = table_meta)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
struct TableMeta {
    name: String,
    last_id: i32,
    current_id: i32,
}

impl TableMeta {
    fn of<R: Record>(table: &Table<R>) -> Self {
        Self {
            name: R::KIND.to_string(),
            last_id: table.last_id(),
            current_id: table.current_id(),
        }
    }
}

/// Everything `load` reads back.
#[derive(Debug)]
pub struct Snapshot {
    pub projects: Table<Project>,
    pub tasks: Table<Task>,
    pub log: ActionLog,
}

// ============================================================================
// Database Connection
// ============================================================================

/// Handle on one store file
pub struct Database {
    conn: SqliteConnection,
    path: PathBuf,
}

impl Database {
    /// Get the store path that will be used
    pub fn db_path() -> PathBuf {
        get_db_path()
    }

    /// Create a fresh store. With `force`, an existing store is replaced.
    pub fn create_at<P: AsRef<Path>>(path: P, force: bool) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            if !force {
                return Err(PitError::StoreExists(path.to_path_buf()));
            }
            std::fs::remove_file(path)?;
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut db = Self {
            conn: Self::establish(path)?,
            path: path.to_path_buf(),
        };
        db.init_schema()?;
        debug!(path = %path.display(), "created store");
        Ok(db)
    }

    /// Open an existing store.
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(PitError::StoreMissing(path.to_path_buf()));
        }

        let mut db = Self {
            conn: Self::establish(path)?,
            path: path.to_path_buf(),
        };
        db.check_schema()?;
        Ok(db)
    }

    fn establish(path: &Path) -> Result<SqliteConnection> {
        let url = path.to_string_lossy();
        Ok(SqliteConnection::establish(&url)?)
    }

    fn init_schema(&mut self) -> Result<()> {
        let conn = &mut self.conn;

        diesel::sql_query(r#"
            CREATE TABLE IF NOT EXISTS schema_versions (
                id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                version TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                features TEXT NOT NULL,
                introduced_at TEXT NOT NULL
            )
        "#).execute(conn)?;

        diesel::sql_query(r#"
            CREATE TABLE IF NOT EXISTS table_meta (
                name TEXT PRIMARY KEY NOT NULL,
                last_id INTEGER NOT NULL DEFAULT 0,
                current_id INTEGER NOT NULL DEFAULT 0
            )
        "#).execute(conn)?;

        diesel::sql_query(r#"
            CREATE TABLE IF NOT EXISTS projects (
                id INTEGER PRIMARY KEY NOT NULL,
                name TEXT NOT NULL UNIQUE,
                status TEXT NOT NULL DEFAULT 'active',
                username TEXT NOT NULL,
                number_of_tasks INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
        "#).execute(conn)?;

        diesel::sql_query(r#"
            CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY NOT NULL,
                project_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'open',
                priority TEXT NOT NULL DEFAULT 'normal',
                date TEXT,
                username TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (project_id) REFERENCES projects(id)
            )
        "#).execute(conn)?;

        diesel::sql_query(r#"
            CREATE TABLE IF NOT EXISTS actions (
                id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                project_id INTEGER NOT NULL,
                task_id INTEGER NOT NULL DEFAULT 0,
                username TEXT NOT NULL,
                message TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
        "#).execute(conn)?;

        diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_tasks_project ON tasks(project_id)").execute(conn)?;
        diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_actions_project ON actions(project_id)").execute(conn)?;

        for kind in [Project::KIND, Task::KIND] {
            let meta = TableMeta {
                name: kind.to_string(),
                last_id: 0,
                current_id: 0,
            };
            diesel::insert_or_ignore_into(table_meta::table)
                .values(&meta)
                .execute(conn)?;
        }

        self.register_schema(&CURRENT_SCHEMA)
    }

    fn register_schema(&mut self, schema: &StoreSchema) -> Result<()> {
        let now = timestamp();
        let features = schema.features.join(",");

        let new_schema = NewSchemaVersion {
            version: &schema.version_string(),
            name: schema.name,
            features: &features,
            introduced_at: &now,
        };

        diesel::insert_or_ignore_into(schema_versions::table)
            .values(&new_schema)
            .execute(&mut self.conn)?;

        Ok(())
    }

    /// Refuse stores that are not ours or were written by an incompatible version.
    fn check_schema(&mut self) -> Result<()> {
        let stored: Vec<StoredSchema> = schema_versions::table
            .select(StoredSchema::as_select())
            .load(&mut self.conn)
            .map_err(|e| PitError::Corrupt(format!("{}: {}", self.path.display(), e)))?;

        if stored.iter().any(|s| CURRENT_SCHEMA.accepts(&s.version)) {
            return Ok(());
        }
        let found: Vec<&str> = stored.iter().map(|s| s.version.as_str()).collect();
        Err(PitError::Corrupt(format!(
            "store schema [{}] is not compatible with {}",
            found.join(", "),
            CURRENT_SCHEMA
        )))
    }

    // ========================================================================
    // Load / Save
    // ========================================================================

    /// Read both tables and the last `log_tail` action log entries.
    pub fn load(&mut self, log_tail: i64) -> Result<Snapshot> {
        let conn = &mut self.conn;

        let metas: Vec<TableMeta> = table_meta::table
            .select(TableMeta::as_select())
            .load(conn)?;
        let meta_for = |kind: &str| {
            metas
                .iter()
                .find(|m| m.name == kind)
                .ok_or_else(|| PitError::Corrupt(format!("missing {} table metadata", kind)))
        };

        let project_rows: Vec<Project> = projects::table
            .order(projects::id.asc())
            .select(Project::as_select())
            .load(conn)?;
        let task_rows: Vec<Task> = tasks::table
            .order(tasks::id.asc())
            .select(Task::as_select())
            .load(conn)?;
        let mut recent: Vec<Action> = actions::table
            .order(actions::id.desc())
            .limit(log_tail)
            .select(Action::as_select())
            .load(conn)?;
        recent.reverse();

        let pm = meta_for(Project::KIND)?;
        let tm = meta_for(Task::KIND)?;
        let snapshot = Snapshot {
            projects: Table::restore(project_rows, pm.last_id, pm.current_id)?,
            tasks: Table::restore(task_rows, tm.last_id, tm.current_id)?,
            log: ActionLog::from_saved(recent),
        };
        debug!(
            projects = snapshot.projects.len(),
            tasks = snapshot.tasks.len(),
            actions = snapshot.log.len(),
            "loaded store"
        );
        Ok(snapshot)
    }

    /// Write both tables and append pending log entries in one transaction.
    pub fn save(
        &mut self,
        projects: &Table<Project>,
        tasks: &Table<Task>,
        log: &mut ActionLog,
    ) -> Result<()> {
        let pending = log.pending();

        let first_action_id = self.conn.immediate_transaction::<_, PitError, _>(|conn| {
            diesel::delete(tasks::table).execute(conn)?;
            diesel::delete(projects::table).execute(conn)?;

            for project in projects {
                diesel::insert_into(projects::table)
                    .values(project)
                    .execute(conn)?;
            }
            for task in tasks {
                diesel::insert_into(tasks::table).values(task).execute(conn)?;
            }

            diesel::replace_into(table_meta::table)
                .values(&TableMeta::of(projects))
                .execute(conn)?;
            diesel::replace_into(table_meta::table)
                .values(&TableMeta::of(tasks))
                .execute(conn)?;

            let mut first_id = 0;
            for (i, action) in pending.iter().enumerate() {
                diesel::insert_into(actions::table)
                    .values(&NewAction::from(action))
                    .execute(conn)?;
                if i == 0 {
                    first_id = diesel::select(diesel::dsl::sql::<diesel::sql_types::Integer>(
                        "last_insert_rowid()",
                    ))
                    .first(conn)?;
                }
            }
            Ok(first_id)
        })?;

        debug!(
            projects = projects.len(),
            tasks = tasks.len(),
            actions = log.pending().len(),
            "saved store"
        );
        log.mark_saved(first_action_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;
    use tempfile::TempDir;

    fn fresh() -> (TempDir, Database) {
        let dir = TempDir::new().unwrap();
        let db = Database::create_at(dir.path().join("pit.db"), false).unwrap();
        (dir, db)
    }

    #[test]
    fn test_schema_accepts_same_major() {
        assert!(CURRENT_SCHEMA.accepts("1.0.0"));
        assert!(CURRENT_SCHEMA.accepts("1.4.2"));
        assert!(!CURRENT_SCHEMA.accepts("2.0.0"));
        assert!(!CURRENT_SCHEMA.accepts("garbage"));
        assert_eq!(CURRENT_SCHEMA.to_string(), "v1.0.0 (pit-store)");
    }

    #[test]
    fn test_empty_store_loads_empty() {
        let (_dir, mut db) = fresh();
        let snapshot = db.load(10).unwrap();
        assert!(snapshot.projects.is_empty());
        assert!(snapshot.tasks.is_empty());
        assert!(snapshot.log.is_empty());
        assert_eq!(snapshot.projects.last_id(), 0);
    }

    #[test]
    fn test_open_missing_store() {
        let dir = TempDir::new().unwrap();
        let result = Database::open_at(dir.path().join("nope.db"));
        assert!(matches!(result, Err(PitError::StoreMissing(_))));
    }

    #[test]
    fn test_create_refuses_existing_without_force() {
        let (dir, _db) = fresh();
        let path = dir.path().join("pit.db");
        assert!(matches!(
            Database::create_at(&path, false),
            Err(PitError::StoreExists(_))
        ));
        assert!(Database::create_at(&path, true).is_ok());
    }

    #[test]
    fn test_open_rejects_foreign_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pit.db");
        std::fs::write(&path, "this is not a database, just some text that is long enough")
            .unwrap();
        assert!(Database::open_at(&path).is_err());
    }

    #[test]
    fn test_round_trip() {
        let (dir, mut db) = fresh();
        let mut projects = Table::new();
        let mut tasks = Table::new();
        let mut log = ActionLog::default();

        let pid = projects
            .insert(Project::new("Alpha".into(), "active".into(), "mike".into()))
            .unwrap()
            .id;
        projects
            .insert(Project::new("Beta".into(), "paused".into(), "mike".into()))
            .unwrap();
        projects.delete(2).unwrap();
        projects.mark(pid);
        let mut task = Task::new(
            pid,
            "Write docs".into(),
            "open".into(),
            Priority::High,
            "mike".into(),
        );
        task.date = Some("2026-11-01".into());
        tasks.insert(task).unwrap();
        projects.find_mut(pid).unwrap().number_of_tasks = 1;
        log.record(pid, 0, "mike", "created project 1: Alpha (status: active)".into());
        log.record(pid, 1, "mike", "created task 1: Write docs".into());

        db.save(&projects, &tasks, &mut log).unwrap();
        assert!(log.pending().is_empty());
        assert_eq!(log.iter().map(|a| a.id).collect::<Vec<_>>(), vec![1, 2]);

        let mut reopened = Database::open_at(dir.path().join("pit.db")).unwrap();
        let snapshot = reopened.load(10).unwrap();
        assert_eq!(snapshot.projects, projects);
        assert_eq!(snapshot.tasks, tasks);
        assert_eq!(snapshot.projects.last_id(), 2);
        assert_eq!(snapshot.projects.current_id(), pid);
        assert_eq!(snapshot.log.len(), 2);
    }

    #[test]
    fn test_load_respects_log_tail() {
        let (_dir, mut db) = fresh();
        let projects = Table::new();
        let tasks = Table::new();
        let mut log = ActionLog::default();
        for i in 0..5 {
            log.record(1, 0, "mike", format!("entry {}", i));
        }
        db.save(&projects, &tasks, &mut log).unwrap();

        let snapshot = db.load(2).unwrap();
        let messages: Vec<&str> = snapshot.log.iter().map(|a| a.message.as_str()).collect();
        assert_eq!(messages, vec!["entry 3", "entry 4"]);
    }

    #[test]
    fn test_save_replaces_deleted_rows() {
        let (_dir, mut db) = fresh();
        let mut projects = Table::new();
        let tasks = Table::new();
        let mut log = ActionLog::default();
        projects
            .insert(Project::new("Alpha".into(), "active".into(), "mike".into()))
            .unwrap();
        db.save(&projects, &tasks, &mut log).unwrap();

        projects.delete(1).unwrap();
        db.save(&projects, &tasks, &mut log).unwrap();

        let snapshot = db.load(10).unwrap();
        assert!(snapshot.projects.is_empty());
        assert_eq!(snapshot.projects.last_id(), 1);
    }

    #[test]
    fn test_failed_save_keeps_last_commit() {
        let (dir, mut db) = fresh();
        let mut projects = Table::new();
        let tasks = Table::new();
        let mut log = ActionLog::default();
        projects
            .insert(Project::new("Alpha".into(), "active".into(), "mike".into()))
            .unwrap();
        log.record(1, 0, "mike", "created project 1: Alpha (status: active)".into());
        db.save(&projects, &tasks, &mut log).unwrap();

        // Bypasses the duplicate check, so the UNIQUE(name) constraint aborts the save
        projects
            .insert(Project::new("Alpha".into(), "paused".into(), "mike".into()))
            .unwrap();
        log.record(2, 0, "mike", "created project 2: Alpha (status: paused)".into());
        assert!(matches!(
            db.save(&projects, &tasks, &mut log),
            Err(PitError::Query(_))
        ));
        assert_eq!(log.pending().len(), 1);

        let mut reopened = Database::open_at(dir.path().join("pit.db")).unwrap();
        let snapshot = reopened.load(10).unwrap();
        assert_eq!(snapshot.projects.len(), 1);
        assert_eq!(snapshot.projects.find(1).unwrap().status, "active");
        assert_eq!(snapshot.projects.last_id(), 1);
        assert_eq!(snapshot.log.len(), 1);
        assert_eq!(
            snapshot.log.iter().map(|a| a.message.as_str()).collect::<Vec<_>>(),
            vec!["created project 1: Alpha (status: active)"]
        );
    }
}
