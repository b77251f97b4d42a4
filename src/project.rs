//! Project operations
//!
//! Each operation loads the session, does its one thing and saves if it
//! changed anything (showing a project counts: it moves the current mark).
//!
//! ```text
//! pit project                                     list all
//! pit project <number>                            show
//! pit project -c <name> [-s <status>]             create
//! pit project -e [<number>] [-n <name>] [-s <status>]
//! pit project -d [<number>]                       delete
//! pit project -q [<number> | [-n <name>] [-s <status>]]
//! ```

use crate::error::{PitError, Result};
use crate::format::{Align, Columns};
use crate::models::{bounded, filter_matches, plural, required, Project, NAME_MAX, STATUS_MAX};
use crate::session::Session;
use crate::task::{self, TaskFields};
use std::io::Write;

/// Fields a user can set, or filter by, on a project.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProjectFields {
    pub name: Option<String>,
    pub status: Option<String>,
}

impl ProjectFields {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.status.is_none()
    }

    fn matches(&self, project: &Project) -> bool {
        filter_matches(self.name.as_deref(), &project.name)
            && filter_matches(self.status.as_deref(), &project.status)
    }
}

/// A fully resolved `pit project` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectCommand {
    List(ProjectFields),
    Show(Option<i32>),
    Create { name: String, status: Option<String> },
    Update { id: Option<i32>, fields: ProjectFields },
    Delete(Option<i32>),
}

/// Run one project command, writing any output to `out`.
pub fn run<W: Write>(session: &mut Session, command: ProjectCommand, out: &mut W) -> Result<()> {
    match command {
        ProjectCommand::List(filter) => list(session, &filter, out),
        ProjectCommand::Show(id) => show(session, id, out),
        ProjectCommand::Create { name, status } => {
            create(session, &name, status.as_deref())?;
            report(session, out)
        }
        ProjectCommand::Update { id, fields } => {
            update(session, id, &fields)?;
            report(session, out)
        }
        ProjectCommand::Delete(id) => {
            delete(session, id)?;
            report(session, out)
        }
    }
}

/// Echo the action the last mutation logged.
fn report<W: Write>(session: &Session, out: &mut W) -> Result<()> {
    if let Some(action) = session.log().iter().last() {
        writeln!(out, "{}", action.message)?;
    }
    Ok(())
}

/// Exact-name lookup among live projects, optionally ignoring one id.
fn name_taken(session: &Session, name: &str, except: Option<i32>) -> bool {
    session
        .projects()
        .iter()
        .any(|p| p.name == name && Some(p.id) != except)
}

/// Create a project and make it current. Returns the new id.
pub fn create(session: &mut Session, name: &str, status: Option<&str>) -> Result<i32> {
    session.load()?;

    let name = required("name", name, NAME_MAX)?;
    let status = bounded(
        "status",
        status.unwrap_or(&session.config().project.default_status),
        STATUS_MAX,
    )?;
    if name_taken(session, &name, None) {
        return Err(PitError::DuplicateName { kind: "project", name });
    }

    let project = Project::new(name, status, session.user().to_string());
    let project = session.projects_mut().insert(project)?;
    let id = project.id;
    let message = format!(
        "created project {}: {} (status: {})",
        id, project.name, project.status
    );

    session.projects_mut().mark(id);
    session.record(id, 0, message);
    session.save()?;
    Ok(id)
}

/// Overwrite the supplied fields of a project (explicit id or current).
pub fn update(session: &mut Session, id: Option<i32>, fields: &ProjectFields) -> Result<()> {
    if fields.is_empty() {
        return Err(PitError::NoOp);
    }
    let name = fields
        .name
        .as_deref()
        .map(|n| required("name", n, NAME_MAX))
        .transpose()?;
    let status = fields
        .status
        .as_deref()
        .map(|s| bounded("status", s, STATUS_MAX))
        .transpose()?;

    session.load()?;
    let id = session.projects().resolve(id)?;
    if let Some(name) = &name {
        if name_taken(session, name, Some(id)) {
            return Err(PitError::DuplicateName {
                kind: "project",
                name: name.clone(),
            });
        }
    }

    let user = session.user().to_string();
    let renamed = name.is_some();
    let restatused = status.is_some();
    let project = session.projects_mut().update(id, |p| {
        if let Some(name) = name {
            p.name = name;
        }
        if let Some(status) = status {
            p.status = status;
        }
        p.username = user;
    })?;
    let message = update_message(project, renamed, restatused);

    session.projects_mut().mark(id);
    session.record(id, 0, message);
    session.save()
}

/// "updated project 1: (name: X, status: Y)" when renamed,
/// "updated project 1: X (status: Y)" otherwise.
fn update_message(project: &Project, renamed: bool, restatused: bool) -> String {
    let mut changes = Vec::new();
    if renamed {
        changes.push(format!("name: {}", project.name));
    }
    if restatused {
        changes.push(format!("status: {}", project.status));
    }

    if renamed {
        format!("updated project {}: ({})", project.id, changes.join(", "))
    } else {
        format!(
            "updated project {}: {} ({})",
            project.id,
            project.name,
            changes.join(", ")
        )
    }
}

/// Delete a project and all of its tasks.
pub fn delete(session: &mut Session, id: Option<i32>) -> Result<()> {
    session.load()?;
    let id = session.projects().resolve(id)?;

    let (project, cascaded) = session.remove_project(id)?;
    let mut message = format!("deleted project {}: {}", project.id, project.name);
    if cascaded > 0 {
        let count = i32::try_from(cascaded).unwrap_or(i32::MAX);
        message.push_str(&format!(" with {}", plural(count, "task")));
    }

    session.record(id, 0, message);
    session.save()
}

fn row(project: &Project, current_id: i32) -> Vec<String> {
    let marker = if project.id == current_id { "*" } else { "" };
    vec![
        marker.to_string(),
        format!("{}:", project.id),
        format!("({})", project.username),
        project.name.clone(),
        format!(
            "({}, {})",
            project.status,
            plural(project.number_of_tasks, "task")
        ),
    ]
}

/// List projects matching every supplied filter (case-insensitive substrings).
pub fn list<W: Write>(session: &mut Session, filter: &ProjectFields, out: &mut W) -> Result<()> {
    session.load()?;

    let projects = session.projects();
    let current_id = projects.current_id();
    let mut columns = Columns::new(&[
        Align::Left,
        Align::Right,
        Align::Left,
        Align::Left,
        Align::Left,
    ]);
    for project in projects.iter().filter(|p| filter.matches(p)) {
        columns.push(row(project, current_id));
    }
    columns.flush(out)?;
    Ok(())
}

/// Print one project (explicit id or current), its tasks, and make it current.
pub fn show<W: Write>(session: &mut Session, id: Option<i32>, out: &mut W) -> Result<()> {
    session.load()?;
    let id = session.projects().resolve(id)?;

    let project = session.projects().find(id)?;
    writeln!(
        out,
        "* {}: ({}) {} (status: {}, {})",
        project.id,
        project.username,
        project.name,
        project.status,
        plural(project.number_of_tasks, "task")
    )?;
    let has_tasks = project.number_of_tasks > 0;

    session.projects_mut().mark(id);
    if has_tasks {
        task::list_for_project(session, id, &TaskFields::default(), out)?;
    }
    session.save()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::Priority;
    use crate::models::Task;
    use tempfile::TempDir;

    fn fresh() -> (TempDir, Session) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pit.db");
        Database::create_at(&path, false).unwrap();
        (dir, Session::new(path, "mike"))
    }

    fn reopen(dir: &TempDir) -> Session {
        let mut session = Session::new(dir.path().join("pit.db"), "mike");
        session.load().unwrap();
        session
    }

    fn fields(name: Option<&str>, status: Option<&str>) -> ProjectFields {
        ProjectFields {
            name: name.map(String::from),
            status: status.map(String::from),
        }
    }

    fn add_task(session: &mut Session, project_id: i32, name: &str) {
        session
            .insert_task(Task::new(
                project_id,
                name.into(),
                "open".into(),
                Priority::Normal,
                "mike".into(),
            ))
            .unwrap();
    }

    fn output<F>(f: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> Result<()>,
    {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_create_defaults_status_and_marks_current() {
        let (_dir, mut session) = fresh();
        let id = create(&mut session, "Alpha", None).unwrap();

        let project = session.projects().current().unwrap();
        assert_eq!(project.id, id);
        assert_eq!(project.status, "active");
        assert_eq!(project.username, "mike");
        assert_eq!(project.number_of_tasks, 0);
    }

    #[test]
    fn test_create_logs_once() {
        let (_dir, mut session) = fresh();
        let id = create(&mut session, "Alpha", Some("planning")).unwrap();

        let actions: Vec<_> = session.log().iter().collect();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].project_id, id);
        assert_eq!(actions[0].task_id, 0);
        assert_eq!(actions[0].message, "created project 1: Alpha (status: planning)");
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let (dir, mut session) = fresh();
        create(&mut session, "Alpha", None).unwrap();

        let err = create(&mut session, "Alpha", None).unwrap_err();
        assert!(matches!(err, PitError::DuplicateName { .. }));

        let session = reopen(&dir);
        assert_eq!(session.projects().iter().filter(|p| p.name == "Alpha").count(), 1);
        assert_eq!(session.log().len(), 1);
    }

    #[test]
    fn test_duplicate_check_is_exact() {
        let (_dir, mut session) = fresh();
        create(&mut session, "Alpha", None).unwrap();
        assert!(create(&mut session, "alpha", None).is_ok());
    }

    #[test]
    fn test_create_rejects_long_name() {
        let (_dir, mut session) = fresh();
        let name = "n".repeat(NAME_MAX + 1);
        assert!(matches!(
            create(&mut session, &name, None),
            Err(PitError::FieldTooLong { field: "name", .. })
        ));
        assert!(session.projects().is_empty());
    }

    #[test]
    fn test_create_round_trips() {
        let (dir, mut session) = fresh();
        let id = create(&mut session, "Alpha", Some("planning")).unwrap();
        let created = session.projects().find(id).unwrap().clone();

        let session = reopen(&dir);
        assert_eq!(session.projects().find(id).unwrap(), &created);
        assert_eq!(session.projects().current_id(), id);
    }

    #[test]
    fn test_update_status_only() {
        let (dir, mut session) = fresh();
        let id = create(&mut session, "Alpha", None).unwrap();

        update(&mut session, Some(id), &fields(None, Some("paused"))).unwrap();

        let session = reopen(&dir);
        let project = session.projects().find(id).unwrap();
        assert_eq!(project.name, "Alpha");
        assert_eq!(project.status, "paused");
        let last = session.log().iter().last().unwrap();
        assert_eq!(last.message, "updated project 1: Alpha (status: paused)");
    }

    #[test]
    fn test_update_name_and_status_message() {
        let (_dir, mut session) = fresh();
        create(&mut session, "Alpha", None).unwrap();

        update(&mut session, None, &fields(Some("Omega"), Some("done"))).unwrap();
        let last = session.log().iter().last().unwrap();
        assert_eq!(last.message, "updated project 1: (name: Omega, status: done)");
    }

    #[test]
    fn test_update_name_only_message() {
        let (_dir, mut session) = fresh();
        create(&mut session, "Alpha", None).unwrap();

        update(&mut session, None, &fields(Some("Omega"), None)).unwrap();
        let last = session.log().iter().last().unwrap();
        assert_eq!(last.message, "updated project 1: (name: Omega)");
        assert_eq!(session.projects().find(1).unwrap().status, "active");
    }

    #[test]
    fn test_update_nothing_is_noop_error() {
        let (_dir, mut session) = fresh();
        assert!(matches!(
            update(&mut session, Some(1), &ProjectFields::default()),
            Err(PitError::NoOp)
        ));
        // Rejected before the store was even read
        assert!(!session.is_loaded());
    }

    #[test]
    fn test_update_without_current_fails() {
        let (_dir, mut session) = fresh();
        create(&mut session, "Alpha", None).unwrap();
        delete(&mut session, None).unwrap();

        assert!(matches!(
            update(&mut session, None, &fields(None, Some("x"))),
            Err(PitError::NoCurrent("project"))
        ));
    }

    #[test]
    fn test_update_refreshes_username() {
        let (dir, mut session) = fresh();
        create(&mut session, "Alpha", None).unwrap();

        let mut other = Session::new(dir.path().join("pit.db"), "sam");
        update(&mut other, Some(1), &fields(None, Some("paused"))).unwrap();
        assert_eq!(other.projects().find(1).unwrap().username, "sam");
    }

    #[test]
    fn test_rename_onto_existing_name_rejected() {
        let (_dir, mut session) = fresh();
        create(&mut session, "Alpha", None).unwrap();
        create(&mut session, "Beta", None).unwrap();

        assert!(matches!(
            update(&mut session, Some(2), &fields(Some("Alpha"), None)),
            Err(PitError::DuplicateName { .. })
        ));
        // Renaming to its own name is fine
        assert!(update(&mut session, Some(2), &fields(Some("Beta"), None)).is_ok());
    }

    #[test]
    fn test_update_marks_current() {
        let (_dir, mut session) = fresh();
        create(&mut session, "Alpha", None).unwrap();
        create(&mut session, "Beta", None).unwrap();

        update(&mut session, Some(1), &fields(None, Some("paused"))).unwrap();
        assert_eq!(session.projects().current_id(), 1);
    }

    #[test]
    fn test_delete_cascades() {
        let (dir, mut session) = fresh();
        let a = create(&mut session, "Alpha", None).unwrap();
        let b = create(&mut session, "Beta", None).unwrap();
        add_task(&mut session, a, "a1");
        add_task(&mut session, b, "b1");
        add_task(&mut session, a, "a2");
        add_task(&mut session, a, "a3");
        session.save().unwrap();

        delete(&mut session, Some(a)).unwrap();

        let session = reopen(&dir);
        assert!(session.projects().find(a).is_err());
        assert_eq!(session.tasks().len(), 1);
        assert!(session.tasks().iter().all(|t| t.project_id == b));
        assert_eq!(session.projects().current_id(), 0);

        let last = session.log().iter().last().unwrap();
        assert_eq!(last.message, "deleted project 1: Alpha with 3 tasks");
        assert_eq!(last.project_id, a);
        assert_eq!(session.log().len(), 3);
    }

    #[test]
    fn test_delete_single_task_wording() {
        let (_dir, mut session) = fresh();
        let a = create(&mut session, "Alpha", None).unwrap();
        add_task(&mut session, a, "a1");

        delete(&mut session, None).unwrap();
        let last = session.log().iter().last().unwrap();
        assert_eq!(last.message, "deleted project 1: Alpha with 1 task");
    }

    #[test]
    fn test_delete_empty_project_wording() {
        let (_dir, mut session) = fresh();
        create(&mut session, "Alpha", None).unwrap();

        delete(&mut session, Some(1)).unwrap();
        let last = session.log().iter().last().unwrap();
        assert_eq!(last.message, "deleted project 1: Alpha");
    }

    #[test]
    fn test_delete_missing() {
        let (_dir, mut session) = fresh();
        assert!(matches!(
            delete(&mut session, Some(4)),
            Err(PitError::NotFound { kind: "project", id: 4 })
        ));
        assert!(matches!(delete(&mut session, None), Err(PitError::NoCurrent(_))));
    }

    #[test]
    fn test_deleted_id_never_reused() {
        let (_dir, mut session) = fresh();
        create(&mut session, "Alpha", None).unwrap();
        delete(&mut session, Some(1)).unwrap();

        let id = create(&mut session, "Beta", None).unwrap();
        assert_eq!(id, 2);
        assert!(session.projects().find(1).is_err());
    }

    #[test]
    fn test_list_filters() {
        let (_dir, mut session) = fresh();
        create(&mut session, "Website", Some("active")).unwrap();
        create(&mut session, "Web app", Some("paused")).unwrap();
        create(&mut session, "Garden", Some("active")).unwrap();

        let text = output(|out| list(&mut session, &fields(Some("WEB"), Some("act")), out));
        assert!(text.contains("Website"));
        assert!(!text.contains("Web app"));
        assert!(!text.contains("Garden"));

        let all = output(|out| list(&mut session, &ProjectFields::default(), out));
        assert_eq!(all.lines().count(), 3);
        assert!(all.lines().last().unwrap().starts_with("* 3: (mike) Garden"));
    }

    #[test]
    fn test_list_does_not_save() {
        let (dir, mut session) = fresh();
        create(&mut session, "Alpha", None).unwrap();
        session.projects_mut().mark(0);

        output(|out| list(&mut session, &ProjectFields::default(), out));
        assert_eq!(reopen(&dir).projects().current_id(), 1);
    }

    #[test]
    fn test_show_prints_and_marks() {
        let (dir, mut session) = fresh();
        let a = create(&mut session, "Alpha", None).unwrap();
        create(&mut session, "Beta", None).unwrap();
        add_task(&mut session, a, "Write docs");

        let text = output(|out| show(&mut session, Some(a), out));
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), "* 1: (mike) Alpha (status: active, 1 task)");
        assert!(lines.next().unwrap().contains("Write docs"));

        assert_eq!(reopen(&dir).projects().current_id(), a);
    }

    #[test]
    fn test_show_current_when_unset() {
        let (_dir, mut session) = fresh();
        let mut out = Vec::new();
        assert!(matches!(
            show(&mut session, None, &mut out),
            Err(PitError::NoCurrent("project"))
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn test_run_reports_action() {
        let (_dir, mut session) = fresh();
        let text = output(|out| {
            run(
                &mut session,
                ProjectCommand::Create {
                    name: "Alpha".into(),
                    status: None,
                },
                out,
            )
        });
        assert_eq!(text, "created project 1: Alpha (status: active)\n");
    }
}
