//! The managed-tasks directory: `<root>/.agent/tasks/NNN-slug/task.md`.
//!
//! The store reads task documents and performs the few edits the CLI
//! offers (create, check off the current gate, set status). Writes are
//! plain overwrites with no locking: concurrent writers race and the last
//! write wins.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::document::{replace_line, set_status_line, TaskDocument, TASK_FILE};
use super::template::{render_task, title_case, TaskType};
use super::TaskId;
use crate::error::{Result, TaskGateError};
use crate::gates::{check_line, summarize, upcoming_gates, Gate, GateSummary};
use crate::root::ProjectRoot;

/// A task name given with an explicit `NNN-` prefix
static NUMBERED_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{3})-(.+)$").expect("static regex is valid"));

/// One row of the task listing.
#[derive(Debug, Clone, Serialize)]
pub struct TaskEntry {
    pub id: TaskId,
    pub name: String,
    pub status: String,
    pub intent: String,
    pub summary: GateSummary,
}

impl TaskEntry {
    pub fn is_done(&self) -> bool {
        self.status.starts_with("done")
    }
}

/// Outcome of checking off the current gate.
#[derive(Debug, Clone, Serialize)]
pub struct CheckOff {
    pub task: String,
    pub checked: Gate,
    pub upcoming: Vec<Gate>,
    /// Summary after the edit
    pub summary: GateSummary,
}

/// Access to the task folders of one project.
#[derive(Debug, Clone)]
pub struct TaskStore {
    tasks_dir: PathBuf,
}

impl TaskStore {
    pub fn new(root: &ProjectRoot) -> Self {
        Self {
            tasks_dir: root.tasks_dir(),
        }
    }

    pub fn tasks_dir(&self) -> &Path {
        &self.tasks_dir
    }

    /// Task folders with a numeric prefix, sorted by folder name.
    fn task_dirs(&self) -> Vec<(TaskId, PathBuf)> {
        if !self.tasks_dir.is_dir() {
            return Vec::new();
        }

        WalkDir::new(&self.tasks_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_dir())
            .filter_map(|e| {
                let id = TaskId::from_folder_name(&e.file_name().to_string_lossy())?;
                Some((id, e.into_path()))
            })
            .collect()
    }

    /// Folder of task `id`, if it holds a task document.
    fn task_dir(&self, id: TaskId) -> Option<PathBuf> {
        self.task_dirs()
            .into_iter()
            .find(|(candidate, dir)| *candidate == id && dir.join(TASK_FILE).is_file())
            .map(|(_, dir)| dir)
    }

    /// Path of the document for `id`, without reading it.
    pub fn document_path(&self, id: TaskId) -> Option<PathBuf> {
        self.task_dir(id).map(|dir| dir.join(TASK_FILE))
    }

    /// Find the document for `id`. Missing or unreadable documents are
    /// treated as absent.
    pub fn find(&self, id: TaskId) -> Option<TaskDocument> {
        let dir = self.task_dir(id)?;

        match TaskDocument::load(id, &dir) {
            Ok(doc) => Some(doc),
            Err(e) => {
                warn!("Cannot read task {}: {}", id, e);
                None
            }
        }
    }

    /// Like [`find`](Self::find), but a missing task is an error.
    pub fn get(&self, id: TaskId) -> Result<TaskDocument> {
        self.find(id).ok_or(TaskGateError::TaskNotFound { id })
    }

    /// All tasks with a readable document.
    pub fn list(&self) -> Vec<TaskEntry> {
        self.task_dirs()
            .into_iter()
            .filter(|(_, dir)| dir.join(TASK_FILE).is_file())
            .filter_map(|(id, dir)| match TaskDocument::load(id, &dir) {
                Ok(doc) => Some(TaskEntry {
                    id,
                    status: doc.status(),
                    intent: doc.intent(),
                    summary: doc.summary(),
                    name: doc.name,
                }),
                Err(e) => {
                    warn!("Skipping {}: {}", dir.display(), e);
                    None
                }
            })
            .collect()
    }

    /// Next free task number: one past the highest existing number.
    pub fn next_number(&self) -> Result<u32> {
        match self.task_dirs().iter().map(|(id, _)| id.number()).max() {
            None => Ok(1),
            Some(highest) => highest
                .checked_add(1)
                .ok_or(TaskGateError::TaskNumbersExhausted { highest }),
        }
    }

    /// Create a new task folder and document.
    ///
    /// A name written as `NNN-rest` is accepted only when `NNN` is the next
    /// free number; the prefix is then dropped.
    pub fn create(
        &self,
        name: &str,
        task_type: Option<TaskType>,
        appendix: Option<&str>,
    ) -> Result<TaskDocument> {
        let next = self.next_number()?;
        let name = match NUMBERED_NAME_RE.captures(name.trim()) {
            Some(caps) => {
                let provided: u32 = caps[1].parse().unwrap_or(0);
                if provided != next {
                    return Err(TaskGateError::TaskNumberMismatch {
                        provided,
                        expected: next,
                    });
                }
                caps[2].to_string()
            }
            None => name.trim().to_string(),
        };

        let slug = slugify(&name);
        if slug.is_empty() {
            return Err(TaskGateError::InvalidTaskName {
                reason: format!("'{}' has no letters or digits", name),
            });
        }

        let id = TaskId::new(next);
        let dir = self.tasks_dir.join(format!("{id}-{slug}"));
        std::fs::create_dir_all(&self.tasks_dir)?;
        std::fs::create_dir(&dir)?;

        let mut content = render_task(id, &title_case(&name), task_type);
        if let Some(extra) = appendix {
            content.push('\n');
            content.push_str(extra);
            content.push('\n');
        }
        std::fs::write(dir.join(TASK_FILE), &content)?;
        info!("Created task {} at {}", id, dir.display());

        TaskDocument::load(id, &dir)
    }

    /// Check off the first unchecked gate of task `id`.
    pub fn check_current_gate(&self, id: TaskId, upcoming_limit: usize) -> Result<CheckOff> {
        let doc = self.get(id)?;
        let gates = doc.gates();
        let current = summarize(&gates)
            .current_gate
            .ok_or(TaskGateError::NoOpenGate { id })?;

        let line = doc
            .text
            .lines()
            .nth(current.line_number - 1)
            .unwrap_or_default();
        let checked_line = check_line(line).ok_or(TaskGateError::NoOpenGate { id })?;
        let updated = replace_line(&doc.text, current.line_number, &checked_line);
        std::fs::write(&doc.path, &updated)?;
        debug!("Checked gate at {}:{}", doc.path.display(), current.line_number);

        let upcoming = upcoming_gates(&gates, current.line_number, upcoming_limit)
            .into_iter()
            .cloned()
            .collect();
        let mut after = gates;
        if let Some(gate) = after
            .iter_mut()
            .find(|g| g.line_number == current.line_number)
        {
            gate.checked = true;
        }

        Ok(CheckOff {
            task: doc.name,
            checked: Gate {
                checked: true,
                ..current
            },
            upcoming,
            summary: summarize(&after),
        })
    }

    /// Rewrite the status line of task `id`. Returns `false` when the
    /// document has no `## Status` section.
    pub fn set_status(&self, id: TaskId, status: &str) -> Result<bool> {
        let doc = self.get(id)?;
        match set_status_line(&doc.text, status) {
            Some(updated) => {
                std::fs::write(&doc.path, updated)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Turn a task name into a lowercase, dash-separated folder slug.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_whitespace() || c == '_' || c == '-' {
            if !slug.is_empty() && !slug.ends_with('-') {
                slug.push('-');
            }
        } else if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        }
    }
    slug.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn store_with_tasks(tasks: &[(&str, &str)]) -> (TaskStore, TempDir) {
        let temp = TempDir::new().unwrap();
        for (folder, text) in tasks {
            let dir = temp.path().join(".agent/tasks").join(folder);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join(TASK_FILE), text).unwrap();
        }
        let store = TaskStore::new(&ProjectRoot::new(temp.path()));
        (store, temp)
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Add login page"), "add-login-page");
        assert_eq!(slugify("fix__the  bug!"), "fix-the-bug");
        assert_eq!(slugify("  -- edge -- "), "edge");
        assert_eq!(slugify("???"), "");
    }

    #[test]
    fn test_next_number_empty_and_missing() {
        let temp = TempDir::new().unwrap();
        let store = TaskStore::new(&ProjectRoot::new(temp.path()));
        assert_eq!(store.next_number().unwrap(), 1);
    }

    #[test]
    fn test_next_number_at_u32_max_is_error() {
        let (store, _temp) = store_with_tasks(&[("4294967295-last", "- [ ] a\n")]);
        assert!(matches!(
            store.next_number(),
            Err(TaskGateError::TaskNumbersExhausted { highest: u32::MAX })
        ));
        assert!(store.create("one more", None, None).is_err());
    }

    #[test]
    fn test_next_number_skips_gaps() {
        let (store, _temp) = store_with_tasks(&[("001-a", ""), ("007-b", ""), ("notes", "")]);
        assert_eq!(store.next_number().unwrap(), 8);
    }

    #[test]
    fn test_find_by_number() {
        let (store, _temp) = store_with_tasks(&[("007-login", "- [ ] x\n")]);
        let doc = store.find(TaskId::new(7)).unwrap();
        assert_eq!(doc.name, "007-login");
        assert!(store.find(TaskId::new(8)).is_none());
        assert!(matches!(
            store.get(TaskId::new(8)),
            Err(TaskGateError::TaskNotFound { .. })
        ));
    }

    #[test]
    fn test_folder_without_document_is_not_found() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".agent/tasks/003-empty")).unwrap();
        let store = TaskStore::new(&ProjectRoot::new(temp.path()));
        assert!(store.find(TaskId::new(3)).is_none());
    }

    #[test]
    fn test_list_sorted_with_progress() {
        let (store, _temp) = store_with_tasks(&[
            ("002-b", "## Status\ndone\n- [x] a\n"),
            ("001-a", "## Status\npending\n## Intent\nShip it\n- [x] a\n- [ ] b\n"),
        ]);
        let entries = store.list();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "001-a");
        assert_eq!(entries[0].intent, "Ship it");
        assert_eq!(entries[0].summary.progress(), "1/2");
        assert!(entries[1].is_done());
    }

    #[test]
    fn test_create_allocates_number_and_slug() {
        let (store, _temp) = store_with_tasks(&[("004-old", "")]);
        let doc = store.create("add login page", Some(TaskType::Feature), None).unwrap();
        assert_eq!(doc.id, TaskId::new(5));
        assert_eq!(doc.name, "005-add-login-page");
        assert!(doc.text.starts_with("# 005 - Add Login Page"));
        assert_eq!(doc.status(), "pending");
    }

    #[test]
    fn test_create_appends_pattern() {
        let (store, _temp) = store_with_tasks(&[]);
        let doc = store
            .create("spike", None, Some("- [ ] Time-box to one hour"))
            .unwrap();
        assert!(doc.text.ends_with("- [ ] Time-box to one hour\n"));
        assert_eq!(doc.summary().total_count, 4);
    }

    #[test]
    fn test_create_with_matching_number_prefix() {
        let (store, _temp) = store_with_tasks(&[]);
        let doc = store.create("001-first task", None, None).unwrap();
        assert_eq!(doc.name, "001-first-task");
    }

    #[test]
    fn test_create_with_wrong_number_prefix() {
        let (store, _temp) = store_with_tasks(&[]);
        let err = store.create("009-later", None, None).unwrap_err();
        assert!(matches!(
            err,
            TaskGateError::TaskNumberMismatch {
                provided: 9,
                expected: 1
            }
        ));
    }

    #[test]
    fn test_create_rejects_empty_slug() {
        let (store, _temp) = store_with_tasks(&[]);
        assert!(matches!(
            store.create("!!!", None, None),
            Err(TaskGateError::InvalidTaskName { .. })
        ));
    }

    #[test]
    fn test_check_current_gate_skips_references() {
        let text = "- [x] Plan\n- [7] See design doc\n  - [ ] Build\n- [ ] Test\n- [ ] Ship\n";
        let (store, _temp) = store_with_tasks(&[("001-a", text)]);

        let result = store.check_current_gate(TaskId::new(1), 1).unwrap();
        assert_eq!(result.checked.raw_text, "Build");
        assert!(result.checked.checked);
        assert_eq!(result.upcoming.len(), 1);
        assert_eq!(result.upcoming[0].raw_text, "Test");
        assert_eq!(result.summary.progress(), "2/4");

        let on_disk = store.get(TaskId::new(1)).unwrap().text;
        assert_eq!(
            on_disk,
            "- [x] Plan\n- [7] See design doc\n  - [x] Build\n- [ ] Test\n- [ ] Ship\n"
        );
    }

    #[test]
    fn test_check_current_gate_when_complete() {
        let (store, _temp) = store_with_tasks(&[("001-a", "- [x] done\n")]);
        assert!(matches!(
            store.check_current_gate(TaskId::new(1), 3),
            Err(TaskGateError::NoOpenGate { .. })
        ));
    }

    #[test]
    fn test_set_status() {
        let (store, _temp) = store_with_tasks(&[("001-a", "## Status\npending\n")]);
        assert!(store.set_status(TaskId::new(1), "done").unwrap());
        assert_eq!(store.get(TaskId::new(1)).unwrap().status(), "done");

        let (store, _temp) = store_with_tasks(&[("001-a", "no status\n")]);
        assert!(!store.set_status(TaskId::new(1), "done").unwrap());
    }
}
