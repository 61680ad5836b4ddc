//! Task state machine.
//!
//! ```text
//!              activate(id)                 refresh()
//!   Inactive ───────────────▶ Active(id, S) ─────────▶ Active(id, S')
//!      ▲                          │
//!      └──────── deactivate() ────┘
//! ```
//!
//! `Active` is split into in-progress and complete by whether the summary
//! has a current gate; that split is derived, never stored. Checking a box
//! is not a transition here: it is an edit to the document that the next
//! `refresh()` observes.

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Result, TaskGateError};
use crate::gates::{load_summary, GateSummary};
use crate::root::ProjectRoot;
use crate::task::{TaskId, TaskStore};

/// Current state of one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TaskState {
    Inactive,
    Active {
        task_id: TaskId,
        summary: GateSummary,
    },
}

impl TaskState {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }

    pub fn task_id(&self) -> Option<TaskId> {
        match self {
            Self::Inactive => None,
            Self::Active { task_id, .. } => Some(*task_id),
        }
    }
}

/// Coarse view of engine state that the enforcement policy is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StateShape {
    /// No project root encloses the working directory
    Unmanaged,
    /// Inside a project with no active task
    Inactive,
    /// Active task with an unchecked gate
    InProgress,
    /// Active task with every gate checked (or none at all)
    Complete,
}

impl StateShape {
    pub const ALL: [StateShape; 4] = [
        Self::Unmanaged,
        Self::Inactive,
        Self::InProgress,
        Self::Complete,
    ];
}

/// Snapshot the enforcement engine reasons over.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EngineState {
    pub active_task_id: Option<TaskId>,
    pub project_root: Option<ProjectRoot>,
    pub gate_summary: Option<GateSummary>,
}

impl EngineState {
    /// State for a call site outside any managed project.
    pub fn unmanaged() -> Self {
        Self::default()
    }

    pub fn shape(&self) -> StateShape {
        if self.project_root.is_none() {
            return StateShape::Unmanaged;
        }
        if self.active_task_id.is_none() {
            return StateShape::Inactive;
        }
        match &self.gate_summary {
            Some(summary) if !summary.is_complete() => StateShape::InProgress,
            _ => StateShape::Complete,
        }
    }
}

/// The session's task state together with the project it lives in.
///
/// The active task is explicit state held by this value; callers that need
/// it to outlive the process persist it themselves.
#[derive(Debug, Clone)]
pub struct TaskStateMachine {
    root: Option<ProjectRoot>,
    state: TaskState,
}

impl TaskStateMachine {
    /// Start `Inactive` in `root`.
    pub fn new(root: Option<ProjectRoot>) -> Self {
        Self {
            root,
            state: TaskState::Inactive,
        }
    }

    /// Rebuild a machine from a previously persisted pointer, refreshing the
    /// summary from disk.
    pub fn resume(root: Option<ProjectRoot>, active: Option<TaskId>) -> Self {
        let mut machine = Self::new(root);
        match (active, machine.root.is_some()) {
            (Some(task_id), true) => {
                machine.state = TaskState::Active {
                    task_id,
                    summary: GateSummary::default(),
                };
                machine.refresh();
            }
            (Some(task_id), false) => {
                warn!("Ignoring active task {} outside a project", task_id);
            }
            (None, _) => {}
        }
        machine
    }

    pub fn root(&self) -> Option<&ProjectRoot> {
        self.root.as_ref()
    }

    pub fn state(&self) -> &TaskState {
        &self.state
    }

    /// Bind `task_id` as the active task.
    ///
    /// Fails with [`TaskGateError::TaskNotFound`] when there is no project
    /// root or no document for the task; the state is left untouched.
    pub fn activate(&mut self, task_id: TaskId) -> Result<GateSummary> {
        let path = self
            .root
            .as_ref()
            .and_then(|root| TaskStore::new(root).document_path(task_id))
            .ok_or(TaskGateError::TaskNotFound { id: task_id })?;

        let summary = load_summary(&path);
        debug!("Activated task {} ({})", task_id, summary.progress());
        self.state = TaskState::Active {
            task_id,
            summary: summary.clone(),
        };
        Ok(summary)
    }

    /// Re-read the active task's document. A document that has gone away
    /// reads as an empty summary.
    pub fn refresh(&mut self) {
        let TaskState::Active { task_id, summary } = &mut self.state else {
            return;
        };
        let path = self
            .root
            .as_ref()
            .and_then(|root| TaskStore::new(root).document_path(*task_id));
        *summary = match path {
            Some(path) => load_summary(&path),
            None => {
                debug!("Task {} has no document; treating as 0/0", task_id);
                GateSummary::default()
            }
        };
    }

    /// Return to `Inactive`, yielding the task that was active.
    pub fn deactivate(&mut self) -> Option<TaskId> {
        let previous = self.state.task_id();
        self.state = TaskState::Inactive;
        previous
    }

    /// Snapshot for the enforcement engine.
    pub fn engine_state(&self) -> EngineState {
        match &self.state {
            TaskState::Inactive => EngineState {
                active_task_id: None,
                project_root: self.root.clone(),
                gate_summary: None,
            },
            TaskState::Active { task_id, summary } => EngineState {
                active_task_id: Some(*task_id),
                project_root: self.root.clone(),
                gate_summary: Some(summary.clone()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn project(tasks: &[(&str, &str)]) -> (ProjectRoot, TempDir) {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".agent/tasks")).unwrap();
        for (folder, text) in tasks {
            let dir = temp.path().join(".agent/tasks").join(folder);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("task.md"), text).unwrap();
        }
        (ProjectRoot::new(temp.path()), temp)
    }

    #[test]
    fn test_starts_inactive() {
        let (root, _temp) = project(&[]);
        let machine = TaskStateMachine::new(Some(root));
        assert_eq!(machine.state(), &TaskState::Inactive);
        assert_eq!(machine.engine_state().shape(), StateShape::Inactive);
    }

    #[test]
    fn test_activate_existing_task() {
        let (root, _temp) = project(&[("002-x", "- [x] a\n- [ ] b\n")]);
        let mut machine = TaskStateMachine::new(Some(root));

        let summary = machine.activate(TaskId::new(2)).unwrap();
        assert_eq!(summary.progress(), "1/2");
        assert_eq!(machine.state().task_id(), Some(TaskId::new(2)));
        assert_eq!(machine.engine_state().shape(), StateShape::InProgress);
    }

    #[test]
    fn test_activate_missing_task_leaves_state() {
        let (root, _temp) = project(&[]);
        let mut machine = TaskStateMachine::new(Some(root));

        let err = machine.activate(TaskId::new(9)).unwrap_err();
        assert!(matches!(err, TaskGateError::TaskNotFound { .. }));
        assert!(!machine.state().is_active());
    }

    #[test]
    fn test_activate_without_root_fails() {
        let mut machine = TaskStateMachine::new(None);
        assert!(machine.activate(TaskId::new(1)).is_err());
        assert_eq!(machine.engine_state().shape(), StateShape::Unmanaged);
    }

    #[test]
    fn test_refresh_sees_external_edit() {
        let (root, temp) = project(&[("001-x", "- [ ] only\n")]);
        let mut machine = TaskStateMachine::new(Some(root));
        machine.activate(TaskId::new(1)).unwrap();
        assert_eq!(machine.engine_state().shape(), StateShape::InProgress);

        fs::write(temp.path().join(".agent/tasks/001-x/task.md"), "- [x] only\n").unwrap();
        machine.refresh();
        assert_eq!(machine.engine_state().shape(), StateShape::Complete);
    }

    #[test]
    fn test_refresh_after_document_removed() {
        let (root, temp) = project(&[("001-x", "- [ ] only\n")]);
        let mut machine = TaskStateMachine::new(Some(root));
        machine.activate(TaskId::new(1)).unwrap();

        fs::remove_file(temp.path().join(".agent/tasks/001-x/task.md")).unwrap();
        machine.refresh();
        let state = machine.engine_state();
        assert_eq!(state.gate_summary, Some(GateSummary::default()));
        assert_eq!(state.shape(), StateShape::Complete);
    }

    #[test]
    fn test_deactivate() {
        let (root, _temp) = project(&[("001-x", "- [ ] a\n")]);
        let mut machine = TaskStateMachine::new(Some(root));
        machine.activate(TaskId::new(1)).unwrap();

        assert_eq!(machine.deactivate(), Some(TaskId::new(1)));
        assert_eq!(machine.deactivate(), None);
        assert_eq!(machine.engine_state().shape(), StateShape::Inactive);
    }

    #[test]
    fn test_resume_refreshes() {
        let (root, _temp) = project(&[("004-x", "- [x] a\n- [x] b\n")]);
        let machine = TaskStateMachine::resume(Some(root), Some(TaskId::new(4)));
        let state = machine.engine_state();
        assert_eq!(state.active_task_id, Some(TaskId::new(4)));
        assert_eq!(state.gate_summary.unwrap().progress(), "2/2");
    }

    #[test]
    fn test_resume_without_root_is_unmanaged() {
        let machine = TaskStateMachine::resume(None, Some(TaskId::new(4)));
        assert!(!machine.state().is_active());
    }

    #[test]
    fn test_engine_state_shapes() {
        let root = Some(ProjectRoot::new("/p"));
        let pending = crate::gates::summarize_text("- [ ] a\n");
        let cases = [
            (EngineState::unmanaged(), StateShape::Unmanaged),
            (
                EngineState {
                    project_root: root.clone(),
                    ..Default::default()
                },
                StateShape::Inactive,
            ),
            (
                EngineState {
                    active_task_id: Some(TaskId::new(1)),
                    project_root: root.clone(),
                    gate_summary: Some(pending),
                },
                StateShape::InProgress,
            ),
            (
                EngineState {
                    active_task_id: Some(TaskId::new(1)),
                    project_root: root,
                    gate_summary: Some(GateSummary::default()),
                },
                StateShape::Complete,
            ),
        ];
        for (state, expected) in cases {
            assert_eq!(state.shape(), expected);
        }
    }
}
