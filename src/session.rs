//! Persistence of the active-task pointer between hook invocations.
//!
//! Every hook call is a fresh process, so the pointer set by `work <N>` is
//! kept in `.agent/session.json` (or `.agent/session.<id>.json` when a
//! session id is given). The state machine never reads this file; the CLI
//! loads the pointer and passes it in.
//!
//! Writes are atomic (temp file + rename) but unsynchronized: two sessions
//! sharing one pointer file overwrite each other, last write wins.

use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::root::ProjectRoot;
use crate::task::TaskId;

/// Pointer file stem.
const SESSION_STEM: &str = "session";

/// Temporary file suffix for atomic writes.
const TMP_SUFFIX: &str = ".tmp";

/// The task bound to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveTask {
    pub task_id: TaskId,
    pub activated_at: DateTime<Utc>,
}

impl ActiveTask {
    pub fn new(task_id: TaskId) -> Self {
        Self {
            task_id,
            activated_at: Utc::now(),
        }
    }
}

/// Reads and writes the pointer file for one session.
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
    session_id: Option<String>,
}

impl SessionStore {
    /// Creates a store for `session_id` (or the shared default session).
    #[must_use]
    pub fn new(root: &ProjectRoot, session_id: Option<&str>) -> Self {
        Self {
            dir: root.agent_dir(),
            session_id: session_id
                .map(sanitize_session_id)
                .filter(|id| !id.is_empty()),
        }
    }

    /// Returns the path to the pointer file.
    #[must_use]
    pub fn pointer_path(&self) -> PathBuf {
        match &self.session_id {
            Some(id) => self.dir.join(format!("{SESSION_STEM}.{id}.json")),
            None => self.dir.join(format!("{SESSION_STEM}.json")),
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut path = self.pointer_path().into_os_string();
        path.push(TMP_SUFFIX);
        PathBuf::from(path)
    }

    /// Loads the active task, if any.
    ///
    /// A missing file means no active task. A corrupted file is logged,
    /// deleted, and also read as no active task.
    pub fn load(&self) -> Option<ActiveTask> {
        let path = self.pointer_path();
        let contents = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Cannot read session file {}: {}", path.display(), e);
                return None;
            }
        };

        match serde_json::from_str(&contents) {
            Ok(active) => Some(active),
            Err(e) => {
                warn!(
                    "Corrupted session file at {}: {}. Deleting and starting fresh.",
                    path.display(),
                    e
                );
                let _ = fs::remove_file(&path);
                None
            }
        }
    }

    /// Saves the active task atomically.
    pub fn save(&self, active: &ActiveTask) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let tmp_path = self.tmp_path();
        let json = serde_json::to_string_pretty(active)?;

        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(json.as_bytes())?;
        tmp_file.sync_all()?;

        fs::rename(&tmp_path, self.pointer_path())?;
        debug!("Session pointer -> task {}", active.task_id);
        Ok(())
    }

    /// Removes the pointer, returning what it pointed to.
    pub fn clear(&self) -> Result<Option<ActiveTask>> {
        let previous = self.load();
        let path = self.pointer_path();
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(previous)
    }

    /// Deletes per-session pointer files not modified within `max_age`.
    /// The shared default pointer and this session's own file are kept.
    pub fn prune_stale(&self, max_age: Duration) -> usize {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return 0;
        };
        let Some(cutoff) = SystemTime::now().checked_sub(max_age) else {
            return 0;
        };
        let own = self.pointer_path();
        let prefix = format!("{SESSION_STEM}.");
        let mut removed = 0;

        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();
            let is_session_file = name.starts_with(&prefix)
                && name.ends_with(".json")
                && name != format!("{SESSION_STEM}.json");
            if !is_session_file || path == own {
                continue;
            }

            let stale = entry
                .metadata()
                .and_then(|m| m.modified())
                .map(|modified| modified < cutoff)
                .unwrap_or(false);
            if stale && fs::remove_file(&path).is_ok() {
                debug!("Pruned stale session file {}", path.display());
                removed += 1;
            }
        }

        removed
    }
}

/// Keep session ids safe for use in a file name.
fn sanitize_session_id(id: &str) -> String {
    id.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
