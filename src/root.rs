//! Marker-based project root resolution.
//!
//! A directory is a project root when it satisfies one of [`ROOT_MARKERS`].
//! Resolution walks upward from a starting directory and stops at the first
//! directory that matches; nothing is cached between calls.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

/// Directory holding agent state, relative to the project root.
pub const AGENT_DIR: &str = ".agent";

/// Managed-tasks directory, relative to the project root.
pub const TASKS_DIR: &str = ".agent/tasks";

/// Top-level memory file.
pub const MIND_MAP_FILE: &str = "MIND_MAP.md";

/// Top-level project instructions file.
pub const CLAUDE_MD_FILE: &str = "CLAUDE.md";

/// A single predicate that identifies a project root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootMarker {
    /// `.agent/tasks/` directory exists
    TasksDir,
    /// `MIND_MAP.md` file exists
    MindMap,
    /// `CLAUDE.md` file exists
    ClaudeMd,
}

impl RootMarker {
    /// Path of the marker relative to a candidate directory.
    pub fn relative_path(self) -> &'static str {
        match self {
            Self::TasksDir => TASKS_DIR,
            Self::MindMap => MIND_MAP_FILE,
            Self::ClaudeMd => CLAUDE_MD_FILE,
        }
    }

    /// Check whether `dir` carries this marker.
    pub fn matches(self, dir: &Path) -> bool {
        let candidate = dir.join(self.relative_path());
        match self {
            Self::TasksDir => candidate.is_dir(),
            Self::MindMap | Self::ClaudeMd => candidate.is_file(),
        }
    }
}

/// Root marker policy, tested in order against each directory.
///
/// The broad set is used so partially initialized projects (only a
/// `CLAUDE.md`, say) still resolve. This is fixed policy, not configuration.
pub const ROOT_MARKERS: [RootMarker; 3] = [
    RootMarker::TasksDir,
    RootMarker::MindMap,
    RootMarker::ClaudeMd,
];

/// Absolute path of a resolved project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ProjectRoot(PathBuf);

impl ProjectRoot {
    /// Wrap a directory already known to be a project root.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// `<root>/.agent`
    pub fn agent_dir(&self) -> PathBuf {
        self.0.join(AGENT_DIR)
    }

    /// `<root>/.agent/tasks`
    pub fn tasks_dir(&self) -> PathBuf {
        self.0.join(TASKS_DIR)
    }
}

impl AsRef<Path> for ProjectRoot {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for ProjectRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Find the project root enclosing `start_dir`.
///
/// Returns `None` when no ancestor (including `start_dir` itself) carries a
/// marker, or when `start_dir` cannot be canonicalized. Absence is a normal
/// outcome meaning "outside any managed project".
pub fn resolve_root(start_dir: &Path) -> Option<ProjectRoot> {
    let start = match start_dir.canonicalize() {
        Ok(path) => path,
        Err(e) => {
            debug!("Cannot resolve {}: {}", start_dir.display(), e);
            return None;
        }
    };

    // ancestors() ends after the filesystem root, so the walk always terminates
    for dir in start.ancestors() {
        if let Some(marker) = ROOT_MARKERS.iter().find(|m| m.matches(dir)) {
            debug!("Project root {} (marker {:?})", dir.display(), marker);
            return Some(ProjectRoot::new(dir));
        }
    }

    debug!("No project root above {}", start.display());
    None
}
