//! Task documents and the few sections taskgate reads from them.
//!
//! Headings other than `## Status` and `## Intent` are opaque; gates are
//! found anywhere in the text.

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::TaskId;
use crate::error::Result;
use crate::gates::{parse_gates, summarize, Gate, GateSummary};

/// File name of the task document inside its task folder
pub const TASK_FILE: &str = "task.md";

/// Status heading
const STATUS_HEADING: &str = "## Status";

/// Headings whose first line describes what the task is for
const INTENT_HEADINGS: [&str; 2] = ["## Intent", "## Problem"];

/// Raw text of one task document.
#[derive(Debug, Clone, Serialize)]
pub struct TaskDocument {
    pub id: TaskId,
    /// Folder name, e.g. `007-add-login`
    pub name: String,
    pub path: PathBuf,
    #[serde(skip)]
    pub text: String,
}

impl TaskDocument {
    /// Read `<task_dir>/task.md`.
    pub fn load(id: TaskId, task_dir: &Path) -> Result<Self> {
        let path = task_dir.join(TASK_FILE);
        let text = std::fs::read_to_string(&path)?;
        let name = task_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            id,
            name,
            path,
            text,
        })
    }

    /// Path of the document relative to `root`, or the absolute path when it
    /// lives elsewhere.
    pub fn relative_path(&self, root: &Path) -> PathBuf {
        self.path
            .strip_prefix(root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| self.path.clone())
    }

    pub fn gates(&self) -> Vec<Gate> {
        parse_gates(&self.text)
    }

    pub fn summary(&self) -> GateSummary {
        summarize(&self.gates())
    }

    /// Status line, or `unknown` when the document has none.
    pub fn status(&self) -> String {
        extract_status(&self.text).unwrap_or_else(|| "unknown".to_string())
    }

    pub fn is_done(&self) -> bool {
        self.status().starts_with("done")
    }

    pub fn intent(&self) -> String {
        extract_intent(&self.text)
    }
}

/// Line following the last `## Status` heading.
pub fn extract_status(text: &str) -> Option<String> {
    let lines: Vec<&str> = text.lines().collect();
    let idx = lines.iter().rposition(|l| l.trim() == STATUS_HEADING)?;
    lines.get(idx + 1).map(|l| l.trim().to_string())
}

/// First non-empty line of the Intent (or Problem) section, with wrapping
/// parentheses removed.
pub fn extract_intent(text: &str) -> String {
    let mut in_section = false;
    for line in text.lines() {
        let trimmed = line.trim();
        if INTENT_HEADINGS.contains(&trimmed) {
            in_section = true;
            continue;
        }
        if !in_section || trimmed.is_empty() {
            continue;
        }
        if trimmed.starts_with("##") {
            break;
        }
        return trimmed
            .strip_prefix('(')
            .and_then(|t| t.strip_suffix(')'))
            .unwrap_or(trimmed)
            .to_string();
    }
    String::new()
}

/// Replace the content of one 1-based line, keeping every line terminator
/// in the document as it was.
pub fn replace_line(text: &str, line_number: usize, content: &str) -> String {
    let mut out = String::with_capacity(text.len() + content.len());
    for (idx, segment) in text.split_inclusive('\n').enumerate() {
        if idx + 1 == line_number {
            let body_len = segment.trim_end_matches(['\r', '\n']).len();
            out.push_str(content);
            out.push_str(&segment[body_len..]);
        } else {
            out.push_str(segment);
        }
    }
    out
}

/// Rewrite the line after the last `## Status` heading. Returns `None` when
/// the document has no status line to rewrite.
pub fn set_status_line(text: &str, status: &str) -> Option<String> {
    let lines: Vec<&str> = text.lines().collect();
    let idx = lines.iter().rposition(|l| l.trim() == STATUS_HEADING)?;
    if idx + 1 >= lines.len() {
        return None;
    }
    // idx is 0-based; the status line is the one after the heading
    Some(replace_line(text, idx + 2, status))
}
