//! Gate summaries: progress counts and the current gate.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use super::parser::{parse_gates, Gate};

/// Derived progress view over a sequence of gates.
///
/// `current_gate` is the first unchecked gate in document order. When it is
/// absent the task is complete, which includes the `0/0` case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GateSummary {
    pub done_count: usize,
    pub total_count: usize,
    pub current_gate: Option<Gate>,
}

impl GateSummary {
    /// True when no unchecked gate remains.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.current_gate.is_none()
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.total_count - self.done_count
    }

    /// Compact `done/total` rendering.
    #[must_use]
    pub fn progress(&self) -> String {
        format!("{}/{}", self.done_count, self.total_count)
    }
}

/// Count gates and locate the current one.
#[must_use]
pub fn summarize(gates: &[Gate]) -> GateSummary {
    GateSummary {
        done_count: gates.iter().filter(|g| g.checked).count(),
        total_count: gates.len(),
        current_gate: gates.iter().find(|g| !g.checked).cloned(),
    }
}

/// Parse and summarize in one step.
#[must_use]
pub fn summarize_text(text: &str) -> GateSummary {
    summarize(&parse_gates(text))
}

/// Read a task document and summarize its gates.
///
/// A missing or unreadable document yields an empty summary rather than an
/// error.
#[must_use]
pub fn load_summary(path: &Path) -> GateSummary {
    match std::fs::read_to_string(path) {
        Ok(text) => summarize_text(&text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("Task document {} missing; no gates", path.display());
            GateSummary::default()
        }
        Err(e) => {
            warn!("Cannot read task document {}: {}", path.display(), e);
            GateSummary::default()
        }
    }
}

/// Unchecked gates following `after_line`, at most `limit` of them.
#[must_use]
pub fn upcoming_gates(gates: &[Gate], after_line: usize, limit: usize) -> Vec<&Gate> {
    gates
        .iter()
        .filter(|g| g.line_number > after_line && !g.checked)
        .take(limit)
        .collect()
}
