//! Status line rendering.
//!
//! The status line is the only information the engine hands back besides
//! allow/deny. It is built from [`EngineState`] alone.

use crate::gates::Gate;
use crate::state::{EngineState, StateShape};

/// Prefix on every status line so the host can tell where it came from.
pub const STATUS_PREFIX: &str = "[taskgate]";

/// Renders engine state into compact, single-line text.
#[derive(Debug, Clone, Copy)]
pub struct StatusFormatter {
    text_width: usize,
}

impl Default for StatusFormatter {
    fn default() -> Self {
        Self { text_width: 160 }
    }
}

impl StatusFormatter {
    /// `text_width` caps the characters of gate text shown.
    pub fn new(text_width: usize) -> Self {
        Self {
            text_width: text_width.max(2),
        }
    }

    /// Gate text cut to the configured width, on a character boundary.
    pub fn gate_text(&self, gate: &Gate) -> String {
        truncate(gate.raw_text.trim_end(), self.text_width)
    }

    /// One-line summary of `state`.
    pub fn status_line(&self, state: &EngineState) -> String {
        let (task, summary) = match (state.shape(), state.active_task_id) {
            (StateShape::Unmanaged, _) => {
                return format!("{STATUS_PREFIX} outside any managed project");
            }
            (StateShape::Inactive, _) | (_, None) => {
                return format!("{STATUS_PREFIX} no active task");
            }
            (_, Some(task)) => (task, state.gate_summary.clone().unwrap_or_default()),
        };

        let head = match &summary.current_gate {
            Some(gate) => format!("current gate: {}", self.gate_text(gate)),
            None => "all gates checked".to_string(),
        };
        format!(
            "{STATUS_PREFIX} task {task} | {} | {head}",
            summary.progress()
        )
    }

    /// Indented list of gates, one per line.
    pub fn gate_list(&self, gates: &[Gate]) -> String {
        gates
            .iter()
            .map(|g| format!("  - [ ] {}", self.gate_text(g)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width - 1).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gates::{summarize_text, GateSummary};
    use crate::root::ProjectRoot;
    use crate::task::TaskId;

    fn active(text: &str) -> EngineState {
        EngineState {
            active_task_id: Some(TaskId::new(7)),
            project_root: Some(ProjectRoot::new("/p")),
            gate_summary: Some(summarize_text(text)),
        }
    }

    #[test]
    fn test_in_progress_line() {
        let state = active("- [x] a\n- [x] b\n- [ ] Write tests\n");
        assert_eq!(
            StatusFormatter::default().status_line(&state),
            "[taskgate] task 007 | 2/3 | current gate: Write tests"
        );
    }

    #[test]
    fn test_complete_line() {
        let state = active("- [x] a\n");
        assert!(StatusFormatter::default()
            .status_line(&state)
            .ends_with("1/1 | all gates checked"));
    }

    #[test]
    fn test_zero_gates_line() {
        let mut state = active("");
        state.gate_summary = Some(GateSummary::default());
        assert!(StatusFormatter::default()
            .status_line(&state)
            .contains("0/0 | all gates checked"));
    }

    #[test]
    fn test_inactive_and_unmanaged_lines() {
        let formatter = StatusFormatter::default();
        let inactive = EngineState {
            project_root: Some(ProjectRoot::new("/p")),
            ..Default::default()
        };
        assert_eq!(formatter.status_line(&inactive), "[taskgate] no active task");
        assert!(formatter
            .status_line(&EngineState::unmanaged())
            .contains("outside any managed project"));
    }

    #[test]
    fn test_gate_text_truncated_on_char_boundary() {
        let state = active("- [ ] ééééééééééé\n");
        let line = StatusFormatter::new(5).status_line(&state);
        assert!(line.ends_with("current gate: éééé…"));
    }

    #[test]
    fn test_gate_list() {
        let gates = crate::gates::parse_gates("- [ ] a\n- [ ] b\n");
        assert_eq!(
            StatusFormatter::default().gate_list(&gates),
            "  - [ ] a\n  - [ ] b"
        );
    }
}
