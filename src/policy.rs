//! Enforcement policy.
//!
//! The policy is a table from `(action, state shape)` to a verdict. Adding
//! an action kind means adding rows, not branches.
//!
//! | action          | unmanaged | inactive           | in progress              | complete |
//! |-----------------|-----------|--------------------|--------------------------|----------|
//! | edit-code       | allow     | deny: no task      | allow                    | allow    |
//! | mark-work-done  | allow     | deny: no task      | deny: gates unchecked    | allow    |
//! | status-query    | allow     | allow              | allow                    | allow    |
//!
//! # Example
//!
//! ```rust
//! use taskgate::policy::{decide, ActionKind};
//! use taskgate::root::ProjectRoot;
//! use taskgate::state::EngineState;
//!
//! let inactive = EngineState {
//!     project_root: Some(ProjectRoot::new("/work/app")),
//!     ..Default::default()
//! };
//! let decision = decide(ActionKind::EditCode, &inactive);
//! assert!(!decision.allow);
//! assert!(decision.message.contains("no active task"));
//! ```

use std::collections::HashMap;
use std::fmt;

use clap::ValueEnum;
use serde::Serialize;
use tracing::{debug, warn};

use crate::state::{EngineState, StateShape};
use crate::status::StatusFormatter;

/// Kind of action a host asks permission for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    /// Modify source files
    EditCode,
    /// Declare the unit of work finished
    MarkWorkDone,
    /// Ask for status only
    StatusQuery,
}

impl ActionKind {
    pub const ALL: [ActionKind; 3] = [Self::EditCode, Self::MarkWorkDone, Self::StatusQuery];
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::EditCode => "edit-code",
            Self::MarkWorkDone => "mark-work-done",
            Self::StatusQuery => "status-query",
        };
        f.write_str(name)
    }
}

/// Precondition a denied action is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    NoActiveTask,
    GatesRemainUnchecked,
}

impl DenyReason {
    /// What the agent should do next.
    pub fn next_step(self) -> &'static str {
        match self {
            Self::NoActiveTask => "Activate a task first: taskgate work <N>",
            Self::GatesRemainUnchecked => {
                "Finish the current gate and check its box before wrapping up"
            }
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoActiveTask => f.write_str("no active task"),
            Self::GatesRemainUnchecked => f.write_str("gates remain unchecked"),
        }
    }
}

/// Outcome of one policy row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Deny(DenyReason),
}

/// One row of the policy table.
#[derive(Debug, Clone, Copy)]
pub struct PolicyRule {
    pub action: ActionKind,
    pub shape: StateShape,
    pub verdict: Verdict,
}

const fn rule(action: ActionKind, shape: StateShape, verdict: Verdict) -> PolicyRule {
    PolicyRule {
        action,
        shape,
        verdict,
    }
}

/// The fixed enforcement policy.
pub const STANDARD_RULES: [PolicyRule; 12] = {
    use ActionKind::{EditCode, MarkWorkDone, StatusQuery};
    use DenyReason::{GatesRemainUnchecked, NoActiveTask};
    use StateShape::{Complete, InProgress, Inactive, Unmanaged};
    use Verdict::{Allow, Deny};
    [
        rule(EditCode, Unmanaged, Allow),
        rule(EditCode, Inactive, Deny(NoActiveTask)),
        rule(EditCode, InProgress, Allow),
        rule(EditCode, Complete, Allow),
        rule(MarkWorkDone, Unmanaged, Allow),
        rule(MarkWorkDone, Inactive, Deny(NoActiveTask)),
        rule(MarkWorkDone, InProgress, Deny(GatesRemainUnchecked)),
        rule(MarkWorkDone, Complete, Allow),
        rule(StatusQuery, Unmanaged, Allow),
        rule(StatusQuery, Inactive, Allow),
        rule(StatusQuery, InProgress, Allow),
        rule(StatusQuery, Complete, Allow),
    ]
};

/// Allow/deny answer plus the status line shown to the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub allow: bool,
    pub message: String,
}

/// Lookup table built from policy rules.
#[derive(Debug, Clone)]
pub struct PolicyTable {
    rules: HashMap<(ActionKind, StateShape), Verdict>,
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl PolicyTable {
    pub fn standard() -> Self {
        Self::from_rules(&STANDARD_RULES)
    }

    /// Later rules for the same key replace earlier ones.
    pub fn from_rules(rules: &[PolicyRule]) -> Self {
        Self {
            rules: rules
                .iter()
                .map(|r| ((r.action, r.shape), r.verdict))
                .collect(),
        }
    }

    pub fn verdict(&self, action: ActionKind, shape: StateShape) -> Option<Verdict> {
        self.rules.get(&(action, shape)).copied()
    }

    /// Decide whether `action` may proceed in `state`.
    ///
    /// Pure: neither the state nor any document is touched.
    pub fn decide(
        &self,
        action: ActionKind,
        state: &EngineState,
        formatter: &StatusFormatter,
    ) -> Decision {
        let shape = state.shape();
        let verdict = self.verdict(action, shape).unwrap_or_else(|| {
            warn!("No policy rule for {} in {:?}; allowing", action, shape);
            Verdict::Allow
        });
        debug!("{} in {:?} -> {:?}", action, shape, verdict);

        let status = formatter.status_line(state);
        match verdict {
            Verdict::Allow => Decision {
                allow: true,
                message: status,
            },
            Verdict::Deny(reason) => Decision {
                allow: false,
                message: format!("{status}\nBlocked: {reason}. {}", reason.next_step()),
            },
        }
    }
}

/// Decide with the standard table and default formatting.
pub fn decide(action: ActionKind, state: &EngineState) -> Decision {
    PolicyTable::standard().decide(action, state, &StatusFormatter::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gates::{summarize_text, GateSummary};
    use crate::root::ProjectRoot;
    use crate::task::TaskId;

    fn inactive() -> EngineState {
        EngineState {
            project_root: Some(ProjectRoot::new("/p")),
            ..Default::default()
        }
    }

    fn active(summary: GateSummary) -> EngineState {
        EngineState {
            active_task_id: Some(TaskId::new(3)),
            project_root: Some(ProjectRoot::new("/p")),
            gate_summary: Some(summary),
        }
    }

    #[test]
    fn test_table_is_total() {
        let table = PolicyTable::standard();
        for action in ActionKind::ALL {
            for shape in StateShape::ALL {
                assert!(
                    table.verdict(action, shape).is_some(),
                    "missing rule for {action} / {shape:?}"
                );
            }
        }
    }

    #[test]
    fn test_edit_code_inactive_denied() {
        let decision = decide(ActionKind::EditCode, &inactive());
        assert!(!decision.allow);
        assert!(decision.message.contains("no active task"));
    }

    #[test]
    fn test_edit_code_active_allowed() {
        let in_progress = active(summarize_text("- [ ] a\n"));
        let complete = active(summarize_text("- [x] a\n"));
        assert!(decide(ActionKind::EditCode, &in_progress).allow);
        assert!(decide(ActionKind::EditCode, &complete).allow);
    }

    #[test]
    fn test_mark_done_with_open_gate_denied() {
        let decision = decide(ActionKind::MarkWorkDone, &active(summarize_text("- [ ] a\n")));
        assert!(!decision.allow);
        assert!(decision.message.contains("gates remain unchecked"));
        assert!(decision.message.contains("current gate: a"));
    }

    #[test]
    fn test_mark_done_when_complete_allowed() {
        let decision = decide(ActionKind::MarkWorkDone, &active(GateSummary::default()));
        assert!(decision.allow);
        assert!(decision.message.contains("all gates checked"));
    }

    #[test]
    fn test_mark_done_inactive_denied() {
        let decision = decide(ActionKind::MarkWorkDone, &inactive());
        assert!(!decision.allow);
        assert!(decision.message.contains("no active task"));
    }

    #[test]
    fn test_status_query_always_allowed_with_message() {
        let states = [
            EngineState::unmanaged(),
            inactive(),
            active(summarize_text("- [ ] a\n")),
            active(GateSummary::default()),
        ];
        for state in &states {
            let decision = decide(ActionKind::StatusQuery, state);
            assert!(decision.allow);
            assert!(!decision.message.is_empty());
        }
    }

    #[test]
    fn test_unmanaged_is_neutral() {
        for action in ActionKind::ALL {
            assert!(decide(action, &EngineState::unmanaged()).allow);
        }
    }

    #[test]
    fn test_decide_is_repeatable() {
        let state = inactive();
        assert_eq!(
            decide(ActionKind::EditCode, &state),
            decide(ActionKind::EditCode, &state)
        );
    }

    #[test]
    fn test_custom_rules_override() {
        let mut rules = STANDARD_RULES.to_vec();
        rules.push(rule(
            ActionKind::EditCode,
            StateShape::Unmanaged,
            Verdict::Deny(DenyReason::NoActiveTask),
        ));
        let table = PolicyTable::from_rules(&rules);
        assert_eq!(
            table.verdict(ActionKind::EditCode, StateShape::Unmanaged),
            Some(Verdict::Deny(DenyReason::NoActiveTask))
        );
    }

    #[test]
    fn test_missing_rule_falls_back_to_allow() {
        let table = PolicyTable::from_rules(&[]);
        let decision = table.decide(ActionKind::EditCode, &inactive(), &StatusFormatter::default());
        assert!(decision.allow);
    }
}
