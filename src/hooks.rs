//! Hook adapter between the host runtime and the enforcement engine.
//!
//! The host runs `taskgate hook run <type>` for each intercepted action and
//! pipes its JSON payload on stdin. The adapter maps the payload to an
//! [`ActionKind`], rebuilds engine state from disk, and returns a
//! [`Decision`]. Exit code 0 lets the action proceed; 2 blocks it.

use clap::ValueEnum;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use taskgate::policy::{ActionKind, Decision, PolicyTable};
use taskgate::root::resolve_root;
use taskgate::session::SessionStore;
use taskgate::state::{EngineState, TaskStateMachine};
use taskgate::status::StatusFormatter;
use taskgate::GateConfig;
use tracing::debug;

/// Exit code telling the host to block the action
pub const BLOCK_EXIT_CODE: i32 = 2;

/// Tools that modify files
const EDIT_TOOLS: &[&str] = &["Edit", "Write", "MultiEdit", "NotebookEdit"];

/// Types of hooks that can be run
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum HookType {
    /// Before a tool runs: file-editing tools need an active task
    PreToolUse,
    /// Agent wants to stop: every gate must be checked
    Stop,
    /// User prompt submitted: status only
    PromptSubmit,
}

/// Fields of the host payload that taskgate reads
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HookInput {
    #[serde(default)]
    pub cwd: Option<PathBuf>,
    #[serde(default)]
    pub tool_name: Option<String>,
}

impl HookInput {
    /// Parse a host payload. Empty or non-JSON input yields an empty payload.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
            return Self::default();
        };
        serde_json::from_str(raw).unwrap_or_else(|e| {
            debug!("Hook input is not a JSON payload: {}", e);
            Self::default()
        })
    }
}

/// Map a hook invocation to the action it asks permission for
pub fn action_for(hook_type: HookType, input: &HookInput) -> ActionKind {
    match hook_type {
        HookType::PreToolUse => match input.tool_name.as_deref() {
            Some(tool) if EDIT_TOOLS.contains(&tool) => ActionKind::EditCode,
            _ => ActionKind::StatusQuery,
        },
        HookType::Stop => ActionKind::MarkWorkDone,
        HookType::PromptSubmit => ActionKind::StatusQuery,
    }
}

/// Decide `action` for the project enclosing `cwd`.
///
/// Every input maps to a decision; there is no error path.
pub fn evaluate(action: ActionKind, cwd: &Path, session_id: Option<&str>) -> Decision {
    let table = PolicyTable::standard();

    let Some(root) = resolve_root(cwd) else {
        return table.decide(action, &EngineState::unmanaged(), &StatusFormatter::default());
    };

    let config = GateConfig::load_or_default(root.path());
    let active = SessionStore::new(&root, session_id)
        .load()
        .map(|a| a.task_id);
    let machine = TaskStateMachine::resume(Some(root), active);

    table.decide(
        action,
        &machine.engine_state(),
        &StatusFormatter::new(config.status_text_width),
    )
}

/// Run a hook with the given host payload
pub fn run_hook(
    hook_type: HookType,
    raw_input: Option<&str>,
    fallback_cwd: &Path,
    session_id: Option<&str>,
) -> Decision {
    let input = HookInput::parse(raw_input);
    let action = action_for(hook_type, &input);
    decide_action(action, &input, fallback_cwd, session_id)
}

/// Evaluate an explicit action kind, taking the working directory from the
/// payload when present
pub fn decide_action(
    action: ActionKind,
    input: &HookInput,
    fallback_cwd: &Path,
    session_id: Option<&str>,
) -> Decision {
    let cwd = input.cwd.as_deref().unwrap_or(fallback_cwd);
    debug!("Hook {} in {}", action, cwd.display());
    evaluate(action, cwd, session_id)
}

/// Exit status the host understands for a decision
pub fn exit_code(decision: &Decision) -> i32 {
    if decision.allow {
        0
    } else {
        BLOCK_EXIT_CODE
    }
}
