//! taskgate - Task Gate State Engine
//!
//! Turns the checkbox lines of a task document into workflow state and
//! decides, per intercepted agent action, whether that action may proceed.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`root`] - Marker-based project root resolution
//! - [`gates`] - Gate parsing and progress summaries
//! - [`task`] - Task documents and the managed-tasks directory
//! - [`session`] - Persistence of the active-task pointer
//! - [`state`] - Task state machine and engine snapshot
//! - [`policy`] - Enforcement table and decisions
//! - [`status`] - Status line rendering
//! - [`config`] - Per-project settings
//! - [`error`] - Custom error types and handling
//!
//! # Example
//!
//! ```rust,ignore
//! use taskgate::policy::{decide, ActionKind};
//! use taskgate::root::resolve_root;
//! use taskgate::session::SessionStore;
//! use taskgate::state::TaskStateMachine;
//!
//! let root = resolve_root(&std::env::current_dir()?);
//! let active = root
//!     .as_ref()
//!     .and_then(|r| SessionStore::new(r, None).load())
//!     .map(|a| a.task_id);
//! let machine = TaskStateMachine::resume(root, active);
//! let decision = decide(ActionKind::EditCode, &machine.engine_state());
//! println!("{}", decision.message);
//! ```

pub mod config;
pub mod error;
pub mod gates;
pub mod policy;
pub mod root;
pub mod session;
pub mod state;
pub mod status;
pub mod task;

// Re-export commonly used types
pub use error::{Result, TaskGateError};

pub use config::GateConfig;
pub use gates::{parse_gates, summarize, Gate, GateSummary};
pub use policy::{decide, ActionKind, Decision, PolicyTable};
pub use root::{resolve_root, ProjectRoot};
pub use session::{ActiveTask, SessionStore};
pub use state::{EngineState, StateShape, TaskState, TaskStateMachine};
pub use status::StatusFormatter;
pub use task::{TaskDocument, TaskId, TaskStore};
