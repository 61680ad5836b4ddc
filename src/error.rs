//! Custom error types for taskgate.
//!
//! Only conditions the caller must act on are errors. Resolution misses,
//! unreadable task documents and malformed gate lines are absorbed into
//! neutral states elsewhere and never surface here.

use std::path::PathBuf;
use thiserror::Error;

use crate::task::TaskId;

/// Main error type for taskgate operations
#[derive(Error, Debug)]
pub enum TaskGateError {
    // =========================================================================
    // Task Errors
    // =========================================================================
    /// No task document exists for the requested identifier
    #[error("Task {id} not found")]
    TaskNotFound { id: TaskId },

    /// An operation needed an active task but none is bound to the session
    #[error("No active task (activate with: taskgate work <N>)")]
    NoActiveTask,

    /// Check-off requested but every gate is already checked
    #[error("No unchecked gate in task {id}")]
    NoOpenGate { id: TaskId },

    /// Task name could not be turned into a folder slug
    #[error("Invalid task name: {reason}")]
    InvalidTaskName { reason: String },

    /// A numbered task name does not match the next free number
    #[error("Provided task number {provided:03} doesn't match next number {expected:03}")]
    TaskNumberMismatch { provided: u32, expected: u32 },

    /// The highest existing task number leaves no room for another task
    #[error("No task number left after {highest}")]
    TaskNumbersExhausted { highest: u32 },

    // =========================================================================
    // Project Errors
    // =========================================================================
    /// No managed project encloses the starting directory
    #[error("Not inside a managed project (searched upward from {})", .start.display())]
    NotInProject { start: PathBuf },

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Failed to load configuration
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        path: Option<PathBuf>,
    },

    // =========================================================================
    // Wrapped Errors
    // =========================================================================
    /// IO error wrapper
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON error wrapper
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl TaskGateError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            path: None,
        }
    }

    /// Create a configuration error with path
    pub fn config_with_path(message: impl Into<String>, path: PathBuf) -> Self {
        Self::Config {
            message: message.into(),
            path: Some(path),
        }
    }

    /// Check if the user can fix this by activating or editing a task
    pub fn is_actionable(&self) -> bool {
        matches!(
            self,
            Self::TaskNotFound { .. }
                | Self::NoActiveTask
                | Self::NoOpenGate { .. }
                | Self::InvalidTaskName { .. }
                | Self::TaskNumberMismatch { .. }
        )
    }

    /// Get error code for exit status.
    ///
    /// Code 2 is reserved for hook denials, which are not errors.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotInProject { .. } => 6,
            Self::Config { .. } => 7,
            _ => 1,
        }
    }
}

/// Type alias for taskgate results
pub type Result<T> = std::result::Result<T, TaskGateError>;
