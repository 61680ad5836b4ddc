//! Configuration management for taskgate.
//!
//! Which directories count as project roots and which actions are gated is
//! fixed policy (see [`crate::root`] and [`crate::policy`]). The knobs here
//! only affect housekeeping and presentation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::error::{Result, TaskGateError};
use crate::root::AGENT_DIR;

/// Config file name inside the agent directory
pub const CONFIG_FILE: &str = "taskgate.json";

/// Upper bound for `staleSessionHours` (one year)
pub const MAX_STALE_SESSION_HOURS: u64 = 24 * 366;

/// Per-project settings from `.agent/taskgate.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GateConfig {
    /// Per-session pointer files older than this are pruned on activation
    pub stale_session_hours: u64,

    /// How many following gates to list after a check-off
    pub upcoming_gates: usize,

    /// Maximum characters of gate text shown in the status line
    pub status_text_width: usize,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            stale_session_hours: 24,
            upcoming_gates: 3,
            status_text_width: 160,
        }
    }
}

impl GateConfig {
    /// Get the config file path for a project
    pub fn path(project_dir: &Path) -> PathBuf {
        project_dir.join(AGENT_DIR).join(CONFIG_FILE)
    }

    /// Load config for a project, falling back to defaults when absent
    pub fn load(project_dir: &Path) -> Result<Self> {
        let path = Self::path(project_dir);

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        let config: GateConfig = serde_json::from_str(&content).map_err(|e| {
            TaskGateError::config_with_path(format!("{}: {}", CONFIG_FILE, e), path.clone())
        })?;
        config
            .validate()
            .map_err(|reason| TaskGateError::config_with_path(reason, path))?;
        Ok(config)
    }

    /// Load config, logging and falling back to defaults on any problem.
    ///
    /// Used on the hook path, which must always produce a decision.
    pub fn load_or_default(project_dir: &Path) -> Self {
        Self::load(project_dir).unwrap_or_else(|e| {
            warn!("Ignoring project config: {}", e);
            Self::default()
        })
    }

    /// Validate config values
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.stale_session_hours == 0 || self.stale_session_hours > MAX_STALE_SESSION_HOURS {
            return Err(format!(
                "staleSessionHours must be between 1 and {} (got {})",
                MAX_STALE_SESSION_HOURS, self.stale_session_hours
            ));
        }
        if self.status_text_width < 8 {
            return Err(format!(
                "statusTextWidth must be at least 8 (got {})",
                self.status_text_width
            ));
        }
        Ok(())
    }

    /// Stale session threshold as a duration
    pub fn stale_session_age(&self) -> Duration {
        Duration::from_secs(self.stale_session_hours.saturating_mul(3600))
    }
}
