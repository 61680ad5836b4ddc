//! Numeric task identifiers.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Task folders are named `NNN-slug`.
static FOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)-").expect("static regex is valid"));

/// Numeric identifier of a task, displayed zero-padded to three digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(u32);

/// Error returned when a string is not a task number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{input}' is not a task number")]
pub struct ParseTaskIdError {
    input: String,
}

impl TaskId {
    pub fn new(number: u32) -> Self {
        Self(number)
    }

    pub fn number(self) -> u32 {
        self.0
    }

    /// Extract the id from a task folder name such as `007-add-login`.
    pub fn from_folder_name(name: &str) -> Option<Self> {
        FOLDER_RE
            .captures(name)
            .and_then(|caps| caps[1].parse().ok())
            .map(Self)
    }
}

impl FromStr for TaskId {
    type Err = ParseTaskIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseTaskIdError {
                input: s.to_string(),
            });
        }
        trimmed.parse().map(Self).map_err(|_| ParseTaskIdError {
            input: s.to_string(),
        })
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}", self.0)
    }
}
