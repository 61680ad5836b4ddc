//! Task document skeletons and playbook pattern lookup.
//!
//! A new task document gets a fixed skeleton (title, status, intent and a
//! starter work plan). When a playbook skill file is installed, the pattern
//! matching the task type is appended below it.
//!
//! # Example
//!
//! ```rust
//! use taskgate::task::{render_task, TaskId, TaskType};
//!
//! let doc = render_task(TaskId::new(3), "Add Login", Some(TaskType::Feature));
//! assert!(doc.starts_with("# 003 - Add Login"));
//! assert!(doc.contains("- Playbook: Build"));
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::Serialize;
use tracing::debug;

use super::TaskId;

/// Playbook skill location relative to a project root or home directory
const PLAYBOOK_SKILL: &str = ".claude/skills/playbook/SKILL.md";

/// Kind of work a task represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Feature,
    Bugfix,
    Refactor,
    Explore,
    Research,
    Spike,
    Decision,
    Review,
    Commit,
    Test,
}

/// Playbook pattern a task type is worked with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Pattern {
    Build,
    Investigate,
    Decide,
    Evaluate,
}

impl TaskType {
    #[must_use]
    pub fn pattern(self) -> Pattern {
        match self {
            Self::Feature | Self::Refactor | Self::Commit => Pattern::Build,
            Self::Bugfix | Self::Explore | Self::Research | Self::Spike => Pattern::Investigate,
            Self::Decision => Pattern::Decide,
            Self::Review | Self::Test => Pattern::Evaluate,
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_possible_value() {
            Some(value) => write!(f, "{}", value.get_name()),
            None => write!(f, "{:?}", self),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Capitalize the first letter of every word, lowercase the rest.
#[must_use]
pub fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut at_word_start = true;
    for c in name.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = !c.is_alphanumeric();
        }
    }
    out
}

/// Render the skeleton of a new task document.
#[must_use]
pub fn render_task(id: TaskId, title: &str, task_type: Option<TaskType>) -> String {
    let mut doc = format!(
        "# {id} - {title}\n\
         \n\
         ## Status\n\
         pending\n\
         \n\
         > Activate with `taskgate work {number}` before starting. Hooks only enforce gates for the active task.\n\
         \n\
         ## Intent\n\
         (what we want to achieve - the outcome, not the activity)\n\
         \n",
        number = id.number(),
    );

    if let Some(task_type) = task_type {
        doc.push_str(&format!(
            "## References\n- Type: {task_type}\n- Playbook: {}\n\n",
            task_type.pattern()
        ));
    }

    doc.push_str(
        "## Work Plan\n\
         - [ ] Restate the request and what \"done\" looks like\n\
         - [ ] Do the work, one gate at a time\n\
         - [ ] Verify the result against the intent\n",
    );
    doc
}

/// Stub `MIND_MAP.md` for a freshly initialized project.
#[must_use]
pub fn mind_map_stub(title: &str) -> String {
    format!("# {title}\n\n## Architecture\n\n(describe your project architecture here)\n")
}

/// Stub `CLAUDE.md` for a freshly initialized project.
#[must_use]
pub fn claude_md_stub(title: &str) -> String {
    format!(
        "# {title}\n\n\
         Work is tracked in `.agent/tasks/<NNN-name>/task.md`.\n\
         \n\
         - Activate a task before editing code: `taskgate work <N>`\n\
         - Work one gate at a time; check the box when the gate is done\n\
         - Finish with `taskgate work done`\n"
    )
}

/// Locate the playbook skill file: project-local first, then home.
pub fn find_playbook_skill(project_dir: Option<&Path>) -> Option<PathBuf> {
    let local = project_dir.map(|dir| dir.join(PLAYBOOK_SKILL));
    let home = dirs::home_dir().map(|home| home.join(PLAYBOOK_SKILL));
    [local, home].into_iter().flatten().find(|p| p.is_file())
}

/// Extract the ```markdown block under `### <pattern>` from a skill file.
#[must_use]
pub fn extract_pattern_template(skill: &str, pattern: Pattern) -> Option<String> {
    let heading = format!("### {pattern}");
    let mut in_section = false;
    let mut in_block = false;
    let mut lines = Vec::new();

    for line in skill.lines() {
        if !in_section {
            in_section = line.trim() == heading;
            continue;
        }
        if !in_block {
            if line.starts_with("### ") {
                break;
            }
            in_block = line.trim() == "```markdown";
            continue;
        }
        if line.trim() == "```" {
            break;
        }
        lines.push(line);
    }

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

/// Load the pattern template for a task type, if a playbook is installed.
pub fn load_pattern_template(project_dir: Option<&Path>, task_type: TaskType) -> Option<String> {
    let path = find_playbook_skill(project_dir)?;
    let skill = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) => {
            debug!("Cannot read playbook {}: {}", path.display(), e);
            return None;
        }
    };
    extract_pattern_template(&skill, task_type.pattern())
}
