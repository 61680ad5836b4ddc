//! Task documents and the managed-tasks directory.
//!
//! - [`id`] - numeric task identifiers
//! - [`document`] - one task's text and the sections read from it
//! - [`store`] - lookup, listing and the edits the CLI performs
//! - [`template`] - skeletons for new task documents

pub mod document;
pub mod id;
pub mod store;
pub mod template;

pub use document::{TaskDocument, TASK_FILE};
pub use id::{ParseTaskIdError, TaskId};
pub use store::{slugify, CheckOff, TaskEntry, TaskStore};
pub use template::{render_task, Pattern, TaskType};
