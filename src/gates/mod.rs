//! Gate parsing and progress summaries.
//!
//! Gates are the checkbox lines of a task document. The parser turns
//! document text into an ordered list of [`Gate`]s; the summary derives
//! `done/total` and the current gate from that list.

pub mod parser;
pub mod summary;

pub use parser::{check_line, classify_line, parse_gates, Checkbox, Gate, LineClass};
pub use summary::{load_summary, summarize, summarize_text, upcoming_gates, GateSummary};
