//! Local evaluation of rules against synthetic events
//!
//! Rule files are TOML documents with a `[meta]` table, a `[match]` table
//! of field conditions and a list of `[[actions]]`:
//!
//! ```toml
//! [meta]
//! description = "Page on critical disk alerts"
//!
//! [match]
//! host = "web-*"
//! severity = ["CRIT", "WARN"]
//! service = { regex = "^disk_" }
//!
//! [[actions]]
//! kind = "notify"
//! message = "{{host}}/{{service}} is {{severity}}"
//! ```
//!
//! [`Evaluator::check`] never performs an action; it only reports what each
//! matching rule would emit.

mod definition;
mod dispatch;
mod evaluator;
mod matcher;
mod result;

pub use dispatch::{Action, ActionDispatcher, DispatchRecord, RecordingDispatcher};
pub use evaluator::Evaluator;
pub use result::{ExecutionResult, RuleLoadError, RuleMatch};
