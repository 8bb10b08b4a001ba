//! Data model shared by synchronization and evaluation

mod event;
mod rule;

pub use event::Event;
pub use rule::{Rule, RuleSet};
