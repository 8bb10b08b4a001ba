//! Rule synchronization and local evaluation for powny
//!
//! This crate keeps an operator's git checkout of rules consistent with the
//! cluster's authoritative rule store, and evaluates the same rules locally
//! against synthetic events:
//!
//! - **RuleRepository**: the local checkout, its rule set and history
//! - **Uploader**: conflict-checked, all-or-nothing synchronization
//! - **Evaluator**: side-effect-free local rule evaluation
//! - **RemoteRuleStore**: the seam the HTTP client (and tests) plug into
//!
//! # Architecture
//!
//! ```text
//!                  powny-cli
//!                   |     |
//!          powny-core --- powny-api
//!             |     |
//!      powny-git   powny-fs
//! ```
//!
//! # Example
//!
//! ```ignore
//! use powny_core::{RuleRepository, Uploader, UploadOptions};
//!
//! let repo = RuleRepository::open("/srv/rules")?;
//! let local = repo.current_rule_set()?;
//! let report = Uploader::new(&repo, &remote).upload(&local, &UploadOptions::default())?;
//! println!("remote now at {}", report.version);
//! ```

pub mod check;
pub mod error;
pub mod model;
pub mod remote;
pub mod repository;
pub mod settings;
pub mod sync;

pub use check::{
    Action, ActionDispatcher, DispatchRecord, Evaluator, ExecutionResult, RecordingDispatcher,
    RuleLoadError, RuleMatch,
};
pub use error::{Error, Result};
pub use model::{Event, Rule, RuleSet};
pub use remote::{MemoryRuleStore, RemoteRuleStore, RemoteSnapshot};
pub use repository::RuleRepository;
pub use settings::Settings;
pub use sync::{
    Change, ManifestEntry, SyncState, UploadManifest, UploadOptions, UploadReport, Uploader,
};
