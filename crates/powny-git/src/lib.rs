//! Git access for powny rule repositories
//!
//! Rule repositories are plain git working directories. This crate opens
//! them, walks their commit history lazily and materializes file snapshots
//! at arbitrary commits.

pub mod commits;
pub mod error;
pub mod repository;

pub use commits::{CommitInfo, History};
pub use error::{Error, Result};
pub use repository::GitRepository;
