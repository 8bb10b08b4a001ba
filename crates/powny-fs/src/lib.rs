//! Filesystem helpers for the powny rule tooling
//!
//! Provides normalized paths, content checksums, atomic writes and
//! format-agnostic configuration loading.

pub mod checksum;
pub mod config;
pub mod error;
pub mod io;
pub mod path;

pub use checksum::{compute_bytes_checksum, compute_content_checksum};
pub use config::ConfigStore;
pub use error::{Error, Result};
pub use path::NormalizedPath;
