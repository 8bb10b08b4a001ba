//! Synchronizing a local rule set to the remote rule store
//!
//! An upload fetches the remote snapshot, checks it against what this
//! checkout last synchronized ([`SyncState`]), and pushes the
//! [`UploadManifest`] that turns the remote into the local rule set.

mod manifest;
mod state;
mod uploader;

pub use manifest::{Change, ManifestEntry, UploadManifest};
pub use state::SyncState;
pub use uploader::{UploadOptions, UploadReport, Uploader};
