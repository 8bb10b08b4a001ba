//! Blocking HTTP clients for the powny/GNS remote service
//!
//! - [`HttpRuleStore`]: the versioned rule store behind `rules upload`
//! - [`ClusterControlClient`]: cluster state, job listing and termination
//! - [`EventDispatchClient`]: event submission, and [`LiveDispatcher`] for
//!   forwarding rule actions
//!
//! All clients share one [`ApiClient`] configuration (base URL and timeout)
//! and never retry.

pub mod client;
pub mod cluster;
pub mod dispatch;
pub mod error;
pub mod rules;

pub use client::{ApiClient, ApiConfig};
pub use cluster::{ClusterControlClient, ClusterState, JobSummary};
pub use dispatch::{EventDispatchClient, LiveDispatcher};
pub use error::{Error, Result};
pub use rules::HttpRuleStore;
