//! Command implementations for powny-cli

pub mod cluster;
pub mod config;
pub mod rules;

pub use cluster::{run_cluster_info, run_job_list, run_kill_job, run_send_event};
pub use config::run_create_config;
pub use rules::{run_exec, run_upload};
