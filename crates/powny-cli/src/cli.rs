//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// powny - Manage GNS rules and cluster jobs
#[derive(Parser, Debug)]
#[command(name = "powny")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Configuration file (default: <config dir>/powny-cli/config.yaml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Write the default configuration file
    CreateConfig {
        /// Overwrite an existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Manage GNS rules
    Rules {
        /// Path to the rules checkout
        #[arg(
            short = 'r',
            long,
            env = "GNS_RULES_PATH",
            default_value = ".",
            global = true
        )]
        rules_path: PathBuf,

        #[command(subcommand)]
        action: RulesAction,
    },

    /// Talk to the GNS cluster
    Gns {
        #[command(flatten)]
        api: ApiArgs,

        #[command(subcommand)]
        action: GnsAction,
    },

    /// Generate shell completions
    ///
    /// Examples:
    ///   powny completions bash > ~/.local/share/bash-completion/completions/powny
    ///   powny completions zsh > ~/.zfunc/_powny
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Where the GNS service lives
#[derive(Args, Debug, Clone, PartialEq, Eq, Default)]
pub struct ApiArgs {
    /// GNS API base URL
    #[arg(long, env = "GNS_API_URL", global = true)]
    pub api_url: Option<String>,
}

/// Rules subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum RulesAction {
    /// Upload new or changed rules to GNS
    ///
    /// Fails when someone else changed the remote rules since this checkout
    /// last synchronized, unless --force is given.
    Upload {
        /// Change message (default: latest commit summary)
        #[arg(short, long)]
        message: Option<String>,

        /// Overwrite remote changes
        #[arg(short, long)]
        force: bool,

        /// Show what would be uploaded without pushing
        #[arg(long)]
        dry_run: bool,

        #[command(flatten)]
        api: ApiArgs,
    },

    /// Run the rules locally against an event
    Exec {
        /// JSON file describing the event
        #[arg(short, long = "event-desc", value_name = "FILE")]
        event_desc: PathBuf,

        /// Output the result as JSON
        #[arg(long)]
        json: bool,
    },
}

/// GNS cluster subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum GnsAction {
    /// Show cluster state
    ClusterInfo,

    /// Show current jobs by id
    JobList,

    /// Mark a job for termination
    KillJob {
        /// Job id
        job_id: String,
    },

    /// Send an event to GNS
    ///
    /// Either give HOST SERVICE SEVERITY, or a JSON file with --file.
    SendEvent {
        /// Event host
        host: Option<String>,

        /// Event service
        service: Option<String>,

        /// Event severity
        severity: Option<String>,

        /// JSON file describing the event
        #[arg(short, long, value_name = "FILE", conflicts_with_all = ["host", "service", "severity"])]
        file: Option<PathBuf>,
    },
}
