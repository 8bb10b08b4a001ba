//! powny CLI
//!
//! Operator tool for GNS: synchronize rules to the cluster, test them
//! locally, and manage cluster jobs.

mod cli;
mod commands;
mod error;

use clap::{CommandFactory, Parser};
use colored::Colorize;
use powny_api::ApiConfig;
use powny_core::{Settings, UploadOptions};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, GnsAction, RulesAction};
use error::Result;

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            std::process::exit(1);
        }
        Err(e) => e.exit(),
    };

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings = match cli.command {
        // These must work even when the existing config is broken
        Commands::CreateConfig { .. } | Commands::Completions { .. } => Settings::default(),
        _ => Settings::load(cli.config.as_deref())?,
    };
    init_logging(cli.debug, settings.log_level.as_deref());

    match cli.command {
        Commands::CreateConfig { force } => {
            commands::run_create_config(cli.config.as_deref(), force)
        }
        Commands::Rules { rules_path, action } => match action {
            RulesAction::Upload {
                message,
                force,
                dry_run,
                api,
            } => commands::run_upload(
                &settings,
                &rules_path,
                api.api_url.as_deref(),
                &UploadOptions {
                    message,
                    force,
                    dry_run,
                },
            ),
            RulesAction::Exec { event_desc, json } => {
                commands::run_exec(&settings, &rules_path, &event_desc, json)
            }
        },
        Commands::Gns { api, action } => {
            let config = || ApiConfig::from_settings(&settings, api.api_url.as_deref());
            match action {
                GnsAction::ClusterInfo => commands::run_cluster_info(&config()?),
                GnsAction::JobList => commands::run_job_list(&config()?),
                GnsAction::KillJob { job_id } => commands::run_kill_job(&config()?, &job_id),
                GnsAction::SendEvent {
                    host,
                    service,
                    severity,
                    file,
                } => {
                    // Usage errors come before configuration errors
                    let event = commands::cluster::event_from_args(
                        host.as_deref(),
                        service.as_deref(),
                        severity.as_deref(),
                        file.as_deref(),
                    )?;
                    commands::run_send_event(&config()?, &event)
                }
            }
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "powny", &mut std::io::stdout());
            Ok(())
        }
    }
}

/// Log to stderr. `RUST_LOG` wins over `--debug`, which wins over the
/// configured level.
fn init_logging(debug: bool, configured: Option<&str>) {
    let level = if debug {
        "debug"
    } else {
        configured.unwrap_or("info")
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(debug)
        .try_init();
    tracing::debug!("debug logging enabled");
}
