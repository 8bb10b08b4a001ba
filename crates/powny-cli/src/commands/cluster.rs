//! gns cluster-info / job-list / kill-job / send-event commands

use std::path::Path;

use colored::Colorize;
use powny_api::{ApiClient, ApiConfig, ClusterControlClient, EventDispatchClient};
use powny_core::Event;
use powny_fs::{NormalizedPath, io};

use crate::error::{CliError, Result};

pub fn run_cluster_info(config: &ApiConfig) -> Result<()> {
    let state = ClusterControlClient::new(ApiClient::new(config)?).cluster_info()?;
    print!("{}", serde_yaml::to_string(&state)?);
    Ok(())
}

pub fn run_job_list(config: &ApiConfig) -> Result<()> {
    let jobs = ClusterControlClient::new(ApiClient::new(config)?).list_jobs()?;

    if jobs.is_empty() {
        println!("{}", "No jobs".dimmed());
        return Ok(());
    }
    let width = jobs.keys().map(String::len).max().unwrap_or(0);
    for (id, job) in &jobs {
        println!("{id:<width$}  {}", job.status_or_unknown());
    }
    Ok(())
}

pub fn run_kill_job(config: &ApiConfig, job_id: &str) -> Result<()> {
    ClusterControlClient::new(ApiClient::new(config)?).terminate_job(job_id)?;
    println!(
        "{} Job {} marked for termination",
        "OK".green().bold(),
        job_id
    );
    Ok(())
}

/// The event given on the command line: a complete triple, or a file.
pub fn event_from_args(
    host: Option<&str>,
    service: Option<&str>,
    severity: Option<&str>,
    file: Option<&Path>,
) -> Result<Event> {
    match (host, service, severity, file) {
        (Some(host), Some(service), Some(severity), None) => {
            Ok(Event::from_triple(host, service, severity))
        }
        (None, None, None, Some(file)) => {
            let raw = io::read_text(&NormalizedPath::new(file))?;
            Ok(Event::from_json_str(&raw)?)
        }
        _ => Err(CliError::usage(
            "send-event needs either HOST SERVICE SEVERITY or --file <FILE>",
        )),
    }
}

pub fn run_send_event(config: &ApiConfig, event: &Event) -> Result<()> {
    EventDispatchClient::new(ApiClient::new(config)?).send(event)?;
    println!("{} Event sent", "OK".green().bold());
    Ok(())
}
