//! rules upload / rules exec commands

use std::path::Path;

use colored::Colorize;
use powny_api::{ApiClient, ApiConfig, HttpRuleStore};
use powny_core::{
    Change, Evaluator, Event, ExecutionResult, RuleRepository, Settings, UploadOptions,
    UploadReport, Uploader,
};
use powny_fs::{NormalizedPath, io};
use similar::TextDiff;

use crate::error::Result;

/// Upload the checkout at `rules_path` to GNS.
pub fn run_upload(
    settings: &Settings,
    rules_path: &Path,
    api_url: Option<&str>,
    options: &UploadOptions,
) -> Result<()> {
    let repo = RuleRepository::open_with_extension(rules_path, &settings.rule_extension)?;
    let config = ApiConfig::from_settings(settings, api_url)?;
    let store = HttpRuleStore::new(ApiClient::new(&config)?);

    let local = repo.current_rule_set()?;
    tracing::info!(root = %repo.root(), rules = local.len(), "uploading rules");

    let report = Uploader::new(&repo, &store).upload(&local, options)?;
    print_upload_report(&report, options.dry_run);
    Ok(())
}

fn print_upload_report(report: &UploadReport, dry_run: bool) {
    let manifest = &report.manifest;
    if report.forced {
        println!(
            "{} Remote changes were overwritten (--force)",
            "WARN".yellow().bold()
        );
    }

    if manifest.is_empty() {
        println!(
            "{} Rules already synchronized at version {}",
            "OK".green().bold(),
            report.version
        );
        return;
    }

    if dry_run {
        println!(
            "{} Would upload {} change(s) on top of version {}:",
            "DRY RUN".cyan().bold(),
            manifest.len(),
            report.previous_version
        );
    } else {
        println!(
            "{} Uploaded {} change(s): {} -> {}",
            "OK".green().bold(),
            manifest.len(),
            report.previous_version,
            report.version
        );
    }

    for entry in manifest.entries() {
        match &entry.change {
            Change::Added { .. } => println!("   {} {}", "+".green(), entry.name),
            Change::Changed { .. } => println!("   {} {}", "~".yellow(), entry.name),
            Change::Removed { .. } => println!("   {} {}", "-".red(), entry.name),
        }
        if dry_run {
            print_entry_diff(&entry.name, &entry.change);
        }
    }
}

fn print_entry_diff(name: &str, change: &Change) {
    let (old, new) = match change {
        Change::Added { content, .. } => ("", content.as_str()),
        Change::Changed {
            previous_content,
            content,
            ..
        } => (previous_content.as_str(), content.as_str()),
        Change::Removed { .. } => return,
    };

    let diff = TextDiff::from_lines(old, new);
    let rendered = diff
        .unified_diff()
        .context_radius(3)
        .header(&format!("remote/{name}"), &format!("local/{name}"))
        .to_string();
    for line in rendered.lines() {
        let line = if line.starts_with('+') && !line.starts_with("+++") {
            line.green().to_string()
        } else if line.starts_with('-') && !line.starts_with("---") {
            line.red().to_string()
        } else {
            line.dimmed().to_string()
        };
        println!("     {line}");
    }
}

/// Evaluate the checkout's rules against the event in `event_desc`.
///
/// Rule load errors are reported with the results; they do not fail the
/// command.
pub fn run_exec(
    settings: &Settings,
    rules_path: &Path,
    event_desc: &Path,
    json: bool,
) -> Result<()> {
    let repo = RuleRepository::open_with_extension(rules_path, &settings.rule_extension)?;
    let raw = io::read_text(&NormalizedPath::new(event_desc))?;
    let event = Event::from_json_str(&raw)?;

    let rule_set = repo.current_rule_set()?;
    let result = Evaluator::check(&rule_set, &event);

    if json {
        println!("{}", result.to_json_pretty()?);
    } else {
        print_execution_result(&result);
    }
    Ok(())
}

fn print_execution_result(result: &ExecutionResult) {
    if result.matched.is_empty() {
        println!("{} No rule matched the event", "OK".green().bold());
    } else {
        println!(
            "{} {} rule(s) matched:",
            "MATCH".green().bold(),
            result.matched.len()
        );
    }

    for matched in &result.matched {
        match &matched.description {
            Some(description) => {
                println!("   {} {} ({})", "+".green(), matched.rule, description.dimmed());
            }
            None => println!("   {} {}", "+".green(), matched.rule),
        }
        for action in &matched.actions {
            let params = serde_json::to_string(&action.params).unwrap_or_default();
            println!("       {} {} {}", "->".cyan(), action.kind.bold(), params.dimmed());
        }
    }

    if !result.unmatched.is_empty() {
        println!("   {} {}", "not matched:".dimmed(), result.unmatched.join(", "));
    }
    if !result.skipped.is_empty() {
        println!("   {} {}", "disabled:".dimmed(), result.skipped.join(", "));
    }

    if result.has_errors() {
        println!();
        println!("{} Some rules failed to load:", "ERROR".red().bold());
        for error in &result.errors {
            println!("   {} {}: {}", "!".red(), error.rule, error.reason);
        }
    }
}
