//! create-config command

use std::path::{Path, PathBuf};

use colored::Colorize;
use powny_core::Settings;
use powny_fs::{NormalizedPath, io};

use crate::error::{CliError, Result};

/// Bundled default configuration
pub const CONFIG_TEMPLATE: &str = include_str!("../../assets/config.yaml");

/// Write the default configuration to `explicit` or the platform location.
pub fn run_create_config(explicit: Option<&Path>, force: bool) -> Result<()> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => default_location()?,
    };
    let target = NormalizedPath::new(&path);

    if target.exists() {
        if !force {
            return Err(CliError::usage(format!(
                "{} already exists; use --force to overwrite it",
                path.display()
            )));
        }
        tracing::warn!(path = %target, "overwriting existing configuration");
    }

    io::write_text(&target, CONFIG_TEMPLATE)?;
    println!("{} Configuration written to {}", "OK".green().bold(), path.display());
    Ok(())
}

fn default_location() -> Result<PathBuf> {
    Settings::default_path()
        .ok_or_else(|| CliError::usage("no configuration directory on this platform; use --config"))
}
