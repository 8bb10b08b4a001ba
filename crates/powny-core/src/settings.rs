//! Operator configuration
//!
//! Settings are loaded once per invocation and passed by value into the
//! components that need them.

use std::path::{Path, PathBuf};
use std::time::Duration;

use powny_fs::{ConfigStore, NormalizedPath};
use serde::{Deserialize, Serialize};

use crate::repository::DEFAULT_RULE_EXTENSION;
use crate::{Error, Result};

/// Directory under the platform config dir
pub const CONFIG_DIR_NAME: &str = "powny-cli";

/// File name of the default configuration
pub const CONFIG_FILE_NAME: &str = "config.yaml";

const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Base URL of the remote service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gns_api_url: Option<String>,

    /// Bound on every network call
    pub timeout_secs: u64,

    /// Log level used when `--debug` is not given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Extension identifying rule files
    pub rule_extension: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gns_api_url: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            log_level: None,
            rule_extension: DEFAULT_RULE_EXTENSION.to_string(),
        }
    }
}

impl Settings {
    /// `<config_dir>/powny-cli/config.yaml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load from `explicit`, or from the default location.
    ///
    /// A missing default file yields defaults; a missing explicit file is an
    /// error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let store = ConfigStore::new();
        let settings = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::config(format!(
                        "config file {} does not exist",
                        path.display()
                    )));
                }
                store.load(&NormalizedPath::new(path))?
            }
            None => match Self::default_path() {
                Some(path) => store.load_or_default(&NormalizedPath::new(path))?,
                None => Self::default(),
            },
        };

        tracing::debug!(?settings, "loaded settings");
        Ok(settings)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Resolve the API base URL: `explicit` (flag or environment, already
    /// merged by the caller) first, then the config file.
    pub fn resolve_api_url(&self, explicit: Option<&str>) -> Result<String> {
        explicit
            .or(self.gns_api_url.as_deref())
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(|url| url.trim_end_matches('/').to_string())
            .ok_or_else(|| Error::config("GNS API url is not defined"))
    }
}
