use std::fs;
use std::path::Path;
use std::time::Duration;

use atomkit_saga::{CoordinatorConfig, PreparationPolicy};
use serde::Deserialize;
use tracing::debug;

use crate::error::{CliError, Result};

pub(crate) const DEFAULT_CONFIG_FILE: &str = "atomkit.toml";

/// Contents of `atomkit.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct FileConfig {
    /// Per-call timeout in milliseconds; `0` disables it.
    call_timeout_ms: Option<u64>,
    preparation_policy: Option<PolicySetting>,
    id_field: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum PolicySetting {
    BestEffort,
    Strict,
}

impl From<PolicySetting> for PreparationPolicy {
    fn from(setting: PolicySetting) -> Self {
        match setting {
            PolicySetting::BestEffort => Self::BestEffort,
            PolicySetting::Strict => Self::Strict,
        }
    }
}

impl FileConfig {
    fn into_coordinator_config(self) -> CoordinatorConfig {
        let mut config = CoordinatorConfig::default();
        if let Some(ms) = self.call_timeout_ms {
            let timeout = (ms > 0).then(|| Duration::from_millis(ms));
            config = config.with_call_timeout(timeout);
        }
        if let Some(policy) = self.preparation_policy {
            config = config.with_preparation_policy(policy.into());
        }
        if let Some(id_field) = self.id_field {
            config = config.with_id_field(id_field);
        }
        config
    }
}

/// Load the coordinator configuration.
///
/// An explicit path must exist. Without one, `atomkit.toml` in the current
/// directory is used when present and defaults otherwise.
pub(crate) fn load(explicit: Option<&Path>) -> Result<CoordinatorConfig> {
    let path = match explicit {
        Some(path) => path,
        None => {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            if !default.exists() {
                debug!("no configuration file, using defaults");
                return Ok(CoordinatorConfig::default());
            }
            default
        }
    };

    let content = fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed = parse(&content).map_err(|source| CliError::Config {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "loaded configuration");
    Ok(parsed)
}

fn parse(content: &str) -> std::result::Result<CoordinatorConfig, toml::de::Error> {
    let file: FileConfig = toml::from_str(content)?;
    Ok(file.into_coordinator_config())
}
