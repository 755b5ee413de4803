use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::core::errors::{MonitorError, Result};
use crate::core::models::service_profile::ExportFormat;

pub const DEFAULT_PROFILE: &str = "default";
pub const DEFAULT_REGION: &str = "us-east-1";
/// Directory under the home directory used when no output dir is configured.
pub const DEFAULT_OUTPUT_DIR: &str = "aws-monitor-logs";

/// Optional user configuration read from `<config_dir>/trailwatch/config.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub defaults: DefaultsSection,
}

/// The `[defaults]` section. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefaultsSection {
    pub profile: Option<String>,
    pub region: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub export_format: Option<ExportFormat>,
}

impl AppConfig {
    /// Load the configuration.
    ///
    /// With `explicit` set the file must exist. Otherwise the default
    /// location is tried and a missing file yields an empty config.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => {
                if !path.is_file() {
                    return Err(MonitorError::InvalidConfig {
                        detail: format!("config file not found: {}", path.display()),
                    });
                }
                path.to_path_buf()
            }
            None => match default_path() {
                Some(path) if path.is_file() => path,
                _ => return Ok(Self::default()),
            },
        };

        let content = std::fs::read_to_string(&path)?;
        Self::parse(&content).map_err(|e| MonitorError::InvalidConfig {
            detail: format!("Failed to parse {}: {e}", path.display()),
        })
    }

    fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Profile to use: the CLI/env value if any, then the file, then `default`.
    pub fn profile(&self, cli: Option<&str>) -> String {
        pick(cli, self.defaults.profile.as_deref()).unwrap_or_else(|| DEFAULT_PROFILE.to_string())
    }

    pub fn region(&self, cli: Option<&str>) -> String {
        pick(cli, self.defaults.region.as_deref()).unwrap_or_else(|| DEFAULT_REGION.to_string())
    }

    /// Root directory for the daily log files.
    pub fn output_dir(&self, cli: Option<&Path>) -> Result<PathBuf> {
        if let Some(dir) = cli.or(self.defaults.output_dir.as_deref()) {
            return Ok(dir.to_path_buf());
        }
        dirs::home_dir()
            .map(|home| home.join(DEFAULT_OUTPUT_DIR))
            .ok_or_else(|| MonitorError::InvalidConfig {
                detail: "cannot determine the home directory; pass --output".into(),
            })
    }

    pub fn export_format(&self, cli: Option<ExportFormat>) -> ExportFormat {
        cli.or(self.defaults.export_format).unwrap_or_default()
    }
}

/// `<config_dir>/trailwatch/config.toml`, if a config dir exists.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("trailwatch").join("config.toml"))
}

fn pick(cli: Option<&str>, file: Option<&str>) -> Option<String> {
    cli.filter(|v| !v.trim().is_empty())
        .or(file.filter(|v| !v.trim().is_empty()))
        .map(|v| v.trim().to_string())
}
