use std::path::{Path, PathBuf};

use crate::core::errors::{MonitorError, Result};

/// Profiles found in the shared AWS files, per file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileListing {
    pub credentials_path: Option<PathBuf>,
    pub credentials: Vec<String>,
    pub config_path: Option<PathBuf>,
    pub config: Vec<String>,
}

impl ProfileListing {
    /// Read both files. Missing files contribute nothing.
    pub fn discover() -> Self {
        Self::from_paths(credentials_file().as_deref(), config_file().as_deref())
    }

    pub fn from_paths(credentials: Option<&Path>, config: Option<&Path>) -> Self {
        let read = |path: Option<&Path>| {
            path.filter(|p| p.is_file())
                .and_then(|p| std::fs::read_to_string(p).ok().map(|c| (p.to_path_buf(), c)))
        };

        let mut listing = Self::default();
        if let Some((path, content)) = read(credentials) {
            listing.credentials = extract_profiles(&content, false);
            listing.credentials_path = Some(path);
        }
        if let Some((path, content)) = read(config) {
            listing.config = extract_profiles(&content, true);
            listing.config_path = Some(path);
        }
        listing
    }

    /// True when neither shared file exists.
    pub fn no_files(&self) -> bool {
        self.credentials_path.is_none() && self.config_path.is_none()
    }

    pub fn contains(&self, profile: &str) -> bool {
        self.credentials.iter().chain(&self.config).any(|p| p == profile)
    }

    /// Distinct profile names, in file order.
    pub fn all(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for name in self.credentials.iter().chain(&self.config) {
            if !names.contains(&name.as_str()) {
                names.push(name.as_str());
            }
        }
        names
    }

    /// Check that `profile` can be loaded.
    ///
    /// Static credentials in the environment bypass the files entirely, so
    /// the check passes whenever they are set.
    pub fn validate(&self, profile: &str) -> Result<()> {
        if static_credentials_in_env() {
            return Ok(());
        }
        if self.no_files() {
            return Err(MonitorError::AuthFailure {
                profile: profile.to_string(),
                reason: "no AWS credentials or config file found".into(),
            });
        }
        if self.contains(profile) {
            return Ok(());
        }

        let all = self.all();
        Err(MonitorError::ProfileNotFound {
            profile: profile.to_string(),
            available: if all.is_empty() {
                "(none)".to_string()
            } else {
                all.join(", ")
            },
        })
    }
}

/// Section names from an INI-style AWS file. In the config file,
/// sections other than `default` are written `[profile name]`.
pub fn extract_profiles(content: &str, is_config: bool) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix('[')?.strip_suffix(']'))
        .map(str::trim)
        .filter_map(|section| {
            if !is_config {
                return Some(section);
            }
            match section.strip_prefix("profile ") {
                Some(name) => Some(name.trim()),
                None if section == "default" => Some(section),
                // sso-session and services sections are not profiles.
                None => None,
            }
        })
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn credentials_file() -> Option<PathBuf> {
    std::env::var_os("AWS_SHARED_CREDENTIALS_FILE")
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|h| h.join(".aws").join("credentials")))
}

fn config_file() -> Option<PathBuf> {
    std::env::var_os("AWS_CONFIG_FILE")
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|h| h.join(".aws").join("config")))
}

fn static_credentials_in_env() -> bool {
    let set = |name: &str| std::env::var(name).is_ok_and(|v| !v.is_empty());
    set("AWS_ACCESS_KEY_ID") && set("AWS_SECRET_ACCESS_KEY")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CREDENTIALS: &str = "\
[default]
aws_access_key_id = AKIAEXAMPLE
aws_secret_access_key = secret

[prod-admin]
aws_access_key_id = AKIAEXAMPLE2
";

    const CONFIG: &str = "\
[default]
region = us-east-1

[profile audit]
region = eu-west-1
sso_session = corp

[sso-session corp]
sso_start_url = https://corp.awsapps.com/start
";

    #[test]
    fn credentials_sections_are_profiles() {
        assert_eq!(extract_profiles(CREDENTIALS, false), vec!["default", "prod-admin"]);
    }

    #[test]
    fn config_sections_drop_profile_prefix_and_skip_sessions() {
        assert_eq!(extract_profiles(CONFIG, true), vec!["default", "audit"]);
    }

    #[test]
    fn ignores_lines_that_are_not_sections() {
        let content = "region = [us-east-1]\n  [ spaced ]  \n[]\n";
        assert_eq!(extract_profiles(content, false), vec!["spaced"]);
    }

    #[test]
    fn listing_reads_both_files() {
        let tmp = TempDir::new().unwrap();
        let creds = tmp.path().join("credentials");
        let config = tmp.path().join("config");
        std::fs::write(&creds, CREDENTIALS).unwrap();
        std::fs::write(&config, CONFIG).unwrap();

        let listing = ProfileListing::from_paths(Some(&creds), Some(&config));
        assert!(listing.contains("prod-admin"));
        assert!(listing.contains("audit"));
        assert_eq!(listing.all(), vec!["default", "prod-admin", "audit"]);
    }

    #[test]
    fn missing_files_yield_empty_listing() {
        let tmp = TempDir::new().unwrap();
        let listing = ProfileListing::from_paths(
            Some(&tmp.path().join("nope")),
            Some(&tmp.path().join("nada")),
        );
        assert!(listing.no_files());
        assert!(listing.all().is_empty());
    }

    #[test]
    fn unknown_profile_lists_available_ones() {
        let listing = ProfileListing {
            credentials_path: Some(PathBuf::from("/tmp/credentials")),
            credentials: vec!["default".into(), "dev".into()],
            ..ProfileListing::default()
        };
        if static_credentials_in_env() {
            return;
        }
        let err = listing.validate("prod").unwrap_err();
        match err {
            MonitorError::ProfileNotFound { profile, available } => {
                assert_eq!(profile, "prod");
                assert_eq!(available, "default, dev");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn known_profile_validates() {
        let listing = ProfileListing {
            config_path: Some(PathBuf::from("/tmp/config")),
            config: vec!["audit".into()],
            ..ProfileListing::default()
        };
        assert!(listing.validate("audit").is_ok());
    }
}
