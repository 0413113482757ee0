//! Replwarden Configuration
//!
//! Immutable settings for the bootstrap controller, built once at
//! process start from environment variables (or a TOML file) and
//! passed by reference into every component. Components never read
//! ambient process state themselves.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Controller settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Replica group identifier
    #[serde(default = "default_group_id")]
    pub group_id: String,

    /// Logical service name resolved to discover peers
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Administrator username
    #[serde(default = "default_admin_username")]
    pub admin_username: String,

    /// Administrator password (mandatory wherever it gates an operation)
    #[serde(default)]
    pub admin_password: Option<String>,

    /// Application-level username
    #[serde(default)]
    pub app_username: Option<String>,

    /// Application-level password
    #[serde(default)]
    pub app_password: Option<String>,

    /// Application database name
    #[serde(default)]
    pub app_database: Option<String>,

    /// Shared-secret key value for inter-node authentication
    #[serde(default)]
    pub key_value: Option<String>,

    /// Destination path for the provisioned key file
    #[serde(default = "default_keyfile_path")]
    pub keyfile_path: PathBuf,

    /// Data-store configuration file, probed for an existing key-file directive
    #[serde(default = "default_datastore_conf")]
    pub datastore_conf: PathBuf,

    /// Cache file holding this node's resolved address
    #[serde(default = "default_address_cache")]
    pub address_cache: PathBuf,

    /// Attempt budget for bounded polls (liveness, self-address)
    #[serde(default = "default_poll_attempts")]
    pub poll_attempts: u32,

    /// Fixed sleep between poll attempts, in seconds
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Data-store feature toggles
    #[serde(default)]
    pub features: FeatureToggles,
}

/// Feature toggles translated into data-store launch arguments
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureToggles {
    /// Pre-allocate data files
    #[serde(default)]
    pub prealloc: bool,

    /// Use small initial data files
    #[serde(default)]
    pub small_files: bool,

    /// Quiet data-store logging
    #[serde(default)]
    pub quiet: bool,

    /// Enable text-search indexing
    #[serde(default)]
    pub text_search: bool,
}

fn default_group_id() -> String {
    "rs0".to_string()
}

fn default_service_name() -> String {
    "replwarden".to_string()
}

fn default_admin_username() -> String {
    "admin".to_string()
}

fn default_keyfile_path() -> PathBuf {
    PathBuf::from("/data/db/replwarden.key")
}

fn default_datastore_conf() -> PathBuf {
    PathBuf::from("/etc/datastore.conf")
}

fn default_address_cache() -> PathBuf {
    PathBuf::from("/data/db/self-address")
}

fn default_poll_attempts() -> u32 {
    90
}

fn default_poll_interval_secs() -> u64 {
    1
}

impl Settings {
    /// Load settings from a TOML file
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load settings from a TOML string
    pub fn from_str(content: &str) -> crate::Result<Self> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Build settings from the process environment
    pub fn from_env() -> crate::Result<Self> {
        let settings = Self::from_vars(|key| std::env::var(key).ok());
        settings.validate()?;
        Ok(settings)
    }

    /// Build settings from an arbitrary variable lookup
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let flag = |key: &str| {
            lookup(key)
                .map(|v| matches!(v.as_str(), "1" | "true" | "yes" | "on"))
                .unwrap_or(false)
        };

        Settings {
            group_id: lookup("REPLWARDEN_GROUP_ID").unwrap_or_else(default_group_id),
            service_name: lookup("REPLWARDEN_SERVICE").unwrap_or_else(default_service_name),
            admin_username: lookup("REPLWARDEN_ADMIN_USER").unwrap_or_else(default_admin_username),
            admin_password: lookup("REPLWARDEN_ADMIN_PASSWORD"),
            app_username: lookup("REPLWARDEN_APP_USER"),
            app_password: lookup("REPLWARDEN_APP_PASSWORD"),
            app_database: lookup("REPLWARDEN_APP_DATABASE"),
            key_value: lookup("REPLWARDEN_KEY_VALUE"),
            keyfile_path: lookup("REPLWARDEN_KEYFILE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(default_keyfile_path),
            datastore_conf: lookup("REPLWARDEN_DATASTORE_CONF")
                .map(PathBuf::from)
                .unwrap_or_else(default_datastore_conf),
            address_cache: lookup("REPLWARDEN_ADDRESS_CACHE")
                .map(PathBuf::from)
                .unwrap_or_else(default_address_cache),
            poll_attempts: lookup("REPLWARDEN_POLL_ATTEMPTS")
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_poll_attempts),
            poll_interval_secs: lookup("REPLWARDEN_POLL_INTERVAL_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_poll_interval_secs),
            features: FeatureToggles {
                prealloc: flag("REPLWARDEN_PREALLOC"),
                small_files: flag("REPLWARDEN_SMALL_FILES"),
                quiet: flag("REPLWARDEN_QUIET"),
                text_search: flag("REPLWARDEN_TEXT_SEARCH"),
            },
        }
    }

    /// Validate the settings
    pub fn validate(&self) -> crate::Result<()> {
        if self.group_id.is_empty() {
            return Err(crate::Error::Config("group_id cannot be empty".into()));
        }

        if self.service_name.is_empty() {
            return Err(crate::Error::Config("service_name cannot be empty".into()));
        }

        if self.admin_username.is_empty() {
            return Err(crate::Error::Config("admin_username cannot be empty".into()));
        }

        if self.poll_attempts == 0 {
            return Err(crate::Error::Config("poll_attempts must be at least 1".into()));
        }

        Ok(())
    }

    /// Get the poll interval as a Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Build the launch argument list the data-store supervisor must use,
    /// including the key-file argument when this controller provisioned one
    pub fn datastore_args(&self, keyfile: Option<&std::path::Path>) -> Vec<String> {
        let mut args = vec!["--group".to_string(), self.group_id.clone()];

        if let Some(path) = keyfile {
            args.push("--key-file".to_string());
            args.push(path.display().to_string());
        }
        if !self.features.prealloc {
            args.push("--no-prealloc".to_string());
        }
        if self.features.small_files {
            args.push("--small-files".to_string());
        }
        if self.features.quiet {
            args.push("--quiet".to_string());
        }
        if self.features.text_search {
            args.push("--enable-text-search".to_string());
        }

        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_from_empty_env() {
        let settings = Settings::from_vars(|_| None);

        assert_eq!(settings.group_id, "rs0");
        assert_eq!(settings.service_name, "replwarden");
        assert_eq!(settings.admin_username, "admin");
        assert!(settings.admin_password.is_none());
        assert_eq!(settings.poll_attempts, 90);
        assert_eq!(settings.poll_interval(), Duration::from_secs(1));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let env = vars(&[
            ("REPLWARDEN_GROUP_ID", "shard-a"),
            ("REPLWARDEN_SERVICE", "store-headless"),
            ("REPLWARDEN_ADMIN_PASSWORD", "hunter2"),
            ("REPLWARDEN_POLL_ATTEMPTS", "5"),
            ("REPLWARDEN_SMALL_FILES", "true"),
        ]);
        let settings = Settings::from_vars(|key| env.get(key).cloned());

        assert_eq!(settings.group_id, "shard-a");
        assert_eq!(settings.service_name, "store-headless");
        assert_eq!(settings.admin_password.as_deref(), Some("hunter2"));
        assert_eq!(settings.poll_attempts, 5);
        assert!(settings.features.small_files);
        assert!(!settings.features.quiet);
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
group_id = "rs1"
service_name = "db-internal"
admin_password = "secret"

[features]
quiet = true
"#;

        let settings = Settings::from_str(toml).unwrap();
        assert_eq!(settings.group_id, "rs1");
        assert_eq!(settings.service_name, "db-internal");
        assert!(settings.features.quiet);
        assert!(!settings.features.text_search);
    }

    #[test]
    fn test_validation_rejects_empty_group() {
        let env = vars(&[("REPLWARDEN_GROUP_ID", "")]);
        let settings = Settings::from_vars(|key| env.get(key).cloned());
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_datastore_args() {
        let mut settings = Settings::from_vars(|_| None);
        settings.features.small_files = true;
        settings.features.text_search = true;

        let args = settings.datastore_args(Some(std::path::Path::new("/data/db/key")));
        assert_eq!(
            args,
            vec![
                "--group",
                "rs0",
                "--key-file",
                "/data/db/key",
                "--no-prealloc",
                "--small-files",
                "--enable-text-search",
            ]
        );
    }
}
