//! Configuration loading and management
//!
//! Handles parsing of `taskdeck.toml` configuration files.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

pub const CONFIG_FILE: &str = "taskdeck.toml";

pub const DEFAULT_API_URL: &str = "https://taskmanagerback-0bu3.onrender.com";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Live notification channel settings
    #[serde(default)]
    pub channel: ChannelConfig,

    /// Where the session file lives
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL every API route is joined onto
    #[serde(default = "default_api_url")]
    pub base_url: String,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Socket.IO server; falls back to `api.base_url`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default = "default_namespace")]
    pub namespace: String,
}

fn default_namespace() -> String {
    "/".to_string()
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            url: None,
            namespace: default_namespace(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// State directory; defaults to the platform data directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a `taskdeck.toml` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.channel.namespace = config.channel.namespace.trim().to_string();
        config.validate()?;
        Ok(config)
    }

    /// Load `taskdeck.toml` from `dir`, or return defaults when absent
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Replace the API base URL and re-validate.
    pub fn with_api_url(mut self, base_url: impl Into<String>) -> Result<Self> {
        self.api.base_url = base_url.into();
        self.validate()?;
        Ok(self)
    }

    /// Socket.IO server URL.
    pub fn channel_url(&self) -> &str {
        self.channel.url.as_deref().unwrap_or(&self.api.base_url)
    }

    /// Directory holding `session.json`.
    pub fn state_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.session.dir {
            return Ok(dir.clone());
        }
        ProjectDirs::from("", "", "taskdeck")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| {
                Error::InvalidConfig(
                    "cannot determine a state directory; set session.dir".to_string(),
                )
            })
    }

    fn validate(&self) -> Result<()> {
        validate_http_url("api.base_url", &self.api.base_url)?;
        if let Some(url) = &self.channel.url {
            validate_http_url("channel.url", url)?;
        }
        let namespace = self.channel.namespace.trim();
        if !namespace.starts_with('/') || namespace.contains(',') {
            return Err(Error::InvalidConfig(format!(
                "channel.namespace '{namespace}' must start with '/' and contain no ','"
            )));
        }
        if let Some(dir) = &self.session.dir {
            if dir.as_os_str().is_empty() {
                return Err(Error::InvalidConfig("session.dir cannot be empty".to_string()));
            }
        }
        Ok(())
    }
}

fn validate_http_url(field: &str, value: &str) -> Result<()> {
    let url = Url::parse(value.trim())
        .map_err(|err| Error::InvalidConfig(format!("{field}: invalid URL '{value}': {err}")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(Error::InvalidConfig(format!(
            "{field}: unsupported scheme '{other}' (expected http|https)"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_are_expected() {
        let cfg = Config::default();
        assert_eq!(cfg.api.base_url, DEFAULT_API_URL);
        assert_eq!(cfg.channel_url(), DEFAULT_API_URL);
        assert_eq!(cfg.channel.namespace, "/");
        assert!(cfg.session.dir.is_none());
    }

    #[test]
    fn load_parses_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        let content = r#"
[api]
base_url = "http://127.0.0.1:4000"

[channel]
url = "http://127.0.0.1:4001"

[session]
dir = "/tmp/taskdeck-state"
"#;
        fs::write(&path, content).expect("write config");

        let cfg = Config::load(&path).expect("load");
        assert_eq!(cfg.api.base_url, "http://127.0.0.1:4000");
        assert_eq!(cfg.channel_url(), "http://127.0.0.1:4001");
        assert_eq!(cfg.channel.namespace, "/");
        assert_eq!(cfg.state_dir().unwrap(), PathBuf::from("/tmp/taskdeck-state"));
    }

    #[test]
    fn load_from_dir_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = Config::load_from_dir(dir.path()).expect("defaults");
        assert_eq!(cfg.api.base_url, DEFAULT_API_URL);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);

        fs::write(&path, "[api]\nbase_url = \"ftp://files\"\n").expect("write");
        assert!(matches!(Config::load(&path), Err(Error::InvalidConfig(_))));

        fs::write(&path, "[channel]\nnamespace = \"admin\"\n").expect("write");
        assert!(matches!(Config::load(&path), Err(Error::InvalidConfig(_))));

        fs::write(&path, "[api\n").expect("write");
        assert!(matches!(Config::load(&path), Err(Error::TomlParse(_))));
    }

    #[test]
    fn api_override_is_validated() {
        let cfg = Config::default()
            .with_api_url("http://localhost:5000")
            .expect("override");
        assert_eq!(cfg.channel_url(), "http://localhost:5000");
        assert!(Config::default().with_api_url("nope").is_err());
    }

    #[test]
    fn namespace_is_trimmed_on_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[channel]\nnamespace = \" /admin \"\n").expect("write");

        let loaded = Config::load(&path).expect("load");
        assert_eq!(loaded.channel.namespace, "/admin");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[channel]\nnamespace = \"/live\"\n").expect("write");

        let loaded = Config::load(&path).expect("load");
        assert_eq!(loaded.channel.namespace, "/live");
        assert_eq!(loaded.api.base_url, DEFAULT_API_URL);
    }
}
