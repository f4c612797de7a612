//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! The login password comes from `--password-file` or `ADMIN_PASSWORD` and is
//! never read from the TOML file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use common::Secret;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "eduadmin.toml";
pub const DEFAULT_SESSION_FILE: &str = "eduadmin-session.json";
const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Root configuration
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// Backend connection settings
#[derive(Debug, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Where the session (tokens + user) is persisted
#[derive(Debug, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_session_path")]
    pub path: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: default_session_path(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_owned()
}

fn default_timeout() -> u64 {
    30
}

fn default_session_path() -> PathBuf {
    PathBuf::from(DEFAULT_SESSION_FILE)
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.with_env().validated()
    }

    /// Load from the resolved path.
    ///
    /// An explicit path (CLI or `CONFIG_PATH`) must exist. The default file is
    /// optional; without it the built-in defaults apply.
    pub fn load_resolved(cli_path: Option<&Path>) -> common::Result<Self> {
        match Self::resolve_path(cli_path) {
            Some(path) => Self::load(&path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::load(Path::new(DEFAULT_CONFIG_FILE))
            }
            None => Config::default().with_env().validated(),
        }
    }

    /// Resolve an explicit config path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&Path>) -> Option<PathBuf> {
        if let Some(p) = cli_path {
            return Some(p.to_path_buf());
        }
        std::env::var("CONFIG_PATH").ok().map(PathBuf::from)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    fn with_env(mut self) -> Self {
        if let Ok(url) = std::env::var("API_BASE_URL") {
            if !url.trim().is_empty() {
                self.api.base_url = url.trim().to_owned();
            }
        }
        self
    }

    fn validated(self) -> common::Result<Self> {
        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://") {
            return Err(common::Error::Config(format!(
                "base_url must start with http:// or https://, got: {}",
                self.api.base_url
            )));
        }
        if self.api.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }
        Ok(self)
    }
}

/// Resolve the login password.
///
/// Resolution order:
/// 1. `--password-file` path
/// 2. ADMIN_PASSWORD env var
pub fn resolve_password(password_file: Option<&Path>) -> common::Result<Secret<String>> {
    if let Some(file) = password_file {
        let contents = std::fs::read_to_string(file).map_err(|e| {
            common::Error::Config(format!("failed to read password file {}: {e}", file.display()))
        })?;
        let password = Secret::new(contents.trim_end_matches(['\r', '\n']).to_owned());
        if password.is_blank() {
            return Err(common::Error::MissingCredential(format!(
                "password file {} is empty",
                file.display()
            )));
        }
        return Ok(password);
    }

    match std::env::var("ADMIN_PASSWORD") {
        Ok(value) if !value.is_empty() => Ok(Secret::new(value)),
        _ => Err(common::Error::MissingCredential(
            "set ADMIN_PASSWORD or pass --password-file".into(),
        )),
    }
}
