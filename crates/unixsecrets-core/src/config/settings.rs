//! Resolver settings: which directories to scan and in what order
//!
//! Settings come from the environment (`CREDENTIALS_DIR`, `ENVIRONMENT`) and
//! optionally from a YAML file (~/.config/unixsecrets/settings.yaml). Values
//! set in the file win over the environment.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::secrets::Source;

/// Fixed mount point for application secrets (Docker volumes)
pub const APP_SECRETS_DIR: &str = "/app/secrets";

/// Default credentials directory when `CREDENTIALS_DIR` is unset
pub const DEFAULT_CREDENTIALS_DIR: &str = "/run/credentials/telegram-bot.service";

/// Environment variable overriding the credentials directory
pub const CREDENTIALS_DIR_VAR: &str = "CREDENTIALS_DIR";

/// Errors that can occur while loading settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse settings YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type SettingsResult<T> = Result<T, SettingsError>;

/// Settings that determine the resolver's source list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolverSettings {
    /// Highest-priority directory (mounted secrets volume)
    pub secrets_dir: PathBuf,
    /// Credentials directory (systemd `LoadCredential=` and friends)
    pub credentials_dir: PathBuf,
    /// Additional directories, scanned after the two above
    pub extra_dirs: Vec<PathBuf>,
    /// Whether the process environment is consulted last
    pub include_environment: bool,
    /// Log a listing of every source when the resolver is built
    pub debug_sources: bool,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            secrets_dir: PathBuf::from(APP_SECRETS_DIR),
            credentials_dir: PathBuf::from(DEFAULT_CREDENTIALS_DIR),
            extra_dirs: Vec::new(),
            include_environment: true,
            debug_sources: false,
        }
    }
}

/// On-disk settings file; every field is optional
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SettingsFile {
    secrets_dir: Option<PathBuf>,
    credentials_dir: Option<PathBuf>,
    extra_dirs: Vec<PathBuf>,
    include_environment: Option<bool>,
    debug_sources: Option<bool>,
}

impl ResolverSettings {
    /// Settings derived from the process environment
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Settings derived from an arbitrary variable lookup
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();
        if let Some(dir) = lookup(CREDENTIALS_DIR_VAR) {
            settings.credentials_dir = PathBuf::from(dir);
        }
        settings.debug_sources = lookup("ENVIRONMENT").as_deref() == Some("test");
        settings
    }

    /// Default settings file path (~/.config/unixsecrets/settings.yaml)
    pub fn default_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".config"));
        config_dir.join("unixsecrets").join("settings.yaml")
    }

    /// Load settings from a YAML file on top of `base`
    ///
    /// A missing file is not an error: `base` is returned unchanged.
    pub fn load(path: impl AsRef<Path>, base: Self) -> SettingsResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(base);
        }
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content, base)
    }

    /// Load the user-level settings file on top of the environment
    pub fn load_user() -> SettingsResult<Self> {
        Self::load(Self::default_path(), Self::from_env())
    }

    /// Parse YAML settings on top of `base`
    pub fn from_yaml(content: &str, base: Self) -> SettingsResult<Self> {
        // An empty document deserializes to unit, not to a map.
        if content.trim().is_empty() {
            return Ok(base);
        }
        let file: SettingsFile = serde_yaml::from_str(content)?;
        let mut settings = base;
        if let Some(dir) = file.secrets_dir {
            settings.secrets_dir = dir;
        }
        if let Some(dir) = file.credentials_dir {
            settings.credentials_dir = dir;
        }
        settings.extra_dirs.extend(file.extra_dirs);
        if let Some(include) = file.include_environment {
            settings.include_environment = include;
        }
        if let Some(debug) = file.debug_sources {
            settings.debug_sources = debug;
        }
        Ok(settings)
    }

    /// The ordered source list: directories first, environment last
    pub fn sources(&self) -> Vec<Source> {
        let mut sources = vec![
            Source::directory(&self.secrets_dir),
            Source::directory(&self.credentials_dir),
        ];
        sources.extend(self.extra_dirs.iter().map(Source::directory));
        if self.include_environment {
            sources.push(Source::process_env());
        }
        sources
    }
}
