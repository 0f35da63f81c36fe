//! Secret sources: mounted directories and environment mappings

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::error::{SecretError, SecretResult};

/// Where the environment source reads its variables from
#[derive(Clone, PartialEq, Eq)]
pub enum EnvironmentSource {
    /// The live process environment
    Process,
    /// A fixed mapping, e.g. a snapshot or a test fixture
    Map(HashMap<String, String>),
}

// Keys only: map values are secrets.
impl fmt::Debug for EnvironmentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvironmentSource::Process => f.write_str("Process"),
            EnvironmentSource::Map(vars) => {
                let mut keys: Vec<&str> = vars.keys().map(String::as_str).collect();
                keys.sort_unstable();
                f.debug_struct("Map").field("keys", &keys).finish()
            }
        }
    }
}

impl EnvironmentSource {
    /// Environment variable name for a secret
    ///
    /// `telegram-bot-token` → `TELEGRAM_BOT_TOKEN`
    pub fn env_key(name: &str) -> String {
        name.to_uppercase().replace('-', "_")
    }

    /// Look up a secret by its transformed key
    ///
    /// A variable that is set to the empty string is a hit; only an unset
    /// variable is a miss.
    pub fn lookup(&self, name: &str) -> SecretResult<Option<String>> {
        let key = Self::env_key(name);
        match self {
            EnvironmentSource::Map(vars) => Ok(vars.get(&key).cloned()),
            EnvironmentSource::Process => match env::var(&key) {
                Ok(value) => Ok(Some(value)),
                Err(env::VarError::NotPresent) => Ok(None),
                Err(env::VarError::NotUnicode(_)) => Err(SecretError::SourceRead {
                    name: name.to_string(),
                    origin: format!("environment variable ${}", key),
                    source: io::Error::new(io::ErrorKind::InvalidData, "value is not valid unicode"),
                }),
            },
        }
    }
}

/// A single entry in the resolver's ordered source list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Directory of plain files, one file per secret
    Directory(PathBuf),
    /// Environment variables, keyed by the upper-snake form of the name
    Environment(EnvironmentSource),
}

impl Source {
    /// Directory source for `path`
    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Source::Directory(path.into())
    }

    /// Environment source backed by the live process environment
    pub fn process_env() -> Self {
        Source::Environment(EnvironmentSource::Process)
    }

    /// Environment source backed by a fixed mapping
    pub fn env_map<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Source::Environment(EnvironmentSource::Map(
            vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        ))
    }

    /// Look up `name` in this source
    ///
    /// `Ok(None)` is a plain miss. `Err` means the source has the secret but
    /// it could not be read; callers are expected to log it and carry on.
    pub fn lookup(&self, name: &str) -> SecretResult<Option<String>> {
        match self {
            Source::Directory(dir) => lookup_in_directory(dir, name),
            Source::Environment(env_source) => env_source.lookup(name),
        }
    }

    /// Inspect the source without reading any secret contents
    pub fn status(&self) -> SourceStatus {
        match self {
            Source::Directory(dir) => directory_status(dir),
            Source::Environment(_) => SourceStatus::Environment,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Directory(dir) => write!(f, "dir:{}", dir.display()),
            Source::Environment(_) => write!(f, "env"),
        }
    }
}

fn lookup_in_directory(dir: &Path, name: &str) -> SecretResult<Option<String>> {
    // Unmounted volumes are simply skipped.
    if !dir.is_dir() {
        return Ok(None);
    }

    let path = dir.join(name);
    let read_error = |source: io::Error| SecretError::SourceRead {
        name: name.to_string(),
        origin: path.display().to_string(),
        source,
    };

    let metadata = match fs::metadata(&path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(read_error(e)),
    };
    if metadata.is_dir() {
        return Ok(None);
    }

    let content = fs::read_to_string(&path).map_err(read_error)?;
    Ok(Some(content.trim().to_string()))
}

fn directory_status(dir: &Path) -> SourceStatus {
    if !dir.exists() {
        return SourceStatus::Missing;
    }
    if !dir.is_dir() {
        return SourceStatus::NotADirectory;
    }
    match fs::read_dir(dir) {
        Ok(entries) => {
            let mut names: Vec<String> = entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .collect();
            names.sort();
            SourceStatus::Directory { entries: names }
        }
        Err(e) => SourceStatus::Unreadable { reason: e.to_string() },
    }
}

/// Diagnostic view of a source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SourceStatus {
    /// Directory path does not exist
    Missing,
    /// Path exists but is a file
    NotADirectory,
    /// Directory exists but cannot be listed
    Unreadable { reason: String },
    /// Directory with the listed file names
    Directory { entries: Vec<String> },
    /// Environment mapping
    Environment,
}

/// Reject names that are empty or could address a file outside a
/// directory source
pub fn validate_secret_name(name: &str) -> SecretResult<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if invalid {
        return Err(SecretError::InvalidName(name.to_string()));
    }
    Ok(())
}
