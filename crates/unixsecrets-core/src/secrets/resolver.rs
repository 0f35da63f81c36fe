//! Layered secret resolution with memoization
//!
//! Checks sources in the order they were given, typically:
//! 1. Mounted secrets volume (/app/secrets)
//! 2. Credentials directory ($CREDENTIALS_DIR)
//! 3. Process environment

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::{ConfigValue, Configuration, ResolverSettings};
use crate::logging::{NoOpLogger, SharedLogger};
use crate::schema::{SchemaEntry, SCHEMA};
use crate::{log_debug, log_error, log_warn};

use super::error::{SecretError, SecretResult};
use super::source::{validate_secret_name, Source, SourceStatus};

/// Result of resolving a secret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSecret {
    /// The secret value
    pub value: String,
    /// Which source originally provided the secret (`dir:<path>` or `env`)
    pub source: String,
    /// Whether this lookup was answered from the cache
    pub cached: bool,
}

#[derive(Debug, Clone)]
struct CachedSecret {
    value: String,
    source: String,
}

/// Resolves named secrets from an ordered list of sources
///
/// The first source that yields a value wins and the value is cached for the
/// lifetime of the resolver. Misses are never cached, so a secret that
/// appears later (say, a volume mounted after startup) is picked up by the
/// next lookup, while one that was already resolved never changes.
///
/// # Example
///
/// ```
/// use unixsecrets_core::secrets::{SecretResolver, Source};
///
/// let resolver = SecretResolver::new(vec![
///     Source::directory("/app/secrets"),
///     Source::env_map([("REDIS_URL", "redis://localhost:6379")]),
/// ]);
///
/// let url = resolver.resolve_secret("redis-url", false).unwrap();
/// assert_eq!(url.as_deref(), Some("redis://localhost:6379"));
/// assert!(resolver.resolve_secret("telegram-bot-token", true).is_err());
/// ```
pub struct SecretResolver {
    sources: Vec<Source>,
    cache: Mutex<HashMap<String, CachedSecret>>,
    logger: SharedLogger,
}

impl SecretResolver {
    /// Create a resolver over `sources` that logs nowhere
    pub fn new(sources: Vec<Source>) -> Self {
        Self::with_logger(sources, Arc::new(NoOpLogger::new()))
    }

    /// Create a resolver over `sources` that logs to `logger`
    pub fn with_logger(sources: Vec<Source>, logger: SharedLogger) -> Self {
        Self {
            sources,
            cache: Mutex::new(HashMap::new()),
            logger,
        }
    }

    /// Create a resolver from settings
    ///
    /// When `debug_sources` is set, every source is described at debug level.
    pub fn from_settings(settings: &ResolverSettings, logger: SharedLogger) -> Self {
        let resolver = Self::with_logger(settings.sources(), logger);
        if settings.debug_sources {
            resolver.log_sources();
        }
        resolver
    }

    /// Create a resolver with the default sources derived from the environment
    pub fn from_env(logger: SharedLogger) -> Self {
        Self::from_settings(&ResolverSettings::from_env(), logger)
    }

    /// The ordered source list
    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    /// Names currently held in the cache
    pub fn cached_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.cache.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// Resolve a secret by name
    ///
    /// Returns `Ok(None)` for a missing optional secret and
    /// `Err(SecretError::MissingRequired)` for a missing required one.
    pub fn resolve_secret(&self, name: &str, required: bool) -> SecretResult<Option<String>> {
        match self.lookup(name)? {
            Some(resolved) => Ok(Some(resolved.value)),
            None if required => Err(SecretError::MissingRequired(name.to_string())),
            None => {
                log_warn!(self.logger, "Secret '{}' not found, using default", name);
                Ok(None)
            }
        }
    }

    /// Resolve a secret that must exist
    pub fn require_secret(&self, name: &str) -> SecretResult<String> {
        self.resolve_secret(name, true)?
            .ok_or_else(|| SecretError::MissingRequired(name.to_string()))
    }

    /// Resolve an optional secret and report where it came from
    pub fn resolve_with_source(&self, name: &str) -> SecretResult<Option<ResolvedSecret>> {
        self.lookup(name)
    }

    /// Build the full configuration from the schema
    ///
    /// Never fails. Missing secrets and values that don't convert fall back
    /// to the schema default; keys with neither are left out.
    pub fn resolve_config(&self) -> Configuration {
        let mut config = Configuration::new();
        for entry in SCHEMA {
            if let Some(value) = self.resolve_entry(entry) {
                config.insert(entry.config_key, value);
            }
        }
        config
    }

    /// Describe every source in order, without reading secret contents
    pub fn describe_sources(&self) -> Vec<(String, SourceStatus)> {
        self.sources
            .iter()
            .map(|source| (source.to_string(), source.status()))
            .collect()
    }

    fn resolve_entry(&self, entry: &SchemaEntry) -> Option<ConfigValue> {
        let raw = match self.resolve_secret(entry.secret_name, false) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                log_debug!(self.logger, "Using default for '{}'", entry.config_key);
                return entry.default_value();
            }
            Err(e) => {
                log_error!(self.logger, "Error loading config '{}': {}", entry.config_key, e);
                return entry.default_value();
            }
        };

        match entry.convert(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                log_error!(self.logger, "Error loading config '{}': {}", entry.config_key, e);
                entry.default_value()
            }
        }
    }

    fn lookup(&self, name: &str) -> SecretResult<Option<ResolvedSecret>> {
        validate_secret_name(name)?;

        // Held for the whole scan so concurrent callers can't both scan the
        // same name.
        let mut cache = self.cache.lock();
        if let Some(hit) = cache.get(name) {
            return Ok(Some(ResolvedSecret {
                value: hit.value.clone(),
                source: hit.source.clone(),
                cached: true,
            }));
        }

        for source in &self.sources {
            match source.lookup(name) {
                Ok(Some(value)) => {
                    let origin = source.to_string();
                    log_debug!(self.logger, "Loaded secret '{}' from {}", name, origin);
                    cache.insert(
                        name.to_string(),
                        CachedSecret {
                            value: value.clone(),
                            source: origin.clone(),
                        },
                    );
                    return Ok(Some(ResolvedSecret {
                        value,
                        source: origin,
                        cached: false,
                    }));
                }
                Ok(None) => {}
                Err(e) => log_warn!(self.logger, "{}", e),
            }
        }

        Ok(None)
    }

    fn log_sources(&self) {
        for (index, (label, status)) in self.describe_sources().into_iter().enumerate() {
            let detail = match status {
                SourceStatus::Missing => "does not exist".to_string(),
                SourceStatus::NotADirectory => "is a file, not a directory".to_string(),
                SourceStatus::Unreadable { reason } => format!("cannot be listed: {}", reason),
                SourceStatus::Directory { entries } => {
                    format!("{} files - {:?}", entries.len(), entries)
                }
                SourceStatus::Environment => "environment mapping".to_string(),
            };
            log_debug!(self.logger, "Source {} ({}): {}", index, label, detail);
        }
    }
}

impl std::fmt::Debug for SecretResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Values stay out of Debug output.
        f.debug_struct("SecretResolver")
            .field("sources", &self.sources)
            .field("cached", &self.cached_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LogLevel, MemoryLogger};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_first_source_wins() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("telegram-bot-token"), "from-file\n").unwrap();

        let resolver = SecretResolver::new(vec![
            Source::directory(dir.path()),
            Source::env_map([("TELEGRAM_BOT_TOKEN", "from-env")]),
        ]);

        assert_eq!(
            resolver.resolve_secret("telegram-bot-token", true).unwrap(),
            Some("from-file".to_string())
        );
    }

    #[test]
    fn test_falls_through_to_env() {
        let dir = tempdir().unwrap();
        let resolver = SecretResolver::new(vec![
            Source::directory(dir.path()),
            Source::env_map([("SENTRY_DSN", "https://key@sentry.example/1")]),
        ]);

        let resolved = resolver.resolve_with_source("sentry-dsn").unwrap().unwrap();
        assert_eq!(resolved.value, "https://key@sentry.example/1");
        assert_eq!(resolved.source, "env");
        assert!(!resolved.cached);

        let again = resolver.resolve_with_source("sentry-dsn").unwrap().unwrap();
        assert!(again.cached);
        assert_eq!(again.source, "env");
    }

    #[test]
    fn test_missing_required_and_optional() {
        let logger = Arc::new(MemoryLogger::new());
        let resolver = SecretResolver::with_logger(vec![Source::env_map::<_, String, String>([])], logger.clone());

        let err = resolver.resolve_secret("database-url", true).unwrap_err();
        assert!(matches!(err, SecretError::MissingRequired(ref name) if name == "database-url"));
        assert!(resolver.require_secret("database-url").unwrap_err().is_missing());

        assert_eq!(resolver.resolve_secret("database-url", false).unwrap(), None);
        assert!(logger.contains(LogLevel::Warn, "database-url"));
    }

    #[test]
    fn test_misses_are_not_cached() {
        let dir = tempdir().unwrap();
        let resolver = SecretResolver::new(vec![Source::directory(dir.path())]);

        assert_eq!(resolver.resolve_secret("redis-password", false).unwrap(), None);
        assert!(resolver.cached_names().is_empty());

        fs::write(dir.path().join("redis-password"), "hunter2").unwrap();
        assert_eq!(
            resolver.resolve_secret("redis-password", false).unwrap(),
            Some("hunter2".to_string())
        );
        assert_eq!(resolver.cached_names(), vec!["redis-password".to_string()]);
    }

    #[test]
    fn test_hits_are_cached_forever() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("health-check-token");
        fs::write(&path, "first").unwrap();

        let resolver = SecretResolver::new(vec![Source::directory(dir.path())]);
        assert_eq!(resolver.require_secret("health-check-token").unwrap(), "first");

        fs::write(&path, "second").unwrap();
        assert_eq!(resolver.require_secret("health-check-token").unwrap(), "first");

        fs::remove_file(&path).unwrap();
        assert_eq!(resolver.require_secret("health-check-token").unwrap(), "first");
    }

    #[test]
    fn test_invalid_name_rejected() {
        let dir = tempdir().unwrap();
        let resolver = SecretResolver::new(vec![Source::directory(dir.path())]);

        assert!(matches!(resolver.resolve_secret("", false), Err(SecretError::InvalidName(_))));
        assert!(matches!(
            resolver.resolve_secret("../passwd", false),
            Err(SecretError::InvalidName(_))
        ));
    }

    #[test]
    fn test_empty_env_value_is_resolved() {
        let resolver = SecretResolver::new(vec![Source::env_map([("TELEGRAM_WEBHOOK_SECRET", "")])]);
        assert_eq!(
            resolver.resolve_secret("telegram-webhook-secret", true).unwrap(),
            Some(String::new())
        );
    }

    #[test]
    fn test_debug_does_not_leak_values() {
        let resolver = SecretResolver::new(vec![Source::env_map([("STRIPE_SECRET_KEY", "sk_live_abc")])]);
        resolver.require_secret("stripe-secret-key").unwrap();

        let debug = format!("{:?}", resolver);
        assert!(debug.contains("stripe-secret-key"));
        assert!(debug.contains("STRIPE_SECRET_KEY"));
        assert!(!debug.contains("sk_live_abc"));
    }

    #[test]
    fn test_read_error_falls_through_with_warning() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("stripe-secret-key"), [0xff, 0xfe]).unwrap();

        let logger = Arc::new(MemoryLogger::new());
        let resolver = SecretResolver::with_logger(
            vec![
                Source::directory(dir.path()),
                Source::env_map([("STRIPE_SECRET_KEY", "from-env")]),
            ],
            logger.clone(),
        );

        let resolved = resolver.resolve_with_source("stripe-secret-key").unwrap().unwrap();
        assert_eq!(resolved.value, "from-env");
        assert_eq!(resolved.source, "env");
        assert!(logger.contains(LogLevel::Warn, "stripe-secret-key"));
    }

    #[test]
    fn test_from_settings_logs_sources() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("openai-api-key"), "sk-test").unwrap();

        let settings = ResolverSettings {
            secrets_dir: dir.path().to_path_buf(),
            credentials_dir: dir.path().join("missing"),
            extra_dirs: vec![],
            include_environment: true,
            debug_sources: true,
        };
        let logger = Arc::new(MemoryLogger::new());
        let resolver = SecretResolver::from_settings(&settings, logger.clone());

        assert_eq!(resolver.sources().len(), 3);
        assert!(logger.contains(LogLevel::Debug, "1 files"));
        assert!(logger.contains(LogLevel::Debug, "does not exist"));
        // Names only, never contents
        assert!(!logger.records().iter().any(|(_, m)| m.contains("sk-test")));
    }
}
