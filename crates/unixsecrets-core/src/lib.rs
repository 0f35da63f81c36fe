//! unixsecrets core
//!
//! Resolves named secrets from mounted credential directories and the
//! process environment, and assembles a typed application configuration
//! from a fixed schema of such secrets.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use unixsecrets_core::{ConsoleLogger, SecretResolver};
//!
//! let resolver = SecretResolver::from_env(Arc::new(ConsoleLogger::new()));
//!
//! // Full configuration: never fails, falls back to defaults
//! let config = resolver.resolve_config();
//! let port = config.get_i64("database_port");
//!
//! // Refuse to start without a bot token
//! let token = config.require_str("telegram_bot_token")?;
//! # Ok::<(), unixsecrets_core::SecretError>(())
//! ```

pub mod logging;
pub mod secrets;
pub mod schema;
pub mod config;
pub mod health;

// Re-export commonly used types
pub use secrets::{
    SecretResolver, ResolvedSecret, Source, EnvironmentSource, SourceStatus,
    SecretError, SecretResult,
};

pub use schema::{SchemaEntry, ValueKind, SCHEMA};

pub use config::{Configuration, ConfigValue, ResolverSettings, SettingsError};

pub use health::{HealthReport, HealthStatus};

pub use logging::{Logger, LogLevel, SharedLogger, NoOpLogger, ConsoleLogger, MemoryLogger};
