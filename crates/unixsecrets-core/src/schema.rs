//! The configuration schema and its defaults
//!
//! Each entry maps a configuration key to the secret that backs it and the
//! type the raw string is converted to. The table is fixed at compile time.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;

use crate::config::ConfigValue;
use crate::secrets::{SecretError, SecretResult};

/// Target type of a schema entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Passed through unchanged
    String,
    /// Signed integer, surrounding whitespace ignored
    Integer,
    /// Floating point, surrounding whitespace ignored
    Float,
    /// `true` when the value equals `"true"` ignoring case, otherwise `false`
    Boolean,
}

impl ValueKind {
    /// Convert a raw secret value
    ///
    /// Only integers and floats can fail. Booleans never fail: anything that
    /// isn't `true` is `false`.
    pub fn convert(self, config_key: &str, raw: &str) -> SecretResult<ConfigValue> {
        let conversion_error = |reason: String| SecretError::Conversion {
            config_key: config_key.to_string(),
            kind: self,
            reason,
        };

        match self {
            ValueKind::String => Ok(ConfigValue::String(raw.to_string())),
            ValueKind::Integer => raw
                .trim()
                .parse::<i64>()
                .map(ConfigValue::Integer)
                .map_err(|e| conversion_error(format!("{} (got {:?})", e, raw))),
            ValueKind::Float => raw
                .trim()
                .parse::<f64>()
                .map(ConfigValue::Float)
                .map_err(|e| conversion_error(format!("{} (got {:?})", e, raw))),
            ValueKind::Boolean => Ok(ConfigValue::Boolean(raw.eq_ignore_ascii_case("true"))),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::String => write!(f, "string"),
            ValueKind::Integer => write!(f, "integer"),
            ValueKind::Float => write!(f, "float"),
            ValueKind::Boolean => write!(f, "boolean"),
        }
    }
}

/// One row of the configuration schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaEntry {
    /// Key in the produced configuration
    pub config_key: &'static str,
    /// Name of the backing secret
    pub secret_name: &'static str,
    /// How the raw value is converted
    pub kind: ValueKind,
}

impl SchemaEntry {
    const fn new(config_key: &'static str, secret_name: &'static str, kind: ValueKind) -> Self {
        Self { config_key, secret_name, kind }
    }

    /// Convert a raw value for this entry
    pub fn convert(&self, raw: &str) -> SecretResult<ConfigValue> {
        self.kind.convert(self.config_key, raw)
    }

    /// Fallback value for this entry, if one exists
    pub fn default_value(&self) -> Option<ConfigValue> {
        default_value(self.config_key)
    }
}

use ValueKind::{Boolean, Float, Integer, String as Str};

/// Every secret that makes up the application configuration, in resolution order
pub static SCHEMA: &[SchemaEntry] = &[
    // Telegram
    SchemaEntry::new("telegram_bot_token", "telegram-bot-token", Str),
    SchemaEntry::new("telegram_bot_username", "telegram-bot-username", Str),
    SchemaEntry::new("telegram_webhook_url", "telegram-webhook-url", Str),
    SchemaEntry::new("telegram_webhook_secret", "telegram-webhook-secret", Str),
    // Database
    SchemaEntry::new("database_url", "database-url", Str),
    SchemaEntry::new("database_host", "database-host", Str),
    SchemaEntry::new("database_port", "database-port", Integer),
    SchemaEntry::new("database_name", "database-name", Str),
    SchemaEntry::new("database_user", "database-user", Str),
    SchemaEntry::new("database_password", "database-password", Str),
    SchemaEntry::new("database_ssl_mode", "database-ssl-mode", Str),
    SchemaEntry::new("database_connection_pool_size", "database-connection-pool-size", Integer),
    SchemaEntry::new("database_connection_timeout", "database-connection-timeout", Integer),
    // Redis
    SchemaEntry::new("redis_url", "redis-url", Str),
    SchemaEntry::new("redis_host", "redis-host", Str),
    SchemaEntry::new("redis_port", "redis-port", Integer),
    SchemaEntry::new("redis_db", "redis-db", Integer),
    SchemaEntry::new("redis_password", "redis-password", Str),
    // API keys
    SchemaEntry::new("openai_api_key", "openai-api-key", Str),
    SchemaEntry::new("google_maps_api_key", "google-maps-api-key", Str),
    SchemaEntry::new("stripe_secret_key", "stripe-secret-key", Str),
    SchemaEntry::new("sendgrid_api_key", "sendgrid-api-key", Str),
    SchemaEntry::new("twilio_account_sid", "twilio-account-sid", Str),
    SchemaEntry::new("twilio_auth_token", "twilio-auth-token", Str),
    // Monitoring
    SchemaEntry::new("sentry_dsn", "sentry-dsn", Str),
    SchemaEntry::new("log_level", "log-level", Str),
    SchemaEntry::new("health_check_token", "health-check-token", Str),
    // Feature flags
    SchemaEntry::new("enable_analytics", "enable-analytics", Boolean),
    SchemaEntry::new("enable_notifications", "enable-notifications", Boolean),
    SchemaEntry::new("enable_cache", "enable-cache", Boolean),
    SchemaEntry::new("enable_rate_limiting", "enable-rate-limiting", Boolean),
    // Cache
    SchemaEntry::new("cache_ttl_seconds", "cache-ttl-seconds", Integer),
    SchemaEntry::new("cache_max_size_mb", "cache-max-size-mb", Integer),
    SchemaEntry::new("cache_redis_prefix", "cache-redis-prefix", Str),
    // Rate limiting
    SchemaEntry::new("rate_limit_requests_per_minute", "rate-limit-requests-per-minute", Integer),
    SchemaEntry::new("rate_limit_burst_size", "rate-limit-burst-size", Integer),
    SchemaEntry::new("rate_limit_window_seconds", "rate-limit-window-seconds", Integer),
    // Performance
    SchemaEntry::new("max_concurrent_requests", "max-concurrent-requests", Integer),
    SchemaEntry::new("request_timeout_seconds", "request-timeout-seconds", Integer),
    SchemaEntry::new("memory_limit_mb", "memory-limit-mb", Integer),
    SchemaEntry::new("cpu_limit", "cpu-limit", Float),
];

static DEFAULTS: Lazy<HashMap<&'static str, ConfigValue>> = Lazy::new(|| {
    use ConfigValue::{Boolean as B, Float as F, Integer as I};

    let mut m = HashMap::new();
    m.insert("database_port", I(5432));
    m.insert("redis_port", I(6379));
    m.insert("redis_db", I(0));
    m.insert("log_level", ConfigValue::String("INFO".to_string()));
    m.insert("enable_analytics", B(false));
    m.insert("enable_notifications", B(false));
    m.insert("enable_cache", B(true));
    m.insert("enable_rate_limiting", B(true));
    m.insert("cache_ttl_seconds", I(3600));
    m.insert("cache_max_size_mb", I(100));
    m.insert("cache_redis_prefix", ConfigValue::String("telegram_bot:".to_string()));
    m.insert("rate_limit_requests_per_minute", I(60));
    m.insert("rate_limit_burst_size", I(10));
    m.insert("rate_limit_window_seconds", I(60));
    m.insert("max_concurrent_requests", I(100));
    m.insert("request_timeout_seconds", I(30));
    m.insert("memory_limit_mb", I(512));
    m.insert("cpu_limit", F(1.0));
    m
});

/// Default value for a configuration key
pub fn default_value(config_key: &str) -> Option<ConfigValue> {
    DEFAULTS.get(config_key).cloned()
}

/// Find the schema entry for a configuration key
pub fn entry(config_key: &str) -> Option<&'static SchemaEntry> {
    SCHEMA.iter().find(|e| e.config_key == config_key)
}

/// Find the schema entry backed by a secret name
pub fn entry_for_secret(secret_name: &str) -> Option<&'static SchemaEntry> {
    SCHEMA.iter().find(|e| e.secret_name == secret_name)
}
