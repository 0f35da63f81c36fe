//! Secrets health report
//!
//! A container health probe wants to know whether the secrets it depends on
//! are in place. The report is plain data; serving it over HTTP is left to
//! the caller.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::secrets::SecretResolver;

/// Secrets a deployment cannot run without
pub const CRITICAL_SECRETS: &[&str] = &["telegram-bot-token", "health-check-token"];

/// Secret holding the bot token
pub const BOT_TOKEN_SECRET: &str = "telegram-bot-token";

/// Tokens this short are treated as placeholders
const MIN_TOKEN_LEN: usize = 10;

/// Overall health
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Configuration loaded and every critical secret present
    Healthy,
    /// Configuration loaded but something critical is missing
    Degraded,
    /// The resolver could not be set up at all
    Unhealthy,
}

/// Whether a critical secret was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretPresence {
    Present,
    Missing,
}

/// State of the bot token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenState {
    Configured,
    NoToken,
}

/// Snapshot of secret health
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    /// Number of keys in the resolved configuration
    pub loaded_count: usize,
    pub critical_secrets: BTreeMap<String, SecretPresence>,
    pub bot_token: TokenState,
    /// Why the secrets could not be loaded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthReport {
    /// Check secret health using `resolver`
    ///
    /// Never fails: lookup errors count as missing secrets.
    pub fn check(resolver: &SecretResolver) -> Self {
        let loaded_count = resolver.resolve_config().len();

        let critical_secrets: BTreeMap<String, SecretPresence> = CRITICAL_SECRETS
            .iter()
            .map(|name| {
                let present = matches!(resolver.resolve_secret(name, false), Ok(Some(v)) if !v.is_empty());
                let presence = if present { SecretPresence::Present } else { SecretPresence::Missing };
                (name.to_string(), presence)
            })
            .collect();

        let bot_token = match resolver.resolve_secret(BOT_TOKEN_SECRET, false) {
            Ok(Some(token)) if token.chars().count() > MIN_TOKEN_LEN => TokenState::Configured,
            _ => TokenState::NoToken,
        };

        let all_present = critical_secrets.values().all(|p| *p == SecretPresence::Present);
        let status = if loaded_count > 0 && all_present {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        };

        Self {
            status,
            loaded_count,
            critical_secrets,
            bot_token,
            error: None,
        }
    }

    /// Report for a resolver that could not be built, e.g. unreadable settings
    pub fn unhealthy(error: impl std::fmt::Display) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            loaded_count: 0,
            critical_secrets: CRITICAL_SECRETS
                .iter()
                .map(|name| (name.to_string(), SecretPresence::Missing))
                .collect(),
            bot_token: TokenState::NoToken,
            error: Some(error.to_string()),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::Source;

    #[test]
    fn test_healthy() {
        let resolver = SecretResolver::new(vec![Source::env_map([
            ("TELEGRAM_BOT_TOKEN", "123456789:AAH-long-enough-token"),
            ("HEALTH_CHECK_TOKEN", "probe"),
        ])]);

        let report = HealthReport::check(&resolver);
        assert_eq!(report.status, HealthStatus::Healthy);
        assert!(report.is_healthy());
        assert_eq!(report.bot_token, TokenState::Configured);
        assert_eq!(report.critical_secrets["health-check-token"], SecretPresence::Present);
    }

    #[test]
    fn test_degraded_without_critical_secrets() {
        let resolver = SecretResolver::new(vec![Source::env_map([("TELEGRAM_BOT_TOKEN", "short")])]);

        let report = HealthReport::check(&resolver);
        // Defaults alone make the configuration non-empty
        assert!(report.loaded_count > 0);
        assert_eq!(report.status, HealthStatus::Degraded);
        assert_eq!(report.bot_token, TokenState::NoToken);
        assert_eq!(report.critical_secrets["telegram-bot-token"], SecretPresence::Present);
        assert_eq!(report.critical_secrets["health-check-token"], SecretPresence::Missing);
    }

    #[test]
    fn test_empty_token_counts_as_missing() {
        let resolver = SecretResolver::new(vec![Source::env_map([
            ("TELEGRAM_BOT_TOKEN", ""),
            ("HEALTH_CHECK_TOKEN", "probe"),
        ])]);

        let report = HealthReport::check(&resolver);
        assert_eq!(report.critical_secrets["telegram-bot-token"], SecretPresence::Missing);
        assert_eq!(report.status, HealthStatus::Degraded);
    }

    #[test]
    fn test_report_serializes() {
        let resolver = SecretResolver::new(vec![]);
        let json = serde_json::to_value(HealthReport::check(&resolver)).unwrap();
        assert_eq!(json["status"], "degraded");
        assert_eq!(json["bot_token"], "no_token");
        assert_eq!(json["critical_secrets"]["telegram-bot-token"], "missing");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_unhealthy_carries_error() {
        let report = HealthReport::unhealthy("Failed to parse settings YAML: bad indent");
        assert_eq!(report.status, HealthStatus::Unhealthy);
        assert!(!report.is_healthy());
        assert_eq!(report.loaded_count, 0);
        assert_eq!(report.critical_secrets["health-check-token"], SecretPresence::Missing);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "unhealthy");
        assert_eq!(json["error"], "Failed to parse settings YAML: bad indent");
    }
}
