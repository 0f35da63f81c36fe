//! Secret lookup against the live process environment and shared resolvers

use std::env;
use std::fs;
use std::sync::Arc;
use std::thread;

use tempfile::tempdir;
use unixsecrets_core::{LogLevel, MemoryLogger, SecretError, SecretResolver, Source};

#[test]
fn process_env_uses_upper_snake_name() {
    env::set_var("UNIXSECRETS_IT_TWILIO_AUTH_TOKEN", "twilio-token");

    let resolver = SecretResolver::new(vec![Source::process_env()]);
    assert_eq!(
        resolver.require_secret("unixsecrets-it-twilio-auth-token").unwrap(),
        "twilio-token"
    );

    env::remove_var("UNIXSECRETS_IT_TWILIO_AUTH_TOKEN");
}

#[test]
fn cached_value_survives_env_change() {
    env::set_var("UNIXSECRETS_IT_SENDGRID_API_KEY", "SG.first");

    let resolver = SecretResolver::new(vec![Source::process_env()]);
    assert_eq!(
        resolver.require_secret("unixsecrets-it-sendgrid-api-key").unwrap(),
        "SG.first"
    );

    env::set_var("UNIXSECRETS_IT_SENDGRID_API_KEY", "SG.second");
    assert_eq!(
        resolver.require_secret("unixsecrets-it-sendgrid-api-key").unwrap(),
        "SG.first"
    );

    env::remove_var("UNIXSECRETS_IT_SENDGRID_API_KEY");
    assert_eq!(
        resolver.require_secret("unixsecrets-it-sendgrid-api-key").unwrap(),
        "SG.first"
    );

    // A fresh resolver has its own cache
    let fresh = SecretResolver::new(vec![Source::process_env()]);
    assert!(matches!(
        fresh.resolve_secret("unixsecrets-it-sendgrid-api-key", true),
        Err(SecretError::MissingRequired(_))
    ));
}

#[test]
fn unmounted_directories_are_skipped() {
    let dir = tempdir().unwrap();
    let resolver = SecretResolver::new(vec![
        Source::directory(dir.path().join("app-secrets")),
        Source::directory(dir.path().join("credentials")),
        Source::env_map([("GOOGLE_MAPS_API_KEY", "maps-key")]),
    ]);

    assert_eq!(
        resolver.resolve_secret("google-maps-api-key", true).unwrap().as_deref(),
        Some("maps-key")
    );
}

#[cfg(unix)]
#[test]
fn unreadable_file_falls_through_to_next_source() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let path = dir.path().join("database-password");
    fs::write(&path, "locked").unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o000)).unwrap();

    // Root ignores file modes; nothing to test there.
    if fs::read_to_string(&path).is_ok() {
        return;
    }

    let resolver = SecretResolver::new(vec![
        Source::directory(dir.path()),
        Source::env_map([("DATABASE_PASSWORD", "from-env")]),
    ]);
    assert_eq!(resolver.require_secret("database-password").unwrap(), "from-env");
}

#[test]
fn undecodable_file_falls_through_with_warning() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("database-password"), [0xff, 0xfe, 0x00]).unwrap();

    let logger = Arc::new(MemoryLogger::new());
    let resolver = SecretResolver::with_logger(
        vec![
            Source::directory(dir.path()),
            Source::env_map([("DATABASE_PASSWORD", "from-env")]),
        ],
        logger.clone(),
    );

    assert_eq!(resolver.require_secret("database-password").unwrap(), "from-env");
    assert!(logger.contains(LogLevel::Warn, "database-password"));
    assert_eq!(logger.count(LogLevel::Warn), 1);
}

#[test]
fn shared_resolver_across_threads() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("openai-api-key"), "sk-shared\n").unwrap();
    let resolver = Arc::new(SecretResolver::new(vec![Source::directory(dir.path())]));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let resolver = Arc::clone(&resolver);
            thread::spawn(move || resolver.require_secret("openai-api-key").unwrap())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), "sk-shared");
    }
    assert_eq!(resolver.cached_names(), vec!["openai-api-key".to_string()]);
}
