//! Configuration: resolver settings in, typed application configuration out
//!
//! - `ResolverSettings`: which directories the resolver scans (env + YAML)
//! - `Configuration`: the flat typed map built from the schema

mod settings;
mod value;

pub use settings::{
    ResolverSettings, SettingsError, SettingsResult,
    APP_SECRETS_DIR, CREDENTIALS_DIR_VAR, DEFAULT_CREDENTIALS_DIR,
};
pub use value::{ConfigValue, Configuration};
