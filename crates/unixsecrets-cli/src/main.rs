// unixsecrets - resolve secrets from mounted credentials and the environment
//
// Thin command-line surface over unixsecrets-core.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use unixsecrets_core::{ConsoleLogger, HealthReport, LogLevel, ResolverSettings, SecretResolver};

/// Resolve secrets from mounted directories and the environment
#[derive(Parser, Debug)]
#[command(name = "unixsecrets")]
#[command(version)]
#[command(about = "Resolve secrets from mounted credential directories and the environment", long_about = None)]
struct Cli {
    /// Settings file (default: ~/.config/unixsecrets/settings.yaml)
    #[arg(short, long, global = true)]
    settings: Option<PathBuf>,

    /// Minimum log level written to stderr
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print a single secret
    Get {
        /// Secret name, e.g. telegram-bot-token
        name: String,

        /// Fail when the secret is not found
        #[arg(long, default_value = "false")]
        required: bool,
    },

    /// Print the full typed configuration
    Config {
        #[arg(short, long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },

    /// Describe every source in resolution order
    Sources,

    /// Print the secrets health report
    Health,

    /// Print the effective settings after the environment and settings file
    Settings {
        #[arg(short, long, value_enum, default_value_t = Format::Yaml)]
        format: Format,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Json,
    Yaml,
}

fn load_settings(path: Option<&PathBuf>) -> Result<ResolverSettings> {
    match path {
        Some(path) => ResolverSettings::load(path, ResolverSettings::from_env())
            .with_context(|| format!("Failed to load settings from {}", path.display())),
        None => ResolverSettings::load_user().context("Failed to load user settings"),
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings = load_settings(cli.settings.as_ref());
    let settings = match (&cli.command, settings) {
        // A health check reports broken settings instead of just failing.
        (Commands::Health, Err(e)) => {
            let report = HealthReport::unhealthy(format!("{:#}", e));
            println!("{}", serde_json::to_string_pretty(&report)?);
            bail!("Secrets are unhealthy");
        }
        (_, settings) => settings?,
    };
    let logger = ConsoleLogger::new().with_level(LogLevel::parse_lenient(&cli.log_level));
    let resolver = SecretResolver::from_settings(&settings, Arc::new(logger));

    match cli.command {
        Commands::Get { name, required } => {
            if let Some(value) = resolver.resolve_secret(&name, required)? {
                println!("{}", value);
            }
        }
        Commands::Config { format } => {
            let config = resolver.resolve_config();
            let output = match format {
                Format::Json => config.to_json().context("Failed to serialize configuration")?,
                Format::Yaml => config.to_yaml().context("Failed to serialize configuration")?,
            };
            println!("{}", output.trim_end());
        }
        Commands::Sources => {
            let sources: Vec<serde_json::Value> = resolver
                .describe_sources()
                .into_iter()
                .map(|(source, status)| serde_json::json!({ "source": source, "status": status }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&sources)?);
        }
        Commands::Health => {
            let report = HealthReport::check(&resolver);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Settings { format } => {
            let output = match format {
                Format::Json => serde_json::to_string_pretty(&settings)?,
                Format::Yaml => serde_yaml::to_string(&settings)?,
            };
            println!("{}", output.trim_end());
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    run(Cli::parse())
}
