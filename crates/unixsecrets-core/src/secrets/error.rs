//! Errors raised while resolving and converting secrets

use thiserror::Error;

use crate::schema::ValueKind;

/// Errors that can occur during secret resolution
#[derive(Error, Debug)]
pub enum SecretError {
    /// A secret requested as required was not found in any source
    #[error("Required secret '{0}' not found in any source")]
    MissingRequired(String),

    /// The name cannot be used as a secret name (empty, or would escape a
    /// directory source)
    #[error("Invalid secret name: {0:?}")]
    InvalidName(String),

    /// A single source failed while being scanned
    ///
    /// The resolver logs these and moves on to the next source.
    #[error("Error reading secret '{name}' from {origin}: {source}")]
    SourceRead {
        name: String,
        origin: String,
        #[source]
        source: std::io::Error,
    },

    /// A raw secret value could not be converted to its schema type
    #[error("Cannot convert '{config_key}' to {kind}: {reason}")]
    Conversion {
        config_key: String,
        kind: ValueKind,
        reason: String,
    },
}

impl SecretError {
    /// Whether this error is a missing required secret
    pub fn is_missing(&self) -> bool {
        matches!(self, SecretError::MissingRequired(_))
    }
}

pub type SecretResult<T> = Result<T, SecretError>;
