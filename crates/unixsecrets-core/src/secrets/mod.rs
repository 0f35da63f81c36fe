//! Secret sources and resolution
//!
//! This module provides:
//! - `Source`: a directory of secret files or an environment mapping
//! - `SecretResolver`: ordered, memoized lookup across sources
//! - `SecretError`: what can go wrong along the way

mod error;
mod source;
mod resolver;

pub use error::{SecretError, SecretResult};
pub use source::{validate_secret_name, EnvironmentSource, Source, SourceStatus};
pub use resolver::{ResolvedSecret, SecretResolver};
