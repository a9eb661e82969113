//! Error types for resource limiting.

use std::path::PathBuf;

use rescap_core::{ResourceKind, UnitError};
use thiserror::Error;

/// Errors surfaced to callers of the limiter.
///
/// A malformed configured ceiling is deliberately absent from this list:
/// it is recovered locally by falling back to the requested value.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The requested value is of a different kind than the one asked for.
    #[error("Resource kind mismatch: asked to clamp {expected}, got a {actual} value")]
    KindMismatch {
        /// Kind named by the caller.
        expected: ResourceKind,
        /// Kind of the value actually supplied.
        actual: ResourceKind,
    },

    /// The resource kind tag is not memory, time or cpus.
    #[error("Unrecognized resource kind: '{0}'")]
    UnrecognizedKind(String),

    /// The requested value itself could not be parsed.
    #[error("Invalid {kind} request '{input}': {source}")]
    InvalidRequest {
        /// Kind being requested.
        kind: ResourceKind,
        /// Raw request string.
        input: String,
        /// Underlying parse error.
        #[source]
        source: UnitError,
    },

    /// Failed to read a limits file.
    #[error("Failed to read limits file {path}: {source}")]
    Io {
        /// Path of the file.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The limits file is not valid TOML.
    #[error("Failed to parse limits config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The limits file is valid TOML but structurally wrong.
    #[error("Invalid limits configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for resource operations.
pub type ResourceResult<T> = std::result::Result<T, ResourceError>;
