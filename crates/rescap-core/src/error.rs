//! Core error types for rescap.
//!
//! Parsing a human-written resource quantity (`"128.GB"`, `"240.h"`, `"16"`)
//! can fail in a handful of well-defined ways. They are collected here so that
//! callers can distinguish a malformed value from an unknown resource kind.

use thiserror::Error;

/// Errors produced while parsing resource quantities.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitError {
    /// The input was empty or whitespace only.
    #[error("Empty {what} string")]
    Empty {
        /// What was being parsed (memory, duration, cpu count).
        what: &'static str,
    },

    /// The numeric part could not be parsed.
    #[error("Invalid number in {what}: '{input}'")]
    InvalidNumber {
        /// What was being parsed.
        what: &'static str,
        /// The offending input.
        input: String,
    },

    /// Negative quantities are never valid resources.
    #[error("Negative {what} is not allowed: '{input}'")]
    Negative {
        /// What was being parsed.
        what: &'static str,
        /// The offending input.
        input: String,
    },

    /// The unit suffix is not recognized.
    #[error("Unknown {what} unit: '{unit}'")]
    UnknownUnit {
        /// What was being parsed.
        what: &'static str,
        /// The unrecognized unit.
        unit: String,
    },

    /// The value does not fit in the underlying representation.
    #[error("{what} value too large: '{input}'")]
    Overflow {
        /// What was being parsed.
        what: &'static str,
        /// The offending input.
        input: String,
    },

    /// A CPU count of zero was given.
    #[error("CPU count must be positive")]
    ZeroCpus,

    /// The resource kind tag is not one of `memory`, `time` or `cpus`.
    #[error("Unrecognized resource kind: '{0}'")]
    UnrecognizedKind(String),
}

/// Result type alias for unit parsing.
pub type UnitResult<T> = std::result::Result<T, UnitError>;
