//! Rescap Resource Limits
//!
//! This crate enforces administrator-defined ceilings on the resources a
//! workflow task may request:
//!
//! - Ceiling configuration via [`LimitsConfig`]
//! - Request clamping via [`ResourceLimiter`]
//!
//! # Clamping Policy
//!
//! 1. **Valid ceiling**: a request above the ceiling is reduced to it
//! 2. **No ceiling**: the request passes through unchanged
//! 3. **Malformed ceiling**: the request passes through unchanged and a
//!    diagnostic is emitted; the pipeline is never halted by a typo in a
//!    config file
//!
//! ```ignore
//! use rescap_limits::{LimitsConfig, ResourceLimiter};
//! use rescap_core::{MemorySize, ResourceKind, ResourceValue};
//!
//! let limiter = ResourceLimiter::new(LimitsConfig::new().with_max_memory("128.GB"));
//! let enforced = limiter.clamp(
//!     ResourceValue::Memory(MemorySize::from_gb(256)),
//!     ResourceKind::Memory,
//! )?;
//! assert_eq!(enforced.to_string(), "128 GB");
//! ```

pub mod config;
pub mod error;
pub mod limiter;

// Re-export main types
pub use config::{LimitsConfig, RawLimit};
pub use error::{ResourceError, ResourceResult};
pub use limiter::{
    FallbackCallback, InvalidLimit, LimitFallback, LimiterStats, ResourceLimiter, TaskRequest,
    clamp,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::{LimitsConfig, RawLimit};
    pub use crate::error::{ResourceError, ResourceResult};
    pub use crate::limiter::{ResourceLimiter, TaskRequest};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_prelude_imports() {
        use crate::prelude::*;

        let config = LimitsConfig::default();
        let limiter = ResourceLimiter::new(config);
        assert_eq!(limiter.clamp_request(TaskRequest::new()), TaskRequest::new());
    }
}
