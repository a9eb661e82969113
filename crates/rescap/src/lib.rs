//! # Rescap - Resource Ceilings for Workflow Tasks
//!
//! Rescap clamps the memory, wall-clock time and CPU count requested by
//! workflow tasks to ceilings set by a cluster administrator. It is meant to
//! be embedded in a workflow host, which asks for the enforced value of each
//! resource dimension before submitting a task.
//!
//! ## Features
//!
//! - **Typed resources**: memory, time and CPU counts never compare across kinds
//! - **Forgiving configuration**: a malformed ceiling is reported and ignored,
//!   it never halts a pipeline
//! - **Presets**: the pipeline's default ceilings and its CI `test` profile
//! - **Shareable**: a built limiter is immutable and `Send + Sync`
//!
//! ## Quick Start
//!
//! ```ignore
//! use rescap::prelude::*;
//!
//! let limiter = Rescap::builder()
//!     .with_preset(Preset::PipelineDefaults)
//!     .with_max_cpus(8u32)
//!     .build()?;
//!
//! let enforced = limiter.clamp(ResourceValue::Cpus(16), ResourceKind::Cpus)?;
//! assert_eq!(enforced, ResourceValue::Cpus(8));
//! ```
//!
//! ## Layering
//!
//! Ceilings are layered, later layers overriding earlier ones per key:
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │  explicit overrides (with_max_*)     │
//! ├──────────────────────────────────────┤
//! │  programmatic limits (with_limits)   │
//! ├──────────────────────────────────────┤
//! │  config files, in order added        │
//! ├──────────────────────────────────────┤
//! │  preset                              │
//! └──────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use rescap_limits::{
    FallbackCallback, LimitsConfig, RawLimit, ResourceLimiter, ResourceResult,
};

// Re-export from sub-crates
pub use rescap_core;
pub use rescap_limits;

/// Main entry point for Rescap.
pub struct Rescap;

impl Rescap {
    /// Create a new limiter builder.
    pub fn builder() -> RescapBuilder {
        RescapBuilder::new()
    }

    /// Create a limiter with the pipeline's default ceilings.
    pub fn with_defaults() -> Arc<ResourceLimiter> {
        Arc::new(ResourceLimiter::new(LimitsConfig::pipeline_defaults()))
    }
}

/// Named sets of ceilings to start from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Preset {
    /// No ceilings.
    #[default]
    None,
    /// 128 GB, 240 h, 16 CPUs.
    PipelineDefaults,
    /// 6 GB, 48 h, 2 CPUs.
    Test,
}

impl Preset {
    /// The ceilings for this preset.
    pub fn limits(&self) -> LimitsConfig {
        match self {
            Preset::None => LimitsConfig::new(),
            Preset::PipelineDefaults => LimitsConfig::pipeline_defaults(),
            Preset::Test => LimitsConfig::test_profile(),
        }
    }
}

/// Builder for configuring a resource limiter.
pub struct RescapBuilder {
    preset: Preset,
    config_files: Vec<PathBuf>,
    limits: LimitsConfig,
    overrides: LimitsConfig,
    on_fallback: Option<FallbackCallback>,
}

impl RescapBuilder {
    /// Create a new builder with no ceilings.
    pub fn new() -> Self {
        Self {
            preset: Preset::None,
            config_files: Vec::new(),
            limits: LimitsConfig::new(),
            overrides: LimitsConfig::new(),
            on_fallback: None,
        }
    }

    /// Start from a preset.
    pub fn with_preset(mut self, preset: Preset) -> Self {
        self.preset = preset;
        self
    }

    /// Layer a TOML config file over the preset.
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_files.push(path.into());
        self
    }

    /// Layer programmatic limits over the preset and config files.
    pub fn with_limits(mut self, limits: LimitsConfig) -> Self {
        self.limits = self.limits.merge(limits);
        self
    }

    // Overrides

    /// Override the memory ceiling.
    pub fn with_max_memory(mut self, limit: impl Into<RawLimit>) -> Self {
        self.overrides = self.overrides.with_max_memory(limit);
        self
    }

    /// Override the time ceiling.
    pub fn with_max_time(mut self, limit: impl Into<RawLimit>) -> Self {
        self.overrides = self.overrides.with_max_time(limit);
        self
    }

    /// Override the CPU ceiling.
    pub fn with_max_cpus(mut self, limit: impl Into<RawLimit>) -> Self {
        self.overrides = self.overrides.with_max_cpus(limit);
        self
    }

    // Observability

    /// Register a callback for fallback diagnostics.
    pub fn with_fallback_callback(mut self, callback: FallbackCallback) -> Self {
        self.on_fallback = Some(callback);
        self
    }

    /// Resolve all layers into a single configuration.
    pub fn resolve(&self) -> ResourceResult<LimitsConfig> {
        let mut config = self.preset.limits();
        for path in &self.config_files {
            config = config.merge(LimitsConfig::from_file(path)?);
        }
        Ok(config.merge(self.limits.clone()).merge(self.overrides.clone()))
    }

    /// Build the limiter.
    pub fn build(self) -> ResourceResult<Arc<ResourceLimiter>> {
        let config = self.resolve()?;
        debug!(preset = ?self.preset, ?config, "Building resource limiter");

        let limiter = match self.on_fallback {
            Some(callback) => ResourceLimiter::with_fallback_callback(config, callback),
            None => ResourceLimiter::new(config),
        };
        Ok(Arc::new(limiter))
    }
}

impl Default for RescapBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RescapBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RescapBuilder")
            .field("preset", &self.preset)
            .field("config_files", &self.config_files)
            .field("limits", &self.limits)
            .field("overrides", &self.overrides)
            .finish()
    }
}

/// Prelude module for convenient imports.
pub mod prelude {
    // Main types
    pub use crate::{Preset, Rescap, RescapBuilder};

    // Core types
    pub use rescap_core::{MemorySize, ResourceKind, ResourceValue, UnitError};

    // Limit types
    pub use rescap_limits::{
        LimitFallback, LimitsConfig, RawLimit, ResourceError, ResourceLimiter, ResourceResult,
        TaskRequest,
    };

    // Common std types
    pub use std::sync::Arc;
    pub use std::time::Duration;
}
