//! Resource request clamping.
//!
//! This module provides the [`ResourceLimiter`], which holds the parsed
//! ceilings from a [`LimitsConfig`] and clamps per-task resource requests to
//! them. A ceiling that fails to parse never aborts the caller: the request
//! passes through unchanged and a diagnostic is emitted.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use rescap_core::{MemorySize, ResourceKind, ResourceValue, UnitError};

use crate::config::LimitsConfig;
use crate::error::{ResourceError, ResourceResult};

/// Callback type for fallback events.
pub type FallbackCallback = Box<dyn Fn(&LimitFallback) + Send + Sync>;

/// A configured ceiling that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid {kind} ceiling '{configured}': {error}")]
pub struct InvalidLimit {
    /// Kind of the ceiling.
    pub kind: ResourceKind,
    /// The configured text, as written.
    pub configured: String,
    /// Why it failed to parse.
    #[source]
    pub error: UnitError,
}

/// Event emitted when a request passes through because its ceiling is invalid.
#[derive(Debug, Clone, PartialEq)]
pub struct LimitFallback {
    /// Kind of the ceiling.
    pub kind: ResourceKind,
    /// The invalid configured text.
    pub configured: String,
    /// The value used instead (the unmodified request).
    pub fallback: ResourceValue,
}

impl fmt::Display for LimitFallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Max {} '{}' is not valid, using requested value {}",
            self.kind, self.configured, self.fallback
        )
    }
}

/// A per-task resource request. Absent dimensions are left alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskRequest {
    /// Requested memory.
    pub memory: Option<MemorySize>,
    /// Requested wall-clock time.
    pub time: Option<Duration>,
    /// Requested CPUs.
    pub cpus: Option<u32>,
}

impl TaskRequest {
    /// Create an empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request memory.
    pub fn with_memory(mut self, memory: MemorySize) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Request wall-clock time.
    pub fn with_time(mut self, time: Duration) -> Self {
        self.time = Some(time);
        self
    }

    /// Request CPUs.
    pub fn with_cpus(mut self, cpus: u32) -> Self {
        self.cpus = Some(cpus);
        self
    }

    /// The requested dimensions as typed values.
    pub fn values(&self) -> Vec<ResourceValue> {
        let mut values = Vec::with_capacity(3);
        if let Some(memory) = self.memory {
            values.push(ResourceValue::Memory(memory));
        }
        if let Some(time) = self.time {
            values.push(ResourceValue::Time(time));
        }
        if let Some(cpus) = self.cpus {
            values.push(ResourceValue::Cpus(cpus));
        }
        values
    }
}

/// Clamps resource requests to administrator-configured ceilings.
///
/// Ceilings and the fallback callback are fixed at construction and never
/// change afterwards, so a limiter can be shared across threads and queried
/// concurrently without locking.
pub struct ResourceLimiter {
    /// Configuration, as written.
    config: LimitsConfig,
    /// Parsed ceilings, indexed by [`slot`].
    ceilings: [Option<Result<ResourceValue, InvalidLimit>>; 3],
    /// Number of clamp operations.
    clamp_count: AtomicU64,
    /// Number of requests reduced to their ceiling.
    reduced_count: AtomicU64,
    /// Number of requests passed through because of an invalid ceiling.
    fallback_count: AtomicU64,
    /// Optional callback for fallback events.
    on_fallback: Option<FallbackCallback>,
}

fn slot(kind: ResourceKind) -> usize {
    match kind {
        ResourceKind::Memory => 0,
        ResourceKind::Time => 1,
        ResourceKind::Cpus => 2,
    }
}

impl ResourceLimiter {
    /// Create a limiter from a configuration.
    pub fn new(config: LimitsConfig) -> Self {
        Self::build(config, None)
    }

    /// Create a limiter that reports every fallback to `callback`.
    ///
    /// The callback runs on the clamping thread, concurrently with other
    /// clamps.
    pub fn with_fallback_callback(config: LimitsConfig, callback: FallbackCallback) -> Self {
        Self::build(config, Some(callback))
    }

    fn build(config: LimitsConfig, on_fallback: Option<FallbackCallback>) -> Self {
        let ceilings = ResourceKind::ALL.map(|kind| {
            config.get(kind).map(|raw| {
                raw.parse(kind).map_err(|error| InvalidLimit {
                    kind,
                    configured: raw.to_string(),
                    error,
                })
            })
        });

        for ceiling in ceilings.iter().flatten() {
            match ceiling {
                Ok(value) => debug!(kind = %value.kind(), ceiling = %value, "Resource ceiling configured"),
                Err(invalid) => debug!(
                    kind = %invalid.kind,
                    configured = %invalid.configured,
                    error = %invalid.error,
                    "Resource ceiling is invalid and will be ignored"
                ),
            }
        }

        Self {
            config,
            ceilings,
            clamp_count: AtomicU64::new(0),
            reduced_count: AtomicU64::new(0),
            fallback_count: AtomicU64::new(0),
            on_fallback,
        }
    }

    /// Create a limiter with no ceilings.
    pub fn unlimited() -> Self {
        Self::new(LimitsConfig::new())
    }

    /// The configuration this limiter was built from.
    pub fn config(&self) -> &LimitsConfig {
        &self.config
    }

    /// The effective ceiling for a kind. `None` if absent or invalid.
    pub fn ceiling(&self, kind: ResourceKind) -> Option<ResourceValue> {
        match &self.ceilings[slot(kind)] {
            Some(Ok(value)) => Some(*value),
            _ => None,
        }
    }

    /// The parse outcome of the configured ceiling, if one is configured.
    pub fn configured_ceiling(&self, kind: ResourceKind) -> Option<&Result<ResourceValue, InvalidLimit>> {
        self.ceilings[slot(kind)].as_ref()
    }

    /// All configured ceilings that failed to parse.
    pub fn invalid_limits(&self) -> impl Iterator<Item = &InvalidLimit> {
        self.ceilings
            .iter()
            .filter_map(|ceiling| ceiling.as_ref().and_then(|c| c.as_ref().err()))
    }

    /// Clamp a request of the given kind to its ceiling.
    ///
    /// Returns the ceiling if the request exceeds it, otherwise the request.
    /// If no ceiling is configured, or the configured one is invalid, the
    /// request is returned unchanged. Fails only if `requested` is not a
    /// value of `kind`.
    pub fn clamp(&self, requested: ResourceValue, kind: ResourceKind) -> ResourceResult<ResourceValue> {
        if requested.kind() != kind {
            return Err(ResourceError::KindMismatch {
                expected: kind,
                actual: requested.kind(),
            });
        }
        Ok(self.clamp_value(requested))
    }

    /// Clamp a request against the ceiling for its own kind.
    pub fn clamp_value(&self, requested: ResourceValue) -> ResourceValue {
        self.clamp_count.fetch_add(1, Ordering::Relaxed);
        let kind = requested.kind();

        match &self.ceilings[slot(kind)] {
            None => requested,
            Some(Ok(ceiling)) => {
                if requested > *ceiling {
                    self.reduced_count.fetch_add(1, Ordering::Relaxed);
                    debug!(
                        kind = %kind,
                        requested = %requested,
                        ceiling = %ceiling,
                        "Request reduced to ceiling"
                    );
                    *ceiling
                } else {
                    requested
                }
            }
            Some(Err(invalid)) => {
                self.fallback(invalid, requested);
                requested
            }
        }
    }

    /// Clamp a request given as strings, e.g. `("memory", "256.GB")`.
    pub fn clamp_str(&self, kind: &str, requested: &str) -> ResourceResult<ResourceValue> {
        let kind: ResourceKind = kind
            .parse()
            .map_err(|_: UnitError| ResourceError::UnrecognizedKind(kind.to_string()))?;
        let value = ResourceValue::parse(kind, requested).map_err(|source| {
            ResourceError::InvalidRequest {
                kind,
                input: requested.to_string(),
                source,
            }
        })?;
        self.clamp(value, kind)
    }

    /// Clamp every dimension present in a task request.
    pub fn clamp_request(&self, request: TaskRequest) -> TaskRequest {
        TaskRequest {
            memory: request
                .memory
                .and_then(|m| self.clamp_value(ResourceValue::Memory(m)).as_memory()),
            time: request
                .time
                .and_then(|t| self.clamp_value(ResourceValue::Time(t)).as_time()),
            cpus: request
                .cpus
                .and_then(|c| self.clamp_value(ResourceValue::Cpus(c)).as_cpus()),
        }
    }

    fn fallback(&self, invalid: &InvalidLimit, requested: ResourceValue) {
        self.fallback_count.fetch_add(1, Ordering::Relaxed);

        let event = LimitFallback {
            kind: invalid.kind,
            configured: invalid.configured.clone(),
            fallback: requested,
        };

        warn!(
            kind = %event.kind,
            configured = %event.configured,
            fallback = %event.fallback,
            "{}",
            event
        );

        if let Some(callback) = &self.on_fallback {
            callback(&event);
        }
    }

    /// Reset the statistics counters.
    pub fn reset(&self) {
        self.clamp_count.store(0, Ordering::Relaxed);
        self.reduced_count.store(0, Ordering::Relaxed);
        self.fallback_count.store(0, Ordering::Relaxed);
    }

    /// Get a snapshot of the current statistics.
    pub fn stats(&self) -> LimiterStats {
        LimiterStats {
            clamps: self.clamp_count.load(Ordering::Relaxed),
            reductions: self.reduced_count.load(Ordering::Relaxed),
            fallbacks: self.fallback_count.load(Ordering::Relaxed),
            invalid_ceilings: self.invalid_limits().count(),
        }
    }
}

/// Clamp a single request against a configuration.
///
/// Convenience for one-off checks; hosts clamping many requests should build
/// a [`ResourceLimiter`] once and reuse it.
pub fn clamp(
    requested: ResourceValue,
    kind: ResourceKind,
    limits: &LimitsConfig,
) -> ResourceResult<ResourceValue> {
    ResourceLimiter::new(limits.clone()).clamp(requested, kind)
}

/// Statistics snapshot from a resource limiter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LimiterStats {
    /// Total clamp operations.
    pub clamps: u64,
    /// Requests reduced to a ceiling.
    pub reductions: u64,
    /// Requests passed through because of an invalid ceiling.
    pub fallbacks: u64,
    /// Configured ceilings that failed to parse.
    pub invalid_ceilings: usize,
}

impl fmt::Debug for ResourceLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceLimiter")
            .field("config", &self.config)
            .field("ceilings", &self.ceilings)
            .field("stats", &self.stats())
            .finish()
    }
}
