//! Administrator-supplied resource ceilings.
//!
//! A [`LimitsConfig`] stores the ceilings exactly as they were written. It is
//! not validated here: a malformed value is a legal configuration that the
//! limiter recovers from at clamp time.

use std::fmt;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use rescap_core::{ResourceKind, ResourceValue, UnitResult};

use crate::error::{ResourceError, ResourceResult};

/// A configured ceiling as written by an administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RawLimit {
    /// A plain integer: bytes, milliseconds or a CPU count depending on kind.
    Integer(i64),
    /// A unit string such as `"128.GB"` or `"240.h"`.
    Text(String),
}

impl RawLimit {
    /// Interpret this raw value as a value of the given kind.
    pub fn parse(&self, kind: ResourceKind) -> UnitResult<ResourceValue> {
        match self {
            RawLimit::Integer(value) => ResourceValue::from_integer(kind, *value),
            RawLimit::Text(text) => ResourceValue::parse(kind, text),
        }
    }

    fn from_toml(value: &toml::Value) -> Self {
        match value {
            toml::Value::Integer(i) => RawLimit::Integer(*i),
            toml::Value::String(s) => RawLimit::Text(s.clone()),
            other => RawLimit::Text(other.to_string()),
        }
    }
}

impl fmt::Display for RawLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawLimit::Integer(value) => write!(f, "{}", value),
            RawLimit::Text(text) => f.write_str(text),
        }
    }
}

impl From<&str> for RawLimit {
    fn from(s: &str) -> Self {
        RawLimit::Text(s.to_string())
    }
}

impl From<String> for RawLimit {
    fn from(s: String) -> Self {
        RawLimit::Text(s)
    }
}

impl From<i64> for RawLimit {
    fn from(value: i64) -> Self {
        RawLimit::Integer(value)
    }
}

impl From<u32> for RawLimit {
    fn from(value: u32) -> Self {
        RawLimit::Integer(i64::from(value))
    }
}

impl From<ResourceValue> for RawLimit {
    fn from(value: ResourceValue) -> Self {
        let integer = match value {
            ResourceValue::Memory(size) => size.as_bytes().try_into().unwrap_or(i64::MAX),
            ResourceValue::Time(duration) => duration.as_millis().try_into().unwrap_or(i64::MAX),
            ResourceValue::Cpus(cpus) => i64::from(cpus),
        };
        RawLimit::Integer(integer)
    }
}

/// Ceilings for each resource kind. Any of them may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LimitsConfig {
    /// Maximum memory per task.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_memory: Option<RawLimit>,
    /// Maximum wall-clock time per task.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_time: Option<RawLimit>,
    /// Maximum CPUs per task.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_cpus: Option<RawLimit>,
}

impl LimitsConfig {
    /// Create a configuration with no ceilings.
    pub fn new() -> Self {
        Self::default()
    }

    /// The default ceilings shipped with the epitope prediction pipeline.
    pub fn pipeline_defaults() -> Self {
        Self {
            max_memory: Some(RawLimit::from("128.GB")),
            max_time: Some(RawLimit::from("240.h")),
            max_cpus: Some(RawLimit::Integer(16)),
        }
    }

    /// Ceilings used by the pipeline's `test` profile, sized for CI runners.
    pub fn test_profile() -> Self {
        Self {
            max_memory: Some(RawLimit::from("6.GB")),
            max_time: Some(RawLimit::from("48.h")),
            max_cpus: Some(RawLimit::Integer(2)),
        }
    }

    /// Set the memory ceiling.
    pub fn with_max_memory(mut self, limit: impl Into<RawLimit>) -> Self {
        self.max_memory = Some(limit.into());
        self
    }

    /// Set the time ceiling.
    pub fn with_max_time(mut self, limit: impl Into<RawLimit>) -> Self {
        self.max_time = Some(limit.into());
        self
    }

    /// Set the CPU ceiling.
    pub fn with_max_cpus(mut self, limit: impl Into<RawLimit>) -> Self {
        self.max_cpus = Some(limit.into());
        self
    }

    /// Set the ceiling for an arbitrary kind.
    pub fn with_limit(mut self, kind: ResourceKind, limit: impl Into<RawLimit>) -> Self {
        *self.slot_mut(kind) = Some(limit.into());
        self
    }

    /// Get the raw ceiling for a kind, if configured.
    pub fn get(&self, kind: ResourceKind) -> Option<&RawLimit> {
        match kind {
            ResourceKind::Memory => self.max_memory.as_ref(),
            ResourceKind::Time => self.max_time.as_ref(),
            ResourceKind::Cpus => self.max_cpus.as_ref(),
        }
    }

    fn slot_mut(&mut self, kind: ResourceKind) -> &mut Option<RawLimit> {
        match kind {
            ResourceKind::Memory => &mut self.max_memory,
            ResourceKind::Time => &mut self.max_time,
            ResourceKind::Cpus => &mut self.max_cpus,
        }
    }

    /// Whether no ceiling is configured at all.
    pub fn is_empty(&self) -> bool {
        ResourceKind::ALL.iter().all(|kind| self.get(*kind).is_none())
    }

    /// Layer `other` on top of `self`. Ceilings present in `other` win.
    pub fn merge(mut self, other: LimitsConfig) -> Self {
        for kind in ResourceKind::ALL {
            if let Some(limit) = other.get(kind) {
                *self.slot_mut(kind) = Some(limit.clone());
            }
        }
        self
    }

    /// Build a configuration from host-supplied key/value pairs.
    ///
    /// Only `max_memory`, `max_time` and `max_cpus` are read; other keys
    /// belong to the host and are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<RawLimit>,
    {
        let mut config = Self::default();
        for (key, value) in pairs {
            if let Some(kind) = kind_for_key(key.as_ref()) {
                *config.slot_mut(kind) = Some(value.into());
            }
        }
        config
    }

    /// Parse ceilings from TOML.
    ///
    /// Keys may sit at the top level or inside a `[params]` table; the
    /// `[params]` table wins when both are present.
    pub fn from_toml_str(s: &str) -> ResourceResult<Self> {
        let table: toml::Table = toml::from_str(s)?;

        let mut config = Self::from_toml_table(&table);
        match table.get("params") {
            Some(toml::Value::Table(params)) => {
                config = config.merge(Self::from_toml_table(params));
            }
            Some(other) => {
                return Err(ResourceError::InvalidConfig(format!(
                    "'params' must be a table, found {}",
                    other.type_str()
                )));
            }
            None => {}
        }

        Ok(config)
    }

    fn from_toml_table(table: &toml::Table) -> Self {
        Self::from_pairs(
            table
                .iter()
                .filter(|(key, _)| kind_for_key(key).is_some())
                .map(|(key, value)| (key, RawLimit::from_toml(value))),
        )
    }

    /// Load ceilings from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> ResourceResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ResourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&contents)?;
        debug!(path = %path.display(), ?config, "Loaded resource ceilings");
        Ok(config)
    }
}

fn kind_for_key(key: &str) -> Option<ResourceKind> {
    ResourceKind::ALL
        .into_iter()
        .find(|kind| kind.config_key() == key)
}
