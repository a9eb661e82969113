//! Resource kinds and typed resource values.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::duration::{format_duration, parse_duration};
use crate::error::{UnitError, UnitResult};
use crate::memory::MemorySize;

/// The resource dimensions a task can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// Memory, measured in bytes.
    Memory,
    /// Wall-clock time.
    Time,
    /// Number of CPUs.
    Cpus,
}

impl ResourceKind {
    /// All kinds, in the order they are usually reported.
    pub const ALL: [ResourceKind; 3] = [ResourceKind::Memory, ResourceKind::Time, ResourceKind::Cpus];

    /// The lowercase tag for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Memory => "memory",
            ResourceKind::Time => "time",
            ResourceKind::Cpus => "cpus",
        }
    }

    /// The configuration key holding the ceiling for this kind.
    pub fn config_key(&self) -> &'static str {
        match self {
            ResourceKind::Memory => "max_memory",
            ResourceKind::Time => "max_time",
            ResourceKind::Cpus => "max_cpus",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = UnitError;

    fn from_str(s: &str) -> UnitResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(ResourceKind::Memory),
            "time" => Ok(ResourceKind::Time),
            "cpus" | "cpu" => Ok(ResourceKind::Cpus),
            _ => Err(UnitError::UnrecognizedKind(s.to_string())),
        }
    }
}

/// Parse a CPU count. Must be a positive integer.
pub fn parse_cpus(input: &str) -> UnitResult<u32> {
    let s = input.trim();
    if s.is_empty() {
        return Err(UnitError::Empty { what: "cpu count" });
    }
    if s.starts_with('-') {
        return Err(UnitError::Negative {
            what: "cpu count",
            input: s.to_string(),
        });
    }
    if !s.chars().all(|c| c.is_ascii_digit()) {
        return Err(UnitError::InvalidNumber {
            what: "cpu count",
            input: s.to_string(),
        });
    }
    let cpus: u32 = s.parse().map_err(|_| UnitError::Overflow {
        what: "cpu count",
        input: s.to_string(),
    })?;
    if cpus == 0 {
        return Err(UnitError::ZeroCpus);
    }
    Ok(cpus)
}

/// A resource quantity tagged with its kind.
///
/// Values only compare against values of the same kind; `partial_cmp`
/// returns `None` across kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceValue {
    /// A memory quantity.
    Memory(MemorySize),
    /// A wall-clock duration.
    Time(Duration),
    /// A CPU count.
    Cpus(u32),
}

impl ResourceValue {
    /// The kind of this value.
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceValue::Memory(_) => ResourceKind::Memory,
            ResourceValue::Time(_) => ResourceKind::Time,
            ResourceValue::Cpus(_) => ResourceKind::Cpus,
        }
    }

    /// Parse a value of the given kind from its string form.
    pub fn parse(kind: ResourceKind, input: &str) -> UnitResult<Self> {
        match kind {
            ResourceKind::Memory => MemorySize::parse(input).map(ResourceValue::Memory),
            ResourceKind::Time => parse_duration(input).map(ResourceValue::Time),
            ResourceKind::Cpus => parse_cpus(input).map(ResourceValue::Cpus),
        }
    }

    /// Interpret an integer configured value as a value of the given kind.
    ///
    /// Memory integers are bytes, time integers are milliseconds.
    pub fn from_integer(kind: ResourceKind, value: i64) -> UnitResult<Self> {
        let what = match kind {
            ResourceKind::Memory => "memory",
            ResourceKind::Time => "duration",
            ResourceKind::Cpus => "cpu count",
        };
        let unsigned = u64::try_from(value).map_err(|_| UnitError::Negative {
            what,
            input: value.to_string(),
        })?;
        match kind {
            ResourceKind::Memory => Ok(ResourceValue::Memory(MemorySize::from_bytes(unsigned))),
            ResourceKind::Time => Ok(ResourceValue::Time(Duration::from_millis(unsigned))),
            ResourceKind::Cpus => {
                let cpus = u32::try_from(unsigned).map_err(|_| UnitError::Overflow {
                    what,
                    input: value.to_string(),
                })?;
                if cpus == 0 {
                    return Err(UnitError::ZeroCpus);
                }
                Ok(ResourceValue::Cpus(cpus))
            }
        }
    }

    /// Get the memory size, if this is a memory value.
    pub fn as_memory(&self) -> Option<MemorySize> {
        match self {
            ResourceValue::Memory(size) => Some(*size),
            _ => None,
        }
    }

    /// Get the duration, if this is a time value.
    pub fn as_time(&self) -> Option<Duration> {
        match self {
            ResourceValue::Time(duration) => Some(*duration),
            _ => None,
        }
    }

    /// Get the CPU count, if this is a CPU value.
    pub fn as_cpus(&self) -> Option<u32> {
        match self {
            ResourceValue::Cpus(cpus) => Some(*cpus),
            _ => None,
        }
    }
}

impl PartialOrd for ResourceValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (ResourceValue::Memory(a), ResourceValue::Memory(b)) => Some(a.cmp(b)),
            (ResourceValue::Time(a), ResourceValue::Time(b)) => Some(a.cmp(b)),
            (ResourceValue::Cpus(a), ResourceValue::Cpus(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceValue::Memory(size) => write!(f, "{}", size),
            ResourceValue::Time(duration) => f.write_str(&format_duration(duration)),
            ResourceValue::Cpus(cpus) => write!(f, "{}", cpus),
        }
    }
}

impl Serialize for ResourceValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ResourceValue::Cpus(cpus) => serializer.serialize_u32(*cpus),
            other => serializer.collect_str(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_str() {
        assert_eq!("memory".parse::<ResourceKind>().unwrap(), ResourceKind::Memory);
        assert_eq!("TIME".parse::<ResourceKind>().unwrap(), ResourceKind::Time);
        assert_eq!("cpus".parse::<ResourceKind>().unwrap(), ResourceKind::Cpus);
        assert_eq!("cpu".parse::<ResourceKind>().unwrap(), ResourceKind::Cpus);
    }

    #[test]
    fn test_kind_unrecognized() {
        let err = "gpus".parse::<ResourceKind>().unwrap_err();
        assert_eq!(err, UnitError::UnrecognizedKind("gpus".to_string()));
    }

    #[test]
    fn test_config_keys() {
        let keys: Vec<_> = ResourceKind::ALL.iter().map(|k| k.config_key()).collect();
        assert_eq!(keys, ["max_memory", "max_time", "max_cpus"]);
    }

    #[test]
    fn test_parse_cpus() {
        assert_eq!(parse_cpus("16").unwrap(), 16);
        assert_eq!(parse_cpus("0"), Err(UnitError::ZeroCpus));
        assert!(matches!(parse_cpus("-2"), Err(UnitError::Negative { .. })));
        assert!(matches!(parse_cpus("4.5"), Err(UnitError::InvalidNumber { .. })));
        assert!(matches!(parse_cpus("lots"), Err(UnitError::InvalidNumber { .. })));
    }

    #[test]
    fn test_value_parse_by_kind() {
        assert_eq!(
            ResourceValue::parse(ResourceKind::Memory, "64.GB").unwrap(),
            ResourceValue::Memory(MemorySize::from_gb(64))
        );
        assert_eq!(
            ResourceValue::parse(ResourceKind::Time, "240.h").unwrap(),
            ResourceValue::Time(Duration::from_secs(240 * 3600))
        );
        assert_eq!(
            ResourceValue::parse(ResourceKind::Cpus, "8").unwrap(),
            ResourceValue::Cpus(8)
        );
    }

    #[test]
    fn test_value_from_integer() {
        assert_eq!(
            ResourceValue::from_integer(ResourceKind::Memory, 1024).unwrap(),
            ResourceValue::Memory(MemorySize::from_kb(1))
        );
        assert_eq!(
            ResourceValue::from_integer(ResourceKind::Time, 2000).unwrap(),
            ResourceValue::Time(Duration::from_secs(2))
        );
        assert_eq!(
            ResourceValue::from_integer(ResourceKind::Cpus, 0),
            Err(UnitError::ZeroCpus)
        );
        assert!(matches!(
            ResourceValue::from_integer(ResourceKind::Cpus, -3),
            Err(UnitError::Negative { .. })
        ));
    }

    #[test]
    fn test_ordering_same_kind_only() {
        let small = ResourceValue::Memory(MemorySize::from_gb(1));
        let large = ResourceValue::Memory(MemorySize::from_gb(2));
        assert!(small < large);

        let cpus = ResourceValue::Cpus(4);
        assert_eq!(small.partial_cmp(&cpus), None);
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_string(&ResourceValue::Memory(MemorySize::from_gb(6))).unwrap();
        assert_eq!(json, "\"6 GB\"");
        let json = serde_json::to_string(&ResourceValue::Cpus(2)).unwrap();
        assert_eq!(json, "2");
        let json = serde_json::to_string(&ResourceKind::Time).unwrap();
        assert_eq!(json, "\"time\"");
    }
}
