//! Byte quantities.
//!
//! Memory ceilings are written by administrators in the loose style workflow
//! configs use: `"128.GB"`, `"6 GB"`, `"1.5TB"`, or a bare byte count. All
//! units are binary (1 KB = 1024 bytes).

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::{UnitError, UnitResult};

const WHAT: &str = "memory";

const KB: u64 = 1024;
const MB: u64 = KB * 1024;
const GB: u64 = MB * 1024;
const TB: u64 = GB * 1024;
const PB: u64 = TB * 1024;

/// Display units, largest first. A size is shown in the largest unit that
/// divides it exactly, so the displayed form never hides a difference.
const DISPLAY_UNITS: [(u64, &str); 5] = [(PB, "PB"), (TB, "TB"), (GB, "GB"), (MB, "MB"), (KB, "KB")];

/// A quantity of memory in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct MemorySize(u64);

impl MemorySize {
    /// Create a size from a byte count.
    pub const fn from_bytes(bytes: u64) -> Self {
        Self(bytes)
    }

    /// Create a size from a number of kilobytes.
    pub const fn from_kb(kb: u64) -> Self {
        Self(kb.saturating_mul(KB))
    }

    /// Create a size from a number of megabytes.
    pub const fn from_mb(mb: u64) -> Self {
        Self(mb.saturating_mul(MB))
    }

    /// Create a size from a number of gigabytes.
    pub const fn from_gb(gb: u64) -> Self {
        Self(gb.saturating_mul(GB))
    }

    /// Create a size from a number of terabytes.
    pub const fn from_tb(tb: u64) -> Self {
        Self(tb.saturating_mul(TB))
    }

    /// Get the size in bytes.
    pub const fn as_bytes(&self) -> u64 {
        self.0
    }

    /// Parse a memory string such as `"128.GB"` or `"512 MB"`.
    pub fn parse(input: &str) -> UnitResult<Self> {
        let s = input.trim();
        if s.is_empty() {
            return Err(UnitError::Empty { what: WHAT });
        }
        if s.starts_with('-') {
            return Err(UnitError::Negative {
                what: WHAT,
                input: s.to_string(),
            });
        }

        let split = s
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(s.len());
        let (num_str, unit) = s.split_at(split);
        // "128.GB" carries a separator dot, not a fraction
        let num_str = num_str.strip_suffix('.').unwrap_or(num_str);
        if num_str.is_empty() {
            return Err(UnitError::InvalidNumber {
                what: WHAT,
                input: s.to_string(),
            });
        }

        let multiplier = unit_multiplier(unit.trim())?;

        let bytes = if num_str.contains('.') {
            let value: f64 = num_str.parse().map_err(|_| UnitError::InvalidNumber {
                what: WHAT,
                input: num_str.to_string(),
            })?;
            let bytes = (value * multiplier as f64).round();
            if !bytes.is_finite() || bytes >= u64::MAX as f64 {
                return Err(UnitError::Overflow {
                    what: WHAT,
                    input: s.to_string(),
                });
            }
            bytes as u64
        } else {
            // all digits, so the only possible failure is overflow
            let value: u64 = num_str.parse().map_err(|_| UnitError::Overflow {
                what: WHAT,
                input: s.to_string(),
            })?;
            value.checked_mul(multiplier).ok_or_else(|| UnitError::Overflow {
                what: WHAT,
                input: s.to_string(),
            })?
        };

        Ok(Self(bytes))
    }
}

fn unit_multiplier(unit: &str) -> UnitResult<u64> {
    let multiplier = match unit.to_ascii_uppercase().as_str() {
        "" | "B" => 1,
        "K" | "KB" => KB,
        "M" | "MB" => MB,
        "G" | "GB" => GB,
        "T" | "TB" => TB,
        "P" | "PB" => PB,
        _ => {
            return Err(UnitError::UnknownUnit {
                what: WHAT,
                unit: unit.to_string(),
            });
        }
    };
    Ok(multiplier)
}

impl FromStr for MemorySize {
    type Err = UnitError;

    fn from_str(s: &str) -> UnitResult<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for MemorySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (size, name) in DISPLAY_UNITS {
            if self.0 >= size && self.0 % size == 0 {
                return write!(f, "{} {}", self.0 / size, name);
            }
        }
        write!(f, "{} B", self.0)
    }
}

impl Serialize for MemorySize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_workflow_style() {
        assert_eq!(MemorySize::parse("128.GB").unwrap(), MemorySize::from_gb(128));
        assert_eq!(MemorySize::parse("6 GB").unwrap(), MemorySize::from_gb(6));
        assert_eq!(MemorySize::parse("512MB").unwrap(), MemorySize::from_mb(512));
        assert_eq!(MemorySize::parse("2t").unwrap(), MemorySize::from_tb(2));
    }

    #[test]
    fn test_parse_bare_bytes() {
        assert_eq!(MemorySize::parse("4096").unwrap().as_bytes(), 4096);
        assert_eq!(MemorySize::parse(" 10 B ").unwrap().as_bytes(), 10);
    }

    #[test]
    fn test_parse_fraction() {
        assert_eq!(MemorySize::parse("1.5 GB").unwrap(), MemorySize::from_mb(1536));
        assert_eq!(MemorySize::parse("0.5.KB").unwrap().as_bytes(), 512);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(MemorySize::parse("  "), Err(UnitError::Empty { what: "memory" }));
        assert!(matches!(
            MemorySize::parse("-1 GB"),
            Err(UnitError::Negative { .. })
        ));
        assert!(matches!(
            MemorySize::parse("12 parsecs"),
            Err(UnitError::UnknownUnit { .. })
        ));
        assert!(matches!(
            MemorySize::parse("GB"),
            Err(UnitError::InvalidNumber { .. })
        ));
        assert!(matches!(
            MemorySize::parse("1..5GB"),
            Err(UnitError::InvalidNumber { .. })
        ));
        assert!(matches!(
            MemorySize::parse("99999999999 PB"),
            Err(UnitError::Overflow { .. })
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(MemorySize::from_gb(64).to_string(), "64 GB");
        assert_eq!(MemorySize::from_mb(1536).to_string(), "1536 MB");
        assert_eq!(MemorySize::from_bytes(512).to_string(), "512 B");
        assert_eq!(MemorySize::from_tb(1).to_string(), "1 TB");
    }

    #[test]
    fn test_display_keeps_small_differences() {
        let requested = MemorySize::parse("1.04 GB").unwrap();
        let ceiling = MemorySize::from_gb(1);
        assert!(requested > ceiling);
        assert_ne!(requested.to_string(), ceiling.to_string());
        assert_eq!(MemorySize::parse(&requested.to_string()).unwrap(), requested);
        assert_eq!(MemorySize::from_bytes(1025).to_string(), "1025 B");
    }

    #[test]
    fn test_display_parses_back() {
        let size = MemorySize::from_mb(1536);
        assert_eq!(MemorySize::parse(&size.to_string()).unwrap(), size);
    }

    #[test]
    fn test_ordering() {
        assert!(MemorySize::from_gb(64) < MemorySize::from_gb(128));
        assert!(MemorySize::from_mb(2048) == MemorySize::from_gb(2));
    }
}
