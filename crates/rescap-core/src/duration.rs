//! Duration parsing and formatting.
//!
//! Time ceilings come as `"240.h"`, `"2d 6h"`, `"1h30m"` or `"90 min"`. A bare
//! integer is taken as milliseconds, which is how workflow engines coerce
//! plain numbers into durations.

use std::time::Duration;

use crate::error::{UnitError, UnitResult};

const WHAT: &str = "duration";

const SECOND: u64 = 1000;
const MINUTE: u64 = 60 * SECOND;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

/// Parse a duration string (e.g. `"240.h"`, `"2d 6h"`, `"100ms"`).
pub fn parse_duration(input: &str) -> UnitResult<Duration> {
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

    if s.chars().all(|c| c.is_ascii_digit()) {
        let millis: u64 = s.parse().map_err(|_| UnitError::Overflow {
            what: WHAT,
            input: s.to_string(),
        })?;
        return Ok(Duration::from_millis(millis));
    }

    let mut total: u64 = 0;
    let mut rest = s;
    while !rest.is_empty() {
        let num_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (num_str, tail) = rest.split_at(num_end);
        let num_str = num_str.strip_suffix('.').unwrap_or(num_str);
        if num_str.is_empty() {
            return Err(UnitError::InvalidNumber {
                what: WHAT,
                input: s.to_string(),
            });
        }

        let tail = tail.trim_start();
        let unit_end = tail
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_end);
        let unit_millis = unit_millis(unit)?;

        let millis = if num_str.contains('.') {
            let value: f64 = num_str.parse().map_err(|_| UnitError::InvalidNumber {
                what: WHAT,
                input: num_str.to_string(),
            })?;
            let millis = (value * unit_millis as f64).round();
            if !millis.is_finite() || millis >= u64::MAX as f64 {
                return Err(UnitError::Overflow {
                    what: WHAT,
                    input: s.to_string(),
                });
            }
            millis as u64
        } else {
            num_str
                .parse::<u64>()
                .ok()
                .and_then(|value| value.checked_mul(unit_millis))
                .ok_or_else(|| UnitError::Overflow {
                    what: WHAT,
                    input: s.to_string(),
                })?
        };

        total = total.checked_add(millis).ok_or_else(|| UnitError::Overflow {
            what: WHAT,
            input: s.to_string(),
        })?;
        rest = tail.trim_start();
    }

    Ok(Duration::from_millis(total))
}

fn unit_millis(unit: &str) -> UnitResult<u64> {
    let millis = match unit.to_ascii_lowercase().as_str() {
        "ms" | "milli" | "millis" | "millisecond" | "milliseconds" => 1,
        "s" | "sec" | "secs" | "second" | "seconds" => SECOND,
        "m" | "min" | "mins" | "minute" | "minutes" => MINUTE,
        "h" | "hour" | "hours" => HOUR,
        "d" | "day" | "days" => DAY,
        _ => {
            return Err(UnitError::UnknownUnit {
                what: WHAT,
                unit: unit.to_string(),
            });
        }
    };
    Ok(millis)
}

/// Format a duration in compound form (e.g. `"10d"`, `"1h 30m"`).
pub fn format_duration(duration: &Duration) -> String {
    let mut millis = duration.as_millis();
    if millis == 0 {
        return "0ms".to_string();
    }

    let mut parts = Vec::new();
    for (size, name) in [
        (DAY, "d"),
        (HOUR, "h"),
        (MINUTE, "m"),
        (SECOND, "s"),
        (1, "ms"),
    ] {
        let size = u128::from(size);
        let count = millis / size;
        if count > 0 {
            parts.push(format!("{}{}", count, name));
            millis %= size;
        }
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_component() {
        assert_eq!(parse_duration("240.h").unwrap(), Duration::from_secs(240 * 3600));
        assert_eq!(parse_duration("48h").unwrap(), Duration::from_secs(48 * 3600));
        assert_eq!(parse_duration("90 min").unwrap(), Duration::from_secs(90 * 60));
        assert_eq!(parse_duration("100ms").unwrap(), Duration::from_millis(100));
        assert_eq!(parse_duration("2 days").unwrap(), Duration::from_secs(2 * 86400));
    }

    #[test]
    fn test_parse_compound() {
        assert_eq!(
            parse_duration("2d 6h").unwrap(),
            Duration::from_secs(2 * 86400 + 6 * 3600)
        );
        assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
    }

    #[test]
    fn test_parse_fraction() {
        assert_eq!(parse_duration("1.5h").unwrap(), Duration::from_secs(5400));
    }

    #[test]
    fn test_bare_number_is_millis() {
        assert_eq!(parse_duration("1500").unwrap(), Duration::from_millis(1500));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_duration(""), Err(UnitError::Empty { what: "duration" }));
        assert!(matches!(
            parse_duration("not-a-duration"),
            Err(UnitError::InvalidNumber { .. })
        ));
        assert!(matches!(
            parse_duration("10 fortnights"),
            Err(UnitError::UnknownUnit { .. })
        ));
        assert!(matches!(parse_duration("-4h"), Err(UnitError::Negative { .. })));
        assert!(matches!(parse_duration("1h 30"), Err(UnitError::UnknownUnit { .. })));
        assert!(matches!(
            parse_duration("99999999999999999d"),
            Err(UnitError::Overflow { .. })
        ));
    }

    #[test]
    fn test_format() {
        assert_eq!(format_duration(&Duration::from_secs(240 * 3600)), "10d");
        assert_eq!(format_duration(&Duration::from_secs(5400)), "1h 30m");
        assert_eq!(format_duration(&Duration::from_millis(1500)), "1s 500ms");
        assert_eq!(format_duration(&Duration::ZERO), "0ms");
    }

    #[test]
    fn test_format_parses_back() {
        let d = Duration::from_millis(2 * DAY + 3 * MINUTE + 7);
        assert_eq!(parse_duration(&format_duration(&d)).unwrap(), d);
    }
}
