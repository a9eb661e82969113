//! Clamp command - Enforce ceilings on a task's resource request.

use anyhow::{Context, Result, bail};
use clap::Args;
use serde::Serialize;

use rescap_core::{ResourceKind, ResourceValue};
use rescap_limits::ResourceLimiter;

use crate::OutputFormat;
use crate::commands::print_json;

/// Arguments for the clamp command.
#[derive(Args)]
pub struct ClampArgs {
    /// Requested memory (e.g. "256.GB")
    #[arg(long)]
    pub memory: Option<String>,

    /// Requested wall-clock time (e.g. "72.h")
    #[arg(long)]
    pub time: Option<String>,

    /// Requested CPUs
    #[arg(long)]
    pub cpus: Option<String>,
}

/// Outcome for a single resource dimension.
#[derive(Debug, Serialize)]
struct ClampEntry {
    kind: ResourceKind,
    requested: ResourceValue,
    enforced: ResourceValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    ceiling: Option<ResourceValue>,
    reduced: bool,
}

impl ClampEntry {
    fn human_line(&self) -> String {
        if self.reduced {
            format!("{}: {} (reduced from {})", self.kind, self.enforced, self.requested)
        } else {
            format!("{}: {}", self.kind, self.enforced)
        }
    }
}

fn clamp_entries(args: &ClampArgs, limiter: &ResourceLimiter) -> Result<Vec<ClampEntry>> {
    let requests = [
        (ResourceKind::Memory, &args.memory),
        (ResourceKind::Time, &args.time),
        (ResourceKind::Cpus, &args.cpus),
    ];

    let mut entries = Vec::new();
    for (kind, raw) in requests {
        let Some(raw) = raw else { continue };

        let requested = ResourceValue::parse(kind, raw)
            .with_context(|| format!("Invalid {} request '{}'", kind, raw))?;
        let enforced = limiter.clamp(requested, kind)?;

        entries.push(ClampEntry {
            kind,
            requested,
            enforced,
            ceiling: limiter.ceiling(kind),
            reduced: enforced != requested,
        });
    }

    if entries.is_empty() {
        bail!("Nothing to clamp: pass at least one of --memory, --time or --cpus");
    }
    Ok(entries)
}

/// Execute the clamp command.
pub fn execute(args: &ClampArgs, limiter: &ResourceLimiter, format: OutputFormat) -> Result<()> {
    let entries = clamp_entries(args, limiter)?;

    match format {
        OutputFormat::Human => {
            for entry in &entries {
                println!("{}", entry.human_line());
            }
        }
        OutputFormat::Json | OutputFormat::JsonCompact => print_json(&entries, format)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use rescap_limits::LimitsConfig;

    use super::*;

    fn args(memory: Option<&str>, cpus: Option<&str>) -> ClampArgs {
        ClampArgs {
            memory: memory.map(String::from),
            time: None,
            cpus: cpus.map(String::from),
        }
    }

    #[test]
    fn test_small_reduction_is_visible() {
        let limiter = ResourceLimiter::new(LimitsConfig::new().with_max_memory("1 GB"));
        let entries = clamp_entries(&args(Some("1.04 GB"), None), &limiter).unwrap();

        assert_eq!(entries.len(), 1);
        assert!(entries[0].reduced);
        let line = entries[0].human_line();
        assert!(line.starts_with("memory: 1 GB (reduced from "));
        assert!(!line.ends_with("(reduced from 1 GB)"));
    }

    #[test]
    fn test_entries_in_kind_order() {
        let limiter = ResourceLimiter::new(LimitsConfig::test_profile());
        let entries = clamp_entries(&args(Some("2 GB"), Some("8")), &limiter).unwrap();

        assert_eq!(entries[0].human_line(), "memory: 2 GB");
        assert_eq!(entries[1].human_line(), "cpus: 2 (reduced from 8)");
    }

    #[test]
    fn test_invalid_request_is_an_error() {
        let limiter = ResourceLimiter::unlimited();
        assert!(clamp_entries(&args(None, Some("zero")), &limiter).is_err());
    }
}
