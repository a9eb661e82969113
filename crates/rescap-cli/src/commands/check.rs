//! Check command - Validate configured ceilings.

use anyhow::{Result, anyhow};
use clap::Args;
use serde::Serialize;

use rescap_core::{ResourceKind, ResourceValue};
use rescap_limits::ResourceLimiter;

use crate::OutputFormat;
use crate::commands::print_json;

/// Arguments for the check command.
#[derive(Args)]
pub struct CheckArgs {
    /// Fail if any configured ceiling is invalid
    #[arg(long)]
    pub strict: bool,
}

/// State of a single ceiling.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum CeilingStatus {
    Valid { value: ResourceValue },
    Invalid { configured: String, error: String },
    Absent,
}

#[derive(Debug, Serialize)]
struct CheckEntry {
    key: &'static str,
    #[serde(flatten)]
    status: CeilingStatus,
}

/// Check result.
#[derive(Debug, Serialize)]
struct CheckResult {
    valid: bool,
    ceilings: Vec<CheckEntry>,
}

/// Execute the check command.
pub fn execute(args: &CheckArgs, limiter: &ResourceLimiter, format: OutputFormat) -> Result<()> {
    let ceilings: Vec<CheckEntry> = ResourceKind::ALL
        .into_iter()
        .map(|kind| {
            let status = match limiter.configured_ceiling(kind) {
                Some(Ok(value)) => CeilingStatus::Valid { value: *value },
                Some(Err(invalid)) => CeilingStatus::Invalid {
                    configured: invalid.configured.clone(),
                    error: invalid.error.to_string(),
                },
                None => CeilingStatus::Absent,
            };
            CheckEntry {
                key: kind.config_key(),
                status,
            }
        })
        .collect();

    let result = CheckResult {
        valid: limiter.invalid_limits().next().is_none(),
        ceilings,
    };

    match format {
        OutputFormat::Human => {
            for entry in &result.ceilings {
                match &entry.status {
                    CeilingStatus::Valid { value } => println!("  {:<11} {}", entry.key, value),
                    CeilingStatus::Invalid { configured, error } => println!(
                        "  {:<11} INVALID '{}' ({}), requests pass through unchanged",
                        entry.key, configured, error
                    ),
                    CeilingStatus::Absent => println!("  {:<11} not set", entry.key),
                }
            }
        }
        OutputFormat::Json | OutputFormat::JsonCompact => print_json(&result, format)?,
    }

    if args.strict && !result.valid {
        Err(anyhow!("Invalid resource ceilings found"))
    } else {
        Ok(())
    }
}
