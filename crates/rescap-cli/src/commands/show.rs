//! Show command - Print the effective ceilings.

use anyhow::Result;
use serde::Serialize;

use rescap_core::ResourceValue;
use rescap_limits::{LimitsConfig, ResourceLimiter};

use crate::OutputFormat;
use crate::commands::print_json;

#[derive(Debug, Serialize)]
struct ShowResult<'a> {
    configured: &'a LimitsConfig,
    effective: Effective,
}

#[derive(Debug, Serialize)]
struct Effective {
    max_memory: Option<ResourceValue>,
    max_time: Option<ResourceValue>,
    max_cpus: Option<ResourceValue>,
}

/// Execute the show command.
pub fn execute(limiter: &ResourceLimiter, format: OutputFormat) -> Result<()> {
    use rescap_core::ResourceKind::{Cpus, Memory, Time};

    let result = ShowResult {
        configured: limiter.config(),
        effective: Effective {
            max_memory: limiter.ceiling(Memory),
            max_time: limiter.ceiling(Time),
            max_cpus: limiter.ceiling(Cpus),
        },
    };

    match format {
        OutputFormat::Human => {
            for kind in [Memory, Time, Cpus] {
                let shown = match limiter.configured_ceiling(kind) {
                    Some(Ok(value)) => value.to_string(),
                    Some(Err(invalid)) => format!("unlimited (ignoring invalid '{}')", invalid.configured),
                    None => "unlimited".to_string(),
                };
                println!("{:<10} = {}", kind.config_key(), shown);
            }
        }
        OutputFormat::Json | OutputFormat::JsonCompact => print_json(&result, format)?,
    }

    Ok(())
}
