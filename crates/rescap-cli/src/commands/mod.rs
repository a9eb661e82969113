//! Subcommand implementations.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;

use rescap::Rescap;
use rescap_limits::ResourceLimiter;

use crate::{Cli, OutputFormat};

pub mod check;
pub mod clamp;
pub mod show;

/// Build the limiter from the global flags: profile, then config file, then
/// `--max-*` overrides.
pub fn build_limiter(cli: &Cli) -> Result<Arc<ResourceLimiter>> {
    let mut builder = Rescap::builder().with_preset(cli.profile.into());

    if let Some(path) = &cli.config {
        builder = builder.with_config_file(path);
    }
    if let Some(memory) = &cli.max_memory {
        builder = builder.with_max_memory(memory.as_str());
    }
    if let Some(time) = &cli.max_time {
        builder = builder.with_max_time(time.as_str());
    }
    if let Some(cpus) = &cli.max_cpus {
        builder = builder.with_max_cpus(cpus.as_str());
    }

    let limiter = builder.build().context("Failed to load resource ceilings")?;
    debug!(
        profile = ?cli.profile,
        config = ?cli.config,
        ceilings = ?limiter.config(),
        invalid = limiter.invalid_limits().count(),
        "Resource limiter ready"
    );
    Ok(limiter)
}

/// Print a serializable result in one of the JSON formats.
pub fn print_json<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    let json = match format {
        OutputFormat::JsonCompact => serde_json::to_string(value)?,
        _ => serde_json::to_string_pretty(value)?,
    };
    println!("{}", json);
    Ok(())
}
