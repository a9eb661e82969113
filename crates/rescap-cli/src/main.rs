//! Rescap CLI - Command-line interface for resource ceilings.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use rescap::Preset;

mod commands;

/// Clamp workflow task resource requests to configured ceilings
#[derive(Parser)]
#[command(name = "rescap")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Limits file (TOML, keys at top level or under [params])
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Ceiling preset to start from
    #[arg(short, long, global = true, default_value = "none")]
    pub profile: Profile,

    /// Override the memory ceiling (e.g. "128.GB")
    #[arg(long, global = true)]
    pub max_memory: Option<String>,

    /// Override the time ceiling (e.g. "240.h")
    #[arg(long, global = true)]
    pub max_time: Option<String>,

    /// Override the CPU ceiling
    #[arg(long, global = true)]
    pub max_cpus: Option<String>,

    /// Output format
    #[arg(short = 'f', long, global = true, default_value = "human")]
    pub format: OutputFormat,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output, including the warning
    /// printed when an invalid ceiling is ignored)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Output format options.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    #[default]
    Human,
    /// JSON output
    Json,
    /// Compact JSON (single line)
    JsonCompact,
}

/// Ceiling presets selectable from the command line.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum Profile {
    /// No ceilings unless configured
    #[default]
    None,
    /// Pipeline defaults: 128 GB, 240 h, 16 CPUs
    PipelineDefaults,
    /// CI test profile: 6 GB, 48 h, 2 CPUs
    Test,
}

impl From<Profile> for Preset {
    fn from(profile: Profile) -> Self {
        match profile {
            Profile::None => Preset::None,
            Profile::PipelineDefaults => Preset::PipelineDefaults,
            Profile::Test => Preset::Test,
        }
    }
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Clamp a task's resource request
    Clamp(commands::clamp::ClampArgs),
    /// Check that configured ceilings parse
    Check(commands::check::CheckArgs),
    /// Show the effective ceilings
    Show,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("rescap={}", log_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = commands::build_limiter(&cli).and_then(|limiter| match &cli.command {
        Commands::Clamp(args) => commands::clamp::execute(args, &limiter, cli.format),
        Commands::Check(args) => commands::check::execute(args, &limiter, cli.format),
        Commands::Show => commands::show::execute(&limiter, cli.format),
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if !cli.quiet {
                eprintln!("Error: {:#}", e);
            }
            ExitCode::FAILURE
        }
    }
}
