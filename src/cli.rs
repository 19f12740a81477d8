//! Command-line interface components.
//!
//! Argument definitions, logging setup and configuration layering for the
//! `tydex` binary. Command implementations live in [`commands`].

pub mod commands;

use crate::config::{Encoding, ParserConfig};
use crate::error::{Result, TydexError};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::debug;

/// CLI arguments for the Tydex reader
#[derive(Debug, Clone, Parser)]
#[command(
    name = "tydex",
    version,
    about = "Read, inspect and verify Tydex tire-test data files",
    long_about = "Parses Tydex tire-test data files (header, constants, channel definitions and \
                  measured data) into validated documents. Prints summaries, exports channels \
                  or whole documents, and checks measured channels against their nominal constants."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to a JSON configuration file
    ///
    /// If not specified, looks for <config dir>/tydex/config.json
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    pub config_file: Option<PathBuf>,

    /// Input encoding (utf8 or latin1)
    #[arg(long, value_name = "ENCODING", global = true)]
    pub encoding: Option<Encoding>,

    /// Decimal separator used by numeric fields
    #[arg(long = "decimal-separator", value_name = "CHAR", global = true)]
    pub decimal_separator: Option<char>,

    /// Accept files that end inside the data section without **END
    #[arg(long = "no-end-marker", global = true)]
    pub no_end_marker: bool,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        global = true,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Only show errors
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Parse a file and print it as a summary, JSON or Tydex text
    Parse(ParseArgs),
    /// Print the values of one channel
    Channel(ChannelArgs),
    /// Check measured channels against their nominal constants
    Verify(VerifyArgs),
}

#[derive(Debug, Clone, Parser)]
pub struct ParseArgs {
    /// Tydex file to parse
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Summary)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable overview
    Summary,
    /// The whole document as JSON
    Json,
    /// Re-serialized Tydex text
    Tydex,
}

#[derive(Debug, Clone, Parser)]
pub struct ChannelArgs {
    /// Tydex file to read
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Channel name, e.g. FX or SLIPANGL
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Apply the channel's conversion factor and offset
    #[arg(long)]
    pub converted: bool,
}

#[derive(Debug, Clone, Parser)]
pub struct VerifyArgs {
    /// Files, glob patterns (e.g. "tydex/*/Run*/*.tdx") or directories to scan
    #[arg(value_name = "PATTERN", required = true)]
    pub patterns: Vec<String>,

    /// Override or add a tolerance, e.g. --tolerance FZW=50
    #[arg(long = "tolerance", value_name = "NAME=LIMIT", value_parser = parse_tolerance)]
    pub tolerances: Vec<(String, f64)>,

    /// Exit with an error when any constant is out of tolerance
    #[arg(long)]
    pub strict: bool,
}

impl Args {
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Check if we should show progress bars (not in quiet mode)
    pub fn show_progress(&self) -> bool {
        !self.quiet
    }

    /// Load configuration using layered approach (file -> env -> args)
    pub fn parser_config(&self) -> Result<ParserConfig> {
        let mut config = ParserConfig::load_layered(self.config_file.as_deref())?;

        if let Some(encoding) = self.encoding {
            config.encoding = encoding;
        }
        if let Some(separator) = self.decimal_separator {
            config.decimal_separator = separator;
        }
        if self.no_end_marker {
            config.require_end_marker = false;
        }

        config.validate()?;
        debug!("Effective parser configuration: {:?}", config);
        Ok(config)
    }
}

/// Set up structured logging based on CLI arguments
pub fn setup_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tydex_reader={}", log_level)));

    if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Parse a `NAME=LIMIT` tolerance override
fn parse_tolerance(s: &str) -> Result<(String, f64)> {
    let (name, limit) = s.split_once('=').ok_or_else(|| {
        TydexError::configuration(format!("Tolerance must be NAME=LIMIT, got '{}'", s))
    })?;

    let limit: f64 = limit.trim().parse().map_err(|_| {
        TydexError::configuration(format!("Tolerance limit for {} is not a number", name))
    })?;
    if !(limit.is_finite() && limit >= 0.0) {
        return Err(TydexError::configuration(format!(
            "Tolerance limit for {} must be a non-negative number",
            name
        )));
    }

    Ok((name.trim().to_string(), limit))
}
