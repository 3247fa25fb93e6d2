// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! earncal CLI - Yahoo Finance earnings calendar from the command line.
//!
//! # Examples
//!
//! ```bash
//! # Earnings events for one day
//! earncal fetch 2024-04-05
//!
//! # A week, as JSON
//! earncal fetch 2024-04-01 --to 2024-04-05 --format json --pretty
//!
//! # Only run the cookie/crumb chain and show each attempt
//! earncal crumb --verbose
//!
//! # Write a default config file
//! earncal config init
//! ```

mod commands;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use earncal_fetch::{ErrorKind, FetchError};
use earncal_store::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{config, crumb, fetch};

// ============================================================================
// CLI Definition
// ============================================================================

/// earncal CLI - earnings calendar fetcher.
#[derive(Parser)]
#[command(name = "earncal")]
#[command(about = "Yahoo Finance earnings calendar CLI")]
#[command(long_about = r#"
earncal retrieves the earnings calendar for a date from Yahoo Finance's
visualization API and prints it as a table or JSON.

Examples:
  earncal fetch 2024-04-05                    # One day
  earncal fetch 2024-04-01 --to 2024-04-05    # Inclusive range
  earncal fetch 2024-04-05 --format json      # JSON output
  earncal crumb                               # Diagnose the crumb chain
"#)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Config file to use instead of the default location.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Request timeout in seconds (overrides the config file).
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

impl Cli {
    /// Returns the config file path in effect.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Fetch the earnings calendar for a date or date range.
    #[command(visible_alias = "f")]
    Fetch(fetch::FetchArgs),

    /// Acquire a cookie and crumb and report each strategy attempt.
    Crumb(crumb::CrumbArgs),

    /// Manage configuration.
    Config(config::ConfigArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable table.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// General error.
    Error = 1,
    /// No usable cookie/crumb, or the query was rejected.
    Authentication = 2,
    /// Response could not be parsed.
    ParseError = 3,
    /// Timeout.
    Timeout = 4,
}

impl ExitCode {
    /// Maps an error to the exit code a script can act on.
    pub fn for_error(err: &anyhow::Error) -> Self {
        let Some(fetch_error) = err.downcast_ref::<FetchError>() else {
            return Self::Error;
        };
        if fetch_error.is_timeout() {
            return Self::Timeout;
        }
        match fetch_error.kind() {
            ErrorKind::Authentication => Self::Authentication,
            ErrorKind::MalformedResponse => Self::ParseError,
            ErrorKind::Network | ErrorKind::Config => Self::Error,
        }
    }
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool, level: &str) {
    if quiet {
        return; // No logging in quiet mode
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("earncal=debug,info")
        } else {
            EnvFilter::new(format!("earncal={level}"))
        }
    });

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let loaded = Config::load_from(&cli.config_path());
    let level = loaded
        .as_ref()
        .map_or("warn", |config| config.general.log_level.as_str());
    setup_logging(cli.verbose, cli.quiet, level);

    let result = match loaded {
        Ok(mut config) => {
            if let Some(secs) = cli.timeout {
                config.yahoo.timeout_secs = secs;
            }
            run(&cli, &config).await
        }
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("Error: {e:#}");
        }
        std::process::exit(ExitCode::for_error(&e) as i32);
    }
}

async fn run(cli: &Cli, config: &Config) -> Result<()> {
    match &cli.command {
        Commands::Fetch(args) => fetch::run(args, cli, config).await,
        Commands::Crumb(args) => crumb::run(args, cli, config).await,
        Commands::Config(args) => config::run(args, cli, config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_fetch_range() {
        let cli = Cli::parse_from([
            "earncal", "fetch", "2024-04-01", "--to", "2024-04-05", "--format", "json",
        ]);
        assert_eq!(cli.format, OutputFormat::Json);
        let Commands::Fetch(args) = cli.command else {
            panic!("expected fetch");
        };
        assert_eq!(args.date.to_string(), "2024-04-01");
        assert_eq!(args.to.map(|d| d.to_string()).as_deref(), Some("2024-04-05"));
    }

    #[test]
    fn test_rejects_malformed_date() {
        assert!(Cli::try_parse_from(["earncal", "fetch", "04/05/2024"]).is_err());
    }

    #[test]
    fn test_exit_codes() {
        let auth: anyhow::Error = FetchError::authentication("crumb", "all failed").into();
        assert_eq!(ExitCode::for_error(&auth), ExitCode::Authentication);

        let parse: anyhow::Error = FetchError::malformed("query", "not JSON").into();
        assert_eq!(ExitCode::for_error(&parse), ExitCode::ParseError);

        let timeout: anyhow::Error = FetchError::Timeout { stage: "query", secs: 30 }.into();
        assert_eq!(ExitCode::for_error(&timeout), ExitCode::Timeout);

        let other = anyhow::anyhow!("boom");
        assert_eq!(ExitCode::for_error(&other), ExitCode::Error);
        assert_eq!(ExitCode::Success as i32, 0);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_commands_run_on_current_thread_runtime() {
        use tokio::runtime::{Handle, RuntimeFlavor};
        assert_eq!(Handle::current().runtime_flavor(), RuntimeFlavor::CurrentThread);

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let cli = Cli::parse_from([
            "earncal",
            "config",
            "show",
            "--config",
            path.to_str().unwrap(),
        ]);
        run(&cli, &Config::default()).await.unwrap();
    }
}
