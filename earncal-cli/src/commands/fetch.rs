//! Fetch command - retrieve the earnings calendar.

use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use earncal_core::ResultSet;
use earncal_store::Config;
use tracing::{info, warn};

use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the fetch command.
#[derive(Args)]
pub struct FetchArgs {
    /// Date to fetch (YYYY-MM-DD).
    pub date: NaiveDate,

    /// Last date of an inclusive range (YYYY-MM-DD).
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Print at most this many rows.
    #[arg(long, short)]
    pub limit: Option<usize>,
}

/// Runs the fetch command.
pub async fn run(args: &FetchArgs, cli: &Cli, config: &Config) -> Result<()> {
    let fetcher = config.fetcher()?;

    let mut results = match args.to {
        None => fetcher.fetch_date(args.date).await?,
        Some(end) if end < args.date => {
            anyhow::bail!("--to {end} is before {}", args.date);
        }
        Some(end) => {
            let outcome = fetcher.fetch_range(args.date, end).await;
            info!(
                days = outcome.days.len(),
                succeeded = outcome.successes(),
                elapsed_ms = outcome.duration.as_millis(),
                "Range fetch finished"
            );

            for (date, error) in outcome.failures() {
                warn!(%date, error = %error, "Date failed");
                if !cli.quiet {
                    eprintln!("Warning: {date}: {error}");
                }
            }

            if outcome.successes() == 0 {
                // every date failed; surface the first error for the exit code
                let first = outcome.days.into_iter().find_map(|day| day.result.err());
                if let Some(error) = first {
                    return Err(error.into());
                }
                anyhow::bail!("no dates fetched");
            }
            outcome.merged()
        }
    };

    if let Some(limit) = args.limit {
        results.truncate(limit);
    }

    output_results(&results, cli)
}

fn output_results(results: &ResultSet, cli: &Cli) -> Result<()> {
    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_results(results));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(results)?);
        }
    }
    Ok(())
}
