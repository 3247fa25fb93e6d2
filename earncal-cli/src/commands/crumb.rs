//! Crumb command - run only the cookie/crumb chain.

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use clap::Args;
use earncal_core::EASTERN;
use earncal_store::Config;
use tracing::info;

use crate::output::{CrumbReport, JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the crumb command.
#[derive(Args)]
pub struct CrumbArgs {
    /// Calendar date used by the page-based strategies (default: today, US Eastern).
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Print the crumb value instead of only its length.
    #[arg(long)]
    pub reveal: bool,
}

/// Runs the crumb command.
pub async fn run(args: &CrumbArgs, cli: &Cli, config: &Config) -> Result<()> {
    let date = args
        .date
        .unwrap_or_else(|| Utc::now().with_timezone(&EASTERN).date_naive());

    let fetcher = config.fetcher()?;
    let ctx = fetcher.context()?;
    let outcome = fetcher.acquire_credential(&ctx, date).await;
    info!(
        attempts = outcome.attempts_count(),
        success = outcome.is_success(),
        "Crumb chain finished"
    );

    let report = CrumbReport::from_outcome(date, &outcome, args.reveal);
    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_crumb_report(&report));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&report)?);
        }
    }

    outcome.into_result()?;
    Ok(())
}
