//! # Latest Writing
//!
//! Keeps the "latest posts" section of a static site in sync with two
//! Substack publications. Each run pulls the newest posts of every source,
//! normalizes them and rewrites the generated arrays inside the site's
//! `WritingSection.astro` component.
//!
//! ## Usage
//!
//! ```sh
//! latest_writing -t src/components/WritingSection.astro
//! ```
//!
//! ## Architecture
//!
//! 1. **Fetching**: Request each source's feed, retrying with linear backoff
//! 2. **Normalizing**: Map feed items or archive posts onto four-field records
//! 3. **Patching**: Regenerate the marked regions of the target file
//!
//! The target is only written when every source succeeded. The process
//! exits with status 1 on any failure so a scheduler can notice it.

use chrono::Utc;
use clap::Parser;
use std::error::Error;
use std::path::Path;
use std::process::ExitCode;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod app;
mod cli;
mod config;
mod fetcher;
mod models;
mod normalize;
mod retry;
mod sources;
mod template;
mod utils;

use app::RunStatus;
use cli::Cli;
use config::Settings;
use fetcher::HttpFetcher;
use retry::{RetryFetch, RetryPolicy};
use utils::format_elapsed;

#[tokio::main]
async fn main() -> ExitCode {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!(error = %e, "Error updating writing section");
            ExitCode::FAILURE
        }
    }
}

#[instrument(level = "info", skip_all)]
async fn run(args: Cli) -> Result<bool, Box<dyn Error>> {
    let start_time = std::time::Instant::now();
    info!("latest_writing starting up");

    let mut settings = Settings::load(args.config.as_deref()).await?;
    if let Some(transport) = args.transport {
        settings.transport = transport;
    }
    debug!(?settings, "Effective settings");

    let fetcher = RetryFetch::new(HttpFetcher::new(&settings)?, RetryPolicy::from(&settings.retry));
    let status = app::refresh(
        &fetcher,
        &settings,
        Path::new(&args.target),
        Utc::now(),
        args.dry_run,
    )
    .await?;

    let elapsed = start_time.elapsed();
    match &status {
        RunStatus::Updated(report) => {
            if report.written {
                info!(path = %args.target, "Successfully updated writing section with latest posts");
            } else {
                println!("{}", report.content);
            }
            info!(
                replaced = ?report.replaced,
                missing = ?report.missing,
                stamped = report.stamped,
                elapsed = %format_elapsed(elapsed),
                "Execution complete"
            );
        }
        RunStatus::Skipped { failed } => {
            info!(?failed, elapsed = %format_elapsed(elapsed), "Execution complete without update");
        }
    }
    Ok(status.is_success())
}
