//! # Article Index Sync
//!
//! Keeps the category pages and the front index of a static article site in
//! step with freshly produced article documents.
//!
//! ## Features
//!
//! - Decodes documents under a configurable list of encodings and repairs
//!   common mojibake
//! - Extracts title, canonical URL, date, category and a lead quote from each
//!   article
//! - Renders each article as a fixed-format summary entry
//! - Merges entries into the category page and the site index between the
//!   structural markers, deduplicated and newest first, leaving everything
//!   else byte for byte
//! - Optionally copies illustrations over from the parallel-language articles
//!
//! ## Usage
//!
//! ```sh
//! article_index_sync -a ./output -s ./site
//! ```
//!
//! ## Architecture
//!
//! 1. **Extraction**: decode and parse every article into a record
//! 2. **Grouping**: deduplicate records and group them by category page
//! 3. **Merging**: splice new entries into each category page, then into the index
//! 4. **Reporting**: log the tally and optionally write a JSON run report

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod batch;
mod cli;
mod config;
mod dates;
mod encoding;
mod errors;
mod extract;
mod illustrations;
mod models;
mod outputs;
mod site;
mod utils;

use batch::{RunOptions, run_batch};
use cli::Cli;
use config::load_config;
use outputs::report::write_report;
use site::FsSite;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("article_index_sync starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.articles_dir, ?args.site_dir, "Parsed CLI arguments");

    // ---- Load config ----
    let mut config = load_config(args.config.as_deref()).await?;
    args.apply_overrides(&mut config);
    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(e.into());
    }
    info!(
        category_policy = %config.category_policy,
        index_policy = %config.index_policy,
        recency_days = config.recency_days,
        require_counterpart = config.require_counterpart,
        "Configuration ready"
    );

    let store =
        FsSite::new(&args.articles_dir, &args.site_dir).with_backup_dir(args.backup_dir.clone());
    let options = RunOptions {
        index_path: args.index_path(),
        parallel_index_path: args.parallel_index.clone(),
        counterpart_dir: args.counterpart_dir.clone(),
    };

    // ---- Run ----
    let report = run_batch(&store, &config, &options).await?;

    for skipped in &report.skipped_articles {
        warn!(path = %skipped.path, reason = %skipped.reason, "Article skipped");
    }
    for document in &report.documents {
        for warning in &document.warnings {
            warn!(path = %document.path, ?warning, "Merge warning");
        }
    }

    if let Some(path) = &args.report {
        if let Err(e) = write_report(&report, path).await {
            error!(path = %path.display(), error = %e, "Failed to write run report");
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        updated = report.updated(),
        failed = report.failed(),
        "Execution complete"
    );

    if report.failed() > 0 {
        return Err(format!("{} document(s) failed to update", report.failed()).into());
    }
    Ok(())
}
