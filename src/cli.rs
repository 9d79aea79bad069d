//! Command-line interface definitions for the article index sync.
//!
//! Every option can also come from the environment. Options that mirror a
//! config file key override the file when given.

use crate::config::EngineConfig;
use crate::models::MergePolicy;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for one sync run.
///
/// # Examples
///
/// ```sh
/// # Merge freshly produced articles into the site
/// article_index_sync -a ./output -s ./site
///
/// # Strict index gate against the Romanian index, with backups and a report
/// article_index_sync -a ./output -s ./site --parallel-index ./ro/index.html \
///     --require-counterpart --backup-dir ./backup --report ./reports/run.json
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory of freshly produced article documents
    #[arg(short, long, env = "ARTICLES_DIR")]
    pub articles_dir: PathBuf,

    /// Directory holding the category pages
    #[arg(short, long, env = "SITE_DIR")]
    pub site_dir: PathBuf,

    /// Site index document; defaults to index.html inside the site directory
    #[arg(short, long, env = "SITE_INDEX")]
    pub index: Option<PathBuf>,

    /// Skip the site index entirely
    #[arg(long)]
    pub no_index: bool,

    /// Index of the parallel-language site, used by --require-counterpart
    #[arg(long, env = "PARALLEL_INDEX")]
    pub parallel_index: Option<PathBuf>,

    /// Parallel-language article directory to copy illustrations from
    #[arg(long, env = "COUNTERPART_DIR")]
    pub counterpart_dir: Option<PathBuf>,

    /// Copy every document here before overwriting it
    #[arg(short, long, env = "BACKUP_DIR")]
    pub backup_dir: Option<PathBuf>,

    /// Optional path to config.yaml file
    #[arg(short, long, env = "SYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Write the JSON run report here
    #[arg(short, long)]
    pub report: Option<PathBuf>,

    /// Merge policy for category pages
    #[arg(long, value_enum)]
    pub category_policy: Option<MergePolicy>,

    /// Merge policy for the site index
    #[arg(long, value_enum)]
    pub index_policy: Option<MergePolicy>,

    /// Trailing window, in days, for index eligibility
    #[arg(long)]
    pub recency_days: Option<i64>,

    /// Only index articles whose counterpart is listed in the parallel index
    #[arg(long)]
    pub require_counterpart: bool,

    /// Processing instant (YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS); defaults to now
    #[arg(long, value_parser = parse_instant)]
    pub now: Option<NaiveDateTime>,
}

fn parse_instant(s: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d").map(|d| d.and_time(NaiveTime::MIN)))
        .map_err(|e| format!("invalid instant {s:?}: {e}"))
}

impl Cli {
    /// Fold command-line overrides into the loaded configuration.
    pub fn apply_overrides(&self, config: &mut EngineConfig) {
        if let Some(policy) = self.category_policy {
            config.category_policy = policy;
        }
        if let Some(policy) = self.index_policy {
            config.index_policy = policy;
        }
        if let Some(days) = self.recency_days {
            config.recency_days = days;
        }
        if self.require_counterpart {
            config.require_counterpart = true;
        }
        if self.now.is_some() {
            config.now = self.now;
        }
    }

    /// Index document of this run, if any.
    pub fn index_path(&self) -> Option<PathBuf> {
        if self.no_index {
            return None;
        }
        Some(
            self.index
                .clone()
                .unwrap_or_else(|| self.site_dir.join("index.html")),
        )
    }
}
