//! Engine configuration.
//!
//! The configuration is an optional YAML file; every field has a default so a
//! missing file (or an empty one) yields a working setup for the English site.
//! Command-line flags override individual fields after loading, see
//! [`crate::cli::Cli::apply_overrides`].
//!
//! ```yaml
//! category_policy: full-resort
//! index_policy: full-resort
//! recency_days: 120
//! require_counterpart: true
//! encodings: [utf-8, latin1, cp1252, iso-8859-1]
//! now: 2024-05-01T09:00:00
//! ```

use crate::errors::EngineError;
use crate::models::MergePolicy;
use chrono::{Local, NaiveDateTime};
use encoding_rs::Encoding;
use serde::Deserialize;
use std::path::Path;
use tracing::{info, instrument};

pub const START_MARKER: &str = "<!-- ARTICOL CATEGORIE START -->";
pub const END_MARKER: &str = "<!-- ARTICOL CATEGORIE FINAL -->";
pub const DEFAULT_QUOTE: &str = "True knowledge begins where you dare to transcend the limits imposed by the teachings of others.";

/// Fixed strings of a rendered entry block.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EntryStyle {
    pub attribution: String,
    pub default_quote: String,
    /// Target of the arrow icon next to "read more".
    pub home_url: String,
    pub arrow_icon: String,
}

impl Default for EntryStyle {
    fn default() -> Self {
        EntryStyle {
            attribution: "Neculai Fantanaru".to_string(),
            default_quote: DEFAULT_QUOTE.to_string(),
            home_url: "https://neculaifantanaru.com/en/".to_string(),
            arrow_icon: "Arrow3_black_5x7.gif".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub start_marker: String,
    pub end_marker: String,
    pub default_table_width: u32,
    pub entry: EntryStyle,
    pub category_policy: MergePolicy,
    pub index_policy: MergePolicy,
    /// Years at or above this go on top under [`MergePolicy::AppendBucketed`].
    pub recent_year_threshold: i32,
    /// Trailing window, in days, for index eligibility.
    pub recency_days: i64,
    /// Only index articles whose parallel-language page is already listed in
    /// the parallel index.
    pub require_counterpart: bool,
    /// Encoding labels tried in order when decoding documents.
    pub encodings: Vec<String>,
    /// Prefix of site illustrations swapped in by the illustration sync.
    pub images_base_url: String,
    /// Fixed processing instant; defaults to the local clock.
    pub now: Option<NaiveDateTime>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            start_marker: START_MARKER.to_string(),
            end_marker: END_MARKER.to_string(),
            default_table_width: 638,
            entry: EntryStyle::default(),
            category_policy: MergePolicy::FullResort,
            index_policy: MergePolicy::FullResort,
            recent_year_threshold: 2022,
            recency_days: 120,
            require_counterpart: false,
            encodings: ["utf-8", "latin1", "cp1252", "iso-8859-1"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            images_base_url: "https://neculaifantanaru.com/images/".to_string(),
            now: None,
        }
    }
}

impl EngineConfig {
    /// Parse a YAML document; an empty document gives the defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, EngineError> {
        if yaml.trim().is_empty() {
            return Ok(EngineConfig::default());
        }
        let config: EngineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.start_marker.is_empty() || self.end_marker.is_empty() {
            return Err(EngineError::Config("markers must not be empty".into()));
        }
        if self.encodings.is_empty() {
            return Err(EngineError::Config("at least one encoding is required".into()));
        }
        self.resolved_encodings()?;
        if self.recency_days < 0 {
            return Err(EngineError::Config("recency_days must not be negative".into()));
        }
        Ok(())
    }

    /// Map the configured labels to encodings, preserving order.
    pub fn resolved_encodings(&self) -> Result<Vec<&'static Encoding>, EngineError> {
        self.encodings
            .iter()
            .map(|label| {
                Encoding::for_label(label.trim().as_bytes())
                    .ok_or_else(|| EngineError::Config(format!("unknown encoding label '{label}'")))
            })
            .collect()
    }

    /// The processing instant of this run.
    pub fn processing_instant(&self) -> NaiveDateTime {
        self.now.unwrap_or_else(|| Local::now().naive_local())
    }
}

/// Load configuration from `path`, or the defaults when no path is given.
#[instrument(level = "info")]
pub async fn load_config(path: Option<&Path>) -> Result<EngineConfig, EngineError> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let yaml = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| EngineError::io(path, e))?;
    let config = EngineConfig::from_yaml(&yaml)?;
    info!(path = %path.display(), "Loaded configuration");
    Ok(config)
}
