//! Data models shared by the extractor, the merger and the orchestrator.
//!
//! - [`ArticleRecord`]: publication metadata recovered from one article document
//! - [`MergePolicy`]: how new entries are ordered inside a target document
//! - [`MergeOutcome`] / [`MergeWarning`]: result of merging into one document
//! - [`RunReport`]: per-article and per-document tally of a whole batch

use crate::utils::file_name_of_url;
use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Required article elements, named in extraction failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    CanonicalLink,
    MetaCell,
    Date,
    CategoryLink,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Title => "title",
            Field::CanonicalLink => "canonical link",
            Field::MetaCell => "meta cell",
            Field::Date => "date",
            Field::CategoryLink => "category link",
        };
        f.write_str(name)
    }
}

/// Publication metadata of one article.
///
/// Built once per article document and never mutated afterwards. The
/// `canonical_url` is the identity of the article across every target
/// document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRecord {
    pub title: String,
    pub canonical_url: String,
    pub category_url: String,
    pub category_name: String,
    /// Date as rendered, always ending in a four digit year.
    pub publication_date_text: String,
    /// Resolved calendar date; only used for ordering.
    pub publication_date: NaiveDate,
    /// `YYYYMMDD`, zero padded.
    pub sort_key: String,
    pub quote: Option<String>,
    /// Link to the parallel-language version of the article, if any.
    pub secondary_language_link: Option<String>,
}

impl ArticleRecord {
    /// File name of the category page this article belongs to, e.g. `leadership.html`.
    pub fn category_file(&self) -> Option<String> {
        file_name_of_url(&self.category_url)
    }

    pub fn article_file(&self) -> Option<String> {
        file_name_of_url(&self.canonical_url)
    }

    pub fn counterpart_file(&self) -> Option<String> {
        self.secondary_language_link
            .as_deref()
            .and_then(file_name_of_url)
    }
}

/// Ordering policy applied when merging into a target document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum MergePolicy {
    /// New recent-year entries go on top, older years go to the bottom;
    /// existing entries are never reordered.
    AppendBucketed,
    /// The whole entry region is re-emitted newest first.
    #[default]
    FullResort,
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergePolicy::AppendBucketed => f.write_str("append-bucketed"),
            MergePolicy::FullResort => f.write_str("full-resort"),
        }
    }
}

/// Non-fatal conditions met while merging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MergeWarning {
    /// END marker present but the closing container before it was not found.
    AmbiguousCloseStructure,
    /// No END marker at all; entries were placed before the trailing content.
    MissingEndMarker,
    /// An existing entry's date could not be parsed during a re-sort.
    DateReparseFailure { url: Option<String> },
}

/// Result of merging a batch of records into one target document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Nothing new survived filtering; the input is returned untouched.
    Unchanged,
    Updated {
        text: String,
        added: Vec<String>,
        warnings: Vec<MergeWarning>,
    },
}

/// An article that could not be turned into a record.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedArticle {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DocumentStatus {
    Updated { added: Vec<String> },
    Unchanged,
    Failed { reason: String },
}

/// Outcome for one target document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    pub path: String,
    #[serde(flatten)]
    pub status: DocumentStatus,
    pub warnings: Vec<MergeWarning>,
}

impl DocumentReport {
    pub fn failed(path: impl Into<String>, reason: impl fmt::Display) -> Self {
        DocumentReport {
            path: path.into(),
            status: DocumentStatus::Failed {
                reason: reason.to_string(),
            },
            warnings: Vec::new(),
        }
    }
}

/// Tally of one batch run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub processed_at: String,
    pub articles_seen: usize,
    pub articles_extracted: usize,
    pub illustrations_synced: usize,
    pub skipped_articles: Vec<SkippedArticle>,
    pub documents: Vec<DocumentReport>,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.documents
            .iter()
            .filter(|d| !matches!(d.status, DocumentStatus::Failed { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.documents.len() - self.succeeded()
    }

    pub fn updated(&self) -> usize {
        self.documents
            .iter()
            .filter(|d| matches!(d.status, DocumentStatus::Updated { .. }))
            .count()
    }
}
