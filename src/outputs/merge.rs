//! Document merger.
//!
//! A target document (a category page or the site index) holds its entries
//! between two marker comments:
//!
//! ```text
//! <!-- ARTICOL CATEGORIE START -->
//! <div align="justify">
//!     <table …>…</table> … <p class="text_obisnuit"></p>     ← entry block
//!     <table …>…</table> … <p class="text_obisnuit"></p>     ← entry block
//!           </div>
//!           <p align="justify" class="text_obisnuit style3"> </p>
//! <!-- ARTICOL CATEGORIE FINAL -->
//! ```
//!
//! Everything up to and including the opening `<div>` is copied through
//! untouched, as is everything from the END marker on. Only the entry region
//! and the whitespace of the closing structure are rewritten.
//!
//! # Policies
//!
//! - [`MergePolicy::FullResort`]: every existing block is re-dated and the
//!   whole region is re-emitted newest first (stable on ties).
//! - [`MergePolicy::AppendBucketed`]: new entries from recent years are put on
//!   top, older ones at the bottom; existing entries keep their order.

use crate::config::EngineConfig;
use crate::dates::sort_key;
use crate::errors::EngineError;
use crate::extract::entries::{existing_urls, split_entries, table_width, SPACER};
use crate::models::{ArticleRecord, MergeOutcome, MergePolicy, MergeWarning};
use crate::outputs::entry::render_entry;
use chrono::Datelike;
use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};
use std::borrow::Cow;
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};

pub const CONTAINER_OPEN: &str = r#"<div align="justify">"#;

/// Key that keeps undated leading blocks on top.
const PINNED_KEY: &str = "99999999";

static CLOSING_BEFORE_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"</div>\s*<p[^>]*>\s*</p>\s*\z").unwrap());
static CLOSING_ANYWHERE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"</div>\s*<p[^>]*>\s*</p>").unwrap());
static SPACER_BEFORE_TABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<p class="text_obisnuit"></p>\s+<table width="#).unwrap());
static SPACER_BEFORE_CLOSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<p class="text_obisnuit"></p>\s*</div>\s*<p align"#).unwrap()
});

/// What is being merged into and how.
#[derive(Debug, Clone, Copy)]
pub struct MergeTarget<'a> {
    /// File name the document stands for (`leadership.html`). Candidates whose
    /// category points elsewhere are refused. `None` for the site index.
    pub identity: Option<&'a str>,
    pub policy: MergePolicy,
}

/// Byte offsets of the structural boundaries of a target document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// End of the opening container tag.
    pub open_end: usize,
    /// Start of the closing container (or of whatever trails the entries).
    pub close_start: usize,
    /// Position of the END marker, when present.
    pub end_marker: Option<usize>,
    pub warning: Option<MergeWarning>,
}

/// Locate the entry region of `text`.
///
/// # Errors
///
/// [`EngineError::InvalidTargetStructure`] when the START marker is missing or
/// not followed by the opening container.
pub fn analyze(text: &str, config: &EngineConfig) -> Result<Layout, EngineError> {
    let start = text
        .find(&config.start_marker)
        .ok_or_else(|| EngineError::structure("start marker not found"))?;
    let after_marker = start + config.start_marker.len();
    let rest = &text[after_marker..];
    let trimmed = rest.trim_start();
    if !trimmed.starts_with(CONTAINER_OPEN) {
        return Err(EngineError::structure(
            "opening container does not follow the start marker",
        ));
    }
    let open_end = after_marker + (rest.len() - trimmed.len()) + CONTAINER_OPEN.len();

    let region_and_rest = &text[open_end..];
    let layout = match region_and_rest.find(&config.end_marker) {
        Some(rel) => {
            let end_at = open_end + rel;
            match CLOSING_BEFORE_END.find(&text[open_end..end_at]) {
                Some(m) => Layout {
                    open_end,
                    close_start: open_end + m.start(),
                    end_marker: Some(end_at),
                    warning: None,
                },
                None => Layout {
                    open_end,
                    close_start: end_at,
                    end_marker: Some(end_at),
                    warning: Some(MergeWarning::AmbiguousCloseStructure),
                },
            }
        }
        None => {
            let close = CLOSING_ANYWHERE
                .find_iter(region_and_rest)
                .last()
                .map(|m| m.start())
                .unwrap_or(region_and_rest.len());
            Layout {
                open_end,
                close_start: open_end + close,
                end_marker: None,
                warning: Some(MergeWarning::MissingEndMarker),
            }
        }
    };
    Ok(layout)
}

/// Merge `candidates` into the target document `text`.
///
/// Candidates already present (by canonical URL), addressed to another
/// category, or repeated within `candidates` are dropped. The survivors are
/// rendered and placed according to `target.policy`. Everything before the
/// opening container and after the END marker is copied byte for byte. New
/// and re-emitted lines follow the document's own line ending (`\r\n` or
/// `\n`).
///
/// # Arguments
///
/// * `text` - Decoded target document (category page or site index)
/// * `candidates` - Records offered for this document, in any order
/// * `target` - Destination identity and ordering policy
/// * `config` - Markers, default table width and entry style
///
/// # Returns
///
/// [`MergeOutcome::Unchanged`] when no candidate survives filtering, which
/// makes re-running a batch safe. Otherwise the new document text, the added
/// URLs and any non-fatal [`MergeWarning`]s.
///
/// # Errors
///
/// [`EngineError::InvalidTargetStructure`] when the START marker or the
/// opening container cannot be found. The document is validated even when
/// there is nothing to add.
#[instrument(
    level = "info",
    skip_all,
    fields(policy = %target.policy, identity = ?target.identity, candidates = candidates.len())
)]
pub fn merge_document(
    text: &str,
    candidates: &[ArticleRecord],
    target: &MergeTarget<'_>,
    config: &EngineConfig,
) -> Result<MergeOutcome, EngineError> {
    let layout = analyze(text, config)?;
    let crlf = uses_crlf(text);
    let region = to_lf(&text[layout.open_end..layout.close_start], crlf);
    let existing = existing_urls(&region);
    debug!(existing = existing.len(), crlf, "Recovered existing entries");

    let fresh = filter_candidates(candidates, &existing, target.identity);
    if fresh.is_empty() {
        info!("No new entries to add");
        return Ok(MergeOutcome::Unchanged);
    }

    let width = table_width(&region).unwrap_or(config.default_table_width);
    let mut warnings: Vec<MergeWarning> = layout.warning.iter().cloned().collect();

    let mut body = match target.policy {
        MergePolicy::FullResort => resorted_region(&region, &fresh, width, config, &mut warnings),
        MergePolicy::AppendBucketed => bucketed_region(&region, &fresh, width, config),
    };

    let suffix = &text[layout.close_start..];
    if !suffix.is_empty() && !body.ends_with(char::is_whitespace) {
        body.push('\n');
    }

    // whitespace fixes stop at the END marker; what follows it is copied as is
    let scope_end = layout.end_marker.unwrap_or(text.len());
    let mut tail = body;
    tail.push_str(&to_lf(&text[layout.close_start..scope_end], crlf));
    let mut middle = normalize_spacing(&tail);
    if crlf {
        middle = middle.replace('\n', "\r\n");
    }

    let mut out = String::with_capacity(text.len() + middle.len());
    out.push_str(&text[..layout.open_end]);
    out.push_str(&middle);
    out.push_str(&text[scope_end..]);

    for warning in &warnings {
        warn!(?warning, "Merge completed with a warning");
    }
    let added: Vec<String> = fresh.iter().map(|r| r.canonical_url.clone()).collect();
    info!(added = added.len(), "Merged new entries");

    Ok(MergeOutcome::Updated {
        text: out,
        added,
        warnings,
    })
}

/// Whether `text` mostly ends its lines with `\r\n`.
fn uses_crlf(text: &str) -> bool {
    let crlf = text.matches("\r\n").count();
    crlf > 0 && crlf * 2 >= text.matches('\n').count()
}

/// The merge itself works on `\n` line endings.
fn to_lf(text: &str, crlf: bool) -> Cow<'_, str> {
    if crlf && text.contains('\r') {
        Cow::Owned(text.replace("\r\n", "\n"))
    } else {
        Cow::Borrowed(text)
    }
}

fn filter_candidates<'r>(
    candidates: &'r [ArticleRecord],
    existing: &HashSet<String>,
    identity: Option<&str>,
) -> Vec<&'r ArticleRecord> {
    let mut seen = HashSet::new();
    let mut fresh = Vec::new();
    for record in candidates {
        if existing.contains(&record.canonical_url) {
            debug!(url = %record.canonical_url, "Skipping existing URL");
            continue;
        }
        if let Some(identity) = identity {
            if record.category_file().as_deref() != Some(identity) {
                warn!(
                    url = %record.canonical_url,
                    category = %record.category_url,
                    expected = identity,
                    "Skipping article addressed to another category"
                );
                continue;
            }
        }
        if seen.insert(record.canonical_url.as_str()) {
            fresh.push(record);
        }
    }
    fresh
}

fn render_trimmed(record: &ArticleRecord, width: u32, config: &EngineConfig) -> String {
    render_entry(record, width, &config.entry).trim_start().to_string()
}

fn resorted_region(
    region: &str,
    fresh: &[&ArticleRecord],
    width: u32,
    config: &EngineConfig,
    warnings: &mut Vec<MergeWarning>,
) -> String {
    let parsed = split_entries(region);
    let mut items: Vec<(String, String)> = Vec::with_capacity(parsed.blocks.len() + fresh.len());

    let mut previous_key: Option<String> = None;
    for block in &parsed.blocks {
        let key = match block.date {
            Some(date) => sort_key(date),
            None => {
                warnings.push(MergeWarning::DateReparseFailure {
                    url: block.url.clone(),
                });
                // undated blocks travel with their predecessor
                previous_key.clone().unwrap_or_else(|| PINNED_KEY.to_string())
            }
        };
        previous_key = Some(key.clone());
        items.push((key, block.text.to_string()));
    }
    for record in fresh {
        items.push((record.sort_key.clone(), render_trimmed(record, width, config)));
    }

    items.sort_by(|a, b| b.0.cmp(&a.0));

    let mut body = parsed.head.trim_end().to_string();
    body.push('\n');
    body.push_str(
        &items
            .iter()
            .map(|(_, text)| format!("    {text}"))
            .collect::<Vec<_>>()
            .join("\n"),
    );
    if !parsed.tail.starts_with(char::is_whitespace) {
        body.push('\n');
    }
    body.push_str(parsed.tail);
    body
}

fn bucketed_region(
    region: &str,
    fresh: &[&ArticleRecord],
    width: u32,
    config: &EngineConfig,
) -> String {
    let (mut recent, mut older): (Vec<&ArticleRecord>, Vec<&ArticleRecord>) = fresh
        .iter()
        .copied()
        .partition(|r| r.publication_date.year() >= config.recent_year_threshold);
    // the key leads with the year, so this is newest year first, newest day first
    recent.sort_by(|a, b| b.sort_key.cmp(&a.sort_key));
    older.sort_by(|a, b| b.sort_key.cmp(&a.sort_key));

    let render = |records: &[&ArticleRecord]| {
        records
            .iter()
            .map(|r| render_entry(r, width, &config.entry))
            .collect::<Vec<_>>()
            .join("\n")
    };

    // hand-written intro markup stays above the newest entries
    let head = split_entries(region).head.trim_end();
    let rest = &region[head.len()..];

    let mut body = head.to_string();
    if !recent.is_empty() {
        body.push('\n');
        body.push_str(&render(recent.as_slice()));
        if !rest.starts_with(char::is_whitespace) {
            body.push('\n');
        }
    }
    if older.is_empty() {
        body.push_str(rest);
    } else {
        body.push_str(rest.trim_end());
        body.push('\n');
        body.push_str(&render(older.as_slice()));
        body.push('\n');
    }
    body
}

/// Restore the indentation used throughout the hand-edited pages.
fn normalize_spacing(text: &str) -> String {
    let text = SPACER_BEFORE_TABLE.replace_all(
        text,
        NoExpand(&format!("{SPACER}\n    <table width=")),
    );
    SPACER_BEFORE_CLOSE
        .replace_all(
            &text,
            NoExpand(&format!("{SPACER}\n          </div>\n          <p align")),
        )
        .into_owned()
}
