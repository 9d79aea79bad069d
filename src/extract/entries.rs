//! Reparse of entry blocks already present in a target document.
//!
//! Every rendered entry ends with the empty spacer paragraph
//! `<p class="text_obisnuit"></p>`, which is also where one block is cut from
//! the next. Each block is then parsed as an HTML fragment to recover the
//! article URL from its heading link and the date from its meta cell.

use crate::dates::parse_rendered_date;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;

pub const SPACER: &str = r#"<p class="text_obisnuit"></p>"#;

/// Every rendered entry opens with its bordered table.
const ENTRY_TABLE: &str = "<table";

static HEADING_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span.den_articol a[href]").unwrap());
static META_CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("td.text_dreapta").unwrap());
static TABLE_WIDTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<table width="(\d+)" border="0">"#).unwrap());

/// One entry as found in a document, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryBlock<'a> {
    /// Block text with leading whitespace removed; ends with the spacer.
    pub text: &'a str,
    pub url: Option<String>,
    pub date: Option<NaiveDate>,
}

/// The entry region cut into blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRegion<'a> {
    /// Hand-written markup ahead of the first entry table, such as an intro
    /// heading. Empty when only whitespace precedes the first entry.
    pub head: &'a str,
    pub blocks: Vec<EntryBlock<'a>>,
    /// Whatever follows the last spacer.
    pub tail: &'a str,
}

impl EntryBlock<'_> {
    fn parse(text: &str) -> EntryBlock<'_> {
        let fragment = Html::parse_fragment(text);
        let url = fragment
            .select(&HEADING_LINK)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(|href| href.trim().to_string());
        let date = fragment
            .select(&META_CELL)
            .next()
            .and_then(|td| parse_rendered_date(&td.text().collect::<String>()));
        EntryBlock { text, url, date }
    }
}

/// Cut `region` into entry blocks at every spacer paragraph.
///
/// Markup before the first entry table is split off as the region head so it
/// never travels with the first block.
pub fn split_entries(region: &str) -> EntryRegion<'_> {
    let head_len = match region.find(SPACER) {
        Some(idx) => region[..idx].find(ENTRY_TABLE).unwrap_or(0),
        None => region.trim_end().len(),
    };
    let head_len = if region[..head_len].trim().is_empty() {
        0
    } else {
        head_len
    };

    let mut blocks = Vec::new();
    let mut from = head_len;
    for (idx, _) in region[head_len..].match_indices(SPACER) {
        let end = head_len + idx + SPACER.len();
        let text = region[from..end].trim_start();
        blocks.push(EntryBlock::parse(text));
        from = end;
    }
    EntryRegion {
        head: &region[..head_len],
        blocks,
        tail: &region[from..],
    }
}

/// Canonical URLs of every entry heading inside `region`.
pub fn existing_urls(region: &str) -> HashSet<String> {
    Html::parse_fragment(region)
        .select(&HEADING_LINK)
        .filter_map(|a| a.value().attr("href"))
        .map(|href| href.trim().to_string())
        .collect()
}

/// Width of the first entry table in `region`, if any.
pub fn table_width(region: &str) -> Option<u32> {
    TABLE_WIDTH
        .captures(region)
        .and_then(|c| c[1].parse().ok())
}
