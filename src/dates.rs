//! Publication date handling.
//!
//! Articles render their date as `"March 3, 2024"`. Entries already present in
//! target documents may also be in the Romanian form `"3 martie, 2024"`, so the
//! reparse path used for re-sorting accepts both.

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

const ENGLISH_MONTHS: [&str; 12] = [
    "january", "february", "march", "april", "may", "june", "july", "august", "september",
    "october", "november", "december",
];

const ROMANIAN_MONTHS: [&str; 12] = [
    "ianuarie", "februarie", "martie", "aprilie", "mai", "iunie", "iulie", "august",
    "septembrie", "octombrie", "noiembrie", "decembrie",
];

static DATE_WITH_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"On (.*?, \d{4}),").unwrap());
static DATE_WITHOUT_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"On (.*?),").unwrap());
static TRAILING_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}$").unwrap());
static ANY_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{4})").unwrap());
static MONTH_DAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"([A-Za-z]+) (\d+)").unwrap());
static ENGLISH_RENDERED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)([a-z]+)\s+(\d{1,2}),\s*(\d{4})").unwrap());
static ROMANIAN_RENDERED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d{1,2})\s+([a-zăâîșşțţ]+),?\s*(\d{4})").unwrap());

fn month_in(table: &[&str; 12], name: &str) -> Option<u32> {
    let name = name.to_lowercase();
    table
        .iter()
        .position(|m| *m == name)
        .map(|i| i as u32 + 1)
}

pub fn english_month(name: &str) -> Option<u32> {
    month_in(&ENGLISH_MONTHS, name)
}

pub fn romanian_month(name: &str) -> Option<u32> {
    // both cedilla and comma-below spellings occur in older pages
    let name = name.replace('ş', "ș").replace('ţ', "ț");
    month_in(&ROMANIAN_MONTHS, &name)
}

/// Pull the date out of a meta line such as
/// `"On March 3, 2024, in Leadership, by Neculai Fantanaru"`.
///
/// The `"Month Day, Year"` form wins; `"Month Day"` is accepted and gets
/// `current_year` appended so the rendered text always carries a year.
pub fn extract_date_text(meta_text: &str, current_year: i32) -> Option<String> {
    let captures = DATE_WITH_YEAR
        .captures(meta_text)
        .or_else(|| DATE_WITHOUT_YEAR.captures(meta_text))?;
    let date = captures.get(1)?.as_str().trim();
    if date.is_empty() {
        return None;
    }
    Some(ensure_year(date, current_year))
}

/// Append `, {year}` unless the text already ends in a four digit year.
pub fn ensure_year(date_text: &str, year: i32) -> String {
    if TRAILING_YEAR.is_match(date_text) {
        date_text.to_string()
    } else {
        format!("{date_text}, {year}")
    }
}

/// Resolve rendered date text to a calendar date.
///
/// Never fails: an unknown month becomes January, a missing month/day pair
/// becomes January 1st, and a day past the end of the month is clamped to the
/// last day of that month.
///
/// # Arguments
///
/// * `date_text` - Text such as `"March 3, 2024"`, as returned by [`extract_date_text`]
/// * `fallback_year` - Year used when `date_text` does not end in one
///
/// # Returns
///
/// The resolved date; only ever used for ordering.
pub fn resolve_date(date_text: &str, fallback_year: i32) -> NaiveDate {
    let year = ANY_YEAR
        .captures(date_text)
        .and_then(|c| c[1].parse::<i32>().ok())
        .unwrap_or(fallback_year);

    let (month, day) = match MONTH_DAY.captures(date_text) {
        Some(c) => (
            english_month(&c[1]).unwrap_or(1),
            c[2].parse::<u32>().unwrap_or(1),
        ),
        None => (1, 1),
    };
    clamped_date(year, month, day)
}

fn clamped_date(year: i32, month: u32, day: u32) -> NaiveDate {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .or_else(|| NaiveDate::from_ymd_opt(year, 1, 1))
        .unwrap_or_default();
    let day = day.max(1);
    (0..4)
        .find_map(|back| first.with_day(day.saturating_sub(back)))
        .or_else(|| (28..=31).rev().find_map(|d| first.with_day(d)))
        .unwrap_or(first)
}

/// Zero padded `YYYYMMDD`.
pub fn sort_key(date: NaiveDate) -> String {
    format!("{:04}{:02}{:02}", date.year(), date.month(), date.day())
}

/// Parse the date of an already rendered entry.
///
/// Accepts `"March 3, 2024"` and `"3 martie, 2024"`, case-insensitively,
/// anywhere inside `text`.
///
/// # Arguments
///
/// * `text` - Text of an entry's meta cell
///
/// # Returns
///
/// The date, or `None` when neither form matches or the day does not exist.
/// Unlike [`resolve_date`] nothing is guessed here.
pub fn parse_rendered_date(text: &str) -> Option<NaiveDate> {
    let english = ENGLISH_RENDERED.captures_iter(text).find_map(|c| {
        let month = english_month(&c[1])?;
        NaiveDate::from_ymd_opt(c[3].parse().ok()?, month, c[2].parse().ok()?)
    });
    english.or_else(|| {
        ROMANIAN_RENDERED.captures_iter(text).find_map(|c| {
            let month = romanian_month(&c[2])?;
            NaiveDate::from_ymd_opt(c[3].parse().ok()?, month, c[1].parse().ok()?)
        })
    })
}
