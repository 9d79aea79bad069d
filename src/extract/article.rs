//! Metadata extractor for freshly produced article documents.
//!
//! An article page carries everything needed for its summary entry:
//!
//! | Element | Selector | Required |
//! |---------|----------|----------|
//! | title | `h1.den_articol` | yes |
//! | canonical URL | `link[rel="canonical"]` | yes |
//! | date + category | `td.text_dreapta` ("On {date}, in {category link}, …") | yes |
//! | quote | first `em`, else first `p`, longer than 20 characters | no |
//! | parallel-language link | `a[cunt_code="+40"]`, else the link around a flag image | no |

use crate::dates::{extract_date_text, resolve_date, sort_key};
use crate::errors::EngineError;
use crate::models::{ArticleRecord, Field};
use crate::utils::truncate_for_log;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};

const MIN_QUOTE_CHARS: usize = 20;

static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("h1.den_articol").unwrap());
static CANONICAL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"link[rel="canonical"]"#).unwrap());
static META_CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("td.text_dreapta").unwrap());
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());
static EMPHASIS: Lazy<Selector> = Lazy::new(|| Selector::parse("em").unwrap());
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());
static LANGUAGE_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"a[cunt_code="+40"][href]"#).unwrap());
static FLAG_IMAGE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"img[src*="flag"]"#).unwrap());

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

/// Parse one decoded article document into an [`ArticleRecord`].
///
/// `current_year` is appended to dates rendered without a year.
///
/// # Errors
///
/// [`EngineError::MissingRequiredField`] naming the first required element
/// that is absent or empty. An unparsable month or day never fails the record;
/// see [`resolve_date`].
#[instrument(level = "debug", skip_all)]
pub fn extract_article(html: &str, current_year: i32) -> Result<ArticleRecord, EngineError> {
    let document = Html::parse_document(html);

    let title = document
        .select(&TITLE)
        .next()
        .map(text_of)
        .filter(|t| !t.is_empty())
        .ok_or(EngineError::missing(Field::Title))?;

    let canonical_url = document
        .select(&CANONICAL)
        .next()
        .and_then(|link| non_empty(link.value().attr("href")))
        .ok_or(EngineError::missing(Field::CanonicalLink))?;

    let meta = document
        .select(&META_CELL)
        .next()
        .ok_or(EngineError::missing(Field::MetaCell))?;
    let meta_text = text_of(meta);

    let publication_date_text =
        extract_date_text(&meta_text, current_year).ok_or(EngineError::missing(Field::Date))?;

    let category = meta
        .select(&LINK)
        .next()
        .ok_or(EngineError::missing(Field::CategoryLink))?;
    let category_url = non_empty(category.value().attr("href"))
        .ok_or(EngineError::missing(Field::CategoryLink))?;
    let category_name = text_of(category);

    let publication_date = resolve_date(&publication_date_text, current_year);
    let quote = find_quote(&document);
    let secondary_language_link = find_language_link(&document);

    debug!(
        %title,
        %canonical_url,
        date = %publication_date_text,
        category = %category_name,
        quote = %quote.as_deref().map(|q| truncate_for_log(q, 60)).unwrap_or_default(),
        "Extracted article metadata"
    );

    Ok(ArticleRecord {
        title,
        canonical_url,
        category_url,
        category_name,
        publication_date_text,
        publication_date,
        sort_key: sort_key(publication_date),
        quote,
        secondary_language_link,
    })
}

/// First emphasized text long enough to stand as a quote, else the first such paragraph.
fn find_quote(document: &Html) -> Option<String> {
    let long_enough = |text: &String| text.chars().count() > MIN_QUOTE_CHARS;
    document
        .select(&EMPHASIS)
        .map(text_of)
        .find(long_enough)
        .or_else(|| document.select(&PARAGRAPH).map(text_of).find(long_enough))
}

fn find_language_link(document: &Html) -> Option<String> {
    if let Some(href) = document
        .select(&LANGUAGE_LINK)
        .find_map(|a| non_empty(a.value().attr("href")))
    {
        return Some(href);
    }

    document.select(&FLAG_IMAGE).find_map(|img| {
        img.ancestors()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "a")
            .and_then(|a| non_empty(a.value().attr("href")))
    })
}
