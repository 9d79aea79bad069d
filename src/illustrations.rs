//! Illustration sync between an article and its parallel-language version.
//!
//! Illustrations are generated for the Romanian pages first; the English page
//! is produced with a placeholder image from the same folder. Before the
//! English article is summarized, its site illustration is replaced by the
//! one used on the Romanian counterpart.
//!
//! The rewrite works on the article's raw bytes and touches nothing but the
//! `src` attribute values, so the page keeps its encoding and every other
//! byte it had.

use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::bytes::{NoExpand, Regex};
use scraper::{Html, Selector};

const ILLUSTRATION_SUFFIX: &str = "_image.jpg";

static IMAGES: Lazy<Selector> = Lazy::new(|| Selector::parse("img[src]").unwrap());

fn illustrations<'a>(
    document: &'a Html,
    images_base: &'a str,
) -> impl Iterator<Item = &'a str> + 'a {
    document
        .select(&IMAGES)
        .filter_map(|img| img.value().attr("src"))
        .filter(move |src| src.starts_with(images_base) && src.ends_with(ILLUSTRATION_SUFFIX))
}

/// First site illustration referenced by `html`.
pub fn illustration_url(html: &str, images_base: &str) -> Option<String> {
    let document = Html::parse_document(html);
    illustrations(&document, images_base).next().map(str::to_string)
}

/// Point every site illustration of an article at the one used by `counterpart`.
///
/// # Arguments
///
/// * `raw` - The article document as stored
/// * `article` - The same document, decoded
/// * `counterpart` - Decoded parallel-language article
/// * `images_base` - URL prefix of site illustrations
///
/// # Returns
///
/// The rewritten bytes, or `None` when either page has no illustration or the
/// article already uses the counterpart's.
pub fn swap_illustration(
    raw: &[u8],
    article: &str,
    counterpart: &str,
    images_base: &str,
) -> Option<Vec<u8>> {
    let wanted = illustration_url(counterpart, images_base)?;
    let current: Vec<String> = {
        let document = Html::parse_document(article);
        illustrations(&document, images_base)
            .filter(|src| *src != wanted)
            .unique()
            .map(str::to_string)
            .collect()
    };
    if current.is_empty() {
        return None;
    }

    let replacement = format!("src=\"{wanted}\"");
    let mut updated = raw.to_vec();
    for src in &current {
        let pattern = Regex::new(&regex::escape(&format!("src=\"{src}\""))).ok()?;
        updated = pattern
            .replace_all(&updated, NoExpand(replacement.as_bytes()))
            .into_owned();
    }
    (updated != raw).then_some(updated)
}
