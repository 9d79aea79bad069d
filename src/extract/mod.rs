//! HTML parsing for both sides of a merge.
//!
//! - [`article`]: builds an [`crate::models::ArticleRecord`] from a new article page
//! - [`entries`]: recovers URLs and dates of entries already present in a
//!   category page or the site index
//!
//! Both use `scraper` selector queries instead of raw-text patterns, so
//! attribute order and whitespace inside tags do not matter.

pub mod article;
pub mod entries;
