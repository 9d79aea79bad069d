//! Entry renderer.
//!
//! Produces the fixed-format summary block used in category pages and the
//! site index. The output must match hand-edited blocks byte for byte, so the
//! indentation below is part of the format.

use crate::config::EntryStyle;
use crate::dates::ensure_year;
use crate::extract::entries::SPACER;
use crate::models::ArticleRecord;
use chrono::Datelike;
use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};

/// Render one [`ArticleRecord`] as an entry block.
///
/// The block starts with four spaces of indentation and ends with the spacer
/// paragraph, with no trailing newline.
pub fn render_entry(record: &ArticleRecord, width: u32, style: &EntryStyle) -> String {
    let url = attr(&record.canonical_url);
    let category_url = attr(&record.category_url);
    let category_title = attr(&record.category_name);
    let category_name = text(&record.category_name);
    let title = text(&record.title);
    let date = ensure_year(
        &record.publication_date_text,
        record.publication_date.year(),
    );
    let quote = text(record.quote.as_deref().unwrap_or(&style.default_quote));
    let attribution = text(&style.attribution);
    let home_url = attr(&style.home_url);
    let icon = attr(&style.arrow_icon);

    format!(
        "    <table width=\"{width}\" border=\"0\">\n\
        \x20       <tr>\n\
        \x20         <td><span class=\"den_articol\"><a href=\"{url}\" class=\"linkMare\">{title}</a></span></td>\n\
        \x20         </tr>\n\
        \x20         <tr>\n\
        \x20         <td class=\"text_dreapta\">On {date}, in <a href=\"{category_url}\" title=\"View all articles from {category_title}\" class=\"external\" rel=\"category tag\">{category_name}</a>, by {attribution}</td>\n\
        \x20       </tr>\n\
        \x20     </table>\n\
        \x20     <p class=\"text_obisnuit2\"><em>{quote}</em></p>\n\
        \x20     <table width=\"552\" border=\"0\">\n\
        \x20       <tr>\n\
        \x20         <td width=\"552\"><div align=\"right\" id=\"external2\"><a href=\"{url}\">read more </a><a href=\"{home_url}\" title=\"\"><img src=\"{icon}\" alt=\"\" width=\"5\" height=\"7\" class=\"arrow\" /></a></div></td>\n\
        \x20       </tr>\n\
        \x20     </table>\n\
        \x20     {SPACER}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::entries::split_entries;
    use crate::models::tests::record;

    const EXPECTED: &str = r#"    <table width="638" border="0">
        <tr>
          <td><span class="den_articol"><a href="https://neculaifantanaru.com/en/on-trust.html" class="linkMare">On Trust</a></span></td>
          </tr>
          <tr>
          <td class="text_dreapta">On March 3, 2024, in <a href="https://neculaifantanaru.com/en/leadership.html" title="View all articles from Leadership" class="external" rel="category tag">Leadership</a>, by Neculai Fantanaru</td>
        </tr>
      </table>
      <p class="text_obisnuit2"><em>True knowledge begins where you dare to transcend the limits imposed by the teachings of others.</em></p>
      <table width="552" border="0">
        <tr>
          <td width="552"><div align="right" id="external2"><a href="https://neculaifantanaru.com/en/on-trust.html">read more </a><a href="https://neculaifantanaru.com/en/" title=""><img src="Arrow3_black_5x7.gif" alt="" width="5" height="7" class="arrow" /></a></div></td>
        </tr>
      </table>
      <p class="text_obisnuit"></p>"#;

    fn on_trust() -> ArticleRecord {
        record(
            "On Trust",
            "https://neculaifantanaru.com/en/on-trust.html",
            "leadership.html",
            (2024, 3, 3),
        )
    }

    #[test]
    fn test_render_matches_wire_format() {
        let rendered = render_entry(&on_trust(), 638, &EntryStyle::default());
        assert_eq!(rendered, EXPECTED);
    }

    #[test]
    fn test_render_is_deterministic() {
        let r = on_trust();
        let style = EntryStyle::default();
        assert_eq!(render_entry(&r, 700, &style), render_entry(&r, 700, &style));
        assert!(
            render_entry(&r, 700, &style).starts_with("    <table width=\"700\" border=\"0\">")
        );
    }

    #[test]
    fn test_render_uses_quote_and_escapes_text() {
        let mut r = on_trust();
        r.title = "Trust & Doubt".to_string();
        r.quote = Some("Say <what> you mean.".to_string());
        let rendered = render_entry(&r, 638, &EntryStyle::default());
        assert!(rendered.contains(">Trust &amp; Doubt</a>"));
        assert!(rendered.contains("<em>Say &lt;what&gt; you mean.</em>"));
    }

    #[test]
    fn test_render_appends_missing_year() {
        let mut r = on_trust();
        r.publication_date_text = "March 3".to_string();
        let rendered = render_entry(&r, 638, &EntryStyle::default());
        assert!(rendered.contains("On March 3, 2024, in"));
    }

    #[test]
    fn test_rendered_block_reparses() {
        let rendered = render_entry(&on_trust(), 638, &EntryStyle::default());
        let region = split_entries(&rendered);
        assert_eq!(region.blocks.len(), 1);
        let block = &region.blocks[0];
        assert_eq!(block.url.as_deref(), Some("https://neculaifantanaru.com/en/on-trust.html"));
        assert_eq!(block.date, chrono::NaiveDate::from_ymd_opt(2024, 3, 3));
        assert_eq!(region.tail, "");
    }
}
