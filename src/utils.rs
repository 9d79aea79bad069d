//! Small helpers shared across modules.

use url::Url;

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with the number of dropped bytes
/// appended, so article quotes and document excerpts stay readable in logs.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

/// Last path segment of a link, without query or fragment.
///
/// Works for absolute URLs (`https://host/en/leadership.html`) as well as
/// relative references (`../en/leadership.html`). Returns `None` when the
/// link has no file name.
pub fn file_name_of_url(link: &str) -> Option<String> {
    let link = link.trim();
    let name = match Url::parse(link) {
        Ok(url) => url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .map(|s| s.to_string()),
        Err(_) => {
            let path = link.split(['?', '#']).next().unwrap_or_default();
            path.rsplit(['/', '\\']).next().map(|s| s.to_string())
        }
    };
    name.filter(|n| !n.is_empty())
}
