//! Batch orchestrator.
//!
//! One run takes every article document offered by the [`SiteStore`], turns
//! each into an [`ArticleRecord`], groups the records by category page and
//! merges each group into its page, then merges the recent ones into the site
//! index. A failure in one article or one document is recorded in the
//! [`RunReport`] and the run moves on.
//!
//! # Index eligibility
//!
//! On top of the usual deduplication, the index only takes articles published
//! within the trailing recency window. With `require_counterpart` set, the
//! article's parallel-language file name must also appear in the parallel
//! index; this is a plain substring check on that document's text.

use crate::config::EngineConfig;
use crate::encoding;
use crate::errors::EngineError;
use crate::extract::article::extract_article;
use crate::illustrations::swap_illustration;
use crate::models::{
    ArticleRecord, DocumentReport, DocumentStatus, MergeOutcome, RunReport, SkippedArticle,
};
use crate::outputs::merge::{MergeTarget, merge_document};
use crate::site::SiteStore;
use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime};
use encoding_rs::Encoding;
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument, warn};

/// Documents of a run that are not derived from article categories.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// The site index; skipped when `None`.
    pub index_path: Option<PathBuf>,
    /// Index of the parallel-language site, used by the counterpart gate.
    pub parallel_index_path: Option<PathBuf>,
    /// Parallel-language articles to take illustrations from.
    pub counterpart_dir: Option<PathBuf>,
}

/// Run one batch against `store`.
///
/// # Errors
///
/// Only run-wide problems are errors: an unusable encoding list or a corpus
/// that cannot be listed. Everything else ends up in the returned report.
#[instrument(level = "info", skip_all)]
pub async fn run_batch<S: SiteStore>(
    store: &S,
    config: &EngineConfig,
    options: &RunOptions,
) -> Result<RunReport, EngineError> {
    let now = config.processing_instant();
    let encodings = config.resolved_encodings()?;
    let mut report = RunReport {
        processed_at: now.format("%Y-%m-%dT%H:%M:%S").to_string(),
        ..Default::default()
    };

    let paths = store.articles().await?;
    report.articles_seen = paths.len();

    let mut records = Vec::with_capacity(paths.len());
    for path in &paths {
        match load_article(store, path, config, &encodings, options, now.year()).await {
            Ok((record, synced)) => {
                if synced {
                    report.illustrations_synced += 1;
                }
                records.push(record);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping article");
                report.skipped_articles.push(SkippedArticle {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }

    let records: Vec<ArticleRecord> = records
        .into_iter()
        .unique_by(|r| r.canonical_url.clone())
        .collect();
    report.articles_extracted = records.len();
    info!(
        seen = report.articles_seen,
        extracted = report.articles_extracted,
        skipped = report.skipped_articles.len(),
        "Extracted article records"
    );

    let mut by_category: BTreeMap<String, Vec<ArticleRecord>> = BTreeMap::new();
    for record in &records {
        match record.category_file() {
            Some(file) => by_category.entry(file).or_default().push(record.clone()),
            None => warn!(
                url = %record.canonical_url,
                category = %record.category_url,
                "Category link has no file name; article only eligible for the index"
            ),
        }
    }

    let encodings = encodings.as_slice();
    let category_reports: Vec<DocumentReport> = stream::iter(by_category.iter())
        .then(|(file, group)| async move {
            let path = store.destination(file);
            let target = MergeTarget {
                identity: Some(file.as_str()),
                policy: config.category_policy,
            };
            merge_into(store, &path, group, &target, config, encodings).await
        })
        .collect()
        .await;
    report.documents.extend(category_reports);

    if let Some(index_path) = &options.index_path {
        let document =
            update_index(store, index_path, &records, now, config, options, encodings).await;
        report.documents.push(document);
    }

    info!(
        documents = report.documents.len(),
        updated = report.updated(),
        succeeded = report.succeeded(),
        failed = report.failed(),
        "Batch complete"
    );
    Ok(report)
}

async fn load_article<S: SiteStore>(
    store: &S,
    path: &Path,
    config: &EngineConfig,
    encodings: &[&'static Encoding],
    options: &RunOptions,
    current_year: i32,
) -> Result<(ArticleRecord, bool), EngineError> {
    let bytes = store.read(path).await?;
    let text = encoding::normalize(&bytes, encodings)?;
    let record = extract_article(&text, current_year)?;
    debug!(
        path = %path.display(),
        file = ?record.article_file(),
        sort_key = %record.sort_key,
        "Loaded article"
    );

    let synced = match &options.counterpart_dir {
        Some(dir) => {
            let source = ArticleSource {
                path,
                raw: &bytes,
                text: &text,
            };
            sync_illustration(store, &source, &record, dir, config, encodings).await
        }
        None => false,
    };
    Ok((record, synced))
}

/// An article document as read and as decoded.
struct ArticleSource<'a> {
    path: &'a Path,
    raw: &'a [u8],
    text: &'a str,
}

/// Copy the counterpart's illustration into the article; never fails the article.
///
/// Only the `src` values change in the stored bytes. The article is backed up
/// first and left alone when the backup fails.
async fn sync_illustration<S: SiteStore>(
    store: &S,
    article: &ArticleSource<'_>,
    record: &ArticleRecord,
    counterpart_dir: &Path,
    config: &EngineConfig,
    encodings: &[&'static Encoding],
) -> bool {
    let path = article.path;
    let Some(counterpart_file) = record.counterpart_file() else {
        debug!(path = %path.display(), "No parallel-language link; illustration left as is");
        return false;
    };
    let counterpart_path = counterpart_dir.join(&counterpart_file);
    let counterpart = match store.read(&counterpart_path).await {
        Ok(bytes) => match encoding::normalize(&bytes, encodings) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %counterpart_path.display(), error = %e, "Unreadable counterpart");
                return false;
            }
        },
        Err(e) => {
            warn!(error = %e, "Counterpart article not found");
            return false;
        }
    };

    let Some(updated) =
        swap_illustration(article.raw, article.text, &counterpart, &config.images_base_url)
    else {
        debug!(path = %path.display(), "Illustration already matches or is missing");
        return false;
    };
    if let Err(e) = store.backup(path).await {
        error!(error = %e, "Backup failed; illustration not synced");
        return false;
    }
    match store.write(path, &updated).await {
        Ok(()) => {
            info!(path = %path.display(), counterpart = %counterpart_file, "Synced illustration");
            true
        }
        Err(e) => {
            error!(error = %e, "Failed to write synced illustration");
            false
        }
    }
}

/// Records the index may take.
///
/// A record qualifies when midnight of its publication date is no earlier
/// than `now - recency_days`. When `parallel_index` is given, its counterpart
/// file name must also occur somewhere in that text.
///
/// # Arguments
///
/// * `records` - Deduplicated records of the run
/// * `now` - Processing instant
/// * `recency_days` - Length of the trailing window
/// * `parallel_index` - Raw text of the parallel-language index, when gated
///
/// # Returns
///
/// The qualifying records, in input order.
pub fn index_candidates(
    records: &[ArticleRecord],
    now: NaiveDateTime,
    recency_days: i64,
    parallel_index: Option<&str>,
) -> Vec<ArticleRecord> {
    let cutoff = now - Duration::days(recency_days);
    records
        .iter()
        .filter(|r| {
            let recent = r.publication_date.and_time(NaiveTime::MIN) >= cutoff;
            if !recent {
                debug!(
                    url = %r.canonical_url,
                    date = %r.publication_date,
                    "Outside the recency window"
                );
            }
            recent
        })
        .filter(|r| match parallel_index {
            None => true,
            Some(index) => {
                let listed = r.counterpart_file().is_some_and(|f| index.contains(&f));
                if !listed {
                    debug!(url = %r.canonical_url, "Counterpart not listed in the parallel index");
                }
                listed
            }
        })
        .cloned()
        .collect()
}

async fn update_index<S: SiteStore>(
    store: &S,
    index_path: &Path,
    records: &[ArticleRecord],
    now: NaiveDateTime,
    config: &EngineConfig,
    options: &RunOptions,
    encodings: &[&'static Encoding],
) -> DocumentReport {
    let parallel_index = if config.require_counterpart {
        let Some(parallel_path) = &options.parallel_index_path else {
            error!("Counterpart gate enabled without a parallel index");
            return DocumentReport::failed(
                index_path.display().to_string(),
                EngineError::Config("require_counterpart needs a parallel index path".into()),
            );
        };
        let text = match store.read(parallel_path).await {
            Ok(bytes) => encoding::normalize(&bytes, encodings),
            Err(e) => Err(e),
        };
        match text {
            Ok(text) => Some(text),
            Err(e) => {
                error!(error = %e, "Parallel index unreadable");
                return DocumentReport::failed(index_path.display().to_string(), e);
            }
        }
    } else {
        None
    };

    let eligible = index_candidates(records, now, config.recency_days, parallel_index.as_deref());
    info!(eligible = eligible.len(), total = records.len(), "Selected index candidates");
    let target = MergeTarget {
        identity: None,
        policy: config.index_policy,
    };
    merge_into(store, index_path, &eligible, &target, config, encodings).await
}

/// Read, merge, back up and rewrite one target document.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
async fn merge_into<S: SiteStore>(
    store: &S,
    path: &Path,
    records: &[ArticleRecord],
    target: &MergeTarget<'_>,
    config: &EngineConfig,
    encodings: &[&'static Encoding],
) -> DocumentReport {
    let shown = path.display().to_string();

    let text = match store.read(path).await {
        Ok(bytes) => encoding::normalize(&bytes, encodings),
        Err(e) => Err(e),
    };
    let text = match text {
        Ok(text) => text,
        Err(e) => {
            error!(error = %e, "Cannot read target document");
            return DocumentReport::failed(shown, e);
        }
    };

    let outcome = match merge_document(&text, records, target, config) {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %e, "Rejected target document");
            return DocumentReport::failed(shown, e);
        }
    };
    let (merged, added, warnings) = match outcome {
        MergeOutcome::Unchanged => {
            debug!("Nothing new for this document");
            return DocumentReport {
                path: shown,
                status: DocumentStatus::Unchanged,
                warnings: Vec::new(),
            };
        }
        MergeOutcome::Updated {
            text,
            added,
            warnings,
        } => (text, added, warnings),
    };

    if let Err(e) = store.backup(path).await {
        error!(error = %e, "Backup failed; document left untouched");
        return DocumentReport::failed(shown, e);
    }
    if let Err(e) = store.write(path, merged.as_bytes()).await {
        error!(error = %e, "Write failed");
        return DocumentReport::failed(shown, e);
    }
    info!(added = added.len(), "Updated document");
    DocumentReport {
        path: shown,
        status: DocumentStatus::Updated { added },
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{END_MARKER, START_MARKER};
    use crate::extract::article::tests::article_html;
    use crate::models::MergePolicy;
    use std::collections::{HashMap, HashSet};
    use std::io;
    use std::sync::Mutex;

    /// In-memory store; destinations live under `site/`.
    #[derive(Default)]
    struct MemorySite {
        files: Mutex<HashMap<PathBuf, Vec<u8>>>,
        articles: Vec<PathBuf>,
        backups: Mutex<Vec<PathBuf>>,
        writes: Mutex<Vec<PathBuf>>,
        failing_writes: HashSet<PathBuf>,
        failing_backups: HashSet<PathBuf>,
    }

    impl MemorySite {
        fn put(&mut self, path: &str, content: &str) {
            self.files
                .get_mut()
                .unwrap()
                .insert(PathBuf::from(path), content.as_bytes().to_vec());
        }

        fn add_article(&mut self, name: &str, content: &str) {
            let path = format!("articles/{name}");
            self.put(&path, content);
            self.articles.push(PathBuf::from(path));
        }

        fn text(&self, path: &str) -> String {
            let files = self.files.lock().unwrap();
            String::from_utf8(files[&PathBuf::from(path)].clone()).unwrap()
        }
    }

    impl SiteStore for MemorySite {
        async fn articles(&self) -> Result<Vec<PathBuf>, EngineError> {
            Ok(self.articles.clone())
        }

        async fn read(&self, path: &Path) -> Result<Vec<u8>, EngineError> {
            self.files.lock().unwrap().get(path).cloned().ok_or_else(|| {
                EngineError::io(path, io::Error::from(io::ErrorKind::NotFound))
            })
        }

        async fn write(&self, path: &Path, content: &[u8]) -> Result<(), EngineError> {
            if self.failing_writes.contains(path) {
                return Err(EngineError::io(path, io::Error::other("disk full")));
            }
            self.writes.lock().unwrap().push(path.to_path_buf());
            self.files
                .lock()
                .unwrap()
                .insert(path.to_path_buf(), content.to_vec());
            Ok(())
        }

        async fn backup(&self, path: &Path) -> Result<(), EngineError> {
            if self.failing_backups.contains(path) {
                return Err(EngineError::io(path, io::Error::other("backup dir gone")));
            }
            self.backups.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }

        fn destination(&self, category_file: &str) -> PathBuf {
            PathBuf::from("site").join(category_file)
        }
    }

    fn page(title: &str) -> String {
        format!(
            "<html>\n<head><title>{title}</title></head>\n<body>\n{START_MARKER}\n<div align=\"justify\">\n          </div>\n          <p align=\"justify\" class=\"text_obisnuit style3\"> </p>\n{END_MARKER}\n</body>\n</html>\n"
        )
    }

    fn meta(date: &str, category: &str, name: &str) -> String {
        format!(
            r#"On {date}, in <a href="https://neculaifantanaru.com/en/{category}" title="View all articles from {name}" class="external" rel="category tag">{name}</a>, by Neculai Fantanaru"#
        )
    }

    fn article(slug: &str, date: &str, category: &str) -> String {
        article_html(
            slug,
            &format!("https://neculaifantanaru.com/en/{slug}.html"),
            &meta(date, category, "Leadership"),
            "<p><em>Leaders earn trust one honest conversation at a time.</em></p>",
        )
    }

    fn config() -> EngineConfig {
        EngineConfig {
            now: NaiveDateTime::parse_from_str("2024-05-01 09:00:00", "%Y-%m-%d %H:%M:%S").ok(),
            ..Default::default()
        }
    }

    fn options() -> RunOptions {
        RunOptions {
            index_path: Some(PathBuf::from("site/index.html")),
            ..Default::default()
        }
    }

    fn status<'a>(report: &'a RunReport, path: &str) -> &'a DocumentStatus {
        &report
            .documents
            .iter()
            .find(|d| d.path == path)
            .unwrap_or_else(|| panic!("no report for {path}"))
            .status
    }

    fn site() -> MemorySite {
        let mut site = MemorySite::default();
        site.put("site/leadership.html", &page("Leadership"));
        site.put("site/index.html", &page("Home"));
        site.add_article("on-trust.html", &article("on-trust", "March 3, 2024", "leadership.html"));
        // 200 days before the processing instant
        let old_habits = article("old-habits", "October 14, 2023", "leadership.html");
        site.add_article("old-habits.html", &old_habits);
        site
    }

    #[tokio::test]
    async fn test_run_updates_category_and_index() {
        let site = site();
        let report = run_batch(&site, &config(), &options()).await.unwrap();

        assert_eq!(report.articles_seen, 2);
        assert_eq!(report.articles_extracted, 2);
        assert_eq!(report.processed_at, "2024-05-01T09:00:00");
        assert_eq!(report.failed(), 0);

        let leadership = site.text("site/leadership.html");
        assert!(leadership.contains("/en/on-trust.html"));
        assert!(leadership.contains("/en/old-habits.html"));
        assert!(
            leadership.find("on-trust.html").unwrap() < leadership.find("old-habits.html").unwrap()
        );

        // the 200 day old article stays out of the index
        let index = site.text("site/index.html");
        assert!(index.contains("/en/on-trust.html"));
        assert!(!index.contains("old-habits.html"));
        assert_eq!(
            status(&report, "site/index.html"),
            &DocumentStatus::Updated {
                added: vec!["https://neculaifantanaru.com/en/on-trust.html".to_string()]
            }
        );

        let backups = site.backups.lock().unwrap();
        assert_eq!(backups.len(), 2);
    }

    #[tokio::test]
    async fn test_second_run_is_noop() {
        let site = site();
        run_batch(&site, &config(), &options()).await.unwrap();
        let leadership = site.text("site/leadership.html");
        let index = site.text("site/index.html");
        let writes = site.writes.lock().unwrap().len();

        let report = run_batch(&site, &config(), &options()).await.unwrap();
        assert_eq!(report.updated(), 0);
        assert_eq!(status(&report, "site/leadership.html"), &DocumentStatus::Unchanged);
        assert_eq!(site.text("site/leadership.html"), leadership);
        assert_eq!(site.text("site/index.html"), index);
        assert_eq!(site.writes.lock().unwrap().len(), writes);
    }

    #[tokio::test]
    async fn test_bad_article_is_skipped() {
        let mut site = site();
        site.add_article("broken.html", "<html><body><p>no metadata here</p></body></html>");
        let report = run_batch(&site, &config(), &options()).await.unwrap();
        assert_eq!(report.articles_seen, 3);
        assert_eq!(report.articles_extracted, 2);
        assert_eq!(report.skipped_articles.len(), 1);
        assert_eq!(report.skipped_articles[0].reason, "missing required field: title");
        assert_eq!(report.failed(), 0);
    }

    #[tokio::test]
    async fn test_failures_are_per_document() {
        let mut site = site();
        site.add_article("hope.html", &article("hope", "April 1, 2024", "hope.html"));
        site.add_article("vision.html", &article("vision", "April 2, 2024", "vision.html"));
        // hope.html page does not exist; vision.html has no markers
        site.put("site/vision.html", "<html><body>no markers</body></html>");

        let report = run_batch(&site, &config(), &options()).await.unwrap();
        assert!(matches!(status(&report, "site/hope.html"), DocumentStatus::Failed { .. }));
        match status(&report, "site/vision.html") {
            DocumentStatus::Failed { reason } => assert!(reason.contains("start marker")),
            other => panic!("unexpected status {other:?}"),
        }
        assert!(matches!(status(&report, "site/leadership.html"), DocumentStatus::Updated { .. }));
        // failed category pages do not keep their articles out of the index
        let index = site.text("site/index.html");
        assert!(index.contains("/en/hope.html") && index.contains("/en/vision.html"));
        assert_eq!(report.failed(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_articles_collapse() {
        let mut site = site();
        let copy = article("on-trust", "March 3, 2024", "leadership.html");
        site.add_article("on-trust-copy.html", &copy);
        let report = run_batch(&site, &config(), &options()).await.unwrap();
        assert_eq!(report.articles_extracted, 2);
        let leadership = site.text("site/leadership.html");
        assert_eq!(leadership.matches("class=\"linkMare\"").count(), 2);
    }

    #[tokio::test]
    async fn test_counterpart_gate() {
        let mut site = MemorySite::default();
        site.put("site/leadership.html", &page("Leadership"));
        site.put("site/index.html", &page("Home"));
        site.put(
            "ro/index.html",
            "<a href=\"https://neculaifantanaru.com/despre-incredere.html\">",
        );
        site.add_article("on-trust.html", &article("on-trust", "March 3, 2024", "leadership.html"));
        let lonely = article("lonely", "March 4, 2024", "leadership.html")
            .replace("despre-incredere.html", "singuratate.html");
        site.add_article("lonely.html", &lonely);

        let config = EngineConfig {
            require_counterpart: true,
            ..config()
        };
        let options = RunOptions {
            parallel_index_path: Some(PathBuf::from("ro/index.html")),
            ..options()
        };
        let report = run_batch(&site, &config, &options).await.unwrap();
        assert_eq!(report.failed(), 0);
        let index = site.text("site/index.html");
        assert!(index.contains("/en/on-trust.html"));
        assert!(!index.contains("/en/lonely.html"));
        assert!(site.text("site/leadership.html").contains("/en/lonely.html"));
    }

    #[tokio::test]
    async fn test_counterpart_gate_without_parallel_index_fails_index_only() {
        let site = site();
        let config = EngineConfig {
            require_counterpart: true,
            ..config()
        };
        let report = run_batch(&site, &config, &options()).await.unwrap();
        assert!(matches!(status(&report, "site/index.html"), DocumentStatus::Failed { .. }));
        assert!(matches!(status(&report, "site/leadership.html"), DocumentStatus::Updated { .. }));
    }

    fn image(name: &str) -> String {
        format!("<img src=\"https://neculaifantanaru.com/images/{name}_image.jpg\" />")
    }

    /// One article with a placeholder illustration and its Romanian counterpart.
    fn illustrated_site() -> (MemorySite, String) {
        let mut site = site();
        let en = article("on-trust", "March 3, 2024", "leadership.html")
            .replace("<p><em>", &format!("{}<p><em>", image("placeholder")));
        site.articles.clear();
        site.add_article("on-trust.html", &en);
        let ro = format!("<html><body>{}</body></html>", image("despre-incredere"));
        site.put("ro/despre-incredere.html", &ro);
        (site, en)
    }

    fn counterpart_options() -> RunOptions {
        RunOptions {
            counterpart_dir: Some(PathBuf::from("ro")),
            ..options()
        }
    }

    #[tokio::test]
    async fn test_illustration_sync() {
        let (site, en) = illustrated_site();
        let report = run_batch(&site, &config(), &counterpart_options()).await.unwrap();
        assert_eq!(report.illustrations_synced, 1);
        let article = site.text("articles/on-trust.html");
        assert!(article.contains("images/despre-incredere_image.jpg"));
        assert!(!article.contains("placeholder_image.jpg"));
        assert_eq!(
            article,
            en.replace("placeholder_image.jpg", "despre-incredere_image.jpg")
        );
        assert!(site
            .backups
            .lock()
            .unwrap()
            .contains(&PathBuf::from("articles/on-trust.html")));
    }

    #[tokio::test]
    async fn test_illustration_not_written_without_backup() {
        let (mut site, en) = illustrated_site();
        site.failing_backups.insert(PathBuf::from("articles/on-trust.html"));
        let report = run_batch(&site, &config(), &counterpart_options()).await.unwrap();
        assert_eq!(report.illustrations_synced, 0);
        assert_eq!(site.text("articles/on-trust.html"), en);
        // the article itself is still merged
        assert_eq!(report.articles_extracted, 1);
        assert!(site.text("site/leadership.html").contains("/en/on-trust.html"));
    }

    fn two_category_site() -> MemorySite {
        let mut site = site();
        site.put("site/hope.html", &page("Hope"));
        site.add_article("hope.html", &article("hope", "April 1, 2024", "hope.html"));
        site
    }

    #[tokio::test]
    async fn test_write_failure_is_per_document() {
        let mut site = two_category_site();
        site.failing_writes.insert(PathBuf::from("site/hope.html"));
        let report = run_batch(&site, &config(), &options()).await.unwrap();

        match status(&report, "site/hope.html") {
            DocumentStatus::Failed { reason } => assert!(reason.contains("disk full")),
            other => panic!("unexpected status {other:?}"),
        }
        assert_eq!(site.text("site/hope.html"), page("Hope"));
        assert!(matches!(status(&report, "site/leadership.html"), DocumentStatus::Updated { .. }));
        assert!(matches!(status(&report, "site/index.html"), DocumentStatus::Updated { .. }));
        assert!(site.text("site/index.html").contains("/en/hope.html"));
        assert_eq!(report.failed(), 1);
    }

    #[tokio::test]
    async fn test_backup_failure_is_per_document() {
        let mut site = two_category_site();
        site.failing_backups.insert(PathBuf::from("site/leadership.html"));
        let report = run_batch(&site, &config(), &options()).await.unwrap();

        match status(&report, "site/leadership.html") {
            DocumentStatus::Failed { reason } => assert!(reason.contains("backup dir gone")),
            other => panic!("unexpected status {other:?}"),
        }
        assert_eq!(site.text("site/leadership.html"), page("Leadership"));
        assert!(!site
            .writes
            .lock()
            .unwrap()
            .contains(&PathBuf::from("site/leadership.html")));
        assert!(matches!(status(&report, "site/hope.html"), DocumentStatus::Updated { .. }));
        assert!(matches!(status(&report, "site/index.html"), DocumentStatus::Updated { .. }));
        assert_eq!(report.failed(), 1);
    }

    #[tokio::test]
    async fn test_append_bucketed_category_policy() {
        let site = site();
        let config = EngineConfig {
            category_policy: MergePolicy::AppendBucketed,
            ..config()
        };
        let report = run_batch(&site, &config, &options()).await.unwrap();
        assert_eq!(report.failed(), 0);
        let leadership = site.text("site/leadership.html");
        assert!(
            leadership.find("on-trust.html").unwrap() < leadership.find("old-habits.html").unwrap()
        );
    }

    #[test]
    fn test_index_candidates_window() {
        use crate::models::tests::record;
        let now =
            NaiveDateTime::parse_from_str("2024-05-01 09:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let records = vec![
            record("a", "https://x.com/en/a.html", "c.html", (2024, 3, 3)),
            record("b", "https://x.com/en/b.html", "c.html", (2023, 10, 14)),
            record("c", "https://x.com/en/c.html", "c.html", (2024, 1, 3)),
        ];
        let eligible = index_candidates(&records, now, 120, None);
        let urls: Vec<_> = eligible.iter().map(|r| r.canonical_url.as_str()).collect();
        // midnight of 2024-01-03 is still after the 2024-01-02 09:00 cutoff
        assert_eq!(urls, vec!["https://x.com/en/a.html", "https://x.com/en/c.html"]);
    }
}
