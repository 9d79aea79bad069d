//! Access to the article corpus and the site documents.
//!
//! The engine never walks directories or picks paths on its own. Everything
//! it needs from the outside world goes through [`SiteStore`]:
//!
//! - [`SiteStore::articles`]: enumerate article documents of this run
//! - [`SiteStore::read`] / [`SiteStore::write`]: raw bytes in and out
//! - [`SiteStore::backup`]: keep a copy of a document before overwriting it
//! - [`SiteStore::destination`]: map a category file name to its document
//!
//! [`FsSite`] is the filesystem implementation used by the binary.

use crate::errors::EngineError;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument};

/// Collaborator interface for reading and persisting documents.
///
/// Implementations must not be shared by two runs that touch the same
/// destination document at the same time.
pub trait SiteStore {
    /// Article documents to process, in a stable order.
    async fn articles(&self) -> Result<Vec<PathBuf>, EngineError>;

    async fn read(&self, path: &Path) -> Result<Vec<u8>, EngineError>;

    async fn write(&self, path: &Path, content: &[u8]) -> Result<(), EngineError>;

    /// Copy the current content of `path` aside before it is overwritten.
    async fn backup(&self, path: &Path) -> Result<(), EngineError>;

    /// Document that holds the entries of category `category_file`.
    fn destination(&self, category_file: &str) -> PathBuf;
}

/// [`SiteStore`] over local directories.
#[derive(Debug, Clone)]
pub struct FsSite {
    /// Freshly produced article documents.
    pub articles_dir: PathBuf,
    /// Directory holding the category pages and the index.
    pub site_dir: PathBuf,
    /// Where overwritten documents are copied; no backups when `None`.
    pub backup_dir: Option<PathBuf>,
}

impl FsSite {
    pub fn new(articles_dir: impl Into<PathBuf>, site_dir: impl Into<PathBuf>) -> Self {
        FsSite {
            articles_dir: articles_dir.into(),
            site_dir: site_dir.into(),
            backup_dir: None,
        }
    }

    pub fn with_backup_dir(mut self, backup_dir: Option<PathBuf>) -> Self {
        self.backup_dir = backup_dir;
        self
    }
}

fn is_html(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("html"))
}

impl SiteStore for FsSite {
    #[instrument(level = "info", skip_all, fields(dir = %self.articles_dir.display()))]
    async fn articles(&self) -> Result<Vec<PathBuf>, EngineError> {
        let mut entries = fs::read_dir(&self.articles_dir)
            .await
            .map_err(|e| EngineError::io(&self.articles_dir, e))?;
        let mut paths = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| EngineError::io(&self.articles_dir, e))?
        {
            let path = entry.path();
            if is_html(&path) {
                paths.push(path);
            }
        }
        paths.sort();
        info!(count = paths.len(), "Listed article documents");
        Ok(paths)
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>, EngineError> {
        fs::read(path).await.map_err(|e| EngineError::io(path, e))
    }

    async fn write(&self, path: &Path, content: &[u8]) -> Result<(), EngineError> {
        fs::write(path, content)
            .await
            .map_err(|e| EngineError::io(path, e))?;
        debug!(path = %path.display(), bytes = content.len(), "Wrote document");
        Ok(())
    }

    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    async fn backup(&self, path: &Path) -> Result<(), EngineError> {
        let Some(backup_dir) = &self.backup_dir else {
            return Ok(());
        };
        let Some(name) = path.file_name() else {
            return Err(EngineError::Config(format!(
                "cannot back up {}: no file name",
                path.display()
            )));
        };
        fs::create_dir_all(backup_dir)
            .await
            .map_err(|e| EngineError::io(backup_dir, e))?;
        let target = backup_dir.join(name);
        fs::copy(path, &target)
            .await
            .map_err(|e| EngineError::io(path, e))?;
        info!(backup = %target.display(), "Backed up document");
        Ok(())
    }

    fn destination(&self, category_file: &str) -> PathBuf {
        self.site_dir.join(category_file)
    }
}
