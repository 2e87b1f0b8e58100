//! Where the inventory comes from and how its bytes are fetched.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use bytes::Bytes;

use crate::error::{AppError, Result};

/// Default file extension of inventory snapshots.
pub const DEFAULT_EXTENSION: &str = ".parquet";

/// Location of an inventory file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InventorySource {
    /// Fetched over HTTP(S).
    Url(String),
    /// Read from the local filesystem. A directory resolves to its newest
    /// inventory snapshot.
    File(PathBuf),
}

impl InventorySource {
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            InventorySource::Url(trimmed.to_string())
        } else {
            InventorySource::File(PathBuf::from(trimmed))
        }
    }

    /// Replace a directory location with the newest snapshot inside it.
    pub fn resolve(self, extension: &str) -> Result<Self> {
        match self {
            InventorySource::File(path) if path.is_dir() => {
                let latest = latest_inventory(&path, extension)?;
                tracing::info!(dir = %path.display(), file = %latest.display(), "resolved latest inventory");
                Ok(InventorySource::File(latest))
            }
            other => Ok(other),
        }
    }
}

impl fmt::Display for InventorySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InventorySource::Url(url) => f.write_str(url),
            InventorySource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Find the most recently modified file in `dir` whose name ends with
/// `extension`.
pub fn latest_inventory(dir: &Path, extension: &str) -> Result<PathBuf> {
    let mut newest: Option<(SystemTime, PathBuf)> = None;
    for entry in std::fs::read_dir(dir)? {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };
        let path = entry.path();
        let matches_ext = path
            .file_name()
            .map(|n| n.to_string_lossy().ends_with(extension))
            .unwrap_or(false);
        if !matches_ext || !path.is_file() {
            continue;
        }
        let modified = match entry.metadata().and_then(|m| m.modified()) {
            Ok(t) => t,
            Err(_) => continue,
        };
        if newest.as_ref().map_or(true, |(t, _)| modified > *t) {
            newest = Some((modified, path));
        }
    }
    newest.map(|(_, path)| path).ok_or_else(|| {
        AppError::InvalidPath(format!(
            "no *{} inventory found in {}",
            extension,
            dir.display()
        ))
    })
}

/// Fetch the whole inventory into memory.
pub async fn fetch(source: &InventorySource) -> Result<Bytes> {
    match source {
        InventorySource::File(path) => tokio::fs::read(path)
            .await
            .map(Bytes::from)
            .map_err(|e| AppError::Fetch(format!("{}: {}", path.display(), e))),
        InventorySource::Url(url) => {
            let response = reqwest::get(url).await?.error_for_status()?;
            Ok(response.bytes().await?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::time::Duration;
    use tempfile::TempDir;

    fn touch(path: &Path, age_secs: u64) {
        let file = File::create(path).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(age_secs))
            .unwrap();
    }

    #[test]
    fn parse_detects_urls() {
        assert_eq!(
            InventorySource::parse("https://bucket.example/inventory.parquet"),
            InventorySource::Url("https://bucket.example/inventory.parquet".into())
        );
        assert_eq!(
            InventorySource::parse("../inventory.parquet"),
            InventorySource::File(PathBuf::from("../inventory.parquet"))
        );
    }

    #[test]
    fn latest_inventory_picks_newest_matching_file() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("old.parquet"), 3600);
        touch(&dir.path().join("new.parquet"), 10);
        touch(&dir.path().join("newest.csv"), 0);
        fs::create_dir(dir.path().join("sub.parquet")).unwrap();

        let latest = latest_inventory(dir.path(), DEFAULT_EXTENSION).unwrap();
        assert_eq!(latest, dir.path().join("new.parquet"));
    }

    #[test]
    fn latest_inventory_errors_when_empty() {
        let dir = TempDir::new().unwrap();
        let err = latest_inventory(dir.path(), DEFAULT_EXTENSION).unwrap_err();
        assert!(matches!(err, AppError::InvalidPath(_)));
    }

    #[test]
    fn resolve_directory_to_file() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("2024-01-01.parquet"), 0);
        let source = InventorySource::File(dir.path().to_path_buf())
            .resolve(DEFAULT_EXTENSION)
            .unwrap();
        assert_eq!(
            source,
            InventorySource::File(dir.path().join("2024-01-01.parquet"))
        );
    }

    #[tokio::test]
    async fn fetch_reads_local_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("inventory.parquet");
        fs::write(&path, b"PAR1").unwrap();
        let bytes = fetch(&InventorySource::File(path)).await.unwrap();
        assert_eq!(&bytes[..], b"PAR1");
    }

    #[tokio::test]
    async fn fetch_missing_file_is_fetch_error() {
        let err = fetch(&InventorySource::File(PathBuf::from("/nonexistent/inv.parquet")))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Fetch(_)));
    }

    #[tokio::test]
    async fn fetch_unreachable_url_is_fetch_error() {
        let source = InventorySource::parse("http://127.0.0.1:1/inventory.parquet");
        assert!(matches!(source, InventorySource::Url(_)));
        let err = fetch(&source).await.unwrap_err();
        assert!(matches!(err, AppError::Fetch(_)));
    }
}
