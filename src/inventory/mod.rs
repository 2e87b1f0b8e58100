//! Inventory ingestion: fetch the snapshot, decode it, and build the index.

pub mod parquet;
pub mod source;

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::tree::index::PathIndex;
use crate::tree::navigator::RowRange;

pub use self::parquet::ParquetInventory;
pub use self::source::InventorySource;

/// Names of the inventory columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnNames {
    pub key: String,
    pub size: String,
    pub modified: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            key: "key".to_string(),
            size: "size".to_string(),
            modified: "last_modified_date".to_string(),
        }
    }
}

/// Per-object metadata read back for visible leaves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectRow {
    pub key: String,
    pub size: Option<u64>,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Column-projection reader over an inventory.
///
/// `read_rows` must return rows in file order; callers match rows back to
/// entries by their position within the requested range.
pub trait InventoryReader: Send + Sync {
    /// Every key, one per row, in row order.
    fn read_keys(&self) -> Result<Vec<String>>;

    /// Metadata for the rows in `range`.
    fn read_rows(&self, range: RowRange) -> Result<Vec<ObjectRow>>;
}

/// Run a range read on the blocking pool.
pub async fn read_rows_async(
    reader: Arc<dyn InventoryReader>,
    range: RowRange,
) -> Result<Vec<ObjectRow>> {
    tokio::task::spawn_blocking(move || reader.read_rows(range))
        .await
        .map_err(|e| AppError::Decode(format!("metadata read task failed: {}", e)))?
}

/// Fetch and decode the inventory, then index every key.
///
/// This is the one-time load; any failure is returned to the caller.
pub async fn load_index(
    source: &InventorySource,
    columns: &ColumnNames,
) -> Result<(PathIndex, Arc<dyn InventoryReader>)> {
    let started = Instant::now();
    let bytes = source::fetch(source).await?;
    tracing::info!(
        source = %source,
        bytes = bytes.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "fetched inventory"
    );

    let columns = columns.clone();
    let (index, reader) = tokio::task::spawn_blocking(move || -> Result<_> {
        let inventory = ParquetInventory::from_bytes(bytes, columns)?;
        let keys = inventory.read_keys()?;
        if keys.len() != inventory.num_rows() {
            tracing::warn!(
                keys = keys.len(),
                rows = inventory.num_rows(),
                "key count differs from footer row count"
            );
        }
        Ok((PathIndex::from_keys(&keys), inventory))
    })
    .await
    .map_err(|e| AppError::Decode(format!("inventory decode task failed: {}", e)))??;

    tracing::info!(
        records = index.record_count(),
        leaves = index.leaf_count(),
        directories = index.directory_count(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "indexed inventory"
    );
    Ok((index, Arc::new(reader)))
}

/// Pair each returned row with the leaf at `source_row_index`, by position
/// within `range`. Rows whose key disagrees with `expected_key` are dropped.
pub fn match_row<'a>(
    rows: &'a [ObjectRow],
    range: RowRange,
    source_row_index: usize,
    expected_key: &str,
) -> Option<&'a ObjectRow> {
    let row = rows.get(range.slot_for(source_row_index)?)?;
    if row.key == expected_key {
        Some(row)
    } else {
        tracing::warn!(
            row = source_row_index,
            expected = expected_key,
            found = %row.key,
            "metadata row does not match leaf"
        );
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::parquet::tests::{write_inventory, FixtureRow};
    use tempfile::TempDir;

    /// In-memory reader used to exercise the range protocol.
    struct VecReader(Vec<ObjectRow>);

    impl InventoryReader for VecReader {
        fn read_keys(&self) -> Result<Vec<String>> {
            Ok(self.0.iter().map(|r| r.key.clone()).collect())
        }

        fn read_rows(&self, range: RowRange) -> Result<Vec<ObjectRow>> {
            let end = range.row_end.min(self.0.len());
            Ok(self.0[range.row_start.min(end)..end].to_vec())
        }
    }

    fn row(key: &str, size: u64) -> ObjectRow {
        ObjectRow {
            key: key.to_string(),
            size: Some(size),
            last_modified: None,
        }
    }

    #[tokio::test]
    async fn async_range_read_preserves_order() {
        let reader: Arc<dyn InventoryReader> = Arc::new(VecReader(vec![
            row("a", 1),
            row("b", 2),
            row("c", 3),
            row("d", 4),
        ]));
        let range = RowRange {
            row_start: 1,
            row_end: 3,
        };
        let rows = read_rows_async(reader, range).await.unwrap();
        assert_eq!(rows, vec![row("b", 2), row("c", 3)]);
    }

    #[test]
    fn match_row_uses_relative_position() {
        let rows = vec![row("x/2", 2), row("x/3", 3), row("x/4", 4)];
        let range = RowRange {
            row_start: 2,
            row_end: 5,
        };
        assert_eq!(match_row(&rows, range, 4, "x/4"), Some(&rows[2]));
        assert_eq!(match_row(&rows, range, 2, "x/2"), Some(&rows[0]));
        assert_eq!(match_row(&rows, range, 5, "x/5"), None);
        assert_eq!(match_row(&rows, range, 3, "wrong"), None);
    }

    #[tokio::test]
    async fn load_index_from_local_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("inventory.parquet");
        let rows: &[FixtureRow] = &[
            ("/a/b/file1.txt", Some(1), None),
            ("/a/b/", None, None),
            ("/a/c/file2.txt", Some(2), None),
        ];
        std::fs::write(&path, write_inventory(&[rows], true)).unwrap();

        let (index, reader) = load_index(&InventorySource::File(path), &ColumnNames::default())
            .await
            .unwrap();
        assert_eq!(index.record_count(), 3);
        assert_eq!(index.leaf_count(), 2);
        assert!(index.directory(&["/", "a", "b"]).is_some());

        let range = RowRange {
            row_start: 2,
            row_end: 3,
        };
        let objects = reader.read_rows(range).unwrap();
        assert_eq!(objects[0].key, "/a/c/file2.txt");
        assert_eq!(objects[0].size, Some(2));
    }

    #[tokio::test]
    async fn load_index_rejects_non_parquet() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("inventory.parquet");
        std::fs::write(&path, b"not a parquet file").unwrap();
        let err = load_index(&InventorySource::File(path), &ColumnNames::default())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::Decode(_)));
    }
}
