//! Column-projection and row-range reads over an in-memory Parquet file.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::{Field, Row};
use parquet::schema::types::Type;

use super::{ColumnNames, InventoryReader, ObjectRow};
use crate::error::{AppError, Result};
use crate::tree::navigator::RowRange;

/// An inventory snapshot held in memory.
///
/// The footer is decoded once on construction to validate the schema; each
/// read opens a fresh reader over the shared buffer.
#[derive(Debug, Clone)]
pub struct ParquetInventory {
    bytes: Bytes,
    columns: ColumnNames,
    has_size: bool,
    has_modified: bool,
    num_rows: usize,
}

impl ParquetInventory {
    pub fn from_bytes(bytes: Bytes, columns: ColumnNames) -> Result<Self> {
        let reader = SerializedFileReader::new(bytes.clone())?;
        let metadata = reader.metadata();
        let schema = metadata.file_metadata().schema();
        let has_field = |name: &str| schema.get_fields().iter().any(|f| f.name() == name);

        if !has_field(&columns.key) {
            return Err(AppError::Decode(format!(
                "inventory has no '{}' column",
                columns.key
            )));
        }
        let has_size = has_field(&columns.size);
        let has_modified = has_field(&columns.modified);
        let num_rows = metadata.file_metadata().num_rows().max(0) as usize;

        tracing::debug!(
            rows = num_rows,
            row_groups = metadata.num_row_groups(),
            has_size,
            has_modified,
            "decoded inventory footer"
        );

        Ok(Self {
            bytes,
            columns,
            has_size,
            has_modified,
            num_rows,
        })
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Names of the columns a metadata read projects, in read order.
    fn metadata_columns(&self) -> Vec<&str> {
        let mut names = vec![self.columns.key.as_str()];
        if self.has_size {
            names.push(self.columns.size.as_str());
        }
        if self.has_modified {
            names.push(self.columns.modified.as_str());
        }
        names
    }

    /// Read `columns` for the rows in `range`, in file order.
    ///
    /// Only row groups overlapping the range are decoded.
    fn read(&self, columns: &[&str], range: RowRange) -> Result<Vec<Row>> {
        if range.is_empty() {
            return Ok(Vec::new());
        }
        let reader = SerializedFileReader::new(self.bytes.clone())?;
        let schema = reader.metadata().file_metadata().schema();
        let fields = schema
            .get_fields()
            .iter()
            .filter(|f| columns.contains(&f.name()))
            .cloned()
            .collect();
        let projection = Type::group_type_builder(schema.name())
            .with_fields(fields)
            .build()?;

        let mut rows = Vec::with_capacity(range.len());
        let mut group_start = 0usize;
        for i in 0..reader.num_row_groups() {
            let group_rows = reader.metadata().row_group(i).num_rows().max(0) as usize;
            let group_end = group_start + group_rows;
            if group_start >= range.row_end {
                break;
            }
            if group_end > range.row_start {
                let skip = range.row_start.saturating_sub(group_start);
                let take = range.row_end.min(group_end) - (group_start + skip);
                let group = reader.get_row_group(i)?;
                for row in group
                    .get_row_iter(Some(projection.clone()))?
                    .skip(skip)
                    .take(take)
                {
                    rows.push(row?);
                }
            }
            group_start = group_end;
        }
        Ok(rows)
    }
}

impl InventoryReader for ParquetInventory {
    fn read_keys(&self) -> Result<Vec<String>> {
        let range = RowRange {
            row_start: 0,
            row_end: self.num_rows,
        };
        let rows = self.read(&[self.columns.key.as_str()], range)?;
        Ok(rows
            .iter()
            .map(|row| {
                row.get_column_iter()
                    .find(|(name, _)| **name == self.columns.key)
                    .and_then(|(_, field)| field_string(field))
                    .unwrap_or_default()
            })
            .collect())
    }

    fn read_rows(&self, range: RowRange) -> Result<Vec<ObjectRow>> {
        let rows = self.read(&self.metadata_columns(), range)?;
        Ok(rows
            .iter()
            .map(|row| {
                let mut object = ObjectRow::default();
                for (name, field) in row.get_column_iter() {
                    if *name == self.columns.key {
                        object.key = field_string(field).unwrap_or_default();
                    } else if *name == self.columns.size {
                        object.size = field_u64(field);
                    } else if *name == self.columns.modified {
                        object.last_modified = field_timestamp(field);
                    }
                }
                object
            })
            .collect())
    }
}

fn field_string(field: &Field) -> Option<String> {
    match field {
        Field::Str(s) => Some(s.clone()),
        Field::Bytes(b) => std::str::from_utf8(b.data()).ok().map(str::to_string),
        _ => None,
    }
}

fn field_u64(field: &Field) -> Option<u64> {
    match field {
        Field::Long(v) => u64::try_from(*v).ok(),
        Field::Int(v) => u64::try_from(*v).ok(),
        Field::ULong(v) => Some(*v),
        Field::UInt(v) => Some(u64::from(*v)),
        _ => None,
    }
}

fn field_timestamp(field: &Field) -> Option<DateTime<Utc>> {
    match field {
        Field::TimestampMillis(ms) | Field::Long(ms) => DateTime::from_timestamp_millis(*ms),
        Field::TimestampMicros(us) => DateTime::from_timestamp_micros(*us),
        _ => None,
    }
}
