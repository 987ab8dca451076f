//! Materialized query results
//!
//! Component columns are named `<entity_path>:<Component>`, so a scalar
//! logged at `/control` ends up in `/control:Scalar`.

use rerun::external::arrow::array::ArrayRef;
use rerun::external::arrow::record_batch::RecordBatch;

use crate::error::{Error, Result};

/// A record batch with a designated index column
#[derive(Debug, Clone)]
pub struct Table {
    batch: RecordBatch,
    index: String,
    index_position: usize,
}

impl Table {
    /// Wrap a record batch; `index` must name one of its columns
    pub fn new(batch: RecordBatch, index: &str) -> Result<Self> {
        let index_position = batch
            .schema()
            .index_of(index)
            .map_err(|_| Error::Schema {
                column: index.to_string(),
                available: column_names(&batch),
            })?;
        Ok(Self {
            batch,
            index: index.to_string(),
            index_position,
        })
    }

    /// Name of the index column
    pub fn index_name(&self) -> &str {
        &self.index
    }

    /// Number of rows
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Number of columns, index included
    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    /// Check if there are no rows
    pub fn is_empty(&self) -> bool {
        self.batch.num_rows() == 0
    }

    /// Column names in table order
    pub fn column_names(&self) -> Vec<String> {
        column_names(&self.batch)
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Result<&ArrayRef> {
        self.batch.column_by_name(name).ok_or_else(|| Error::Schema {
            column: name.to_string(),
            available: self.column_names(),
        })
    }

    /// The index column
    pub fn index_column(&self) -> &ArrayRef {
        self.batch.column(self.index_position)
    }

    /// The underlying record batch
    pub fn record_batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Take the underlying record batch
    pub fn into_record_batch(self) -> RecordBatch {
        self.batch
    }
}

fn column_names(batch: &RecordBatch) -> Vec<String> {
    batch
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect()
}
