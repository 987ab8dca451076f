use std::collections::BTreeMap;

use rerun::external::arrow::datatypes::DataType;
use rerun::external::arrow::record_batch::RecordBatch;

use super::EntityPath;
use crate::error::Result;
use crate::query::SparseFillStrategy;

/// A component column a recording can materialize
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    /// Column name, `<entity_path>:<Component>`
    pub name: String,
    /// Entity the column belongs to
    pub entity_path: EntityPath,
    /// Type of one cell once materialized
    pub data_type: DataType,
}

/// Storage that answers column queries over one recording
pub trait RecordingBackend {
    /// Timelines and the arrow type of their index column
    fn timelines(&self) -> &BTreeMap<String, DataType>;

    /// Component columns, sorted by name
    fn columns(&self) -> &[ColumnInfo];

    /// Materialize the columns of `entity_paths` on the `index` timeline
    ///
    /// The batch has one row per index value at which any of the entities
    /// has data, ascending. The index column comes first; component columns
    /// follow sorted by name, one value per cell.
    fn query(
        &self,
        index: &str,
        entity_paths: &[EntityPath],
        sparse_fill: SparseFillStrategy,
    ) -> Result<RecordBatch>;
}
