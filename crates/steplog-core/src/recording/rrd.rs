//! Rerun `.rrd` recordings
//!
//! Files are loaded into a rerun chunk store and queried with its dataframe
//! engine. Rerun materializes every cell as a list (a component batch); the
//! backend unwraps the first element so a scalar column comes out as plain
//! `Float64`.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use rerun::dataframe::{
    QueryEngine, QueryExpression, SparseFillStrategy as RerunFill, StorageEngine,
};
use rerun::external::arrow::array::{Array, ArrayRef, ListArray, UInt32Array};
use rerun::external::arrow::compute::{concat_batches, take};
use rerun::external::arrow::datatypes::{DataType, Field, Schema};
use rerun::external::arrow::record_batch::RecordBatch;
use rerun::ChunkStoreConfig;

use super::{ColumnInfo, EntityPath, RecordingBackend};
use crate::error::{Error, Result};
use crate::query::SparseFillStrategy;

/// Leading bytes of every `.rrd` file
pub const RRD_MAGIC: &[u8] = b"RRF";

/// Field metadata key rerun stores the entity path of a component column under
pub const ENTITY_PATH_METADATA_KEY: &str = "rerun.entity_path";

/// A recording loaded from an `.rrd` file
pub struct RerunBackend {
    engine: QueryEngine<StorageEngine>,
    timelines: BTreeMap<String, DataType>,
    columns: Vec<ColumnInfo>,
}

impl RerunBackend {
    /// Load the first recording stored in `path`
    pub fn open(path: &Path) -> Result<Self> {
        check_header(path)?;

        let engines = QueryEngine::from_rrd_filepath(&ChunkStoreConfig::DEFAULT, path)
            .map_err(|err| Error::format(path, format!("{err:#}")))?;
        let Some((store_id, engine)) = engines.into_iter().next() else {
            return Err(Error::format(path, "file holds no recording"));
        };

        // Without an index the query selects every column of the store.
        let schema = engine.query(QueryExpression::default()).schema().clone();

        let mut timelines = BTreeMap::new();
        let mut columns = Vec::new();
        for field in schema.fields().iter() {
            if let Some(entity_path) = column_entity_path(field) {
                columns.push(ColumnInfo {
                    name: field.name().clone(),
                    entity_path,
                    data_type: cell_type(field.data_type()).clone(),
                });
            } else if is_index_type(field.data_type()) {
                timelines.insert(field.name().clone(), field.data_type().clone());
            } else {
                tracing::debug!(column = %field.name(), "skipping column");
            }
        }
        columns.sort_by(|a, b| a.name.cmp(&b.name));

        tracing::debug!(
            store = ?store_id,
            timelines = timelines.len(),
            columns = columns.len(),
            "loaded rrd store"
        );
        Ok(Self {
            engine,
            timelines,
            columns,
        })
    }
}

impl RecordingBackend for RerunBackend {
    fn timelines(&self) -> &BTreeMap<String, DataType> {
        &self.timelines
    }

    fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    fn query(
        &self,
        index: &str,
        entity_paths: &[EntityPath],
        sparse_fill: SparseFillStrategy,
    ) -> Result<RecordBatch> {
        let expression = QueryExpression {
            filtered_index: Some(index.into()),
            view_contents: Some(
                entity_paths
                    .iter()
                    .map(|path| (rerun::EntityPath::from(path.as_str()), None))
                    .collect(),
            ),
            sparse_fill_strategy: match sparse_fill {
                SparseFillStrategy::None => RerunFill::None,
                SparseFillStrategy::LatestAtGlobal => RerunFill::LatestAtGlobal,
            },
            ..Default::default()
        };

        let handle = self.engine.query(expression);
        let batches: Vec<_> = handle.batch_iter().collect();
        let batch = concat_batches(handle.schema(), &batches)?;
        unwrap_cells(&batch, index, entity_paths)
    }
}

impl fmt::Debug for RerunBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RerunBackend")
            .field("timelines", &self.timelines)
            .field("columns", &self.columns)
            .finish_non_exhaustive()
    }
}

fn check_header(path: &Path) -> Result<()> {
    let file = File::open(path).map_err(|err| Error::file_access(path, err))?;
    let mut header = Vec::with_capacity(RRD_MAGIC.len());
    file.take(RRD_MAGIC.len() as u64)
        .read_to_end(&mut header)
        .map_err(|err| Error::file_access(path, err))?;

    if header.is_empty() {
        return Err(Error::format(path, "file is empty"));
    }
    if header != RRD_MAGIC {
        return Err(Error::format(path, "not a Rerun recording"));
    }
    Ok(())
}

/// Entity path of a component column
///
/// `None` for index and control columns, and for the `/__`-prefixed paths the
/// logging SDK keeps its own properties under.
fn column_entity_path(field: &Field) -> Option<EntityPath> {
    let path = match field.metadata().get(ENTITY_PATH_METADATA_KEY) {
        Some(path) => path.as_str(),
        None => field.name().split_once(':')?.0,
    };
    if path.trim_start_matches('/').starts_with("__") {
        return None;
    }
    match EntityPath::parse(path) {
        Ok(path) => Some(path),
        Err(err) => {
            tracing::debug!(column = %field.name(), "unsupported entity path: {err}");
            None
        }
    }
}

fn is_index_type(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Int64 | DataType::Duration(_) | DataType::Timestamp(_, _)
    )
}

/// Type of one element of a component batch
fn cell_type(data_type: &DataType) -> &DataType {
    match data_type {
        DataType::List(item) => item.data_type(),
        other => other,
    }
}

/// Keep the index and the requested entities' columns, one value per cell
fn unwrap_cells(
    batch: &RecordBatch,
    index: &str,
    entity_paths: &[EntityPath],
) -> Result<RecordBatch> {
    let schema = batch.schema();
    let index_position = schema.index_of(index)?;

    let mut components: Vec<usize> = schema
        .fields()
        .iter()
        .enumerate()
        .filter(|(_, field)| {
            column_entity_path(field).is_some_and(|path| entity_paths.contains(&path))
        })
        .map(|(i, _)| i)
        .collect();
    components.sort_by(|a, b| schema.field(*a).name().cmp(schema.field(*b).name()));

    let mut fields = vec![schema.field(index_position).clone()];
    let mut arrays = vec![batch.column(index_position).clone()];
    for i in components {
        let field = schema.field(i);
        let array = first_of_each(batch.column(i))?;
        fields.push(
            Field::new(field.name(), array.data_type().clone(), true)
                .with_metadata(field.metadata().clone()),
        );
        arrays.push(array);
    }

    Ok(RecordBatch::try_new(
        Arc::new(Schema::new(fields)),
        arrays,
    )?)
}

/// First element of every list, null where the list is null or empty
fn first_of_each(array: &ArrayRef) -> Result<ArrayRef> {
    let Some(list) = array.as_any().downcast_ref::<ListArray>() else {
        return Ok(array.clone());
    };

    let offsets = list.value_offsets();
    let indices: UInt32Array = (0..list.len())
        .map(|row| {
            (list.is_valid(row) && list.value_length(row) > 0).then(|| offsets[row] as u32)
        })
        .collect();
    Ok(take(list.values().as_ref(), &indices, None)?)
}
