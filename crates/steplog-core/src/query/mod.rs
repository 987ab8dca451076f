//! Queries over a recording
//!
//! A [`View`] picks an index timeline and a set of entity paths. The entity
//! filter is resolved against the recording's columns here; the rows
//! themselves come from the recording's backend.

mod filter;

pub use filter::{EntityPathFilter, PathRule, RuleEffect};

use std::fmt;
use std::ops::RangeInclusive;
use std::sync::Arc;

use rerun::external::arrow::array::{new_empty_array, BooleanArray, Int64Array};
use rerun::external::arrow::compute::{cast, filter_record_batch};
use rerun::external::arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use rerun::external::arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::recording::{ColumnInfo, EntityPath, Recording};
use crate::table::Table;

/// How null cells are treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SparseFillStrategy {
    /// No sparse filling. Nulls stay nulls.
    #[default]
    None,
    /// Fill nulls with the latest value at or before the row, looking at the
    /// whole recording (values from before the index range can show up).
    LatestAtGlobal,
}

impl fmt::Display for SparseFillStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::LatestAtGlobal => f.write_str("latest-at (global)"),
        }
    }
}

/// A query over a recording
#[derive(Debug, Clone)]
pub struct View<'a> {
    recording: &'a Recording,
    index: String,
    contents: EntityPathFilter,
    range: Option<RangeInclusive<i64>>,
    sparse_fill: SparseFillStrategy,
}

impl<'a> View<'a> {
    /// Create a view over `recording` indexed by the `index` timeline
    pub fn new(recording: &'a Recording, index: &str, contents: EntityPathFilter) -> Self {
        Self {
            recording,
            index: index.to_string(),
            contents,
            range: None,
            sparse_fill: SparseFillStrategy::None,
        }
    }

    /// Only keep rows whose index value lies in `range` (inclusive)
    pub fn with_range(mut self, range: RangeInclusive<i64>) -> Self {
        self.range = Some(range);
        self
    }

    /// Set how null cells are filled
    pub fn with_sparse_fill(mut self, strategy: SparseFillStrategy) -> Self {
        self.sparse_fill = strategy;
        self
    }

    /// Index timeline name
    pub fn index(&self) -> &str {
        &self.index
    }

    /// Content filter
    pub fn contents(&self) -> &EntityPathFilter {
        &self.contents
    }

    /// Sparse fill strategy
    pub fn sparse_fill(&self) -> SparseFillStrategy {
        self.sparse_fill
    }

    /// Component columns the view selects, sorted by name
    pub fn selected_columns(&self) -> Vec<&'a ColumnInfo> {
        let recording: &'a Recording = self.recording;
        recording
            .columns()
            .iter()
            .filter(|column| self.contents.matches(&column.entity_path))
            .collect()
    }

    /// Entities whose columns the view selects, sorted
    pub fn selected_entities(&self) -> Vec<EntityPath> {
        let mut paths: Vec<EntityPath> = self
            .selected_columns()
            .into_iter()
            .map(|column| column.entity_path.clone())
            .collect();
        paths.sort();
        paths.dedup();
        paths
    }

    /// Run the query and materialize the result
    pub fn select(&self) -> Result<Table> {
        let Some(index_type) = self.recording.timelines().get(&self.index) else {
            tracing::warn!(
                index = %self.index,
                known = ?self.recording.timelines().keys().collect::<Vec<_>>(),
                "index timeline not found in recording, result will be empty"
            );
            let batch = empty_batch(
                &self.index,
                &DataType::Duration(TimeUnit::Nanosecond),
                &self.selected_columns(),
            )?;
            return Table::new(batch, &self.index);
        };

        let entities = self.selected_entities();
        let batch = if entities.is_empty() {
            empty_batch(&self.index, index_type, &[])?
        } else {
            self.recording
                .backend()
                .query(&self.index, &entities, self.sparse_fill)?
        };
        let batch = match &self.range {
            Some(range) => rows_in_range(&batch, &self.index, range)?,
            None => batch,
        };

        tracing::debug!(
            index = %self.index,
            contents = %self.contents,
            sparse_fill = %self.sparse_fill,
            rows = batch.num_rows(),
            columns = batch.num_columns(),
            "materialized view"
        );
        Table::new(batch, &self.index)
    }
}

/// Zero-row batch with the given index and component columns
fn empty_batch(
    index: &str,
    index_type: &DataType,
    columns: &[&ColumnInfo],
) -> Result<RecordBatch> {
    let mut fields = vec![Field::new(index, index_type.clone(), false)];
    let mut arrays = vec![new_empty_array(index_type)];
    for column in columns {
        fields.push(Field::new(&column.name, column.data_type.clone(), true));
        arrays.push(new_empty_array(&column.data_type));
    }
    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
}

/// Rows whose index value lies in `range`
fn rows_in_range(
    batch: &RecordBatch,
    index: &str,
    range: &RangeInclusive<i64>,
) -> Result<RecordBatch> {
    let column = batch.column_by_name(index).ok_or_else(|| Error::Schema {
        column: index.to_string(),
        available: Vec::new(),
    })?;
    let ticks = cast(column.as_ref(), &DataType::Int64)?;
    let ticks = ticks
        .as_any()
        .downcast_ref::<Int64Array>()
        .ok_or_else(|| Error::Conversion {
            column: index.to_string(),
            data_type: column.data_type().clone(),
            expected: "index ticks",
        })?;

    let keep: BooleanArray = ticks
        .iter()
        .map(|tick| Some(tick.is_some_and(|tick| range.contains(&tick))))
        .collect();
    Ok(filter_record_batch(batch, &keep)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::BTreeMap;
    use std::rc::Rc;

    use pretty_assertions::assert_eq;
    use rerun::external::arrow::array::{Array, ArrayRef, DurationNanosecondArray, Float64Array};

    use crate::recording::RecordingBackend;

    type QueryLog = Rc<RefCell<Vec<(Vec<EntityPath>, SparseFillStrategy)>>>;

    /// Backend serving one fixed batch; logs what it was asked for
    struct FixedBackend {
        timelines: BTreeMap<String, DataType>,
        columns: Vec<ColumnInfo>,
        batch: RecordBatch,
        queries: QueryLog,
    }

    impl FixedBackend {
        fn new(queries: QueryLog) -> Self {
            let duration = DataType::Duration(TimeUnit::Nanosecond);
            let names = ["/control:Scalar", "/debug/loop:Scalar", "/velocity:Scalar"];
            let columns = names
                .iter()
                .map(|name| ColumnInfo {
                    name: name.to_string(),
                    entity_path: EntityPath::parse(name.split_once(':').unwrap().0).unwrap(),
                    data_type: DataType::Float64,
                })
                .collect();

            let mut fields = vec![Field::new("sample_time", duration.clone(), false)];
            let mut arrays: Vec<ArrayRef> =
                vec![Arc::new(DurationNanosecondArray::from(vec![0, 10, 20, 30]))];
            for (i, name) in names.iter().enumerate() {
                fields.push(Field::new(*name, DataType::Float64, true));
                arrays.push(Arc::new(Float64Array::from(vec![i as f64; 4])));
            }
            let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).unwrap();

            Self {
                timelines: BTreeMap::from([("sample_time".to_string(), duration)]),
                columns,
                batch,
                queries,
            }
        }
    }

    impl RecordingBackend for FixedBackend {
        fn timelines(&self) -> &BTreeMap<String, DataType> {
            &self.timelines
        }

        fn columns(&self) -> &[ColumnInfo] {
            &self.columns
        }

        fn query(
            &self,
            _index: &str,
            entity_paths: &[EntityPath],
            sparse_fill: SparseFillStrategy,
        ) -> Result<RecordBatch> {
            self.queries
                .borrow_mut()
                .push((entity_paths.to_vec(), sparse_fill));
            Ok(self.batch.clone())
        }
    }

    fn recording() -> (Recording, QueryLog) {
        let queries = QueryLog::default();
        let recording = Recording::from_backend(FixedBackend::new(queries.clone()));
        (recording, queries)
    }

    fn paths(paths: &[&str]) -> Vec<EntityPath> {
        paths.iter().map(|p| EntityPath::parse(p).unwrap()).collect()
    }

    #[test]
    fn test_filter_selects_entities() {
        let (recording, queries) = recording();
        let view = recording.view("sample_time", "+ /** - /debug/**").unwrap();

        let names: Vec<&str> = view.selected_columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["/control:Scalar", "/velocity:Scalar"]);

        view.with_sparse_fill(SparseFillStrategy::LatestAtGlobal)
            .select()
            .unwrap();
        assert_eq!(
            *queries.borrow(),
            vec![(
                paths(&["/control", "/velocity"]),
                SparseFillStrategy::LatestAtGlobal
            )]
        );
    }

    #[test]
    fn test_range_keeps_inclusive_rows() {
        let (recording, _) = recording();
        let table = recording
            .view("sample_time", "/**")
            .unwrap()
            .with_range(10..=20)
            .select()
            .unwrap();

        assert_eq!(table.num_rows(), 2);
        let index = table
            .index_column()
            .as_any()
            .downcast_ref::<DurationNanosecondArray>()
            .unwrap();
        assert_eq!(index.values().to_vec(), vec![10, 20]);
    }

    #[test]
    fn test_unknown_index_is_empty() {
        let (recording, queries) = recording();
        let table = recording.view("frame", "/control").unwrap().select().unwrap();

        assert!(table.is_empty());
        assert_eq!(table.column_names(), vec!["frame", "/control:Scalar"]);
        assert_eq!(
            table.index_column().data_type(),
            &DataType::Duration(TimeUnit::Nanosecond)
        );
        assert!(queries.borrow().is_empty());
    }

    #[test]
    fn test_nothing_selected_skips_the_backend() {
        let (recording, queries) = recording();
        let table = recording.view("sample_time", "/nothing").unwrap().select().unwrap();

        assert!(table.is_empty());
        assert_eq!(table.column_names(), vec!["sample_time"]);
        assert!(queries.borrow().is_empty());
    }
}
