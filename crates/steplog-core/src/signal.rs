//! Signal extraction
//!
//! Pulls columns out of a [`Table`] as flat numeric sequences. The index
//! column becomes timestamps in seconds; value columns keep their nulls.
//! Nothing is resampled or interpolated, so every sequence extracted from
//! one table has the same length and row order.

use rerun::external::arrow::array::{Array, PrimitiveArray};
use rerun::external::arrow::datatypes::{
    ArrowPrimitiveType, DataType, DurationNanosecondType, Float32Type, Float64Type, Int32Type,
    Int64Type, TimeUnit, TimestampNanosecondType,
};

use crate::error::{Error, Result};
use crate::table::Table;
use crate::unit_conversion::nanos_to_seconds;

/// A named column of optional samples
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    name: String,
    values: Vec<Option<f64>>,
}

impl Signal {
    /// Create a signal
    pub fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Column the signal was extracted from
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Samples, `None` where the column was null
    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    /// Get the number of samples
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of missing samples
    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }

    /// Dense copy with `NaN` for missing samples
    pub fn to_nan_filled(&self) -> Vec<f64> {
        self.values.iter().map(|v| v.unwrap_or(f64::NAN)).collect()
    }
}

/// Timestamps plus the signals extracted alongside them
#[derive(Debug, Clone, PartialEq)]
pub struct Signals {
    time: Vec<f64>,
    signals: Vec<Signal>,
}

impl Signals {
    /// Extract the index as seconds and each named column as a signal
    pub fn extract<S: AsRef<str>>(table: &Table, names: &[S]) -> Result<Self> {
        let time = index_seconds(table)?;
        let signals = names
            .iter()
            .map(|name| signal(table, name.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { time, signals })
    }

    /// Timestamps in seconds
    pub fn time(&self) -> &[f64] {
        &self.time
    }

    /// Extracted signals, in the order they were requested
    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    /// Find a signal by column name
    pub fn get(&self, name: &str) -> Option<&Signal> {
        self.signals.iter().find(|s| s.name == name)
    }

    /// Get the number of samples
    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Mean spacing between consecutive timestamps, in seconds
    ///
    /// # Returns
    /// `None` with fewer than two samples
    pub fn mean_sample_period(&self) -> Option<f64> {
        let (first, last) = (self.time.first()?, self.time.last()?);
        let intervals = self.time.len() - 1;
        if intervals == 0 {
            return None;
        }
        Some((last - first) / intervals as f64)
    }
}

/// The index column as nanosecond ticks
///
/// Only temporal indexes qualify. A sequence timeline counts frames, not
/// time, and is rejected with [`Error::Conversion`].
pub fn index_ticks(table: &Table) -> Result<Vec<i64>> {
    let column = table.index_name();
    let array = table.index_column();
    match array.data_type() {
        DataType::Duration(TimeUnit::Nanosecond) => {
            ticks::<DurationNanosecondType>(array.as_ref(), column)
        }
        DataType::Timestamp(TimeUnit::Nanosecond, _) => {
            ticks::<TimestampNanosecondType>(array.as_ref(), column)
        }
        other => Err(Error::Conversion {
            column: column.to_string(),
            data_type: other.clone(),
            expected: "seconds",
        }),
    }
}

/// The index column converted from nanosecond ticks to seconds
pub fn index_seconds(table: &Table) -> Result<Vec<f64>> {
    Ok(index_ticks(table)?
        .into_iter()
        .map(nanos_to_seconds)
        .collect())
}

/// A value column as optional `f64` samples
pub fn signal(table: &Table, name: &str) -> Result<Signal> {
    let array = table.column(name)?.as_ref();
    let values = match array.data_type() {
        DataType::Float64 => values::<Float64Type>(array, name, |v| v)?,
        DataType::Float32 => values::<Float32Type>(array, name, f64::from)?,
        DataType::Int64 => values::<Int64Type>(array, name, |v| v as f64)?,
        DataType::Int32 => values::<Int32Type>(array, name, f64::from)?,
        other => {
            return Err(Error::Conversion {
                column: name.to_string(),
                data_type: other.clone(),
                expected: "numbers",
            })
        }
    };
    Ok(Signal::new(name, values))
}

fn downcast<'a, T: ArrowPrimitiveType>(
    array: &'a dyn Array,
    column: &str,
    expected: &'static str,
) -> Result<&'a PrimitiveArray<T>> {
    array
        .as_any()
        .downcast_ref::<PrimitiveArray<T>>()
        .ok_or_else(|| Error::Conversion {
            column: column.to_string(),
            data_type: array.data_type().clone(),
            expected,
        })
}

fn ticks<T>(array: &dyn Array, column: &str) -> Result<Vec<i64>>
where
    T: ArrowPrimitiveType<Native = i64>,
{
    downcast::<T>(array, column, "seconds")?
        .iter()
        .enumerate()
        .map(|(row, tick)| {
            tick.ok_or_else(|| Error::NullIndex {
                column: column.to_string(),
                row,
            })
        })
        .collect()
}

fn values<T: ArrowPrimitiveType>(
    array: &dyn Array,
    column: &str,
    to_f64: impl Fn(T::Native) -> f64,
) -> Result<Vec<Option<f64>>> {
    Ok(downcast::<T>(array, column, "numbers")?
        .iter()
        .map(|v| v.map(&to_f64))
        .collect())
}
