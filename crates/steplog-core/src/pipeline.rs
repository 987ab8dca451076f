//! The analysis pipeline
//!
//! Open the recording, materialize the configured view, extract the signals
//! and hand them to a plotter. Any failure stops the run.

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::plot::Plotter;
use crate::recording::Recording;
use crate::signal::Signals;
use crate::table::Table;
use crate::unit_conversion::period_to_hz;

/// Relative deviation between measured and nominal rate that gets reported
const RATE_TOLERANCE: f64 = 0.1;

/// Output of one analysis run
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Materialized view
    pub table: Table,
    /// Timestamps in seconds and the configured signals
    pub signals: Signals,
}

/// Run the analysis on the configured recording file
pub fn run(config: &AnalysisConfig, plotter: &mut dyn Plotter) -> Result<Analysis> {
    let recording = Recording::open(&config.recording_path)?;
    analyze(&recording, config, plotter)
}

/// Run the analysis on an already loaded recording
pub fn analyze(
    recording: &Recording,
    config: &AnalysisConfig,
    plotter: &mut dyn Plotter,
) -> Result<Analysis> {
    let table = recording
        .view(&config.index_column, &config.contents)?
        .with_sparse_fill(config.sparse_fill)
        .select()?;
    tracing::info!(
        rows = table.num_rows(),
        columns = ?table.column_names(),
        "selected table"
    );

    let signals = Signals::extract(&table, &config.value_columns)?;
    check_sample_rate(&signals, config.sample_rate);

    plotter.plot(&signals)?;
    Ok(Analysis { table, signals })
}

/// Compare the measured sample rate with the nominal one
///
/// # Returns
/// The measured rate in Hz, if there are enough samples to measure it
pub fn check_sample_rate(signals: &Signals, nominal_hz: f64) -> Option<f64> {
    let measured_hz = period_to_hz(signals.mean_sample_period()?);
    let deviation = (measured_hz - nominal_hz).abs() / nominal_hz;
    if deviation > RATE_TOLERANCE {
        tracing::warn!(
            measured_hz,
            nominal_hz,
            "measured sample rate differs from the nominal rate"
        );
    } else {
        tracing::debug!(measured_hz, nominal_hz, "sample rate");
    }
    Some(measured_hz)
}
