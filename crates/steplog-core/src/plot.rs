//! Plotting collaborators
//!
//! Rendering is not part of the analysis; a [`Plotter`] receives the aligned
//! signals and does whatever it likes with them.

use crate::error::Result;
use crate::signal::Signals;

/// Consumer of extracted signals, typically a chart
pub trait Plotter {
    /// Draw the signals against their timestamps
    fn plot(&mut self, signals: &Signals) -> Result<()>;
}

/// Plotter that draws nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledPlotter;

impl Plotter for DisabledPlotter {
    fn plot(&mut self, signals: &Signals) -> Result<()> {
        tracing::debug!(
            samples = signals.len(),
            signals = signals.signals().len(),
            "plotting disabled"
        );
        Ok(())
    }
}
