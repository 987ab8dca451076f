//! # steplog Core Library
//!
//! Loads step-response recordings and extracts aligned signals from them.

#![warn(missing_docs)]

//!
//! This library provides:
//! - Loading Rerun `.rrd` recordings behind a pluggable backend
//! - Table extraction over an index timeline with entity path filters
//! - Signal normalization (nanosecond ticks to seconds)
//! - A synthetic step-response recording generator
//!
//! ## Example
//!
//! ```rust,ignore
//! use steplog_core::prelude::*;
//!
//! let recording = Recording::open("./step_response.rrd")?;
//! let table = recording.view("sample_time", "/**")?.select()?;
//! println!("{:?}", table.column_names());
//!
//! let signals = Signals::extract(&table, &["/control:Scalar", "/velocity:Scalar"])?;
//! println!("{} samples", signals.len());
//! ```

pub mod config;
pub mod demo;
pub mod error;
pub mod pipeline;
pub mod plot;
pub mod query;
pub mod recording;
pub mod signal;
pub mod table;
pub mod unit_conversion;

pub use error::{Error, Result};
pub use rerun::external::arrow;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::AnalysisConfig;
    pub use crate::demo::StepResponseSimulator;
    pub use crate::error::{Error, Result};
    pub use crate::pipeline::Analysis;
    pub use crate::plot::{DisabledPlotter, Plotter};
    pub use crate::query::{EntityPathFilter, SparseFillStrategy, View};
    pub use crate::recording::{ColumnInfo, EntityPath, Recording, RecordingBackend, RerunBackend};
    pub use crate::signal::{Signal, Signals};
    pub use crate::table::Table;
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
