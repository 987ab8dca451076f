//! Analysis configuration
//!
//! Everything the analysis needs to know about where the recording lives and
//! which columns to pull out of it. Stored as JSON; missing fields fall back
//! to the defaults below.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::query::{EntityPathFilter, SparseFillStrategy};

/// Default recording file
pub const DEFAULT_RECORDING_PATH: &str = "./step_response.rrd";

/// Default index timeline
pub const DEFAULT_INDEX_COLUMN: &str = "sample_time";

/// Default content filter (every entity)
pub const DEFAULT_CONTENTS: &str = "/**";

/// Default nominal sample rate in Hz
pub const DEFAULT_SAMPLE_RATE: f64 = 100.0;

/// Analysis configuration stored in steplog.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Recording file to open
    pub recording_path: PathBuf,

    /// Timeline that orders the rows of the table
    pub index_column: String,

    /// Entity path filter selecting the table's columns
    pub contents: String,

    /// Columns extracted as signals
    pub value_columns: Vec<String>,

    /// Nominal sample rate in Hz
    ///
    /// Only compared against the measured rate; samples are never resampled.
    pub sample_rate: f64,

    /// How nulls in sparse columns are filled
    pub sparse_fill: SparseFillStrategy,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            recording_path: PathBuf::from(DEFAULT_RECORDING_PATH),
            index_column: DEFAULT_INDEX_COLUMN.to_string(),
            contents: DEFAULT_CONTENTS.to_string(),
            value_columns: vec!["/control:Scalar".to_string(), "/velocity:Scalar".to_string()],
            sample_rate: DEFAULT_SAMPLE_RATE,
            sparse_fill: SparseFillStrategy::None,
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::file_access(path, e))?;
        let config: Self = serde_json::from_str(&content).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate().map_err(|message| Error::Config {
            path: path.to_path_buf(),
            message,
        })?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults if the file does not exist
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no configuration file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        fs::write(path, content).map_err(|e| Error::file_access(path, e))
    }

    /// Check field values that serde cannot
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.index_column.trim().is_empty() {
            return Err("index_column must not be empty".to_string());
        }
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(format!(
                "sample_rate must be a positive number of Hz, got {}",
                self.sample_rate
            ));
        }
        EntityPathFilter::parse(&self.contents).map_err(|e| e.to_string())?;
        Ok(())
    }
}
