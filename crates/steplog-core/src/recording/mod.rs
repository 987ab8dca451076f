//! Recordings
//!
//! A recording is a read-only capture of time-stamped values logged at
//! entity paths. The file format belongs to the logging library; a
//! [`RecordingBackend`] answers column queries over an opened file.

mod backend;
mod rrd;

pub use backend::{ColumnInfo, RecordingBackend};
pub use rrd::{RerunBackend, ENTITY_PATH_METADATA_KEY, RRD_MAGIC};

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use rerun::external::arrow::datatypes::DataType;

use crate::error::{Error, Result};
use crate::query::{EntityPathFilter, View};

/// Hierarchical name of a logged signal, e.g. `/robot/arm/velocity`
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityPath(String);

impl EntityPath {
    /// The root path `/`
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Parse a path, normalizing away a trailing slash
    pub fn parse(path: &str) -> Result<Self> {
        let trimmed = path.trim();
        if !trimmed.starts_with('/') {
            return Err(Error::InvalidEntityPath(format!(
                "'{path}' must start with '/'"
            )));
        }
        if trimmed == "/" {
            return Ok(Self::root());
        }

        let body = trimmed.strip_suffix('/').unwrap_or(trimmed);
        for part in body[1..].split('/') {
            if part.is_empty() {
                return Err(Error::InvalidEntityPath(format!("'{path}' has an empty part")));
            }
            if part.contains(|c: char| c == ':' || c == '*' || c.is_whitespace()) {
                return Err(Error::InvalidEntityPath(format!(
                    "'{path}' contains a reserved character in '{part}'"
                )));
            }
        }
        Ok(Self(body.to_string()))
    }

    /// The path as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path parts, without the leading root
    pub fn parts(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|part| !part.is_empty())
    }

    /// Number of parts; the root has depth 0
    pub fn depth(&self) -> usize {
        self.parts().count()
    }

    /// Whether `self` is `ancestor` or lies anywhere below it
    pub fn is_descendant_of_or_equal(&self, ancestor: &EntityPath) -> bool {
        let mut mine = self.parts();
        ancestor.parts().all(|part| mine.next() == Some(part))
    }
}

impl fmt::Display for EntityPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for EntityPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for EntityPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// An opened recording
pub struct Recording {
    backend: Box<dyn RecordingBackend>,
    /// File this recording was loaded from
    source: Option<PathBuf>,
}

impl Recording {
    /// Wrap a backend that already holds the recording's data
    pub fn from_backend(backend: impl RecordingBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            source: None,
        }
    }

    /// Open an `.rrd` file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let backend = RerunBackend::open(path)?;

        tracing::info!(
            path = %path.display(),
            timelines = ?backend.timelines().keys().collect::<Vec<_>>(),
            columns = backend.columns().len(),
            "opened recording"
        );
        Ok(Self {
            backend: Box::new(backend),
            source: Some(path.to_path_buf()),
        })
    }

    /// Timelines and the arrow type of their index column
    pub fn timelines(&self) -> &BTreeMap<String, DataType> {
        self.backend.timelines()
    }

    /// Component columns, sorted by name
    pub fn columns(&self) -> &[ColumnInfo] {
        self.backend.columns()
    }

    /// Every entity path that has at least one component column, sorted
    pub fn entity_paths(&self) -> BTreeSet<&EntityPath> {
        self.columns().iter().map(|c| &c.entity_path).collect()
    }

    /// File the recording was loaded from
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// The backend answering queries
    pub fn backend(&self) -> &dyn RecordingBackend {
        self.backend.as_ref()
    }

    /// Start a query over this recording
    ///
    /// `index` names the timeline that orders rows; `contents` is an entity
    /// path filter such as `/**` or `+ /robot/** - /robot/debug`.
    pub fn view(&self, index: &str, contents: &str) -> Result<View<'_>> {
        let filter: EntityPathFilter = contents.parse()?;
        Ok(View::new(self, index, filter))
    }
}

impl fmt::Debug for Recording {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recording")
            .field("source", &self.source)
            .field("timelines", &self.timelines().keys().collect::<Vec<_>>())
            .field("columns", &self.columns().len())
            .finish()
    }
}
