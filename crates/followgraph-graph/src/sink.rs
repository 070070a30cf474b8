//! Graph export sinks.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::graphson;
use crate::store::GraphStore;

/// Errors that can occur while exporting a graph.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Failed to write graph to {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Summary of a completed export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    /// Where the graph ended up. Absolute for files.
    pub destination: String,
    pub vertices: usize,
    pub edges: usize,
    pub bytes: u64,
}

/// Destination for a finished graph.
pub trait GraphSink {
    /// Serialize every vertex and edge of `store`. Either the complete
    /// graph is persisted or nothing is.
    fn export(&self, store: &GraphStore) -> Result<ExportReport, SinkError>;
}

/// Writes GraphSON to a file on disk.
///
/// Output goes to a temporary file next to the destination and is renamed
/// into place only after the write has completed and been synced.
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_err(&self, source: std::io::Error) -> SinkError {
        SinkError::Write {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl GraphSink for FileSink {
    fn export(&self, store: &GraphStore) -> Result<ExportReport, SinkError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| self.write_err(e))?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            graphson::write_graph(store, &mut writer).map_err(|e| self.write_err(e))?;
            writer.flush().map_err(|e| self.write_err(e))?;
        }
        tmp.as_file().sync_all().map_err(|e| self.write_err(e))?;

        tmp.persist(&self.path).map_err(|e| self.write_err(e.error))?;

        let bytes = fs::metadata(&self.path)
            .map(|m| m.len())
            .map_err(|e| self.write_err(e))?;
        let absolute = fs::canonicalize(&self.path).map_err(|e| self.write_err(e))?;

        tracing::debug!(
            path = %absolute.display(),
            bytes,
            "Graph file persisted"
        );

        Ok(ExportReport {
            destination: absolute.display().to_string(),
            vertices: store.vertex_count(),
            edges: store.edge_count(),
            bytes,
        })
    }
}
