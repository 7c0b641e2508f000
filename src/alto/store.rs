//! Filesystem access for ALTO documents.
//!
//! A run targets either a single file or a folder of per-page ALTO files.

use std::path::{Path, PathBuf};

use crate::alto::document::AltoDocument;
use crate::alto::writer;
use crate::error::AppError;

/// Extension of ALTO files picked up from a folder.
const ALTO_EXTENSION: &str = "xml";

/// Resolves, reads and writes the documents of one run.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    location: PathBuf,
}

impl DocumentStore {
    pub fn new(location: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
        }
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Documents targeted by this run.
    ///
    /// A file yields itself. A folder yields its `*.xml` files (not
    /// recursive), sorted by name so runs are reproducible.
    pub fn targets(&self) -> Result<Vec<PathBuf>, AppError> {
        let meta = std::fs::metadata(&self.location).map_err(|source| {
            AppError::DocumentUnavailable {
                path: self.location.clone(),
                source,
            }
        })?;

        if !meta.is_dir() {
            return Ok(vec![self.location.clone()]);
        }

        let entries =
            std::fs::read_dir(&self.location).map_err(|source| AppError::DocumentUnavailable {
                path: self.location.clone(),
                source,
            })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| AppError::DocumentUnavailable {
                path: self.location.clone(),
                source,
            })?;
            let path = entry.path();
            let is_alto = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(ALTO_EXTENSION));
            if is_alto && path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        tracing::debug!(
            folder = %self.location.display(),
            count = paths.len(),
            "Collected ALTO files"
        );
        Ok(paths)
    }

    /// Read and parse one document.
    pub fn load(&self, path: &Path) -> Result<AltoDocument, AppError> {
        let bytes = std::fs::read(path).map_err(|source| AppError::DocumentUnavailable {
            path: path.to_path_buf(),
            source,
        })?;

        AltoDocument::parse(&bytes).map_err(|e| AppError::MalformedDocument {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Serialize a document and atomically replace the file at `path`.
    pub fn save(&self, path: &Path, doc: &AltoDocument) -> Result<(), AppError> {
        let rewrite_failure = |e: std::io::Error| AppError::RewriteFailure {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        let bytes = writer::to_bytes(doc).map_err(rewrite_failure)?;
        writer::write_atomic(path, &bytes).map_err(rewrite_failure)?;

        tracing::debug!(path = %path.display(), bytes = bytes.len(), "Rewrote document");
        Ok(())
    }
}
