//! Local folder scanner: finds the documents that should be available remotely.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::contract::LocalDocument;
use crate::error::SyncError;

/// Result of looking at the book folder.
#[derive(Debug, PartialEq, Eq)]
pub enum FolderScan {
    /// The folder did not exist and has been created empty.
    Created,
    /// Matching documents in discovery order (sorted by file name). May be empty.
    Documents(Vec<LocalDocument>),
}

/// Scan `dir` for regular files ending in `.{extension}`.
///
/// A missing folder is created rather than reported as an error.
pub fn scan_documents(dir: &Path, extension: &str) -> Result<FolderScan, SyncError> {
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|source| SyncError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        info!(path = %dir.display(), "[SCAN] Created missing book folder");
        return Ok(FolderScan::Created);
    }

    let io_err = |source: std::io::Error| SyncError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mime_type = mime_for_extension(extension);
    let mut documents = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let path = entry.path();
        if !entry.file_type().map_err(io_err)?.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(extension));
        if !matches {
            debug!(path = %path.display(), "[SCAN] Skipping non-document file");
            continue;
        }
        let Some(display_name) = path.file_name().and_then(|n| n.to_str()) else {
            debug!(path = %path.display(), "[SCAN] Skipping file with non UTF-8 name");
            continue;
        };
        documents.push(LocalDocument {
            display_name: display_name.to_string(),
            mime_type: mime_type.to_string(),
            path,
        });
    }
    documents.sort_by(|a, b| a.display_name.cmp(&b.display_name));

    info!(path = %dir.display(), count = documents.len(), "[SCAN] Found local documents");
    Ok(FolderScan::Documents(documents))
}

/// MIME type sent along with uploads of the given extension.
pub fn mime_for_extension(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "html" | "htm" => "text/html",
        "csv" => "text/csv",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}
