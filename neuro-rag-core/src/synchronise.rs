//! High-level pipeline: reconciles the local book folder with the remote file store.
//!
//! This module provides the orchestration behind startup and `refresh`. One run:
//!   - Scans the book folder (creating it when missing)
//!   - Lists the remote store once and keys it by display name
//!   - Reuses remote files whose display name matches a local document
//!   - Uploads the rest through [`upload_and_wait`], one at a time
//!   - Returns the [`AvailableFileSet`] plus a report of what happened to each document
//!
//! # Error Handling
//! A failed upload is logged, recorded in the report and skipped; the remaining documents are still
//! synchronised. A failed listing aborts the run with [`SyncError::Listing`].
//!
//! # Navigation
//! - Main entrypoint: [`synchronise`]
//! - Supporting types: [`AvailableFileSet`], [`SyncReport`], [`SyncStatus`].

use std::collections::HashMap;

use tracing::{debug, error, info, warn};

use crate::config::SyncConfig;
use crate::contract::{FileState, FileStore, RemoteFile};
use crate::error::{SyncError, UploadError};
use crate::scan::{scan_documents, FolderScan};
use crate::upload::{upload_and_wait, PollPolicy};

/// Ordered set of remote files usable as context for questions.
///
/// Rebuilt from scratch on every sync; never diffed in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AvailableFileSet {
    files: Vec<RemoteFile>,
}

impl AvailableFileSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, file: RemoteFile) {
        self.files.push(file);
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RemoteFile> {
        self.files.iter()
    }

    pub fn display_names(&self) -> Vec<&str> {
        self.files.iter().map(|f| f.display_name.as_str()).collect()
    }
}

impl FromIterator<RemoteFile> for AvailableFileSet {
    fn from_iter<I: IntoIterator<Item = RemoteFile>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().collect(),
        }
    }
}

/// How far a sync run got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// The book folder was missing and has been created; nothing to sync yet.
    FolderCreated,
    /// The folder exists but holds no matching documents.
    NoDocuments,
    /// Documents were reconciled against the remote store.
    Synced,
}

#[derive(Debug)]
pub struct FailedUpload {
    pub display_name: String,
    pub error: UploadError,
}

/// Outcome of one sync run.
#[derive(Debug)]
pub struct SyncReport {
    pub status: SyncStatus,
    pub available: AvailableFileSet,
    /// Display names found in the remote store and reused without upload.
    pub reused: Vec<String>,
    /// Display names uploaded during this run.
    pub uploaded: Vec<String>,
    pub failed: Vec<FailedUpload>,
}

impl SyncReport {
    fn empty(status: SyncStatus) -> Self {
        Self {
            status,
            available: AvailableFileSet::new(),
            reused: Vec::new(),
            uploaded: Vec::new(),
            failed: Vec::new(),
        }
    }
}

pub async fn synchronise<S>(
    config: &SyncConfig,
    store: &S,
    poll: &PollPolicy,
) -> Result<SyncReport, SyncError>
where
    S: FileStore + ?Sized,
{
    info!(books_dir = %config.books_dir.display(), "[SYNC] Starting synchronisation");

    let documents = match scan_documents(&config.books_dir, &config.extension)? {
        FolderScan::Created => {
            info!("[SYNC] Book folder created, no documents configured");
            return Ok(SyncReport::empty(SyncStatus::FolderCreated));
        }
        FolderScan::Documents(docs) if docs.is_empty() => {
            info!(extension = %config.extension, "[SYNC] No documents to sync");
            return Ok(SyncReport::empty(SyncStatus::NoDocuments));
        }
        FolderScan::Documents(docs) => docs,
    };

    let remote = match store.list_files().await {
        Ok(files) => {
            info!(count = files.len(), "[SYNC] Listed remote files");
            index_by_display_name(files)
        }
        Err(e) => {
            error!(error = ?e, "[SYNC][ERROR] Failed to list remote files");
            return Err(SyncError::Listing(e));
        }
    };

    let mut report = SyncReport::empty(SyncStatus::Synced);

    for document in &documents {
        let name = document.display_name.as_str();

        if let Some(existing) = remote.get(name) {
            if existing.state != FileState::Ready {
                warn!(file = %name, state = ?existing.state, "[SYNC] Reusing remote file that is not ready");
            }
            debug!(file = %name, id = %existing.id, "[SYNC] Found in remote store");
            report.available.push(existing.clone());
            report.reused.push(name.to_string());
            continue;
        }

        match upload_and_wait(store, document, poll).await {
            Ok(file) => {
                info!(file = %name, id = %file.id, "[SYNC] Uploaded");
                match serde_json::to_string_pretty(&file) {
                    Ok(json) => debug!(json = %json, file = %name, "[SYNC][DEBUG] Uploaded RemoteFile as JSON"),
                    Err(e) => error!(file = %name, error = ?e, "[SYNC][DEBUG] Failed to serialize RemoteFile as JSON"),
                }
                report.available.push(file);
                report.uploaded.push(name.to_string());
            }
            Err(e) => {
                error!(file = %name, error = %e, "[SYNC][ERROR] Upload failed, continuing");
                report.failed.push(FailedUpload {
                    display_name: name.to_string(),
                    error: e,
                });
            }
        }
    }

    info!(
        available = report.available.len(),
        reused = report.reused.len(),
        uploaded = report.uploaded.len(),
        failed = report.failed.len(),
        "[SYNC] Synchronisation complete"
    );
    Ok(report)
}

/// Keys remote files by display name. When a name occurs more than once a ready file wins over
/// one that is not, otherwise the later listing entry wins.
fn index_by_display_name(files: Vec<RemoteFile>) -> HashMap<String, RemoteFile> {
    let mut index: HashMap<String, RemoteFile> = HashMap::new();
    for file in files {
        let keep_existing = index.get(&file.display_name).is_some_and(|current| {
            current.state == FileState::Ready && file.state != FileState::Ready
        });
        if !keep_existing {
            index.insert(file.display_name.clone(), file);
        }
    }
    index
}
