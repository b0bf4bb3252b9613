use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::contract::{FileState, TransportError};

/// Failure of a whole sync run. Per-file upload failures are not sync errors.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Failed to list remote files: {0}")]
    Listing(#[source] TransportError),

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure to get one document uploaded and processed.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Upload of {display_name} failed: {source}")]
    Transport {
        display_name: String,
        #[source]
        source: TransportError,
    },

    #[error("Remote processing of {display_name} ended in state {state:?}")]
    Failed {
        display_name: String,
        state: FileState,
    },

    #[error("Remote processing of {display_name} did not finish within {waited:?}")]
    TimedOut {
        display_name: String,
        waited: Duration,
    },
}

/// Failure to answer a question.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("No documents loaded")]
    NoDocuments,

    #[error("Generation failed: {0}")]
    Generation(#[source] TransportError),

    #[error("Model returned no text")]
    EmptyResponse,
}
