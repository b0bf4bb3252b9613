//! # contract: interface to the remote file store and the hosted model
//!
//! This module defines the two traits the core talks to ([`FileStore`] and [`Generator`])
//! together with the plain data types that flow through them.
//!
//! ## Interface & Extensibility
//! - Implement [`FileStore`] to back synchronisation with a real API or a local fake.
//! - Implement [`Generator`] to answer questions with a hosted model.
//! - All methods are async and return boxed transport errors; the core maps them into
//!   the component errors in [`crate::error`].
//!
//! ## Mocking & Testing
//! - Both traits are annotated for `mockall`, exported under the `test-export-mocks` feature so
//!   the CLI crate's tests can reuse `MockFileStore` and `MockGenerator`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use mockall::automock;
use serde::Serialize;

/// Boxed error returned by transport implementations.
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// A document found in the local book folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalDocument {
    pub path: PathBuf,
    /// File base name; the key used to match remote files.
    pub display_name: String,
    pub mime_type: String,
}

/// Processing state of a file held by the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FileState {
    Processing,
    Ready,
    Failed,
    /// The service reported a state this client does not know about.
    Unspecified,
}

/// Handle to a file stored remotely. Owned by the service; we only keep the reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteFile {
    /// Service assigned identifier, e.g. `files/abc123`.
    pub id: String,
    pub display_name: String,
    pub state: FileState,
    /// URI used to reference the file from a generation request.
    pub uri: String,
    pub mime_type: String,
}

/// Data needed to upload one local file.
pub struct NewUpload<'a> {
    pub path: &'a Path,
    /// Name the remote copy is stored under, so later syncs can find it.
    pub display_name: &'a str,
    pub mime_type: &'a str,
}

/// Sampling parameters sent with every question.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            top_p: 0.95,
            top_k: 64,
        }
    }
}

/// One element of the content sent to the model.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentPart {
    Text(String),
    File { uri: String, mime_type: String },
}

impl From<&RemoteFile> for ContentPart {
    fn from(file: &RemoteFile) -> Self {
        ContentPart::File {
            uri: file.uri.clone(),
            mime_type: file.mime_type.clone(),
        }
    }
}

/// A single generation round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub model: String,
    pub config: GenerationConfig,
    pub contents: Vec<ContentPart>,
}

/// Remote file directory: list, upload and status lookups.
///
/// The trait is implemented by real clients and by test mocks.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait FileStore: Send + Sync {
    /// List every file currently held by the store.
    async fn list_files(&self) -> Result<Vec<RemoteFile>, TransportError>;

    /// Upload a local file under the given display name.
    ///
    /// The returned handle may still be processing.
    async fn upload_file<'a>(&self, req: NewUpload<'a>) -> Result<RemoteFile, TransportError>;

    /// Fetch the current status of a stored file by id.
    async fn get_file(&self, id: &str) -> Result<RemoteFile, TransportError>;
}

/// Hosted model that turns a request into text.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Generator: Send + Sync {
    /// Run one generation call and return the generated text verbatim.
    async fn generate(&self, req: GenerateRequest) -> Result<String, TransportError>;
}
