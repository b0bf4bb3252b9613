//! Upload waiter: push one document to the store and wait for the service to process it.
//!
//! The wait polls the file status at a fixed interval until the file leaves the processing state
//! or [`PollPolicy::max_wait`] runs out. A processing file is always polled at least once.

use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::contract::{FileState, FileStore, LocalDocument, NewUpload, RemoteFile, TransportError};
use crate::error::UploadError;

/// How the waiter polls a freshly uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Fixed delay between status polls.
    pub interval: Duration,
    /// Total time spent waiting before giving up.
    pub max_wait: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_wait: Duration::from_secs(300),
        }
    }
}

/// Upload `document` and return its handle once the store reports it ready.
///
/// Polls exactly as many times as needed to observe a terminal state; a handle that is already
/// ready on upload is returned without polling.
pub async fn upload_and_wait<S>(
    store: &S,
    document: &LocalDocument,
    poll: &PollPolicy,
) -> Result<RemoteFile, UploadError>
where
    S: FileStore + ?Sized,
{
    let display_name = document.display_name.as_str();
    info!(file = %display_name, path = %document.path.display(), "[UPLOAD] Uploading document");

    let transport = |source: TransportError| UploadError::Transport {
        display_name: display_name.to_string(),
        source,
    };

    let mut file = store
        .upload_file(NewUpload {
            path: &document.path,
            display_name,
            mime_type: &document.mime_type,
        })
        .await
        .map_err(|e| {
            error!(file = %display_name, error = ?e, "[UPLOAD][ERROR] upload_file failed");
            transport(e)
        })?;
    debug!(file = %display_name, id = %file.id, state = ?file.state, "[UPLOAD] upload_file accepted");

    let mut waited = Duration::ZERO;
    let mut polls = 0u32;
    while file.state == FileState::Processing {
        if polls > 0 && waited + poll.interval > poll.max_wait {
            warn!(file = %display_name, ?waited, polls, "[UPLOAD] Gave up waiting for processing");
            return Err(UploadError::TimedOut {
                display_name: display_name.to_string(),
                waited,
            });
        }
        tokio::time::sleep(poll.interval).await;
        waited += poll.interval;
        polls += 1;
        file = store.get_file(&file.id).await.map_err(|e| {
            error!(file = %display_name, error = ?e, "[UPLOAD][ERROR] get_file failed while polling");
            transport(e)
        })?;
        debug!(file = %display_name, state = ?file.state, polls, "[UPLOAD] Polled processing state");
    }

    match file.state {
        FileState::Ready => {
            info!(file = %display_name, id = %file.id, polls, "[UPLOAD] Document ready");
            Ok(file)
        }
        state @ (FileState::Failed | FileState::Unspecified | FileState::Processing) => {
            error!(file = %display_name, ?state, "[UPLOAD][ERROR] Remote processing failed");
            Err(UploadError::Failed {
                display_name: display_name.to_string(),
                state,
            })
        }
    }
}
