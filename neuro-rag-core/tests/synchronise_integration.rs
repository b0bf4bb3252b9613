use std::fs;
use std::path::Path;
use std::time::Duration;

use neuro_rag_core::config::SyncConfig;
use neuro_rag_core::contract::{FileState, MockFileStore, NewUpload, RemoteFile};
use neuro_rag_core::error::{SyncError, UploadError};
use neuro_rag_core::synchronise::{synchronise, SyncStatus};
use neuro_rag_core::upload::PollPolicy;
use tempfile::tempdir;

fn remote(name: &str, id: &str, state: FileState) -> RemoteFile {
    RemoteFile {
        id: id.to_string(),
        display_name: name.to_string(),
        state,
        uri: format!("https://files.example/{id}"),
        mime_type: "application/pdf".to_string(),
    }
}

fn touch(dir: &Path, name: &str) {
    fs::write(dir.join(name), b"%PDF-1.4 test").expect("write test document");
}

fn config_for(dir: &Path) -> SyncConfig {
    SyncConfig {
        books_dir: dir.to_path_buf(),
        extension: "pdf".to_string(),
    }
}

fn fast_poll() -> PollPolicy {
    PollPolicy {
        interval: Duration::from_millis(1),
        max_wait: Duration::from_secs(1),
    }
}

#[tokio::test]
async fn test_missing_folder_is_created_and_nothing_synced() {
    let temp = tempdir().unwrap();
    let books = temp.path().join("books");

    let mut store = MockFileStore::new();
    store.expect_list_files().times(0);
    store.expect_upload_file().times(0);

    let report = synchronise(&config_for(&books), &store, &fast_poll())
        .await
        .expect("Sync of a missing folder should succeed");

    assert_eq!(report.status, SyncStatus::FolderCreated);
    assert!(report.available.is_empty());
    assert!(books.is_dir(), "Book folder should have been created");
}

#[tokio::test]
async fn test_folder_without_documents_skips_listing() {
    let temp = tempdir().unwrap();
    touch(temp.path(), "notes.txt");

    let mut store = MockFileStore::new();
    store.expect_list_files().times(0);

    let report = synchronise(&config_for(temp.path()), &store, &fast_poll())
        .await
        .expect("Sync of an empty folder should succeed");

    assert_eq!(report.status, SyncStatus::NoDocuments);
    assert!(report.available.is_empty());
}

#[tokio::test]
async fn test_new_document_is_uploaded_once() {
    let temp = tempdir().unwrap();
    touch(temp.path(), "anatomy.pdf");

    let mut store = MockFileStore::new();
    store.expect_list_files().times(1).returning(|| Ok(vec![]));
    store
        .expect_upload_file()
        .times(1)
        .returning(|req: NewUpload<'_>| {
            assert_eq!(req.display_name, "anatomy.pdf");
            assert_eq!(req.mime_type, "application/pdf");
            Ok(remote(req.display_name, "files/anatomy", FileState::Ready))
        });
    store.expect_get_file().times(0);

    let report = synchronise(&config_for(temp.path()), &store, &fast_poll())
        .await
        .expect("Sync should succeed");

    assert_eq!(report.status, SyncStatus::Synced);
    assert_eq!(report.available.display_names(), vec!["anatomy.pdf"]);
    assert_eq!(report.uploaded, vec!["anatomy.pdf".to_string()]);
    assert!(report.reused.is_empty());
}

#[tokio::test]
async fn test_existing_remote_file_is_reused_without_upload() {
    let temp = tempdir().unwrap();
    touch(temp.path(), "anatomy.pdf");

    let existing = remote("anatomy.pdf", "files/existing", FileState::Ready);
    let listed = existing.clone();

    let mut store = MockFileStore::new();
    store
        .expect_list_files()
        .times(1)
        .return_once(move || Ok(vec![listed]));
    store.expect_upload_file().times(0);

    let report = synchronise(&config_for(temp.path()), &store, &fast_poll())
        .await
        .expect("Sync should succeed");

    assert_eq!(report.available.len(), 1);
    assert_eq!(report.available.iter().next(), Some(&existing));
    assert_eq!(report.reused, vec!["anatomy.pdf".to_string()]);
    assert!(report.uploaded.is_empty());
}

#[tokio::test]
async fn test_mixed_folder_uploads_only_missing_names_in_discovery_order() {
    let temp = tempdir().unwrap();
    touch(temp.path(), "b_physiology.pdf");
    touch(temp.path(), "a_anatomy.pdf");
    touch(temp.path(), "c_neurons.PDF");

    let mut store = MockFileStore::new();
    store.expect_list_files().times(1).returning(|| {
        Ok(vec![
            remote("b_physiology.pdf", "files/b", FileState::Ready),
            remote("unrelated.pdf", "files/x", FileState::Ready),
        ])
    });
    let mut upload_count = 0;
    store
        .expect_upload_file()
        .times(2)
        .returning(move |req: NewUpload<'_>| {
            upload_count += 1;
            Ok(remote(
                req.display_name,
                &format!("files/new-{upload_count}"),
                FileState::Ready,
            ))
        });

    let report = synchronise(&config_for(temp.path()), &store, &fast_poll())
        .await
        .expect("Sync should succeed");

    assert_eq!(
        report.available.display_names(),
        vec!["a_anatomy.pdf", "b_physiology.pdf", "c_neurons.PDF"]
    );
    assert_eq!(report.reused, vec!["b_physiology.pdf".to_string()]);
    assert_eq!(report.uploaded.len(), 2);
}

#[tokio::test]
async fn test_upload_failure_is_isolated_to_one_file() {
    let temp = tempdir().unwrap();
    touch(temp.path(), "broken.pdf");
    touch(temp.path(), "good.pdf");

    let mut store = MockFileStore::new();
    store.expect_list_files().returning(|| Ok(vec![]));
    store
        .expect_upload_file()
        .times(2)
        .returning(|req: NewUpload<'_>| {
            if req.display_name == "broken.pdf" {
                Err("connection reset".into())
            } else {
                Ok(remote(req.display_name, "files/good", FileState::Ready))
            }
        });

    let report = synchronise(&config_for(temp.path()), &store, &fast_poll())
        .await
        .expect("A single failed upload must not fail the sync");

    assert_eq!(report.available.display_names(), vec!["good.pdf"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].display_name, "broken.pdf");
    assert!(matches!(
        report.failed[0].error,
        UploadError::Transport { .. }
    ));
}

#[tokio::test]
async fn test_remote_processing_failure_is_skipped() {
    let temp = tempdir().unwrap();
    touch(temp.path(), "scanned.pdf");

    let mut store = MockFileStore::new();
    store.expect_list_files().returning(|| Ok(vec![]));
    store
        .expect_upload_file()
        .returning(|req: NewUpload<'_>| {
            Ok(remote(req.display_name, "files/scanned", FileState::Processing))
        });
    store
        .expect_get_file()
        .times(1)
        .returning(|id: &str| Ok(remote("scanned.pdf", id, FileState::Failed)));

    let report = synchronise(&config_for(temp.path()), &store, &fast_poll())
        .await
        .expect("Sync should succeed");

    assert!(report.available.is_empty());
    assert!(matches!(
        report.failed[0].error,
        UploadError::Failed {
            state: FileState::Failed,
            ..
        }
    ));
}

#[tokio::test]
async fn test_listing_failure_aborts_sync() {
    let temp = tempdir().unwrap();
    touch(temp.path(), "anatomy.pdf");

    let mut store = MockFileStore::new();
    store
        .expect_list_files()
        .returning(|| Err("503 Service Unavailable".into()));
    store.expect_upload_file().times(0);

    let err = synchronise(&config_for(temp.path()), &store, &fast_poll())
        .await
        .expect_err("Listing failure should abort the sync");

    assert!(matches!(err, SyncError::Listing(_)));
    assert!(err.to_string().contains("503"));
}

#[tokio::test]
async fn test_second_sync_without_changes_uploads_nothing() {
    let temp = tempdir().unwrap();
    touch(temp.path(), "anatomy.pdf");
    touch(temp.path(), "physiology.pdf");
    let config = config_for(temp.path());

    // First run: remote empty, both uploaded.
    let mut first = MockFileStore::new();
    first.expect_list_files().returning(|| Ok(vec![]));
    first
        .expect_upload_file()
        .times(2)
        .returning(|req: NewUpload<'_>| {
            Ok(remote(
                req.display_name,
                &format!("files/{}", req.display_name),
                FileState::Ready,
            ))
        });
    let first_report = synchronise(&config, &first, &fast_poll())
        .await
        .expect("First sync should succeed");

    // Second run: remote now holds what the first run uploaded.
    let uploaded: Vec<RemoteFile> = first_report.available.iter().cloned().collect();
    let mut second = MockFileStore::new();
    second
        .expect_list_files()
        .return_once(move || Ok(uploaded));
    second.expect_upload_file().times(0);
    let second_report = synchronise(&config, &second, &fast_poll())
        .await
        .expect("Second sync should succeed");

    assert_eq!(
        first_report.available.display_names(),
        second_report.available.display_names()
    );
    assert!(second_report.uploaded.is_empty());
}

#[tokio::test]
async fn test_duplicate_remote_names_prefer_ready_file() {
    let temp = tempdir().unwrap();
    touch(temp.path(), "anatomy.pdf");

    let mut store = MockFileStore::new();
    store.expect_list_files().returning(|| {
        Ok(vec![
            remote("anatomy.pdf", "files/ready", FileState::Ready),
            remote("anatomy.pdf", "files/failed", FileState::Failed),
        ])
    });
    store.expect_upload_file().times(0);

    let report = synchronise(&config_for(temp.path()), &store, &fast_poll())
        .await
        .expect("Sync should succeed");

    let ids: Vec<&str> = report.available.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, vec!["files/ready"]);
}

#[tokio::test]
async fn test_remote_file_still_processing_is_reused_without_upload() {
    let temp = tempdir().unwrap();
    touch(temp.path(), "anatomy.pdf");

    let mut store = MockFileStore::new();
    store.expect_list_files().times(1).returning(|| {
        Ok(vec![remote(
            "anatomy.pdf",
            "files/pending",
            FileState::Processing,
        )])
    });
    store.expect_upload_file().times(0);
    store.expect_get_file().times(0);

    let report = synchronise(&config_for(temp.path()), &store, &fast_poll())
        .await
        .expect("Sync should succeed");

    assert_eq!(report.reused, vec!["anatomy.pdf".to_string()]);
    assert!(report.uploaded.is_empty());
    let states: Vec<FileState> = report.available.iter().map(|f| f.state).collect();
    assert_eq!(states, vec![FileState::Processing]);
}
