mod helpers;

use std::sync::Arc;

use helpers::{
    is_empty_dir, orchestrator, zip_bytes, MemoryStorage, UnavailableCatalog, UpsertFailingCatalog,
};
use pixvault_core::{AppError, EntryStatus, ErrorMetadata};
use pixvault_services::{CatalogStore, IngestResponse, LocalStorage, MemoryCatalogStore};
use tempfile::tempdir;

fn statuses(result: &pixvault_core::BatchResult) -> Vec<EntryStatus> {
    result.outcomes().iter().map(|o| o.status).collect()
}

#[tokio::test]
async fn test_classification_and_upload() {
    let root = tempdir().unwrap();
    let storage = Arc::new(MemoryStorage::default());
    let catalog = Arc::new(MemoryCatalogStore::new());
    let orchestrator = orchestrator(storage.clone(), catalog.clone(), root.path());

    let archive = zip_bytes(&[("a.jpg", b"aaa"), ("b.txt", b"bbb"), ("c.PNG", b"ccc")]);
    let result = orchestrator.ingest_archive(archive).await.unwrap();

    assert_eq!(
        statuses(&result),
        vec![
            EntryStatus::Uploaded,
            EntryStatus::Skipped,
            EntryStatus::Uploaded
        ]
    );
    assert_eq!(storage.upload_count(), 2);
    assert_eq!(catalog.count().await.unwrap(), 2);
    assert!(catalog.lookup("b.txt").await.unwrap().is_none());

    let urls = result.urls();
    assert_eq!(urls.len(), 2);
    assert_eq!(
        catalog.lookup("c.PNG").await.unwrap().as_deref(),
        Some(urls[1].as_str())
    );
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let root = tempdir().unwrap();
    let storage = Arc::new(MemoryStorage::default());
    let catalog = Arc::new(MemoryCatalogStore::new());
    let orchestrator = orchestrator(storage.clone(), catalog.clone(), root.path());
    let archive = zip_bytes(&[("photos/a.jpg", b"aaa"), ("photos/b.jpeg", b"bbb")]);

    let first = orchestrator.ingest_archive(archive.clone()).await.unwrap();
    let uploads_after_first = storage.upload_count();
    let second = orchestrator.ingest_archive(archive).await.unwrap();

    assert_eq!(
        statuses(&second),
        vec![EntryStatus::AlreadyPresent, EntryStatus::AlreadyPresent]
    );
    assert_eq!(first.urls(), second.urls());
    assert_eq!(storage.upload_count(), uploads_after_first);
    assert_eq!(catalog.count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_failed_upload_does_not_affect_other_entries() {
    let root = tempdir().unwrap();
    let storage = Arc::new(MemoryStorage::failing_for(&["bad.jpg"]));
    let catalog = Arc::new(MemoryCatalogStore::new());
    let orchestrator = orchestrator(storage.clone(), catalog.clone(), root.path());

    let archive = zip_bytes(&[("a.jpg", b"a"), ("bad.jpg", b"b"), ("c.jpg", b"c")]);
    let result = orchestrator.ingest_archive(archive).await.unwrap();

    assert_eq!(
        statuses(&result),
        vec![
            EntryStatus::Uploaded,
            EntryStatus::Failed,
            EntryStatus::Uploaded
        ]
    );
    let failed = &result.outcomes()[1];
    assert_eq!(failed.error_code.as_deref(), Some("UPLOAD_UNAVAILABLE"));
    assert!(failed.url.is_none());
    assert!(catalog.lookup("bad.jpg").await.unwrap().is_none());
    assert_eq!(result.summary().failed, 1);
    assert_eq!(result.summary().uploaded, 2);
}

#[tokio::test]
async fn test_empty_entry_is_rejected_not_uploaded() {
    let root = tempdir().unwrap();
    let storage = Arc::new(MemoryStorage::default());
    let catalog = Arc::new(MemoryCatalogStore::new());
    let orchestrator = orchestrator(storage.clone(), catalog.clone(), root.path());

    let archive = zip_bytes(&[("empty.jpg", b""), ("a.jpg", b"a")]);
    let result = orchestrator.ingest_archive(archive).await.unwrap();

    assert_eq!(
        result.outcomes()[0].error_code.as_deref(),
        Some("UPLOAD_REJECTED")
    );
    assert_eq!(result.outcomes()[1].status, EntryStatus::Uploaded);
    assert_eq!(storage.attempt_count(), 1);
}

#[tokio::test]
async fn test_duplicates_within_batch_resolve_to_first_occurrence() {
    let root = tempdir().unwrap();
    let storage = Arc::new(MemoryStorage::default());
    let catalog = Arc::new(MemoryCatalogStore::new());
    let orchestrator = orchestrator(storage.clone(), catalog.clone(), root.path());

    let archive = zip_bytes(&[("day1/x.jpg", b"one"), ("day2/x.jpg", b"two")]);
    let result = orchestrator.ingest_archive(archive).await.unwrap();

    assert_eq!(
        statuses(&result),
        vec![EntryStatus::Uploaded, EntryStatus::AlreadyPresent]
    );
    assert_eq!(result.outcomes()[0].url, result.outcomes()[1].url);
    assert_eq!(result.outcomes()[1].name, "day2/x.jpg");
    assert_eq!(storage.upload_count(), 1);
}

#[tokio::test]
async fn test_duplicates_of_failed_entry_repeat_the_failure() {
    let root = tempdir().unwrap();
    let storage = Arc::new(MemoryStorage::failing_for(&["bad.jpg"]));
    let catalog = Arc::new(MemoryCatalogStore::new());
    let orchestrator = orchestrator(storage.clone(), catalog.clone(), root.path());

    let archive = zip_bytes(&[("a/bad.jpg", b"1"), ("b/bad.jpg", b"2")]);
    let result = orchestrator.ingest_archive(archive).await.unwrap();

    assert_eq!(
        statuses(&result),
        vec![EntryStatus::Failed, EntryStatus::Failed]
    );
    assert_eq!(
        result.outcomes()[1].error_code.as_deref(),
        Some("UPLOAD_UNAVAILABLE")
    );
    assert_eq!(storage.attempt_count(), 1);
}

#[tokio::test]
async fn test_concurrent_batches_record_one_entry() {
    let root = tempdir().unwrap();
    let storage = Arc::new(MemoryStorage::default());
    let catalog = Arc::new(MemoryCatalogStore::new());
    let orchestrator = orchestrator(storage.clone(), catalog.clone(), root.path());
    let archive = zip_bytes(&[("new.jpg", b"fresh")]);

    let other = orchestrator.clone();
    let (first, second) = tokio::join!(
        orchestrator.ingest_archive(archive.clone()),
        other.ingest_archive(archive.clone())
    );
    let (first, second) = (first.unwrap(), second.unwrap());

    assert_eq!(catalog.count().await.unwrap(), 1);
    assert!(!first.urls()[0].is_empty());
    assert!(!second.urls()[0].is_empty());
    let recorded = catalog.lookup("new.jpg").await.unwrap().unwrap();
    assert!(recorded == first.urls()[0] || recorded == second.urls()[0]);
}

#[tokio::test]
async fn test_catalog_outage_fails_entries_without_uploading() {
    let root = tempdir().unwrap();
    let storage = Arc::new(MemoryStorage::default());
    let orchestrator = orchestrator(storage.clone(), Arc::new(UnavailableCatalog), root.path());

    let archive = zip_bytes(&[("a.jpg", b"a"), ("notes.txt", b"n")]);
    let result = orchestrator.ingest_archive(archive).await.unwrap();

    assert_eq!(
        statuses(&result),
        vec![EntryStatus::Failed, EntryStatus::Skipped]
    );
    assert_eq!(
        result.outcomes()[0].error_code.as_deref(),
        Some("STORE_UNAVAILABLE")
    );
    assert_eq!(storage.attempt_count(), 0);
}

#[tokio::test]
async fn test_corrupt_archive_aborts_batch() {
    let root = tempdir().unwrap();
    let storage = Arc::new(MemoryStorage::default());
    let catalog = Arc::new(MemoryCatalogStore::new());
    let orchestrator = orchestrator(storage.clone(), catalog.clone(), root.path());

    let err = orchestrator
        .ingest_archive(b"this is not an archive".to_vec())
        .await
        .unwrap_err();

    match &err {
        AppError::IngestionAborted(inner) => {
            assert!(matches!(**inner, AppError::CorruptArchive(_)))
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.error_code(), "INGESTION_ABORTED");
    assert!(err.is_batch_fatal());
    assert_eq!(catalog.count().await.unwrap(), 0);
    assert!(is_empty_dir(root.path()));
}

#[tokio::test]
async fn test_traversal_aborts_before_any_upload() {
    let root = tempdir().unwrap();
    let storage = Arc::new(MemoryStorage::default());
    let catalog = Arc::new(MemoryCatalogStore::new());
    let orchestrator = orchestrator(storage.clone(), catalog.clone(), root.path());

    let archive = zip_bytes(&[("a.jpg", b"a"), ("../../evil.jpg", b"evil")]);
    let err = orchestrator.ingest_archive(archive).await.unwrap_err();

    assert!(matches!(
        err,
        AppError::IngestionAborted(ref inner) if matches!(**inner, AppError::PathTraversal(_))
    ));
    assert_eq!(storage.attempt_count(), 0);
}

#[tokio::test]
async fn test_scratch_dir_removed_after_batch() {
    let root = tempdir().unwrap();
    let storage = Arc::new(MemoryStorage::default());
    let catalog = Arc::new(MemoryCatalogStore::new());
    let orchestrator = orchestrator(storage, catalog, root.path());

    orchestrator
        .ingest_archive(zip_bytes(&[("a.jpg", b"a")]))
        .await
        .unwrap();

    assert!(is_empty_dir(root.path()));
}

#[tokio::test]
async fn test_ingest_folder_leaves_files_in_place() {
    let root = tempdir().unwrap();
    let folder = tempdir().unwrap();
    std::fs::write(folder.path().join("b.jpg"), b"b").unwrap();
    std::fs::write(folder.path().join("a.png"), b"a").unwrap();
    std::fs::write(folder.path().join("readme.md"), b"r").unwrap();

    let storage = Arc::new(MemoryStorage::default());
    let catalog = Arc::new(MemoryCatalogStore::new());
    catalog
        .upsert("b.jpg", "https://cdn.test/uploads/existing-b.jpg")
        .await
        .unwrap();
    let orchestrator = orchestrator(storage.clone(), catalog.clone(), root.path());

    let result = orchestrator.ingest_folder(folder.path()).await.unwrap();

    assert_eq!(
        statuses(&result),
        vec![
            EntryStatus::Uploaded,
            EntryStatus::AlreadyPresent,
            EntryStatus::Skipped
        ]
    );
    let summary = result.summary();
    assert_eq!(
        (summary.total, summary.skipped, summary.already_present, summary.uploaded),
        (3, 1, 1, 1)
    );
    assert!(folder.path().join("a.png").exists());
    assert_eq!(storage.upload_count(), 1);
}

#[tokio::test]
async fn test_ingest_missing_folder_aborts() {
    let root = tempdir().unwrap();
    let orchestrator = orchestrator(
        Arc::new(MemoryStorage::default()),
        Arc::new(MemoryCatalogStore::new()),
        root.path(),
    );

    let err = orchestrator
        .ingest_folder(&root.path().join("missing"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::IngestionAborted(_)));
}

#[tokio::test]
async fn test_local_storage_end_to_end() {
    let root = tempdir().unwrap();
    let media = tempdir().unwrap();
    let storage = Arc::new(
        LocalStorage::new(
            media.path(),
            "http://localhost:3000/media".to_string(),
            "uploads".to_string(),
        )
        .await
        .unwrap(),
    );
    let catalog = Arc::new(MemoryCatalogStore::new());
    let orchestrator = orchestrator(storage, catalog, root.path());

    let result = orchestrator
        .ingest_archive(zip_bytes(&[("beach.jpg", b"jpeg bytes")]))
        .await
        .unwrap();

    let response = IngestResponse::from(&result);
    assert_eq!(response.message, "Images uploaded and saved to catalog");
    let url = &response.urls[0];
    assert!(url.starts_with("http://localhost:3000/media/uploads/"));
    assert!(url.ends_with("-beach.jpg"));

    let stored_name = url.rsplit('/').next().unwrap();
    let stored = std::fs::read(media.path().join("uploads").join(stored_name)).unwrap();
    assert_eq!(stored, b"jpeg bytes");
}

#[tokio::test]
async fn test_failed_catalog_write_after_upload_fails_only_that_entry() {
    let root = tempdir().unwrap();
    let storage = Arc::new(MemoryStorage::default());
    let catalog = Arc::new(UpsertFailingCatalog::for_keys(&["a.jpg"]));
    let orchestrator = orchestrator(storage.clone(), catalog.clone(), root.path());

    let archive = zip_bytes(&[("a.jpg", b"aaa"), ("b.jpg", b"bbb")]);
    let result = orchestrator.ingest_archive(archive).await.unwrap();

    assert_eq!(
        statuses(&result),
        vec![EntryStatus::Failed, EntryStatus::Uploaded]
    );
    let failed = &result.outcomes()[0];
    assert_eq!(failed.error_code.as_deref(), Some("STORE_UNAVAILABLE"));
    assert!(failed.url.is_none());
    assert_eq!(storage.attempt_count(), 2);
    assert_eq!(storage.upload_count(), 2);
    assert_eq!(catalog.lookup("a.jpg").await.unwrap(), None);
    assert!(catalog.lookup("b.jpg").await.unwrap().is_some());
    assert_eq!(result.urls().len(), 1);
}

#[tokio::test]
async fn test_reserved_characters_in_names_yield_resolvable_urls() {
    let root = tempdir().unwrap();
    let media = tempdir().unwrap();
    let storage = Arc::new(
        LocalStorage::new(
            media.path(),
            "http://localhost:3000/media".to_string(),
            "uploads".to_string(),
        )
        .await
        .unwrap(),
    );
    let catalog = Arc::new(MemoryCatalogStore::new());
    let orchestrator = orchestrator(storage, catalog.clone(), root.path());

    let result = orchestrator
        .ingest_archive(zip_bytes(&[("party #2 ?.jpg", b"jpeg bytes")]))
        .await
        .unwrap();

    let outcome = &result.outcomes()[0];
    assert_eq!(outcome.status, EntryStatus::Uploaded);
    assert_eq!(outcome.identity_key, "party #2 ?.jpg");

    let url = outcome.url.clone().unwrap();
    assert!(url.ends_with("-party__2__.jpg"));
    assert!(!url.contains(|c: char| matches!(c, '#' | '?' | ' ')));
    assert_eq!(
        catalog.lookup("party #2 ?.jpg").await.unwrap().as_deref(),
        Some(url.as_str())
    );

    let stored_name = url.rsplit('/').next().unwrap();
    let stored = std::fs::read(media.path().join("uploads").join(stored_name)).unwrap();
    assert_eq!(stored, b"jpeg bytes");
}
