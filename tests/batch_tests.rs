use std::sync::Arc;

use bytes::Bytes;
use file_queries::batch::FailedItem;
use file_queries::blob_store::{BlobStore, LocalStore};
use file_queries::service::{DeleteFilesRequest, FileService, ListFilesRequest, UploadItem};
use file_queries::storage::Database;

struct Fixture {
    dir: tempfile::TempDir,
    blobs: Arc<LocalStore>,
    files: FileService,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("data")).unwrap();
    let blobs = Arc::new(LocalStore::new(dir.path().join("files")).unwrap());
    let files = FileService::new(Arc::new(db), blobs.clone(), 25);
    Fixture {
        dir,
        blobs,
        files,
    }
}

fn upload(name: &str) -> UploadItem {
    UploadItem::new(name, Bytes::from(format!("contents of {name}")))
}

#[tokio::test]
async fn test_upload_three_valid_files() {
    let fx = fixture();
    let result = fx
        .files
        .upload_many("u1", vec![upload("a.png"), upload("b.pdf"), upload("c.jpeg")])
        .await;

    assert!(result.failures.is_empty());
    assert_eq!(result.successes.len(), 3);
    for (file, name) in result.successes.iter().zip(["a.png", "b.pdf", "c.jpeg"]) {
        assert!(!file.file_id.is_empty());
        assert_eq!(file.owner_id, "u1");
        assert_eq!(file.file_name, name);
    }

    let stored = fx.blobs.get("u1", "b.pdf").await.unwrap();
    assert_eq!(stored.data, "contents of b.pdf");
}

#[tokio::test]
async fn test_upload_failures_are_per_item() {
    let fx = fixture();
    let result = fx
        .files
        .upload_many(
            "u1",
            vec![
                upload("ok.png"),
                upload("notes.txt"),
                UploadItem {
                    file_name: None,
                    data: Bytes::from_static(b"anonymous"),
                },
                upload("also-ok.jpg"),
            ],
        )
        .await;

    assert_eq!(result.len(), 4);
    assert_eq!(
        result
            .successes
            .iter()
            .map(|f| f.file_name.as_str())
            .collect::<Vec<_>>(),
        vec!["ok.png", "also-ok.jpg"]
    );
    assert_eq!(
        result.failures,
        vec![
            FailedItem::new("notes.txt", 400),
            FailedItem::new("file[2]", 400)
        ]
    );
}

#[tokio::test]
async fn test_delete_missing_id() {
    let fx = fixture();
    let result = fx
        .files
        .delete_many(
            "u1",
            DeleteFilesRequest {
                file_ids: vec!["missing-id".to_string()],
                file_names: vec![],
            },
        )
        .await;

    assert!(result.successes.is_empty());
    assert_eq!(result.failures, vec![FailedItem::new("missing-id", 400)]);
}

#[tokio::test]
async fn test_delete_other_owners_file_is_unauthorized() {
    let fx = fixture();
    let theirs = fx.files.upload("u2", upload("secret.pdf")).await.unwrap();

    let result = fx
        .files
        .delete_many(
            "u1",
            DeleteFilesRequest {
                file_ids: vec![theirs.file_id.clone()],
                file_names: vec!["secret.pdf".to_string()],
            },
        )
        .await;

    // By id: owned by someone else. By name: u1 has no such file.
    assert_eq!(
        result.failures,
        vec![
            FailedItem::new(theirs.file_id.clone(), 401),
            FailedItem::new("secret.pdf", 400)
        ]
    );
    assert!(fx.blobs.get("u2", "secret.pdf").await.is_ok());
}

#[tokio::test]
async fn test_same_file_by_id_and_by_name() {
    let fx = fixture();
    let file = fx.files.upload("u1", upload("dup.png")).await.unwrap();

    let result = fx
        .files
        .delete_many(
            "u1",
            DeleteFilesRequest {
                file_ids: vec![file.file_id.clone()],
                file_names: vec!["dup.png".to_string()],
            },
        )
        .await;

    assert_eq!(result.successes, vec![file]);
    assert_eq!(result.failures, vec![FailedItem::new("dup.png", 400)]);
    assert!(fx.blobs.get("u1", "dup.png").await.is_err());
}

#[tokio::test]
async fn test_ids_run_before_names() {
    let fx = fixture();
    let a = fx.files.upload("u1", upload("a.png")).await.unwrap();
    let b = fx.files.upload("u1", upload("b.png")).await.unwrap();

    let result = fx
        .files
        .delete_many(
            "u1",
            DeleteFilesRequest {
                file_ids: vec![b.file_id.clone()],
                file_names: vec!["a.png".to_string()],
            },
        )
        .await;

    assert_eq!(result.successes, vec![b, a]);
    let listed = fx
        .files
        .list("u1", &ListFilesRequest::default(), None)
        .unwrap();
    assert!(listed.file_ids.is_empty());
}

#[tokio::test]
async fn test_every_item_is_reported_once() {
    let fx = fixture();
    fx.files.upload("u1", upload("keep.png")).await.unwrap();
    let doomed = fx.files.upload("u1", upload("gone.png")).await.unwrap();

    let request = DeleteFilesRequest {
        file_ids: vec![
            "nope".to_string(),
            doomed.file_id.clone(),
            doomed.file_id.clone(),
        ],
        file_names: vec!["missing.png".to_string(), "keep.png".to_string()],
    };
    let result = fx.files.delete_many("u1", request).await;

    assert_eq!(result.len(), 5);
    assert_eq!(result.successes.len(), 2);
    assert_eq!(
        result.failures,
        vec![
            FailedItem::new("nope", 400),
            FailedItem::new(doomed.file_id, 400),
            FailedItem::new("missing.png", 400)
        ]
    );
}

#[tokio::test]
async fn test_dot_owner_cannot_escape_blob_root() {
    let fx = fixture();

    for owner in ["..", "."] {
        let result = fx.files.upload_many(owner, vec![upload("escaped.png")]).await;

        assert!(result.successes.is_empty());
        assert_eq!(result.failures, vec![FailedItem::new("escaped.png", 400)]);
    }

    // The blob root is `<dir>/files`; its parent must stay untouched.
    assert!(!fx.dir.path().join("escaped.png").exists());
    assert!(!fx.dir.path().join("files").join("escaped.png").exists());
}

#[tokio::test]
async fn test_dot_owner_delete_by_name_is_rejected() {
    let fx = fixture();
    std::fs::write(fx.dir.path().join("victim.png"), b"outside").unwrap();

    let result = fx
        .files
        .delete_many(
            "..",
            DeleteFilesRequest {
                file_ids: vec![],
                file_names: vec!["victim.png".to_string()],
            },
        )
        .await;

    assert_eq!(result.failures, vec![FailedItem::new("victim.png", 400)]);
    assert!(fx.dir.path().join("victim.png").exists());
}
