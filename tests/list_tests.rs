use std::collections::BTreeSet;
use std::sync::Arc;

use file_queries::blob_store::LocalStore;
use file_queries::query::token;
use file_queries::service::{FileError, FileService, ListFilesRequest, UploadItem};
use file_queries::storage::{Attribute, Database, FileRecord};

struct Fixture {
    _dir: tempfile::TempDir,
    db: Database,
    files: FileService,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("data")).unwrap();
    let blobs = LocalStore::new(dir.path().join("files")).unwrap();
    let files = FileService::new(Arc::new(db.clone()), Arc::new(blobs), 25);
    Fixture {
        _dir: dir,
        db,
        files,
    }
}

/// Insert records directly so creation dates are controlled.
fn seed(db: &Database, owner: &str, files: &[(&str, &str, &str)]) {
    for (id, name, created) in files {
        db.put_file(&FileRecord {
            file_id: id.to_string(),
            owner_id: owner.to_string(),
            file_name: name.to_string(),
            creation_date: created.to_string(),
        })
        .unwrap();
    }
}

fn request(limit: i64) -> ListFilesRequest {
    ListFilesRequest {
        limit: Some(limit),
        ..Default::default()
    }
}

/// Follow tokens to the end, returning every page's ids.
fn all_pages(files: &FileService, owner: &str, req: &ListFilesRequest) -> Vec<Vec<String>> {
    let mut pages = Vec::new();
    let mut next_token: Option<String> = None;
    loop {
        let page = files.list(owner, req, next_token.as_deref()).unwrap();
        assert!(page.file_ids.len() as i64 <= req.limit.unwrap_or(25));
        pages.push(page.file_ids);
        match page.next_token {
            Some(t) => next_token = Some(t),
            None => return pages,
        }
        assert!(pages.len() < 100, "listing did not terminate");
    }
}

#[tokio::test]
async fn test_limit_two_over_three_uploads() {
    let fx = fixture();
    for name in ["one.png", "two.png", "three.png"] {
        fx.files
            .upload("u1", UploadItem::new(name, &b"png"[..]))
            .await
            .unwrap();
    }

    let first = fx.files.list("u1", &request(2), None).unwrap();
    assert_eq!(first.file_ids.len(), 2);
    let next_token = first.next_token.expect("a third file remains");

    let second = fx.files.list("u1", &request(2), Some(&next_token)).unwrap();
    assert_eq!(second.file_ids.len(), 1);
    assert_eq!(second.next_token, None);

    let mut seen: Vec<_> = first.file_ids.into_iter().chain(second.file_ids).collect();
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), 3);
}

#[test]
fn test_limit_covering_everything_has_no_token() {
    let fx = fixture();
    seed(
        &fx.db,
        "u1",
        &[
            ("f1", "a.png", "2024-01-01T00:00:00.000Z"),
            ("f2", "b.png", "2024-01-02T00:00:00.000Z"),
        ],
    );

    for limit in [2, 3, 25] {
        let page = fx.files.list("u1", &request(limit), None).unwrap();
        assert_eq!(page.file_ids, vec!["f1", "f2"]);
        assert_eq!(page.next_token, None);
    }
}

#[test]
fn test_default_limit_applies() {
    let fx = fixture();
    let many: Vec<(String, String)> = (0..30)
        .map(|i| (format!("f{i:02}"), format!("file{i:02}.png")))
        .collect();
    let rows: Vec<(&str, &str, &str)> = many
        .iter()
        .map(|(id, name)| (id.as_str(), name.as_str(), "2024-01-01T00:00:00.000Z"))
        .collect();
    seed(&fx.db, "u1", &rows);

    let page = fx
        .files
        .list("u1", &ListFilesRequest::default(), None)
        .unwrap();
    assert_eq!(page.file_ids.len(), 25);
    assert!(page.next_token.is_some());
}

#[test]
fn test_non_positive_limit_returns_nothing() {
    let fx = fixture();
    seed(&fx.db, "u1", &[("f1", "a.png", "2024-01-01T00:00:00.000Z")]);

    for limit in [0, -5] {
        let page = fx.files.list("u1", &request(limit), None).unwrap();
        assert!(page.file_ids.is_empty());
        assert_eq!(page.next_token, None);
    }
}

#[test]
fn test_paging_is_exhaustive_for_every_strategy() {
    let fx = fixture();
    let rows: Vec<(String, String, String)> = (0..7)
        .map(|i| {
            (
                format!("f{i}"),
                format!("payload{i}.png"),
                format!("2024-01-0{}T00:00:00.000Z", i + 1),
            )
        })
        .collect();
    let borrowed: Vec<(&str, &str, &str)> = rows
        .iter()
        .map(|(a, b, c)| (a.as_str(), b.as_str(), c.as_str()))
        .collect();
    seed(&fx.db, "u1", &borrowed);
    seed(&fx.db, "u2", &[("other", "payload9.png", "2024-01-03T00:00:00.000Z")]);

    let requests = [
        request(2),
        ListFilesRequest {
            name_begins_with: Some("payload".to_string()),
            ..request(3)
        },
        ListFilesRequest {
            created_after: Some("2024-01-01T00:00:00Z".to_string()),
            created_before: Some("2024-01-31T00:00:00Z".to_string()),
            ..request(1)
        },
    ];

    for req in &requests {
        let pages = all_pages(&fx.files, "u1", req);
        let ids: Vec<String> = pages.into_iter().flatten().collect();
        let unique: BTreeSet<&String> = ids.iter().collect();
        assert_eq!(ids.len(), 7, "{req:?}");
        assert_eq!(unique.len(), 7, "{req:?}");
        assert!(!ids.contains(&"other".to_string()));
    }
}

#[test]
fn test_name_prefix_matches_png_and_pdf() {
    let fx = fixture();
    seed(
        &fx.db,
        "u1",
        &[
            ("f1", "payload.png", "2024-01-01T00:00:00.000Z"),
            ("f2", "payload.pdf", "2024-01-02T00:00:00.000Z"),
            ("f3", "payload.jpg", "2024-01-03T00:00:00.000Z"),
        ],
    );

    let req = ListFilesRequest {
        name_begins_with: Some("payload.p".to_string()),
        ..Default::default()
    };
    let page = fx.files.list("u1", &req, None).unwrap();
    assert_eq!(page.file_ids, vec!["f2", "f1"]);
}

#[test]
fn test_time_range_is_inclusive_on_both_ends() {
    let fx = fixture();
    seed(
        &fx.db,
        "u1",
        &[
            ("f1", "a.png", "2024-01-01T00:00:00.000Z"),
            ("f2", "b.png", "2024-01-02T00:00:00.000Z"),
            ("f3", "c.png", "2024-01-03T00:00:00.000Z"),
            ("f4", "d.png", "2024-01-04T00:00:00.000Z"),
        ],
    );

    let req = ListFilesRequest {
        created_after: Some("2024-01-02T00:00:00Z".to_string()),
        created_before: Some("2024-01-03T00:00:00+00:00".to_string()),
        ..Default::default()
    };
    let page = fx.files.list("u1", &req, None).unwrap();
    assert_eq!(page.file_ids, vec!["f2", "f3"]);
}

#[test]
fn test_prefix_wins_over_time_range() {
    let fx = fixture();
    seed(
        &fx.db,
        "u1",
        &[
            ("old", "report-2020.pdf", "2020-01-01T00:00:00.000Z"),
            ("new", "report-2024.pdf", "2024-01-01T00:00:00.000Z"),
        ],
    );

    let req = ListFilesRequest {
        name_begins_with: Some("report".to_string()),
        created_after: Some("2023-01-01T00:00:00Z".to_string()),
        ..Default::default()
    };
    let page = fx.files.list("u1", &req, None).unwrap();
    assert_eq!(page.file_ids, vec!["old", "new"]);
}

#[test]
fn test_token_carries_full_record_key() {
    let fx = fixture();
    seed(
        &fx.db,
        "u1",
        &[
            ("f1", "a.png", "2024-01-01T00:00:00.000Z"),
            ("f2", "b.png", "2024-01-02T00:00:00.000Z"),
        ],
    );

    let page = fx.files.list("u1", &request(1), None).unwrap();
    let key = token::decode(&page.next_token.unwrap()).unwrap();
    assert_eq!(key.len(), 4);
    assert_eq!(key[&Attribute::FileId], "f1");
    assert_eq!(key[&Attribute::FileName], "a.png");
}

#[test]
fn test_token_from_one_strategy_resumes_another() {
    let fx = fixture();
    seed(
        &fx.db,
        "u1",
        &[
            ("f1", "a.png", "2024-01-01T00:00:00.000Z"),
            ("f2", "b.png", "2024-01-02T00:00:00.000Z"),
            ("f3", "c.png", "2024-01-03T00:00:00.000Z"),
        ],
    );

    let by_name = ListFilesRequest {
        name_begins_with: Some("a".to_string()),
        ..request(1)
    };
    // Issued by the owner-only listing, replayed against the time and name indexes.
    let first = fx.files.list("u1", &request(1), None).unwrap();
    assert_eq!(first.file_ids, vec!["f1"]);
    let next_token = first.next_token.unwrap();

    let by_time = ListFilesRequest {
        created_after: Some("2024-01-01T00:00:00Z".to_string()),
        ..request(5)
    };
    let resumed = fx.files.list("u1", &by_time, Some(&next_token)).unwrap();
    assert_eq!(resumed.file_ids, vec!["f2", "f3"]);

    let resumed = fx.files.list("u1", &by_name, Some(&next_token)).unwrap();
    assert!(resumed.file_ids.is_empty());
}

#[test]
fn test_garbage_token_is_a_validation_failure() {
    let fx = fixture();
    let err = fx
        .files
        .list("u1", &request(1), Some("definitely not a token"))
        .unwrap_err();
    assert!(matches!(err, FileError::Validation(_)));
    assert_eq!(err.status(), 400);
}
