mod helpers;

use axum::http::{header, StatusCode};
use fileward::{FileError, HttpFileError, MemoryRecord};
use helpers::fixtures::create_test_png;
use helpers::TestStorage;

#[tokio::test]
async fn test_show_file_streams_inline() {
    let storage = TestStorage::new();
    let manager = storage.manager();
    let png = create_test_png(8, 8);
    storage.put("40", "image", "1_a.png", &png);
    let owner = MemoryRecord::stored("post", "40", [("image", "1_a.png")]);

    let response = manager.show_file(&owner, None, None).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    assert_eq!(
        response.headers()[header::CONTENT_LENGTH],
        png.len().to_string().as_str()
    );
    assert!(response.headers().get(header::CONTENT_DISPOSITION).is_none());

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(body.as_ref(), png.as_slice());
}

#[tokio::test]
async fn test_send_file_is_attachment() {
    let storage = TestStorage::new();
    let manager = storage.manager();
    storage.put("41", "image", "2_report.pdf", b"%PDF-1.4");
    let owner = MemoryRecord::stored("post", "41", [("image", "1_a.png")]);

    let response = manager
        .send_file(&owner, None, Some("2_report.pdf"))
        .await
        .unwrap();

    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"2_report.pdf\""
    );
}

#[tokio::test]
async fn test_missing_file_is_not_found() {
    let storage = TestStorage::new();
    let manager = storage.manager();
    let owner = MemoryRecord::stored("post", "42", [("image", "1_a.png")]);

    let err = manager.show_file(&owner, None, None).await.unwrap_err();
    assert!(matches!(err, FileError::NotFound(_)));

    let response = axum::response::IntoResponse::into_response(HttpFileError::from(err));
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_directory_is_not_found() {
    let storage = TestStorage::new();
    let manager = storage.manager();
    storage.put("43", "image", "1_a.png", b"x");
    let owner = MemoryRecord::stored("post", "43", [("image", "1_a.png")]);

    let err = manager.send_file(&owner, None, Some("")).await.unwrap_err();
    assert!(matches!(err, FileError::NotFound(_)));
}

#[tokio::test]
async fn test_owner_without_file_is_not_found() {
    let storage = TestStorage::new();
    let manager = storage.manager();
    let owner = MemoryRecord::new("post", "44");

    let err = manager.show_file(&owner, None, None).await.unwrap_err();
    assert!(matches!(err, FileError::NotFound(_)));
}
