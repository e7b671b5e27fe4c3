//! R2 backend against a mocked S3 endpoint.

use std::net::TcpListener;
use std::time::Duration;

use bytes::Bytes;
use httpmock::Method::{DELETE, HEAD, PUT};
use httpmock::MockServer;
use inkpress_shared::R2Config;
use inkpress_storage::{FileStore, FileUpload, R2FileStore, StorageError, StorageProvider};

const BUCKET: &str = "pages";
const PUBLIC_URL: &str = "https://cdn.example.com";

fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

fn store_for(endpoint: &str) -> R2FileStore {
    let config = R2Config {
        account_id: "acct".into(),
        access_key: "access".into(),
        secret_key: "secret".into(),
        bucket: BUCKET.into(),
        public_url: PUBLIC_URL.into(),
        endpoint: Some(endpoint.to_string()),
    };
    R2FileStore::new(&config, Duration::from_secs(5)).expect("r2 store")
}

fn webp(size: usize) -> FileUpload {
    FileUpload::new(
        Bytes::from(vec![7u8; size]),
        Some("image/webp".into()),
        Some("001.webp".into()),
    )
}

#[tokio::test]
async fn store_puts_object_under_subdirectory() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start_async().await;
    let put = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path_contains(format!("/{BUCKET}/webtoons/w1/chapters/c2/"));
            then.status(200).header("ETag", "\"5d41402abc4b2a76b9719d911017c592\"");
        })
        .await;

    let store = store_for(&server.base_url());
    let url = store.store_page(&webp(128), "w1", "c2").await.expect("store");

    assert!(
        url.starts_with(&format!("{PUBLIC_URL}/webtoons/w1/chapters/c2/")),
        "{url}"
    );
    assert!(url.ends_with(".webp"));
    put.assert_hits_async(1).await;
}

#[tokio::test]
async fn stored_object_reports_size_and_deletes_once() {
    if !can_bind_localhost() {
        return;
    }

    let server = MockServer::start_async().await;
    let object_prefix = format!("/{BUCKET}/avatars/u1/");
    server
        .mock_async(|when, then| {
            when.method(PUT).path_contains(object_prefix.clone());
            then.status(200).header("ETag", "\"9a0364b9e99bb480dd25e1f0284c8555\"");
        })
        .await;
    let present = server
        .mock_async(|when, then| {
            when.method(HEAD).path_contains(object_prefix.clone());
            then.status(200)
                .header("content-length", "128")
                .header("content-type", "image/webp");
        })
        .await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE).path_contains(object_prefix.clone());
            then.status(204);
        })
        .await;

    let store = store_for(&server.base_url());
    let url = store.store_avatar(&webp(128), "u1").await.expect("store");

    assert!(store.exists(&url).await);
    assert_eq!(store.size(&url).await, 128);

    assert!(store.delete(&url).await);
    delete.assert_hits_async(1).await;

    present.delete_async().await;
    server
        .mock_async(|when, then| {
            when.method(HEAD).path_contains(object_prefix.clone());
            then.status(404);
        })
        .await;

    assert!(!store.exists(&url).await);
    assert!(!store.delete(&url).await);
    delete.assert_hits_async(1).await;
}

#[tokio::test]
async fn missing_object_reports_absent() {
    if !can_bind_localhost() {
        return;
    }

    let server = MockServer::start_async().await;
    let head = server
        .mock_async(|when, then| {
            when.method(HEAD).path_contains(format!("/{BUCKET}/avatars/u1/"));
            then.status(404);
        })
        .await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE);
            then.status(204);
        })
        .await;

    let store = store_for(&server.base_url());
    let url = format!("{PUBLIC_URL}/avatars/u1/2024/05/06/gone.png");

    assert!(!store.exists(&url).await);
    assert_eq!(store.size(&url).await, 0);
    assert!(!store.delete(&url).await);

    assert!(head.hits_async().await >= 3);
    delete.assert_hits_async(0).await;
}

#[tokio::test]
async fn validation_rejects_before_any_request() {
    if !can_bind_localhost() {
        return;
    }

    let server = MockServer::start_async().await;
    let any = server
        .mock_async(|when, then| {
            when.any_request();
            then.status(200);
        })
        .await;

    let store = store_for(&server.base_url());

    let err = store
        .store_avatar(&webp(10 * 1024 * 1024 + 1), "u1")
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::FileTooLarge { .. }));

    let pdf = FileUpload::new(
        Bytes::from_static(b"%PDF"),
        Some("application/pdf".into()),
        Some("doc.pdf".into()),
    );
    let err = store.store_avatar(&pdf, "u1").await.unwrap_err();
    assert!(matches!(err, StorageError::InvalidMimeType { .. }));

    any.assert_hits_async(0).await;
}

#[tokio::test]
async fn foreign_urls_never_reach_the_bucket() {
    if !can_bind_localhost() {
        return;
    }

    let server = MockServer::start_async().await;
    let any = server
        .mock_async(|when, then| {
            when.any_request();
            then.status(200);
        })
        .await;

    let store = store_for(&server.base_url());
    for url in [
        "https://elsewhere.example.com/avatars/u1/a.png",
        "https://cdn.example.com/avatars/../../secret.png",
        "https://cdn.example.com/",
    ] {
        assert!(!store.exists(url).await, "{url}");
        assert!(!store.delete(url).await, "{url}");
    }
    any.assert_hits_async(0).await;
}

#[tokio::test]
async fn unreachable_endpoint_is_swallowed_except_on_store() {
    let store = store_for("http://127.0.0.1:1");
    assert_eq!(store.provider(), StorageProvider::R2);

    let url = format!("{PUBLIC_URL}/avatars/u1/2024/05/06/a.png");
    assert!(!store.exists(&url).await);
    assert_eq!(store.size(&url).await, 0);
    assert!(!store.delete(&url).await);

    let err = store.store_avatar(&webp(16), "u1").await.unwrap_err();
    assert!(!err.is_validation());
}
