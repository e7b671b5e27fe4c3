//! End-to-end behaviour of the local filesystem backend through the
//! selected `StorageService`.

use bytes::Bytes;
use chrono::Utc;
use inkpress_shared::{LocalStorageConfig, StorageConfig};
use inkpress_storage::{FileStore, FileUpload, StorageError, StorageProvider, StorageService};
use tempfile::TempDir;
use uuid::Uuid;

const BASE_URL: &str = "http://localhost:8081";

fn local_service(provider: &str) -> (TempDir, StorageService) {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = StorageConfig {
        provider: provider.to_string(),
        local: LocalStorageConfig {
            root: dir.path().to_path_buf(),
            base_url: BASE_URL.to_string(),
            ..LocalStorageConfig::default()
        },
        ..StorageConfig::default()
    };
    let service = StorageService::from_config(&config).expect("local storage");
    (dir, service)
}

fn image(size: usize, content_type: &str, filename: &str) -> FileUpload {
    FileUpload::new(
        Bytes::from(vec![0x5A; size]),
        Some(content_type.to_string()),
        Some(filename.to_string()),
    )
}

#[tokio::test]
async fn avatar_scenario_store_then_delete() {
    let (_dir, storage) = local_service("local");
    let avatar = image(2 * 1000 * 1000, "image/jpeg", "me.jpg");

    let url = storage.store_avatar(&avatar, "u1").await.expect("store avatar");

    let date = Utc::now().format("%Y/%m/%d").to_string();
    let prefix = format!("{BASE_URL}/files/{date}/avatars/u1/");
    let name = url
        .strip_prefix(&prefix)
        .and_then(|rest| rest.strip_suffix(".jpg"))
        .unwrap_or_else(|| panic!("unexpected url {url}"));
    assert!(Uuid::parse_str(name).is_ok(), "name should be a uuid: {name}");

    assert!(storage.exists(&url).await);
    assert_eq!(storage.size(&url).await, 2_000_000);

    assert!(storage.delete(&url).await);
    assert!(!storage.exists(&url).await);
    assert_eq!(storage.size(&url).await, 0);
}

#[tokio::test]
async fn delete_twice_returns_true_then_false() {
    let (_dir, storage) = local_service("local");
    let url = storage
        .store(&image(10, "image/png", "a.png"), "misc")
        .await
        .expect("store");

    assert!(storage.delete(&url).await);
    assert!(!storage.delete(&url).await);
}

#[tokio::test]
async fn size_round_trips_for_each_role() {
    let (dir, storage) = local_service("local");

    let cover = image(1234, "image/webp", "cover.webp");
    let url = storage.store_cover(&cover, "w1").await.expect("cover");
    assert!(url.contains("/webtoons/w1/covers/"));
    assert!(url.ends_with(".webp"));
    assert_eq!(storage.size(&url).await, 1234);

    let page = image(777, "image/png", "001.png");
    let url = storage.store_page(&page, "w1", "c7").await.expect("page");
    assert!(url.contains("/webtoons/w1/chapters/c7/"));
    assert_eq!(storage.size(&url).await, 777);

    let key = url
        .strip_prefix(&format!("{BASE_URL}/files/"))
        .expect("prefix");
    assert!(dir.path().join(key).is_file());
}

#[tokio::test]
async fn rejects_oversized_and_disallowed_uploads() {
    let (dir, storage) = local_service("local");

    let too_big = image(10 * 1024 * 1024 + 1, "image/png", "big.png");
    let err = storage.store_avatar(&too_big, "u1").await.unwrap_err();
    assert!(matches!(err, StorageError::FileTooLarge { .. }));
    assert!(err.is_validation());

    let at_limit = image(10 * 1024 * 1024, "image/png", "edge.png");
    assert!(storage.store_avatar(&at_limit, "u1").await.is_ok());

    let html = image(10, "text/html", "x.html");
    let err = storage.store_avatar(&html, "u2").await.unwrap_err();
    assert!(matches!(err, StorageError::InvalidMimeType { .. }));

    let empty = image(0, "image/png", "empty.png");
    let err = storage.store_avatar(&empty, "u3").await.unwrap_err();
    assert!(matches!(err, StorageError::EmptyFile));

    let date = Utc::now().format("%Y/%m/%d").to_string();
    for user in ["u2", "u3"] {
        assert!(!dir.path().join(&date).join("avatars").join(user).exists());
    }
}

#[tokio::test]
async fn unknown_provider_uses_local_storage() {
    let (_dir, storage) = local_service("azure");
    assert_eq!(storage.provider(), StorageProvider::Local);

    let url = storage
        .store(&image(3, "image/jpeg", "x.jpeg"), "avatars/u9")
        .await
        .expect("store");
    assert!(url.starts_with(&format!("{BASE_URL}/files/")));
    assert!(storage.exists(&url).await);
}

#[tokio::test]
async fn uploads_without_extension_keep_bare_uuid() {
    let (_dir, storage) = local_service("local");
    let upload = FileUpload::new(
        Bytes::from_static(b"\x89PNG"),
        Some("image/png".into()),
        None,
    );

    let url = storage.store(&upload, "avatars/u1").await.expect("store");
    let name = url.rsplit('/').next().expect("file name");
    assert!(Uuid::parse_str(name).is_ok());
}
