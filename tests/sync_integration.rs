//! Integration tests for the sync drivers against a mocked Graph API.
//!
//! Covers pagination termination, second-run idempotence, the HD
//! upgrade policy, rate-limit waits, refusal handling, and download
//! atomicity.

use std::path::Path;
use std::time::{Duration, Instant};

use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use facebook_downloader::api::{GraphApi, ProxyPool};
use facebook_downloader::config::{
    AccountConfig, Config, OptionsConfig, ProxyConfig, StoreConfig, TargetsConfig,
};
use facebook_downloader::download::uploads::sync_uploads;
use facebook_downloader::download::wall::sync_wall;
use facebook_downloader::download::{sync_media_item, SyncState};
use facebook_downloader::error::Error;
use facebook_downloader::media::{MediaKind, MediaRef};
use facebook_downloader::store::MediaStore;

const TARGET: &str = "137258589622";

fn test_config(api_base: &str, download_dir: &Path) -> Config {
    Config {
        targets: TargetsConfig {
            ids: vec![TARGET.to_string()],
        },
        account: AccountConfig {
            access_token: "EAATESTTOKEN1234567890abcdefghij".to_string(),
            api_base: api_base.to_string(),
            ..AccountConfig::default()
        },
        options: OptionsConfig {
            download_directory: Some(download_dir.to_path_buf()),
            min_request_delay_ms: 0,
            target_delay_seconds: 0,
            max_retries: 5,
            page_size: 25,
            ..OptionsConfig::default()
        },
        proxy: ProxyConfig::default(),
        store: StoreConfig::default(),
    }
}

fn test_api(config: &Config) -> GraphApi {
    GraphApi::new(
        &config.account,
        Duration::from_millis(config.options.min_request_delay_ms),
        config.options.max_retries,
        ProxyPool::new(Vec::new(), &config.account.user_agent),
    )
    .unwrap()
}

fn photo_json(id: &str, source: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "created_time": "2024-03-01T12:00:00+0000",
        "source": source,
        "name": "Test photo"
    })
}

async fn mount_media(server: &MockServer, url_path: &str, content_type: &str) {
    Mock::given(method("GET"))
        .and(path(url_path))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(b"fakemediabytes".to_vec(), content_type),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_uploads_walks_all_pages_and_second_run_skips() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&server.uri(), dir.path());
    config.options.prefer_hd = false;

    let page1 = serde_json::json!({
        "data": [
            photo_json("101", &format!("{}/media/101.jpg", server.uri())),
            photo_json("102", &format!("{}/media/102.jpg", server.uri())),
        ],
        "paging": {
            "cursors": {"before": "B1", "after": "CAAR"},
            "next": format!("{}/v19.0/{}/photos?after=CAAR&limit=25", server.uri(), TARGET)
        }
    });
    // The final window still carries a cursors block; only the missing
    // next link marks the end of the collection.
    let page2 = serde_json::json!({
        "data": [photo_json("103", &format!("{}/media/103.jpg", server.uri()))],
        "paging": {"cursors": {"before": "B2", "after": "CAAS"}}
    });

    Mock::given(method("GET"))
        .and(path(format!("/v19.0/{}/photos", TARGET)))
        .and(query_param("type", "uploaded"))
        .and(query_param_is_missing("after"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&page1))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/v19.0/{}/photos", TARGET)))
        .and(query_param("type", "uploaded"))
        .and(query_param("after", "CAAR"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(
                    "x-app-usage",
                    r#"{"call_count":12,"total_cputime":3,"total_time":5}"#,
                )
                .set_body_json(&page2),
        )
        .mount(&server)
        .await;

    for id in ["101", "102", "103"] {
        mount_media(&server, &format!("/media/{}.jpg", id), "image/jpeg").await;
    }

    let store = MediaStore::open_in_memory().unwrap();
    let owner = store.get_or_create_owner(TARGET, None).unwrap();
    let api = test_api(&config);
    let cancel = CancellationToken::new();

    let mut state = SyncState::new(TARGET.to_string(), owner.id);
    let report = sync_uploads(&api, &config, &store, &mut state, &cancel)
        .await
        .unwrap();

    assert_eq!(report.saved, 3);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.errors, 0);
    assert_eq!(store.media_count(owner.id).unwrap(), 3);

    // The usage header on page 2 reached the tracker.
    assert_eq!(api.usage().max_usage_percent(), 12);

    // A completed walk leaves no resume point behind.
    assert!(store.load_cursor(owner.id, "uploads").unwrap().is_none());

    let photos_dir = dir.path().join(TARGET).join("Photos");
    assert!(photos_dir.join("2024-03-01T12-00-00_101.jpg").exists());
    assert_eq!(std::fs::read_dir(&photos_dir).unwrap().count(), 3);

    // Second run over identical pages downloads nothing new.
    let mut state = SyncState::new(TARGET.to_string(), owner.id);
    let report = sync_uploads(&api, &config, &store, &mut state, &cancel)
        .await
        .unwrap();

    assert_eq!(report.saved, 0);
    assert_eq!(report.skipped, 3);
    assert_eq!(store.media_count(owner.id).unwrap(), 3);
    assert_eq!(std::fs::read_dir(&photos_dir).unwrap().count(), 3);
}

#[tokio::test]
async fn test_wall_follows_next_links_and_flattens_albums() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&server.uri(), dir.path());
    config.options.prefer_hd = false;

    let feed_page1 = serde_json::json!({
        "data": [{
            "id": format!("{}_5001", TARGET),
            "created_time": "2024-04-02T09:30:00+0000",
            "attachments": {"data": [
                {
                    "type": "photo",
                    "target": {"id": "301"},
                    "media": {"image": {
                        "src": format!("{}/media/301.jpg", server.uri()),
                        "width": 720,
                        "height": 480
                    }}
                },
                {
                    "type": "album",
                    "target": {"id": "9999"},
                    "title": "Trip",
                    "subattachments": {"data": [
                        {
                            "type": "photo",
                            "target": {"id": "302"},
                            "media": {"image": {"src": format!("{}/media/302.jpg", server.uri())}}
                        },
                        {
                            "type": "video_inline",
                            "target": {"id": "303"},
                            "media": {"source": format!("{}/media/303.mp4", server.uri())}
                        }
                    ]}
                }
            ]}
        }],
        "paging": {
            "cursors": {"before": "B", "after": "NEXT1"},
            "next": format!(
                "{}/v19.0/{}/feed?access_token=SECRET&limit=25&after=NEXT1",
                server.uri(),
                TARGET
            )
        }
    });

    let feed_page2 = serde_json::json!({
        "data": [{
            "id": format!("{}_5002", TARGET),
            "created_time": "2024-04-03T10:00:00+0000",
            "attachments": {"data": [
                {
                    "type": "video_autoplay",
                    "target": {"id": "304"},
                    "media": {"source": format!("{}/media/304.mp4", server.uri())}
                }
            ]}
        }]
    });

    Mock::given(method("GET"))
        .and(path(format!("/v19.0/{}/feed", TARGET)))
        .and(query_param_is_missing("after"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&feed_page1))
        .mount(&server)
        .await;

    // The next link is followed literally, token and all.
    Mock::given(method("GET"))
        .and(path(format!("/v19.0/{}/feed", TARGET)))
        .and(query_param("after", "NEXT1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&feed_page2))
        .mount(&server)
        .await;

    mount_media(&server, "/media/301.jpg", "image/jpeg").await;
    mount_media(&server, "/media/302.jpg", "image/jpeg").await;
    mount_media(&server, "/media/303.mp4", "video/mp4").await;
    mount_media(&server, "/media/304.mp4", "video/mp4").await;

    let store = MediaStore::open_in_memory().unwrap();
    let owner = store.get_or_create_owner(TARGET, None).unwrap();
    let api = test_api(&config);
    let cancel = CancellationToken::new();

    let mut state = SyncState::new(TARGET.to_string(), owner.id);
    let report = sync_wall(&api, &config, &store, &mut state, &cancel)
        .await
        .unwrap();

    assert_eq!(report.saved_photos, 2);
    assert_eq!(report.saved_videos, 2);
    assert_eq!(report.errors, 0);
    assert_eq!(store.media_count(owner.id).unwrap(), 4);
    assert!(store.load_cursor(owner.id, "wall").unwrap().is_none());

    let photos_dir = dir.path().join(TARGET).join("Photos");
    let videos_dir = dir.path().join(TARGET).join("Videos");
    assert!(photos_dir.join("2024-04-02T09-30-00_301.jpg").exists());
    assert!(videos_dir.join("2024-04-03T10-00-00_304.mp4").exists());
    assert_eq!(std::fs::read_dir(&photos_dir).unwrap().count(), 2);
    assert_eq!(std::fs::read_dir(&videos_dir).unwrap().count(), 2);
}

#[tokio::test]
async fn test_failed_hd_upgrade_keeps_standard_record() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server.uri(), dir.path());

    let store = MediaStore::open_in_memory().unwrap();
    let owner = store.get_or_create_owner(TARGET, None).unwrap();
    store
        .record_saved(owner.id, "201", false, Path::new("/downloads/old/201.jpg"))
        .unwrap();

    let page = serde_json::json!({
        "data": [photo_json("201", &format!("{}/media/201.jpg", server.uri()))],
        "paging": {"cursors": {"before": "B", "after": "A"}}
    });

    Mock::given(method("GET"))
        .and(path(format!("/v19.0/{}/photos", TARGET)))
        .respond_with(ResponseTemplate::new(200).set_body_json(&page))
        .mount(&server)
        .await;

    // The rendition lookup is refused outright. No media mock is
    // mounted: a download attempt would surface as an error below.
    Mock::given(method("GET"))
        .and(path("/v19.0/201"))
        .respond_with(ResponseTemplate::new(400).set_body_string(
            r#"{"error":{"message":"Unsupported get request","type":"GraphMethodException","code":100}}"#,
        ))
        .mount(&server)
        .await;

    let api = test_api(&config);
    let cancel = CancellationToken::new();
    let mut state = SyncState::new(TARGET.to_string(), owner.id);
    let report = sync_uploads(&api, &config, &store, &mut state, &cancel)
        .await
        .unwrap();

    assert_eq!(report.saved, 0);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.errors, 0);

    // The standard record survives untouched and nothing hit the disk.
    let record = store.get_media(owner.id, "201").unwrap().unwrap();
    assert!(!record.is_hd);
    assert_eq!(record.file_path, "/downloads/old/201.jpg");
    assert!(!dir.path().join(TARGET).exists());
}

#[tokio::test]
async fn test_rate_limited_requests_wait_and_recover() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&server.uri(), dir.path());
    config.options.prefer_hd = false;

    let page = serde_json::json!({
        "data": [photo_json("401", &format!("{}/media/401.jpg", server.uri()))],
        "paging": {"cursors": {"before": "B", "after": "A"}}
    });

    Mock::given(method("GET"))
        .and(path(format!("/v19.0/{}/photos", TARGET)))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "1"))
        .up_to_n_times(3)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/v19.0/{}/photos", TARGET)))
        .respond_with(ResponseTemplate::new(200).set_body_json(&page))
        .mount(&server)
        .await;

    mount_media(&server, "/media/401.jpg", "image/jpeg").await;

    let store = MediaStore::open_in_memory().unwrap();
    let owner = store.get_or_create_owner(TARGET, None).unwrap();
    let api = test_api(&config);
    let cancel = CancellationToken::new();
    let mut state = SyncState::new(TARGET.to_string(), owner.id);

    let start = Instant::now();
    let report = sync_uploads(&api, &config, &store, &mut state, &cancel)
        .await
        .unwrap();

    // Three Retry-After: 1 hints, each waited out before the retry.
    assert!(start.elapsed() >= Duration::from_secs(3));
    assert_eq!(report.saved, 1);
    assert_eq!(report.errors, 0);
}

#[tokio::test]
async fn test_refusal_on_ok_status_preserves_resume_cursor() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server.uri(), dir.path());

    let store = MediaStore::open_in_memory().unwrap();
    let owner = store.get_or_create_owner(TARGET, None).unwrap();
    store.save_cursor(owner.id, "uploads", "CAAR", 1).unwrap();

    // Some refusals arrive as an error envelope under HTTP 200. Lacking
    // a next link, such a body must not read as the end of the walk.
    Mock::given(method("GET"))
        .and(path(format!("/v19.0/{}/photos", TARGET)))
        .and(query_param("after", "CAAR"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"error":{"message":"Error validating access token","type":"OAuthException","code":190}}"#,
        ))
        .mount(&server)
        .await;

    let api = test_api(&config);
    let cancel = CancellationToken::new();
    let mut state = SyncState::new(TARGET.to_string(), owner.id);

    let result = sync_uploads(&api, &config, &store, &mut state, &cancel).await;
    assert!(matches!(result, Err(Error::Graph { code: 190, .. })));

    // The walk failed, so the resume point survives for the next run.
    let position = store.load_cursor(owner.id, "uploads").unwrap().unwrap();
    assert_eq!(position.cursor, "CAAR");
    assert_eq!(position.pages_loaded, 1);
}

/// Serve valid headers and a partial body, then drop the connection.
async fn spawn_truncating_server() -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let mut buf = [0u8; 2048];
            let _ = socket.read(&mut buf).await;

            let header =
                "HTTP/1.1 200 OK\r\ncontent-type: image/jpeg\r\ncontent-length: 1000000\r\n\r\n";
            let _ = socket.write_all(header.as_bytes()).await;
            let _ = socket.write_all(&[0u8; 4096]).await;
            let _ = socket.flush().await;
            // Dropping the socket cuts the body short of content-length.
        }
    });

    format!("http://{}/media/cut.jpg", addr)
}

#[tokio::test]
async fn test_interrupted_download_leaves_no_partial_file() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config("http://127.0.0.1:9", dir.path());
    config.options.prefer_hd = false;

    let url = spawn_truncating_server().await;

    let store = MediaStore::open_in_memory().unwrap();
    let owner = store.get_or_create_owner(TARGET, None).unwrap();
    let api = test_api(&config);
    let mut state = SyncState::new(TARGET.to_string(), owner.id);

    let item = MediaRef {
        media_id: "501".to_string(),
        kind: MediaKind::Photo,
        url,
        created_time: None,
    };

    let result = sync_media_item(&api, &config, &store, &mut state, &item).await;
    assert!(result.is_err());

    // Neither the final file nor the temp file survives.
    let photos_dir = dir.path().join(TARGET).join("Photos");
    let leftovers: Vec<_> = std::fs::read_dir(&photos_dir)
        .map(|entries| entries.filter_map(|e| e.ok()).collect())
        .unwrap_or_default();
    assert!(leftovers.is_empty(), "leftover files: {:?}", leftovers);

    // And the store never heard about the item.
    assert!(store.get_media(owner.id, "501").unwrap().is_none());
}
