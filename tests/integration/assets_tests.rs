//! Image download concurrency tests

use article_harvester::assets::AssetDownloader;
use article_harvester::config::UserAgentConfig;
use article_harvester::crawler::build_http_client;
use article_harvester::output::DownloadStatistics;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn slow_image_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"img".to_vec())
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;
    server
}

async fn download(count: usize, max_workers: usize) -> (TempDir, DownloadStatistics) {
    let server = slow_image_server().await;
    let dir = TempDir::new().unwrap();
    let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(10)).unwrap();
    let downloader = AssetDownloader::new(client, dir.path(), max_workers);

    let urls = (0..count)
        .map(|i| format!("{}/NMediaFile/{}.jpg", server.uri(), i))
        .collect::<Vec<_>>();
    let stats = downloader.download_all(urls).await;
    (dir, stats)
}

#[tokio::test]
async fn test_concurrency_limited_by_image_count() {
    let (dir, stats) = download(7, 30).await;

    assert_eq!(stats.concurrency, 7);
    assert!(stats.peak_in_flight <= 7);
    assert_eq!(stats.downloaded, 7);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 7);
}

#[tokio::test]
async fn test_concurrency_limited_by_max_workers() {
    let (_dir, stats) = download(50, 30).await;

    assert_eq!(stats.concurrency, 30);
    assert!(stats.peak_in_flight <= 30);
    assert!(stats.peak_in_flight > 1);
    assert_eq!(stats.downloaded, 50);
    assert_eq!(stats.failed, 0);
}
