//! Crawl phase tests against a mock site

use crate::common::{article_html, create_test_config, index_html, mount_page};
use article_harvester::config::AckMode;
use article_harvester::crawler::{run_crawl, Coordinator, ImageSet};
use article_harvester::queue::{
    Delivery, DeliveryMode, MessageQueue, QueueDepth, QueueError, QueueResult, SqliteQueue,
};
use article_harvester::DocumentRecord;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Broker that accepts declarations but refuses every message
struct RefusingQueue;

impl MessageQueue for RefusingQueue {
    fn declare_queue(&self, _: &str, _: bool) -> QueueResult<()> {
        Ok(())
    }
    fn publish(&self, queue: &str, _: &[u8], _: DeliveryMode) -> QueueResult<()> {
        Err(QueueError::UnknownQueue(queue.to_string()))
    }
    fn receive(&self, _: &str, _: AckMode) -> QueueResult<Option<Delivery>> {
        Ok(None)
    }
    fn ack(&self, tag: u64) -> QueueResult<()> {
        Err(QueueError::UnknownDelivery(tag))
    }
    fn reject(&self, tag: u64, _: bool) -> QueueResult<()> {
        Err(QueueError::UnknownDelivery(tag))
    }
    fn depth(&self, _: &str) -> QueueResult<QueueDepth> {
        Ok(QueueDepth::default())
    }
}

fn not_interrupted() -> Arc<AtomicBool> {
    Arc::new(AtomicBool::new(false))
}

/// Drains every record from the queue file
fn queued_records(db_path: &str, queue: &str) -> Vec<DocumentRecord> {
    let broker = SqliteQueue::open(Path::new(db_path)).expect("queue should open");
    let mut records = Vec::new();
    while let Some(delivery) = broker.receive(queue, AckMode::Auto).unwrap() {
        records.push(DocumentRecord::from_json(&delivery.body).unwrap());
    }
    records
}

#[tokio::test]
async fn test_full_crawl_stays_in_scope() {
    let server = MockServer::start().await;
    let base = server.uri();
    let port = url::Url::parse(&base).unwrap().port().unwrap();
    let out_of_scope = format!("http://localhost:{}/outside", port);
    let page2 = format!("{}/page2", base);

    mount_page(
        &server,
        "/",
        index_html(&["/page1", &page2, &out_of_scope, "mailto:editor@example.com"]),
        1,
    )
    .await;
    // page1 and page2 link to each other and back to the index
    mount_page(
        &server,
        "/page1",
        article_html("One", &["/", "/page2"], &["/NMediaFile/one.jpg"]),
        1,
    )
    .await;
    mount_page(&server, "/page2", article_html("Two", &["/page1"], &[]), 1).await;
    mount_page(&server, "/outside", article_html("Outside", &[], &[]), 0).await;
    Mock::given(method("GET"))
        .and(path("/NMediaFile/one.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpeg".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&base, dir.path());

    let report = run_crawl(&config, not_interrupted()).await.unwrap();

    assert_eq!(report.crawl.pages_visited, 2);
    assert_eq!(report.crawl.records_published, 2);
    assert!(!report.crawl.interrupted);
    assert_eq!(report.crawl.images_collected, 1);
    assert_eq!(report.downloads.downloaded, 1);
    assert_eq!(report.downloads.concurrency, 1);

    let saved = std::fs::read(dir.path().join("images").join("_NMediaFile_one.jpg")).unwrap();
    assert_eq!(saved, b"jpeg");

    let records = queued_records(&config.queue.database_path, &config.queue.name);
    let links: BTreeSet<String> = records.iter().map(|r| r.link.clone()).collect();
    assert_eq!(
        links,
        BTreeSet::from([format!("{}/page1", base), format!("{}/page2", base)])
    );

    let one = records.iter().find(|r| r.title == "One").unwrap();
    assert_eq!(one.metadata.date, "2021年06月01日08:21");
    assert_eq!(one.metadata.source, "来源：人民网");
    assert_eq!(one.images, vec!["/NMediaFile/one.jpg"]);
}

#[tokio::test]
async fn test_failed_pages_are_skipped() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", index_html(&["/missing", "/bare", "/page1"]), 1).await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    // Not an article: no record, and its links are not followed
    mount_page(&server, "/bare", index_html(&["/hidden"]), 1).await;
    mount_page(&server, "/hidden", article_html("Hidden", &[], &[]), 0).await;
    mount_page(&server, "/page1", article_html("One", &["/missing"], &[]), 1).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&base, dir.path());

    let report = run_crawl(&config, not_interrupted()).await.unwrap();

    assert_eq!(report.crawl.pages_visited, 3);
    assert_eq!(report.crawl.records_published, 1);
    assert_eq!(report.crawl.fetch_failures, 1);
    assert_eq!(report.crawl.parse_failures, 1);

    let records = queued_records(&config.queue.database_path, &config.queue.name);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].link, format!("{}/page1", base));
}

#[tokio::test]
async fn test_unreachable_entry_page_ends_crawl() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());

    let report = run_crawl(&config, not_interrupted()).await.unwrap();

    assert_eq!(report.crawl.pages_visited, 0);
    assert_eq!(report.downloads.requested, 0);
    assert!(dir.path().join("images").is_dir());
}

#[tokio::test]
async fn test_interrupt_stops_before_next_page() {
    let server = MockServer::start().await;
    mount_page(&server, "/", index_html(&["/page1"]), 1).await;
    mount_page(&server, "/page1", article_html("One", &[], &[]), 0).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());

    let report = run_crawl(&config, Arc::new(AtomicBool::new(true)))
        .await
        .unwrap();

    assert!(report.crawl.interrupted);
    assert_eq!(report.crawl.pages_visited, 0);
    assert_eq!(report.crawl.links_queued, 1);
}

#[tokio::test]
async fn test_uncreatable_image_dir_is_fatal() {
    let server = MockServer::start().await;
    mount_page(&server, "/", index_html(&[]), 0).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server.uri(), dir.path());

    // A regular file where the directory should go
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "").unwrap();
    config.assets.image_dir = blocker.join("images").display().to_string();

    assert!(run_crawl(&config, not_interrupted()).await.is_err());
}

#[tokio::test]
async fn test_publish_failures_do_not_stop_crawl() {
    let server = MockServer::start().await;
    mount_page(&server, "/", index_html(&["/page1"]), 1).await;
    mount_page(&server, "/page1", article_html("One", &["/page2"], &[]), 1).await;
    mount_page(&server, "/page2", article_html("Two", &["/page3"], &[]), 1).await;
    mount_page(&server, "/page3", article_html("Three", &[], &[]), 1).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());

    let mut coordinator =
        Coordinator::new(&config, Arc::new(RefusingQueue), ImageSet::new()).unwrap();
    let stats = coordinator.run(&AtomicBool::new(false)).await;

    assert_eq!(stats.pages_visited, 3);
    assert_eq!(stats.publish_failures, 3);
    assert_eq!(stats.records_published, 0);
    assert_eq!(stats.links_queued, 3);
    assert!(!stats.interrupted);
}
