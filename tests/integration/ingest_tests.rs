//! Ingest phase tests: queue file in, record files and documents out

use crate::common::{article_html, create_test_config, index_html, mount_page};
use article_harvester::config::{AckMode, DocumentStoreConfig, SinkKind};
use article_harvester::crawler::run_crawl;
use article_harvester::ingest::{run_ingest, IngestWorker, Poll};
use article_harvester::queue::{open_consumer_queue, open_queue, Publisher, QueueDepth};
use article_harvester::record::{DocumentRecord, Metadata};
use article_harvester::storage::{DocumentStore, Sink, SqliteDocumentStore};
use article_harvester::url::record_filename;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::MockServer;

fn record(i: usize) -> DocumentRecord {
    DocumentRecord {
        link: format!("http://society.people.com.cn/n1/2021/0601/c1008-{}.html", i),
        title: format!("标题 {}", i),
        metadata: Metadata {
            date: "2021年06月01日08:21".to_string(),
            source: "来源：人民网".to_string(),
        },
        content: "正文".to_string(),
        images: vec![],
    }
}

/// Sets the flag after `delay`
fn interrupt_after(delay: Duration) -> Arc<AtomicBool> {
    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        flag.store(true, Ordering::SeqCst);
    });
    interrupted
}

fn read_record(path: &Path) -> DocumentRecord {
    DocumentRecord::from_json(&std::fs::read(path).unwrap()).unwrap()
}

#[tokio::test]
async fn test_ingest_writes_record_files() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config("http://127.0.0.1:1", dir.path());

    let publisher = Publisher::new(open_queue(&config.queue).unwrap(), &config.queue.name).unwrap();
    for i in 0..5 {
        publisher.publish(&record(i)).unwrap();
    }

    let stats = run_ingest(&config, interrupt_after(Duration::from_millis(300)))
        .await
        .unwrap();

    assert_eq!(stats.received, 5);
    // Two full batches plus the final drain of the fifth record
    assert_eq!(stats.files_written, 5);

    let records_dir = Path::new(&config.ingest.output_dir);
    for i in 0..5 {
        let path = records_dir.join(record_filename(&record(i).link));
        assert_eq!(read_record(&path), record(i));
    }
}

#[tokio::test]
async fn test_ingest_both_sinks_after_flush() {
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config("http://127.0.0.1:1", dir.path());
    config.ingest.sink = SinkKind::Both;
    config.ingest.ack_mode = AckMode::AfterFlush;
    config.document_store = Some(DocumentStoreConfig {
        database_path: dir.path().join("docs.db").display().to_string(),
        collection: "peoplecomcn".to_string(),
    });

    let queue = open_queue(&config.queue).unwrap();
    let publisher = Publisher::new(Arc::clone(&queue), &config.queue.name).unwrap();
    for i in 0..3 {
        publisher.publish(&record(i)).unwrap();
    }

    let stats = run_ingest(&config, interrupt_after(Duration::from_millis(300)))
        .await
        .unwrap();

    assert_eq!(stats.documents_stored, 3);
    assert_eq!(stats.files_written, 3);
    assert_eq!(stats.acked, 3);
    assert_eq!(queue.depth(&config.queue.name).unwrap().total(), 0);

    let store = SqliteDocumentStore::open(&dir.path().join("docs.db"), "peoplecomcn").unwrap();
    assert_eq!(store.count().unwrap(), 3);
    assert_eq!(store.find_by_link(&record(1).link).unwrap().len(), 1);
}

/// Config with both sinks, after-flush acking and a document store in `dir`
fn both_sinks_config(dir: &Path) -> article_harvester::Config {
    let mut config = create_test_config("http://127.0.0.1:1", dir);
    config.ingest.sink = SinkKind::Both;
    config.ingest.ack_mode = AckMode::AfterFlush;
    config.ingest.threshold = 10;
    config.document_store = Some(DocumentStoreConfig {
        database_path: dir.join("docs.db").display().to_string(),
        collection: "peoplecomcn".to_string(),
    });
    config
}

#[test]
fn test_publisher_open_does_not_redeliver_held_records() {
    let dir = TempDir::new().unwrap();
    let config = both_sinks_config(dir.path());

    let worker_queue = open_consumer_queue(&config.queue).unwrap();
    let publisher = Publisher::new(Arc::clone(&worker_queue), &config.queue.name).unwrap();
    for i in 0..3 {
        publisher.publish(&record(i)).unwrap();
    }

    let mut worker = IngestWorker::new(
        worker_queue,
        &config.queue.name,
        config.ingest.ack_mode,
        Duration::from_millis(10),
        Sink::from_config(&config).unwrap(),
    )
    .unwrap();
    for _ in 0..3 {
        assert_eq!(worker.poll_once().unwrap(), Poll::Delivered);
    }

    // A crawler starting up against the same broker file
    let crawler_queue = open_queue(&config.queue).unwrap();
    assert_eq!(
        crawler_queue.depth(&config.queue.name).unwrap(),
        QueueDepth { ready: 0, unacked: 3 }
    );

    for _ in 0..3 {
        assert_eq!(worker.poll_once().unwrap(), Poll::Idle);
    }
    let stats = worker.finish();

    assert_eq!(stats.received, 3);
    assert_eq!(stats.acked, 3);
    let store = SqliteDocumentStore::open(&dir.path().join("docs.db"), "peoplecomcn").unwrap();
    assert_eq!(store.count().unwrap(), 3);
    assert_eq!(crawler_queue.depth(&config.queue.name).unwrap().total(), 0);
}

#[test]
fn test_consumer_restart_recovers_held_records() {
    let dir = TempDir::new().unwrap();
    let config = both_sinks_config(dir.path());

    {
        let queue = open_consumer_queue(&config.queue).unwrap();
        let publisher = Publisher::new(Arc::clone(&queue), &config.queue.name).unwrap();
        publisher.publish(&record(1)).unwrap();
        // Taken but never acked, as if the worker died mid-batch
        queue
            .receive(&config.queue.name, AckMode::AfterFlush)
            .unwrap()
            .unwrap();
    }

    let queue = open_consumer_queue(&config.queue).unwrap();
    let delivery = queue
        .receive(&config.queue.name, AckMode::AfterFlush)
        .unwrap()
        .unwrap();
    assert!(delivery.redelivered);
    assert_eq!(DocumentRecord::from_json(&delivery.body).unwrap(), record(1));
}

#[tokio::test]
async fn test_crawl_then_ingest_pipeline() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(&server, "/", index_html(&["/a", "/b"]), 1).await;
    mount_page(&server, "/a", article_html("A", &[], &[]), 1).await;
    mount_page(&server, "/b", article_html("B", &[], &[]), 1).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&base, dir.path());

    let report = run_crawl(&config, Arc::new(AtomicBool::new(false)))
        .await
        .unwrap();
    assert_eq!(report.crawl.records_published, 2);

    let stats = run_ingest(&config, interrupt_after(Duration::from_millis(300)))
        .await
        .unwrap();
    assert_eq!(stats.files_written, 2);

    let records_dir = Path::new(&config.ingest.output_dir);
    for route in ["/a", "/b"] {
        let link = format!("{}{}", base, route);
        assert_eq!(read_record(&records_dir.join(record_filename(&link))).link, link);
    }
}
