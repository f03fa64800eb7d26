use serde::Deserialize;

/// Main configuration structure for Article-Harvester
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub assets: AssetConfig,
    #[serde(rename = "document-store", default)]
    pub document_store: Option<DocumentStoreConfig>,
    #[serde(default)]
    pub extract: ExtractConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Index page the crawl starts from
    #[serde(rename = "entry-url")]
    pub entry_url: String,

    /// Hostnames (or `*.domain` patterns) whose links are followed
    #[serde(rename = "allowed-domains")]
    pub allowed_domains: Vec<String>,

    /// Per-request timeout in seconds
    #[serde(rename = "fetch-timeout-secs", default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name", default = "default_crawler_name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version", default = "default_crawler_version")]
    pub crawler_version: String,
}

/// Durable queue configuration
#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    /// Name of the durable queue records are published to
    #[serde(default = "default_queue_name")]
    pub name: String,

    /// Path to the SQLite file backing the broker
    #[serde(rename = "database-path", default = "default_queue_path")]
    pub database_path: String,
}

/// Where the ingest worker persists records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SinkKind {
    /// Buffer records and dump them as JSON files
    File,
    /// Insert every record into the document store immediately
    DocumentStore,
    /// Both of the above
    Both,
}

impl SinkKind {
    /// Returns true if this sink needs a document store connection
    pub fn uses_document_store(&self) -> bool {
        matches!(self, Self::DocumentStore | Self::Both)
    }
}

/// When the ingest worker acknowledges deliveries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AckMode {
    /// Messages are consumed the instant they are delivered (at-most-once)
    Auto,
    /// Messages are acknowledged only once the sink has persisted them
    AfterFlush,
}

/// Ingest worker configuration
#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    /// Number of buffered records that triggers a drain to disk
    #[serde(default = "default_threshold")]
    pub threshold: usize,

    /// Directory record dumps are written to
    #[serde(rename = "output-dir", default = "default_output_dir")]
    pub output_dir: String,

    /// Persistence backend(s)
    #[serde(default = "default_sink")]
    pub sink: SinkKind,

    /// Acknowledgment policy
    #[serde(rename = "ack-mode", default = "default_ack_mode")]
    pub ack_mode: AckMode,

    /// How long to wait before polling an empty queue again (milliseconds)
    #[serde(rename = "poll-interval-ms", default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

/// Image download configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AssetConfig {
    /// Directory downloaded images are written to
    #[serde(rename = "image-dir", default = "default_image_dir")]
    pub image_dir: String,

    /// Upper bound on simultaneous image fetches
    #[serde(rename = "max-workers", default = "default_max_workers")]
    pub max_workers: usize,
}

/// Document store connection
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentStoreConfig {
    /// Path to the SQLite file holding the collection
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Collection (table) name
    pub collection: String,
}

/// CSS selectors used to pull an article out of a page
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractConfig {
    #[serde(rename = "title-selector", default = "default_title_selector")]
    pub title_selector: String,

    /// Element holding the "date | source" line
    #[serde(rename = "byline-selector", default = "default_byline_selector")]
    pub byline_selector: String,

    #[serde(rename = "content-selector", default = "default_content_selector")]
    pub content_selector: String,

    #[serde(rename = "image-selector", default = "default_image_selector")]
    pub image_selector: String,

    /// Only image sources starting with this prefix are collected
    #[serde(rename = "image-prefix", default = "default_image_prefix")]
    pub image_prefix: String,
}

fn default_fetch_timeout() -> u64 {
    30
}

fn default_crawler_name() -> String {
    "ArticleHarvester".to_string()
}

fn default_crawler_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_queue_name() -> String {
    "task_queue".to_string()
}

fn default_queue_path() -> String {
    "./queue.db".to_string()
}

fn default_threshold() -> usize {
    10
}

fn default_output_dir() -> String {
    ".".to_string()
}

fn default_sink() -> SinkKind {
    SinkKind::File
}

fn default_ack_mode() -> AckMode {
    AckMode::Auto
}

fn default_poll_interval() -> u64 {
    200
}

fn default_image_dir() -> String {
    "images".to_string()
}

fn default_max_workers() -> usize {
    30
}

fn default_title_selector() -> String {
    ".rm_txt .col-1 h1".to_string()
}

fn default_byline_selector() -> String {
    ".channel .col-1-1".to_string()
}

fn default_content_selector() -> String {
    ".col.col-1 div.rm_txt_con.cf".to_string()
}

fn default_image_selector() -> String {
    ".rm_txt_con.cf img[src]".to_string()
}

fn default_image_prefix() -> String {
    "/NMediaFile".to_string()
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: default_crawler_name(),
            crawler_version: default_crawler_version(),
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            name: default_queue_name(),
            database_path: default_queue_path(),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            output_dir: default_output_dir(),
            sink: default_sink(),
            ack_mode: default_ack_mode(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            image_dir: default_image_dir(),
            max_workers: default_max_workers(),
        }
    }
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            title_selector: default_title_selector(),
            byline_selector: default_byline_selector(),
            content_selector: default_content_selector(),
            image_selector: default_image_selector(),
            image_prefix: default_image_prefix(),
        }
    }
}
