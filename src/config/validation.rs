use crate::config::types::{
    AssetConfig, Config, CrawlerConfig, DocumentStoreConfig, ExtractConfig, IngestConfig,
    QueueConfig, UserAgentConfig,
};
use crate::storage::is_valid_collection_name;
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_queue_config(&config.queue)?;
    validate_ingest_config(&config.ingest)?;
    validate_asset_config(&config.assets)?;
    validate_document_store(config)?;
    validate_extract_config(&config.extract)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    let entry = Url::parse(&config.entry_url).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid entry-url '{}': {}", config.entry_url, e))
    })?;

    if entry.scheme() != "http" && entry.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "entry-url '{}' must use http or https",
            config.entry_url
        )));
    }

    if config.allowed_domains.is_empty() {
        return Err(ConfigError::Validation(
            "allowed-domains must list at least one domain".to_string(),
        ));
    }

    for domain in &config.allowed_domains {
        validate_domain_pattern(domain)?;
    }

    if config.fetch_timeout_secs < 1 || config.fetch_timeout_secs > 300 {
        return Err(ConfigError::Validation(format!(
            "fetch-timeout-secs must be between 1 and 300, got {}",
            config.fetch_timeout_secs
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler-name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler-name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Ok(())
}

/// Validates queue configuration
fn validate_queue_config(config: &QueueConfig) -> Result<(), ConfigError> {
    if config.name.is_empty() {
        return Err(ConfigError::Validation(
            "queue name cannot be empty".to_string(),
        ));
    }

    if !config
        .name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(ConfigError::Validation(format!(
            "queue name may only contain letters, digits, '-', '_' and '.', got '{}'",
            config.name
        )));
    }

    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "queue database-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates ingest worker configuration
fn validate_ingest_config(config: &IngestConfig) -> Result<(), ConfigError> {
    if config.threshold < 1 {
        return Err(ConfigError::Validation(format!(
            "ingest threshold must be >= 1, got {}",
            config.threshold
        )));
    }

    if config.output_dir.is_empty() {
        return Err(ConfigError::Validation(
            "ingest output-dir cannot be empty".to_string(),
        ));
    }

    if config.poll_interval_ms < 10 {
        return Err(ConfigError::Validation(format!(
            "poll-interval-ms must be >= 10ms, got {}ms",
            config.poll_interval_ms
        )));
    }

    Ok(())
}

/// Validates image download configuration
fn validate_asset_config(config: &AssetConfig) -> Result<(), ConfigError> {
    if config.image_dir.is_empty() {
        return Err(ConfigError::Validation(
            "image-dir cannot be empty".to_string(),
        ));
    }

    if config.max_workers < 1 || config.max_workers > 256 {
        return Err(ConfigError::Validation(format!(
            "max-workers must be between 1 and 256, got {}",
            config.max_workers
        )));
    }

    Ok(())
}

/// Validates that a document store is configured whenever the sink needs one
fn validate_document_store(config: &Config) -> Result<(), ConfigError> {
    match (&config.document_store, config.ingest.sink.uses_document_store()) {
        (None, true) => Err(ConfigError::Validation(
            "ingest sink requires a [document-store] section".to_string(),
        )),
        (Some(store), _) => validate_document_store_config(store),
        (None, false) => Ok(()),
    }
}

fn validate_document_store_config(config: &DocumentStoreConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "document-store database-path cannot be empty".to_string(),
        ));
    }

    if !is_valid_collection_name(&config.collection) {
        return Err(ConfigError::Validation(format!(
            "document-store collection must be a plain identifier, got '{}'",
            config.collection
        )));
    }

    Ok(())
}

/// Validates that every selector parses
fn validate_extract_config(config: &ExtractConfig) -> Result<(), ConfigError> {
    for selector in [
        &config.title_selector,
        &config.byline_selector,
        &config.content_selector,
        &config.image_selector,
    ] {
        validate_selector(selector)?;
    }

    if !config.image_prefix.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "image-prefix must be a rooted path, got '{}'",
            config.image_prefix
        )));
    }

    Ok(())
}

/// Checks that a CSS selector compiles
fn validate_selector(selector: &str) -> Result<(), ConfigError> {
    Selector::parse(selector)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidSelector {
            selector: selector.to_string(),
            message: format!("{:?}", e),
        })
}

/// Validates a domain pattern (supports wildcards)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    if let Some(domain) = pattern.strip_prefix("*.") {
        validate_domain_string(domain)?;
    } else {
        validate_domain_string(pattern)?;
    }

    Ok(())
}

/// Validates a domain string (without wildcard prefix)
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot (e.g., 'example.com')",
            domain
        )));
    }

    Ok(())
}
