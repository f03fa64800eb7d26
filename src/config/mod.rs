//! Configuration module for Article-Harvester
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use article_harvester::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvester.toml")).unwrap();
//! println!("Crawl will start at: {}", config.crawler.entry_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    AckMode, AssetConfig, Config, CrawlerConfig, DocumentStoreConfig, ExtractConfig,
    IngestConfig, QueueConfig, SinkKind, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
