//! Integration tests for Article-Harvester
//!
//! These tests use wiremock to create mock HTTP servers and exercise the
//! crawl, ingest and download phases end-to-end.

mod assets_tests;
mod common;
mod crawl_tests;
mod ingest_tests;
