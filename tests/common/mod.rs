//! Common test utilities for the ingestion pipeline
//!
//! Scripted adapters for orchestrator and service tests, and a canned
//! HTTP fetcher for driving the real adapters without a network.

#![allow(dead_code)]

pub mod mock_fetcher;
pub mod mock_source;
pub mod mock_store;

pub use mock_fetcher::MockFetcher;
pub use mock_source::{raw, MockSource, SourceScript};
pub use mock_store::PanickingStore;
