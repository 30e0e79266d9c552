//! Crawler module for listing page fetching and processing
//!
//! This module contains the core scraping logic, including:
//! - Browser-like request headers
//! - Request pacing, retries and backoff
//! - HTTP fetching
//! - HTML parsing with pluggable extraction strategies
//! - Overall run coordination

mod backoff;
mod coordinator;
mod counts;
mod fetcher;
mod fingerprint;
mod parser;
mod strategy;

pub use backoff::{BackoffPolicy, RateLimiter};
pub use coordinator::{run_scrape, Coordinator};
pub use counts::{clean_title, extract_labeled_count, normalize_subscribers};
pub use fetcher::{classify_status, fetch_with_retry, FetchResponse, HttpClient, StatusClass};
pub use fingerprint::FingerprintProvider;
pub use parser::{extract_records, PageParser, ParsedListing};
pub use strategy::{Extract, ExtractionStrategy, Field, FieldRule};
