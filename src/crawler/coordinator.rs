//! Scrape coordinator - main run orchestration logic
//!
//! This module contains the page loop that ties the other components
//! together:
//! - Resolving the listing URL before any network activity
//! - Fetching pages strictly in order, with pacing and retries
//! - Parsing and accumulating records, containing page-level failures
//! - Writing the CSV file once at the end of the run

use crate::config::RunConfig;
use crate::crawler::backoff::{BackoffPolicy, RateLimiter};
use crate::crawler::fetcher::{fetch_with_retry, HttpClient};
use crate::crawler::fingerprint::FingerprintProvider;
use crate::crawler::parser::{PageParser, ParsedListing};
use crate::output::{write_records, RunReport};
use crate::record::Record;
use crate::state::RunState;
use crate::url::{page_url, resolve_listing_url};
use crate::ScoutError;
use chrono::Utc;
use std::collections::HashSet;
use url::Url;

/// Main scrape coordinator structure
///
/// Owns every component of a run; nothing is shared or global.
pub struct Coordinator {
    config: RunConfig,
    listing_url: Url,
    client: HttpClient,
    limiter: RateLimiter,
    parser: PageParser,
    state: RunState,
    records: Vec<Record>,
    seen_links: HashSet<String>,
    duplicates_dropped: usize,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// The listing URL is resolved first, so an unknown category code fails
    /// here before the HTTP client even exists.
    ///
    /// # Arguments
    ///
    /// * `config` - The validated run configuration
    /// * `fingerprints` - Header provider for every request
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(ScoutError)` - Configuration or client construction failed
    pub fn new(config: RunConfig, fingerprints: FingerprintProvider) -> Result<Self, ScoutError> {
        let listing_url =
            resolve_listing_url(&config.target, config.content_type, &config.base_url)?;
        let client = HttpClient::new(&config.fetch, fingerprints)?;
        let limiter = RateLimiter::new(BackoffPolicy::from_config(&config.pacing));
        let parser = PageParser::new()?;

        Ok(Self::with_components(config, listing_url, client, limiter, parser))
    }

    /// Creates a coordinator from pre-built components
    pub fn with_components(
        config: RunConfig,
        listing_url: Url,
        client: HttpClient,
        limiter: RateLimiter,
        parser: PageParser,
    ) -> Self {
        Self {
            config,
            listing_url,
            client,
            limiter,
            parser,
            state: RunState::Idle,
            records: Vec::new(),
            seen_links: HashSet::new(),
            duplicates_dropped: 0,
        }
    }

    /// Current state of the run
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Base listing URL of the run
    pub fn listing_url(&self) -> &Url {
        &self.listing_url
    }

    /// HTTP requests sent so far, retries included
    pub fn requests_sent(&self) -> u64 {
        self.client.requests_sent()
    }

    fn transition(&mut self, next: RunState) -> Result<(), ScoutError> {
        if !self.state.can_transition_to(&next) {
            return Err(ScoutError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }

        tracing::trace!(from = %self.state, to = %next, "State transition");
        self.state = next;
        Ok(())
    }

    /// Runs the scrape to completion
    ///
    /// Page-level failures are logged and skipped. Only an invalid state
    /// transition or a failed CSV write aborts the run.
    pub async fn run(&mut self) -> Result<RunReport, ScoutError> {
        let started_at = Utc::now();
        let pages = self.config.effective_pages();
        let content_type = self.config.content_type;
        let mut pages_succeeded = 0;
        let mut failed_pages = Vec::new();

        tracing::info!(
            listing = %self.listing_url,
            content_type = %content_type,
            pages,
            self_check = self.config.self_check,
            "Starting scrape"
        );

        for page in 1..=pages {
            self.transition(RunState::Fetching { page })?;
            let url = page_url(&self.listing_url, page).to_string();

            let fetched = fetch_with_retry(&mut self.client, &mut self.limiter, &url).await;
            let body = match fetched {
                Ok(body) => body,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::error!(page, error = %e, "Giving up on page");
                    tracing::warn!(page, "Page yielded zero records");
                    failed_pages.push(page);
                    continue;
                }
            };
            tracing::info!(page, bytes = body.len(), "Page fetched");

            self.transition(RunState::Parsing { page })?;
            let listing = match self.parser.parse(&body, content_type) {
                Ok(listing) => listing,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::warn!(page, error = %e, "Page yielded zero records");
                    failed_pages.push(page);
                    continue;
                }
            };
            log_listing(page, &listing);

            self.transition(RunState::Accumulating { page })?;
            let added = self.accumulate(listing.records);
            pages_succeeded += 1;

            if added == 0 {
                tracing::warn!(page, "Page yielded zero records");
            } else {
                tracing::info!(
                    page,
                    records = added,
                    total = self.records.len(),
                    "Page accumulated"
                );
            }
        }

        self.transition(RunState::Finalizing)?;
        let output_path = self.config.output_path();
        if let Err(e) = write_records(&self.records, &output_path) {
            tracing::error!(path = %output_path.display(), error = %e, "Failed to write output");
            return Err(e.into());
        }
        self.transition(RunState::Done)?;

        let report = RunReport {
            content_type,
            listing_url: self.listing_url.to_string(),
            started_at,
            finished_at: Utc::now(),
            pages_requested: pages,
            pages_succeeded,
            failed_pages,
            requests_sent: self.client.requests_sent(),
            records_written: self.records.len(),
            duplicates_dropped: self.duplicates_dropped,
            output_path,
        };

        tracing::info!(
            records = report.records_written,
            pages_succeeded = report.pages_succeeded,
            pages_failed = report.failed_pages.len(),
            requests = report.requests_sent,
            path = %report.output_path.display(),
            "Scrape finished"
        );

        Ok(report)
    }

    /// Appends a page's records, dropping links already seen in this run
    ///
    /// Returns the number of records added.
    fn accumulate(&mut self, records: Vec<Record>) -> usize {
        let before = self.records.len();

        for record in records {
            if self.config.dedupe && !self.seen_links.insert(record.link.clone()) {
                tracing::debug!(link = %record.link, "Duplicate link dropped");
                self.duplicates_dropped += 1;
                continue;
            }
            self.records.push(record);
        }

        self.records.len() - before
    }
}

fn log_listing(page: u32, listing: &ParsedListing) {
    if listing.skipped_without_link > 0 {
        tracing::warn!(
            page,
            skipped = listing.skipped_without_link,
            items = listing.items_found,
            "Listing items without a t.me link were skipped"
        );
    }

    if listing.used_fallbacks() {
        tracing::warn!(
            page,
            title_fallbacks = listing.title_fallbacks,
            titles_missing = listing.titles_missing,
            subscriber_fallbacks = listing.subscriber_fallbacks,
            subscribers_missing = listing.subscribers_missing,
            "Field extraction fallback used"
        );
    }
}

/// Runs a complete scrape with a fresh fingerprint provider
pub async fn run_scrape(config: RunConfig) -> Result<RunReport, ScoutError> {
    let mut coordinator = Coordinator::new(config, FingerprintProvider::new())?;
    coordinator.run().await
}
