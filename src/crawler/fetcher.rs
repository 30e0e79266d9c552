//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests made by the scraper:
//! - Building the HTTP client (timeout, proxy, compression)
//! - Issuing GET requests with a browser fingerprint
//! - Classifying responses for the retry loop
//! - Retrying rate-limited and transient failures with backoff

use crate::config::FetchConfig;
use crate::crawler::backoff::RateLimiter;
use crate::crawler::fingerprint::FingerprintProvider;
use crate::ScoutError;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Proxy, StatusCode};
use std::time::Duration;

/// Upper bound on establishing a connection
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// A completed HTTP exchange, whatever its status
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// HTTP status code
    pub status: u16,

    /// Response body
    pub body: String,

    /// Parsed `Retry-After` header (delta-seconds form only)
    pub retry_after: Option<Duration>,
}

/// How the retry loop treats a status code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// 2xx: hand the body to the parser
    Success,

    /// 429: back off and retry
    RateLimited,

    /// 500, 502, 503, 504: back off and retry
    Transient,

    /// Anything else: give up on the page
    Permanent,
}

/// Classifies an HTTP status for the retry loop
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | HTTP 2xx | Parse the body |
/// | HTTP 429 | Retry with backoff, honouring `Retry-After` |
/// | HTTP 500/502/503/504 | Retry with backoff |
/// | Other status | Skip the page |
/// | Timeout, connection failure | Retry with backoff |
pub fn classify_status(status: u16) -> StatusClass {
    match status {
        200..=299 => StatusClass::Success,
        429 => StatusClass::RateLimited,
        500 | 502 | 503 | 504 => StatusClass::Transient,
        _ => StatusClass::Permanent,
    }
}

/// HTTP client wrapper
///
/// Status codes are never turned into errors here; only connection-level
/// failures surface as [`ScoutError::Transport`].
#[derive(Debug)]
pub struct HttpClient {
    client: Client,
    fingerprints: FingerprintProvider,
    requests_sent: u64,
}

impl HttpClient {
    /// Builds an HTTP client with timeout and optional proxy
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::time::Duration;
    /// use tgscout::config::FetchConfig;
    /// use tgscout::crawler::{FingerprintProvider, HttpClient};
    ///
    /// let config = FetchConfig {
    ///     proxy: Some("http://127.0.0.1:8080".to_string()),
    ///     timeout: Duration::from_secs(30),
    /// };
    /// let client = HttpClient::new(&config, FingerprintProvider::new()).unwrap();
    /// ```
    pub fn new(
        config: &FetchConfig,
        fingerprints: FingerprintProvider,
    ) -> Result<Self, ScoutError> {
        let mut builder = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(config.timeout))
            .gzip(true)
            .brotli(true);

        if let Some(proxy) = &config.proxy {
            builder = builder.proxy(Proxy::all(proxy.as_str())?);
        }

        Ok(Self {
            client: builder.build()?,
            fingerprints,
            requests_sent: 0,
        })
    }

    /// Number of requests put on the wire so far
    pub fn requests_sent(&self) -> u64 {
        self.requests_sent
    }

    /// Issues one GET request
    ///
    /// # Returns
    ///
    /// * `Ok(FetchResponse)` - A response was received (any status)
    /// * `Err(ScoutError::Transport)` - Connection, timeout or body read failure
    pub async fn fetch(&mut self, url: &str) -> Result<FetchResponse, ScoutError> {
        let headers = self.fingerprints.headers();
        self.requests_sent += 1;

        let transport = |source: reqwest::Error| ScoutError::Transport {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        let retry_after = parse_retry_after(&response);
        let body = response.text().await.map_err(transport)?;

        Ok(FetchResponse {
            status: status.as_u16(),
            body,
            retry_after,
        })
    }
}

fn parse_retry_after(response: &reqwest::Response) -> Option<Duration> {
    if response.status() != StatusCode::TOO_MANY_REQUESTS
        && response.status() != StatusCode::SERVICE_UNAVAILABLE
    {
        return None;
    }

    response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Fetches a listing page, retrying rate limits and transient failures
///
/// The limiter pauses before every attempt, including the first. Exhausting
/// the attempt budget yields [`ScoutError::RateLimitExceeded`] when the last
/// failure was a 429, the last [`ScoutError::Transport`] error when it was a
/// connection failure, and [`ScoutError::HttpStatus`] for a server error.
/// Other non-success statuses are returned immediately as
/// [`ScoutError::HttpStatus`].
pub async fn fetch_with_retry(
    client: &mut HttpClient,
    limiter: &mut RateLimiter,
    url: &str,
) -> Result<String, ScoutError> {
    let mut attempt = 0;
    let mut retry_after = None;

    loop {
        limiter.wait_before_request(attempt, retry_after).await;
        attempt += 1;

        let failure = match client.fetch(url).await {
            Ok(response) => match classify_status(response.status) {
                StatusClass::Success => {
                    tracing::debug!(
                        url,
                        status = response.status,
                        bytes = response.body.len(),
                        "Fetched"
                    );
                    return Ok(response.body);
                }
                StatusClass::Permanent => {
                    return Err(ScoutError::HttpStatus {
                        url: url.to_string(),
                        status: response.status,
                    });
                }
                StatusClass::RateLimited => {
                    retry_after = response.retry_after;
                    ScoutError::RateLimitExceeded {
                        url: url.to_string(),
                        attempts: attempt,
                    }
                }
                StatusClass::Transient => {
                    retry_after = response.retry_after;
                    ScoutError::HttpStatus {
                        url: url.to_string(),
                        status: response.status,
                    }
                }
            },
            Err(e) => {
                retry_after = None;
                e
            }
        };

        if !limiter.policy().has_attempts_left(attempt) {
            return Err(failure);
        }

        tracing::warn!(
            url,
            attempt,
            max_attempts = limiter.policy().max_attempts,
            "Request failed ({}), retrying",
            failure
        );
    }
}
