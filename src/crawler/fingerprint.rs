//! Browser fingerprint provider
//!
//! Every request carries the header set of an ordinary desktop browser. The
//! user agent is drawn from a pool on each call so consecutive requests do
//! not share an identical fingerprint.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, DNT, UPGRADE_INSECURE_REQUESTS, USER_AGENT,
};

/// Default user agent pool (recent desktop Chrome, Firefox, Safari and Edge)
const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36 Edg/123.0.2420.81",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4_1) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4.1 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14.4; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0",
];

const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";

const DEFAULT_ACCEPT_LANGUAGE: &str = "ru-RU,ru;q=0.8,en-US;q=0.5,en;q=0.3";

/// Supplies browser-like request headers
#[derive(Debug, Clone)]
pub struct FingerprintProvider {
    user_agents: Vec<String>,
    accept_language: String,
    rng: StdRng,
}

impl FingerprintProvider {
    /// Creates a provider with the default pool and an entropy-seeded RNG
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Creates a provider with a fixed seed, for reproducible runs
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            user_agents: DEFAULT_USER_AGENTS
                .iter()
                .map(|ua| ua.to_string())
                .collect(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            rng,
        }
    }

    /// Replaces the user agent pool
    ///
    /// Entries that are not valid header values are dropped; an empty result
    /// keeps the default pool.
    pub fn with_user_agents(mut self, user_agents: Vec<String>) -> Self {
        let valid: Vec<String> = user_agents
            .into_iter()
            .filter(|ua| !ua.trim().is_empty() && HeaderValue::from_str(ua).is_ok())
            .collect();

        if !valid.is_empty() {
            self.user_agents = valid;
        }
        self
    }

    /// Sets the `Accept-Language` value
    pub fn with_accept_language(mut self, accept_language: impl Into<String>) -> Self {
        self.accept_language = accept_language.into();
        self
    }

    /// Size of the user agent pool
    pub fn pool_size(&self) -> usize {
        self.user_agents.len()
    }

    /// Draws a user agent from the pool
    pub fn user_agent(&mut self) -> &str {
        self.user_agents
            .choose(&mut self.rng)
            .map(String::as_str)
            .unwrap_or(DEFAULT_USER_AGENTS[0])
    }

    /// Builds the full header set for one request
    pub fn headers(&mut self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        if let Ok(value) = HeaderValue::from_str(self.user_agent()) {
            headers.insert(USER_AGENT, value);
        }
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        if let Ok(value) = HeaderValue::from_str(&self.accept_language) {
            headers.insert(ACCEPT_LANGUAGE, value);
        }
        headers.insert(DNT, HeaderValue::from_static("1"));
        headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
        headers.insert("sec-fetch-dest", HeaderValue::from_static("document"));
        headers.insert("sec-fetch-mode", HeaderValue::from_static("navigate"));
        headers.insert("sec-fetch-site", HeaderValue::from_static("none"));
        headers.insert("sec-fetch-user", HeaderValue::from_static("?1"));

        headers
    }
}

impl Default for FingerprintProvider {
    fn default() -> Self {
        Self::new()
    }
}
