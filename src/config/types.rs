use crate::ConfigError;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Default catalogue site
pub const DEFAULT_BASE_URL: &str = "https://tgstat.ru";

/// Default output directory
pub const DEFAULT_OUTPUT_DIR: &str = "./output";

/// Default pause before every request (seconds)
pub const DEFAULT_DELAY_SECS: f64 = 0.8;

/// Default upper bound of the random jitter added to every pause (seconds)
pub const DEFAULT_JITTER_SECS: f64 = 0.4;

/// Default minimum wait before a retry (seconds)
pub const DEFAULT_RETRY_FLOOR_SECS: f64 = 2.0;

/// Default cap on the backoff interval (seconds)
pub const DEFAULT_MAX_BACKOFF_SECS: f64 = 60.0;

/// Default request timeout (seconds)
pub const DEFAULT_TIMEOUT_SECS: f64 = 30.0;

/// Default number of attempts per page (first try included)
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Kind of entity listed by a ratings page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Channels,
    Chats,
}

impl ContentType {
    /// Plural form used in listing URLs and output file names
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Channels => "channels",
            Self::Chats => "chats",
        }
    }

    /// Singular path segment of catalogue profile links (`/channel/@name`)
    pub fn profile_segment(&self) -> &'static str {
        match self {
            Self::Channels => "channel",
            Self::Chats => "chat",
        }
    }

    /// Name of the CSV file for this content type
    pub fn file_name(&self) -> String {
        format!("{}.csv", self.as_str())
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "channels" | "channel" => Ok(Self::Channels),
            "chats" | "chat" => Ok(Self::Chats),
            other => Err(ConfigError::Validation(format!(
                "content type must be 'channels' or 'chats', got '{}'",
                other
            ))),
        }
    }
}

/// What to scrape: a direct listing URL or a category code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Url(Url),
    Category(String),
}

/// HTTP client settings
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Proxy URL applied to every request (http, https or socks5)
    pub proxy: Option<String>,

    /// Upper bound on a single request, connect included
    pub timeout: Duration,
}

/// Pacing and retry settings
#[derive(Debug, Clone)]
pub struct PacingConfig {
    /// Pause before every first attempt
    pub base_delay: Duration,

    /// Upper bound of the uniform random jitter added to every pause
    pub jitter: Duration,

    /// Minimum pause before a retry
    pub retry_floor: Duration,

    /// Cap on the exponential backoff
    pub max_backoff: Duration,

    /// Attempts per page, first try included
    pub max_attempts: u32,
}

/// Immutable configuration of one run
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub target: Target,
    pub content_type: ContentType,

    /// Number of listing pages to fetch, starting at 1
    pub pages: u32,

    pub output_dir: PathBuf,

    /// Catalogue site used to expand category codes
    pub base_url: Url,

    pub fetch: FetchConfig,
    pub pacing: PacingConfig,

    /// Quick end-to-end check: fetch a single page
    pub self_check: bool,

    /// Collapse records that share a link within the run
    pub dedupe: bool,
}

impl RunConfig {
    /// Number of pages the run will actually request
    pub fn effective_pages(&self) -> u32 {
        if self.self_check {
            1
        } else {
            self.pages
        }
    }

    /// Path of the CSV file this run writes
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(self.content_type.file_name())
    }
}

/// One layer of partially specified settings
///
/// Layers come from the TOML file, the environment and the command line;
/// [`ConfigLayer::or`] stacks them and [`RunConfig::try_from`] applies the
/// defaults and validates the result. Durations are given in seconds.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigLayer {
    pub url: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub content_type: Option<ContentType>,
    pub pages: Option<u32>,
    pub outdir: Option<PathBuf>,
    pub base_url: Option<String>,
    pub delay: Option<f64>,
    pub jitter: Option<f64>,
    pub retry_floor: Option<f64>,
    pub max_backoff: Option<f64>,
    pub max_attempts: Option<u32>,
    pub timeout: Option<f64>,
    pub proxy: Option<String>,
    pub self_check: Option<bool>,
    pub dedupe: Option<bool>,
}

impl ConfigLayer {
    /// Stacks `self` on top of `lower`: every field set here wins
    ///
    /// The target is taken as a unit, so a layer naming a category replaces a
    /// URL from a lower layer instead of conflicting with it.
    pub fn or(self, lower: ConfigLayer) -> ConfigLayer {
        let (url, category) = if self.url.is_some() || self.category.is_some() {
            (self.url, self.category)
        } else {
            (lower.url, lower.category)
        };

        ConfigLayer {
            url,
            category,
            content_type: self.content_type.or(lower.content_type),
            pages: self.pages.or(lower.pages),
            outdir: self.outdir.or(lower.outdir),
            base_url: self.base_url.or(lower.base_url),
            delay: self.delay.or(lower.delay),
            jitter: self.jitter.or(lower.jitter),
            retry_floor: self.retry_floor.or(lower.retry_floor),
            max_backoff: self.max_backoff.or(lower.max_backoff),
            max_attempts: self.max_attempts.or(lower.max_attempts),
            timeout: self.timeout.or(lower.timeout),
            proxy: self.proxy.or(lower.proxy),
            self_check: self.self_check.or(lower.self_check),
            dedupe: self.dedupe.or(lower.dedupe),
        }
    }
}
