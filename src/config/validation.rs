use crate::config::types::{
    ConfigLayer, ContentType, FetchConfig, PacingConfig, RunConfig, Target, DEFAULT_BASE_URL,
    DEFAULT_DELAY_SECS, DEFAULT_JITTER_SECS, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_BACKOFF_SECS,
    DEFAULT_OUTPUT_DIR, DEFAULT_RETRY_FLOOR_SECS, DEFAULT_TIMEOUT_SECS,
};
use crate::ConfigError;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Upper bound on the page count of a single run
pub const MAX_PAGES: u32 = 1000;

/// Upper bound on attempts per page
pub const MAX_ATTEMPTS_LIMIT: u32 = 10;

const PROXY_SCHEMES: &[&str] = &["http", "https", "socks5", "socks5h"];

impl TryFrom<ConfigLayer> for RunConfig {
    type Error = ConfigError;

    /// Applies defaults to a merged layer and validates every field
    fn try_from(layer: ConfigLayer) -> Result<Self, Self::Error> {
        let target = validate_target(layer.url.as_deref(), layer.category.as_deref())?;
        let pages = validate_pages(layer.pages.unwrap_or(1))?;
        let base_url = validate_http_url(layer.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))?;

        let pacing = PacingConfig {
            base_delay: seconds("delay", layer.delay.unwrap_or(DEFAULT_DELAY_SECS))?,
            jitter: seconds("jitter", layer.jitter.unwrap_or(DEFAULT_JITTER_SECS))?,
            retry_floor: seconds(
                "retry-floor",
                layer.retry_floor.unwrap_or(DEFAULT_RETRY_FLOOR_SECS),
            )?,
            max_backoff: seconds(
                "max-backoff",
                layer.max_backoff.unwrap_or(DEFAULT_MAX_BACKOFF_SECS),
            )?,
            max_attempts: layer.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
        };
        validate_pacing(&pacing)?;

        let fetch = FetchConfig {
            proxy: validate_proxy(layer.proxy)?,
            timeout: seconds("timeout", layer.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS))?,
        };
        if fetch.timeout.is_zero() {
            return Err(ConfigError::Validation(
                "timeout must be greater than zero".to_string(),
            ));
        }

        Ok(RunConfig {
            target,
            content_type: layer.content_type.unwrap_or(ContentType::Channels),
            pages,
            output_dir: layer
                .outdir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            base_url,
            fetch,
            pacing,
            self_check: layer.self_check.unwrap_or(false),
            dedupe: layer.dedupe.unwrap_or(true),
        })
    }
}

/// Exactly one of URL and category must be present
fn validate_target(url: Option<&str>, category: Option<&str>) -> Result<Target, ConfigError> {
    match (url, category) {
        (Some(_), Some(_)) => Err(ConfigError::Validation(
            "specify either a URL or a category, not both".to_string(),
        )),
        (None, None) => Err(ConfigError::Validation(
            "specify a listing URL or a category code".to_string(),
        )),
        (Some(url), None) => Ok(Target::Url(validate_http_url(url)?)),
        (None, Some(code)) => {
            let code = code.trim().to_lowercase();
            if code.is_empty() {
                return Err(ConfigError::Validation(
                    "category code cannot be empty".to_string(),
                ));
            }
            Ok(Target::Category(code))
        }
    }
}

fn validate_pages(pages: u32) -> Result<u32, ConfigError> {
    if pages < 1 || pages > MAX_PAGES {
        return Err(ConfigError::Validation(format!(
            "pages must be between 1 and {}, got {}",
            MAX_PAGES, pages
        )));
    }
    Ok(pages)
}

/// Parses an absolute http(s) URL with a host
fn validate_http_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidUrl(format!("'{}': {}", raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "'{}' must use http or https",
            raw
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!("'{}' has no host", raw)));
    }

    Ok(url)
}

fn validate_pacing(pacing: &PacingConfig) -> Result<(), ConfigError> {
    if pacing.max_attempts < 1 || pacing.max_attempts > MAX_ATTEMPTS_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be between 1 and {}, got {}",
            MAX_ATTEMPTS_LIMIT, pacing.max_attempts
        )));
    }

    if pacing.base_delay > pacing.max_backoff {
        return Err(ConfigError::Validation(format!(
            "delay ({:?}) cannot exceed max-backoff ({:?})",
            pacing.base_delay, pacing.max_backoff
        )));
    }

    Ok(())
}

/// Empty proxy strings (e.g. `PROXY=` in a .env file) mean no proxy
fn validate_proxy(proxy: Option<String>) -> Result<Option<String>, ConfigError> {
    let Some(proxy) = proxy.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()) else {
        return Ok(None);
    };

    let url = Url::parse(&proxy)
        .map_err(|e| ConfigError::InvalidUrl(format!("proxy '{}': {}", proxy, e)))?;

    if !PROXY_SCHEMES.contains(&url.scheme()) {
        return Err(ConfigError::InvalidUrl(format!(
            "proxy '{}' must use one of: {}",
            proxy,
            PROXY_SCHEMES.join(", ")
        )));
    }

    Ok(Some(proxy))
}

fn seconds(name: &str, value: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(value).map_err(|_| {
        ConfigError::Validation(format!(
            "{} must be a finite, non-negative number of seconds, got {}",
            name, value
        ))
    })
}
