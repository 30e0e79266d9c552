//! URL handling module for tgscout
//!
//! This module maps category codes to listing URLs, builds the URL of each
//! listing page, and normalises the many ways a catalogue references a
//! Telegram entity into a canonical `t.me` link.

mod category;
mod listing;
mod telegram;

use crate::config::{ContentType, Target};
use crate::ConfigError;
use ::url::Url;

// Re-export main functions
pub use category::{category_url, resolve_category, Category, CATEGORIES};
pub use listing::{page_url, PAGE_PARAM};
pub use telegram::{find_mention, is_valid_username, to_tme_link, username_link, TME_PREFIX};

/// Resolves a run target to the base URL of its listing
///
/// Direct URLs are used as given; category codes are expanded against
/// `site`. An unknown category code is reported here, before any request
/// is made.
///
/// # Examples
///
/// ```
/// use tgscout::config::{ContentType, Target};
/// use tgscout::url::resolve_listing_url;
/// use url::Url;
///
/// let site = Url::parse("https://tgstat.ru").unwrap();
/// let target = Target::Category("crypto".to_string());
/// let url = resolve_listing_url(&target, ContentType::Chats, &site).unwrap();
/// assert_eq!(url.as_str(), "https://tgstat.ru/ratings/chats/crypto");
/// ```
pub fn resolve_listing_url(
    target: &Target,
    content_type: ContentType,
    site: &Url,
) -> Result<Url, ConfigError> {
    match target {
        Target::Url(url) => Ok(url.clone()),
        Target::Category(code) => category_url(site, content_type, code),
    }
}
