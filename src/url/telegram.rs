//! Recovery of canonical `t.me` links
//!
//! Catalogue pages reference a channel in several ways: a direct `t.me`
//! anchor, a `tg://resolve` deep link, the catalogue's own profile path
//! (`/channel/@name`) or a bare `@name` mention. All of them collapse to
//! `https://t.me/<name>` here.

use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// Canonical prefix of every emitted link
pub const TME_PREFIX: &str = "https://t.me/";

const TELEGRAM_HOSTS: &[&str] = &[
    "t.me",
    "www.t.me",
    "telegram.me",
    "www.telegram.me",
    "telegram.dog",
];

/// First path segments of `t.me` service pages, never usernames
const RESERVED_PATHS: &[&str] = &[
    "share",
    "addstickers",
    "addemoji",
    "addtheme",
    "proxy",
    "socks",
    "iv",
    "login",
    "setlanguage",
    "confirmphone",
];

fn profile_path_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"/(?:channel|chat)/@([A-Za-z][A-Za-z0-9_]{3,31})(?:[/?#]|$)")
            .expect("profile path pattern is valid")
    })
}

fn mention_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:^|[^\w@.])@([A-Za-z][A-Za-z0-9_]{3,31})\b")
            .expect("mention pattern is valid")
    })
}

/// Returns true if `name` is a syntactically valid public username
pub fn is_valid_username(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_alphabetic());

    starts_with_letter
        && (4..=32).contains(&name.len())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.ends_with('_')
}

fn is_public_username(name: &str) -> bool {
    let lowered = name.to_ascii_lowercase();
    is_valid_username(name) && !RESERVED_PATHS.contains(&lowered.as_str())
}

/// Normalises any supported reference into an absolute `t.me` link
///
/// Returns `None` when the input does not point to Telegram. A bare word is
/// not a reference; see [`username_link`] for attributes that hold a plain
/// handle.
///
/// # Examples
///
/// ```
/// use tgscout::url::to_tme_link;
///
/// assert_eq!(to_tme_link("https://t.me/durov").as_deref(), Some("https://t.me/durov"));
/// assert_eq!(to_tme_link("@durov").as_deref(), Some("https://t.me/durov"));
/// assert_eq!(
///     to_tme_link("https://tgstat.ru/channel/@durov/stat").as_deref(),
///     Some("https://t.me/durov")
/// );
/// assert_eq!(to_tme_link("https://example.com/durov"), None);
/// assert_eq!(to_tme_link("about"), None);
/// ```
pub fn to_tme_link(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Some(name) = raw.strip_prefix('@') {
        return is_public_username(name).then(|| format!("{}{}", TME_PREFIX, name));
    }

    if let Some(captures) = profile_path_regex().captures(raw) {
        return Some(format!("{}{}", TME_PREFIX, &captures[1]));
    }

    let absolute = if raw.starts_with("//") {
        format!("https:{}", raw)
    } else if !raw.contains("://")
        && TELEGRAM_HOSTS
            .iter()
            .any(|host| raw.starts_with(&format!("{}/", host)))
    {
        format!("https://{}", raw)
    } else {
        raw.to_string()
    };

    let url = Url::parse(&absolute).ok()?;

    if url.scheme() == "tg" {
        return url
            .query_pairs()
            .find(|(key, _)| *key == "domain")
            .filter(|(_, value)| is_public_username(value))
            .map(|(_, value)| format!("{}{}", TME_PREFIX, value));
    }

    if url.scheme() != "https" && url.scheme() != "http" {
        return None;
    }

    let host = url.host_str()?.to_ascii_lowercase();
    if !TELEGRAM_HOSTS.contains(&host.as_str()) {
        return None;
    }

    let segments: Vec<&str> = url
        .path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    match segments.as_slice() {
        // Private invite links are kept verbatim
        [invite, ..] if invite.starts_with('+') && invite.len() > 1 => {
            Some(format!("{}{}", TME_PREFIX, invite))
        }
        ["joinchat", hash, ..] => Some(format!("{}joinchat/{}", TME_PREFIX, hash)),
        // Web preview of a public channel
        ["s", name, ..] if is_public_username(name) => Some(format!("{}{}", TME_PREFIX, name)),
        [name, ..] if is_public_username(name) => Some(format!("{}{}", TME_PREFIX, name)),
        _ => None,
    }
}

/// Link for a plain handle such as a `data-username` attribute value
///
/// Accepts `name` or `@name`; anything else goes through [`to_tme_link`].
pub fn username_link(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let name = raw.strip_prefix('@').unwrap_or(raw);

    if is_public_username(name) {
        Some(format!("{}{}", TME_PREFIX, name))
    } else {
        to_tme_link(raw)
    }
}

/// Finds the first `@username` mention in free text
pub fn find_mention(text: &str) -> Option<String> {
    mention_regex()
        .captures_iter(text)
        .map(|captures| captures[1].to_string())
        .find(|name| is_public_username(name))
        .map(|name| format!("{}{}", TME_PREFIX, name))
}
