//! Subscriber count normalisation and title clean-up
//!
//! Catalogue pages print counts in many shapes: `125000`, `125 000`,
//! `1,234,567`, `12.3K`, `1,5 млн`, `12 тыс.`. Everything is reduced to a
//! plain integer.

use regex::Regex;
use std::sync::OnceLock;

/// Characters that may separate digit groups
const SEPARATORS: &[char] = &[' ', '\u{00A0}', '\u{202F}', '\u{2009}', '\'', ',', '.'];

/// Characters that may act as a decimal point
const DECIMAL_POINTS: &[char] = &[',', '.'];

fn count_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)(\d[\d \x{00A0}\x{202F}\x{2009}'.,]*)(?:\s*(thousand|млрд|млн|тыс|mln|bn|k|к|m|м|b)\b\.?)?",
        )
        .expect("count pattern is valid")
    })
}

fn label_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\d[\d \x{00A0}\x{202F}\x{2009}'.,]*(?:\s*(?:thousand|млрд|млн|тыс|mln|bn|k|к|m|м|b)\b\.?)?\s*(?:подписчик|участник|subscriber|member)",
        )
        .expect("label pattern is valid")
    })
}

fn multiplier(suffix: &str) -> u64 {
    match suffix.to_lowercase().as_str() {
        "k" | "к" | "тыс" | "thousand" => 1_000,
        "m" | "м" | "млн" | "mln" => 1_000_000,
        "b" | "bn" | "млрд" => 1_000_000_000,
        _ => 1,
    }
}

/// Parses the first count found in `text`
///
/// Returns `None` when the text holds no digits at all.
///
/// # Examples
///
/// ```
/// use tgscout::crawler::normalize_subscribers;
///
/// assert_eq!(normalize_subscribers("125000"), Some(125_000));
/// assert_eq!(normalize_subscribers("125 000 подписчиков"), Some(125_000));
/// assert_eq!(normalize_subscribers("12.3K"), Some(12_300));
/// assert_eq!(normalize_subscribers("1M"), Some(1_000_000));
/// assert_eq!(normalize_subscribers("n/a"), None);
/// ```
pub fn normalize_subscribers(text: &str) -> Option<u64> {
    let captures = count_regex().captures(text)?;
    let number = captures.get(1)?.as_str().trim_end_matches(SEPARATORS);

    match captures.get(2) {
        Some(suffix) => scaled(number, multiplier(suffix.as_str())),
        None => plain(number),
    }
}

/// Number with a magnitude suffix: the last `,` or `.` is a decimal point
fn scaled(number: &str, multiplier: u64) -> Option<u64> {
    let (integer, fraction) = match number.rfind(DECIMAL_POINTS) {
        Some(pos) => (&number[..pos], &number[pos + 1..]),
        None => (number, ""),
    };

    let integer: String = integer.chars().filter(char::is_ascii_digit).collect();
    let fraction: String = fraction.chars().filter(char::is_ascii_digit).collect();
    let value: f64 = format!(
        "{}.{}",
        if integer.is_empty() { "0" } else { &integer },
        if fraction.is_empty() { "0" } else { &fraction }
    )
    .parse()
    .ok()?;

    let scaled = (value * multiplier as f64).round();
    (scaled.is_finite() && scaled >= 0.0 && scaled < u64::MAX as f64).then_some(scaled as u64)
}

/// Number without a suffix
///
/// Groups of exactly three digits after a separator are thousands groups.
/// Anything else after the last `,` or `.` is a fractional part and dropped.
fn plain(number: &str) -> Option<u64> {
    let groups: Vec<&str> = number
        .split(SEPARATORS)
        .filter(|group| !group.is_empty())
        .collect();

    let (first, rest) = groups.split_first()?;
    if rest.iter().all(|group| group.len() == 3) {
        return format!("{}{}", first, rest.concat()).parse().ok();
    }

    match number.rfind(DECIMAL_POINTS) {
        Some(pos) => plain(&number[..pos]),
        // Only whitespace separators: every digit belongs to the integer
        None => groups.concat().parse().ok(),
    }
}

/// Finds a count followed by a subscriber/member label in free text
///
/// Used when an item has no dedicated stats element.
pub fn extract_labeled_count(text: &str) -> Option<u64> {
    let found = label_regex().find(text)?;
    normalize_subscribers(found.as_str())
}

/// Collapses whitespace and cuts off a trailing subscriber count
///
/// Title anchors on catalogue pages often wrap the count as well, e.g.
/// `"Новости России\n 125 000 подписчиков"`.
pub fn clean_title(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");

    let title = match label_regex().find(&collapsed) {
        Some(found) => &collapsed[..found.start()],
        None => collapsed.as_str(),
    };

    title.trim_end_matches(is_title_trailer).to_string()
}

fn is_title_trailer(c: char) -> bool {
    c.is_whitespace() || matches!(c, '·' | '•' | '|' | ',' | '-' | '–')
}
