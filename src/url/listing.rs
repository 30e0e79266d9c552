use url::Url;

/// Name of the query parameter carrying the page number
pub const PAGE_PARAM: &str = "page";

/// Returns the URL of listing page `page` (1-indexed)
///
/// Any existing `page` parameter is replaced; other query parameters are kept
/// in their original order and the page number is appended last.
///
/// # Examples
///
/// ```
/// use tgscout::url::page_url;
/// use url::Url;
///
/// let base = Url::parse("https://tgstat.ru/ratings/channels/news?sort=members&page=7").unwrap();
/// assert_eq!(
///     page_url(&base, 2).as_str(),
///     "https://tgstat.ru/ratings/channels/news?sort=members&page=2"
/// );
/// ```
pub fn page_url(base: &Url, page: u32) -> Url {
    let kept: Vec<(String, String)> = base
        .query_pairs()
        .filter(|(key, _)| *key != PAGE_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut url = base.clone();
    url.set_fragment(None);
    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept.iter())
        .append_pair(PAGE_PARAM, &page.to_string());

    url
}
