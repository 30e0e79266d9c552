//! Listing page parser
//!
//! This module turns the HTML of one listing page into [`Record`]s:
//! - Locating the repeating listing items
//! - Recovering title, subscriber count and `t.me` link per item
//! - Counting fallbacks and skipped items for the run log

use crate::config::ContentType;
use crate::crawler::counts::{clean_title, normalize_subscribers};
use crate::crawler::strategy::{ExtractionStrategy, Field};
use crate::record::Record;
use crate::url::to_tme_link;
use crate::ScoutError;
use scraper::Html;

/// Records extracted from one listing page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedListing {
    /// Records in document (ranking) order
    pub records: Vec<Record>,

    /// Listing items located on the page
    pub items_found: usize,

    /// Items dropped because no `t.me` link could be recovered
    pub skipped_without_link: usize,

    /// Titles recovered by a fallback rule
    pub title_fallbacks: usize,

    /// Items emitted with an empty title
    pub titles_missing: usize,

    /// Subscriber counts recovered by a fallback rule
    pub subscriber_fallbacks: usize,

    /// Items emitted with a zero subscriber count
    pub subscribers_missing: usize,
}

impl ParsedListing {
    /// Returns true if any field needed a fallback or a placeholder
    pub fn used_fallbacks(&self) -> bool {
        self.title_fallbacks
            + self.titles_missing
            + self.subscriber_fallbacks
            + self.subscribers_missing
            > 0
    }
}

/// Parses listing pages of both content types
#[derive(Debug, Clone)]
pub struct PageParser {
    channels: ExtractionStrategy,
    chats: ExtractionStrategy,
}

impl PageParser {
    /// Creates a parser for the tgstat catalogue markup
    pub fn new() -> Result<Self, ScoutError> {
        Ok(Self {
            channels: ExtractionStrategy::tgstat(ContentType::Channels)?,
            chats: ExtractionStrategy::tgstat(ContentType::Chats)?,
        })
    }

    /// Replaces the strategy used for one content type
    pub fn with_strategy(
        mut self,
        content_type: ContentType,
        strategy: ExtractionStrategy,
    ) -> Self {
        match content_type {
            ContentType::Channels => self.channels = strategy,
            ContentType::Chats => self.chats = strategy,
        }
        self
    }

    fn strategy(&self, content_type: ContentType) -> &ExtractionStrategy {
        match content_type {
            ContentType::Channels => &self.channels,
            ContentType::Chats => &self.chats,
        }
    }

    /// Parses one listing page
    ///
    /// # Returns
    ///
    /// * `Ok(ParsedListing)` - Items were found (possibly all without links)
    /// * `Err(ScoutError::ParseAnomaly)` - No listing structure in the page
    ///
    /// # Example
    ///
    /// ```
    /// use tgscout::crawler::PageParser;
    /// use tgscout::ContentType;
    ///
    /// let html = r#"<div class="peer-item-row">
    ///     <a href="https://t.me/news_russia">
    ///         <div class="text-truncate font-16">Новости России</div>
    ///     </a>
    ///     <div class="subscribers">125 000</div>
    /// </div>"#;
    ///
    /// let parsed = PageParser::new().unwrap().parse(html, ContentType::Channels).unwrap();
    /// assert_eq!(parsed.records[0].title, "Новости России");
    /// assert_eq!(parsed.records[0].subscribers, 125_000);
    /// ```
    pub fn parse(
        &self,
        html: &str,
        content_type: ContentType,
    ) -> Result<ParsedListing, ScoutError> {
        let document = Html::parse_document(html);
        let strategy = self.strategy(content_type);
        let items = strategy.items(&document);

        if items.is_empty() {
            return Err(ScoutError::ParseAnomaly {
                message: format!("no {} listing items found", content_type),
            });
        }

        let mut listing = ParsedListing {
            items_found: items.len(),
            ..ParsedListing::default()
        };

        let accept_title = |raw: &str| Some(clean_title(raw)).filter(|title| !title.is_empty());

        for (position, item) in items.into_iter().enumerate() {
            let Some((link, _)) = strategy.extract(item, Field::Link, &to_tme_link) else {
                tracing::debug!(position, "Listing item without a t.me link, skipped");
                listing.skipped_without_link += 1;
                continue;
            };

            let title = match strategy.extract(item, Field::Title, &accept_title) {
                Some((title, 0)) => title,
                Some((title, _)) => {
                    listing.title_fallbacks += 1;
                    title
                }
                None => {
                    tracing::debug!(link = %link, "No title found");
                    listing.titles_missing += 1;
                    String::new()
                }
            };

            let count = strategy.extract(item, Field::Subscribers, &normalize_subscribers);
            let subscribers = match count {
                Some((count, 0)) => count,
                Some((count, _)) => {
                    listing.subscriber_fallbacks += 1;
                    count
                }
                None => {
                    tracing::debug!(link = %link, "No subscriber count found");
                    listing.subscribers_missing += 1;
                    0
                }
            };

            listing.records.push(Record::new(title, subscribers, link));
        }

        Ok(listing)
    }
}

/// Parses a page and returns its records, empty on any anomaly
pub fn extract_records(html: &str, content_type: ContentType) -> Vec<Record> {
    PageParser::new()
        .and_then(|parser| parser.parse(html, content_type))
        .map(|listing| listing.records)
        .unwrap_or_default()
}
