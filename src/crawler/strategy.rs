//! Field extraction strategies
//!
//! A strategy says where the listing items of a page are and, for every
//! logical field of a [`Record`](crate::Record), which ordered list of rules
//! recovers it. Rules are tried in order; the first one that yields an
//! accepted value wins. When the catalogue markup drifts, only the table in
//! [`ExtractionStrategy::tgstat`] needs to change.

use crate::config::ContentType;
use crate::ScoutError;
use scraper::{ElementRef, Html, Selector};
use std::collections::{HashMap, HashSet};

/// Logical record fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Subscribers,
    Link,
}

/// How a raw string is read from a matched element
#[derive(Clone)]
pub enum Extract {
    /// Concatenated text of the element
    Text,

    /// Value of an attribute
    Attr(&'static str),

    /// Custom extraction function
    With(fn(ElementRef<'_>) -> Option<String>),
}

impl std::fmt::Debug for Extract {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "Text"),
            Self::Attr(name) => write!(f, "Attr({})", name),
            Self::With(_) => write!(f, "With(..)"),
        }
    }
}

impl Extract {
    fn read(&self, element: ElementRef<'_>) -> Option<String> {
        match self {
            Self::Text => Some(element.text().collect::<String>()),
            Self::Attr(name) => element.value().attr(name).map(str::to_string),
            Self::With(f) => f(element),
        }
    }
}

/// One way of recovering a field from a listing item
#[derive(Debug, Clone)]
pub struct FieldRule {
    /// Sub-element selector; `None` reads the item itself
    selector: Option<Selector>,
    extract: Extract,
}

impl FieldRule {
    /// Text of the first matching sub-element
    pub fn text(selector: &str) -> Result<Self, ScoutError> {
        Ok(Self {
            selector: Some(parse_selector(selector)?),
            extract: Extract::Text,
        })
    }

    /// Attribute of the first matching sub-element
    pub fn attr(selector: &str, name: &'static str) -> Result<Self, ScoutError> {
        Ok(Self {
            selector: Some(parse_selector(selector)?),
            extract: Extract::Attr(name),
        })
    }

    /// Custom extraction from the first matching sub-element
    pub fn with(
        selector: &str,
        extract: fn(ElementRef<'_>) -> Option<String>,
    ) -> Result<Self, ScoutError> {
        Ok(Self {
            selector: Some(parse_selector(selector)?),
            extract: Extract::With(extract),
        })
    }

    /// Reads the listing item element itself
    pub fn own(extract: Extract) -> Self {
        Self {
            selector: None,
            extract,
        }
    }

    /// Applies the rule to an item
    ///
    /// Every matching sub-element is tried in document order until `accept`
    /// turns a raw string into a value.
    fn apply<T>(&self, item: ElementRef<'_>, accept: &dyn Fn(&str) -> Option<T>) -> Option<T> {
        match &self.selector {
            None => self.extract.read(item).and_then(|raw| accept(&raw)),
            Some(selector) => item
                .select(selector)
                .filter_map(|element| self.extract.read(element))
                .find_map(|raw| accept(&raw)),
        }
    }
}

fn parse_selector(selector: &str) -> Result<Selector, ScoutError> {
    Selector::parse(selector).map_err(|e| ScoutError::InvalidSelector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}

/// Item selectors plus per-field rule chains
#[derive(Debug, Clone)]
pub struct ExtractionStrategy {
    items: Vec<Selector>,
    rules: HashMap<Field, Vec<FieldRule>>,
}

impl ExtractionStrategy {
    /// Creates a strategy from item selectors, tried in order
    pub fn new(item_selectors: &[&str]) -> Result<Self, ScoutError> {
        Ok(Self {
            items: item_selectors
                .iter()
                .map(|s| parse_selector(s))
                .collect::<Result<_, _>>()?,
            rules: HashMap::new(),
        })
    }

    /// Appends a rule to a field's chain
    pub fn with_rule(mut self, field: Field, rule: FieldRule) -> Self {
        self.rules.entry(field).or_default().push(rule);
        self
    }

    /// Replaces a field's whole chain
    pub fn replace_rules(mut self, field: Field, rules: Vec<FieldRule>) -> Self {
        self.rules.insert(field, rules);
        self
    }

    /// Number of rules for a field
    pub fn rule_count(&self, field: Field) -> usize {
        self.rules.get(&field).map_or(0, Vec::len)
    }

    /// Locates the listing items of a document, in document order
    ///
    /// The first item selector with any match is used. Matches nested inside
    /// another match are dropped so that one card yields one item.
    pub fn items<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        for selector in &self.items {
            let matches: Vec<ElementRef<'a>> = document.select(selector).collect();
            if matches.is_empty() {
                continue;
            }

            let ids: HashSet<_> = matches.iter().map(|element| element.id()).collect();
            return matches
                .into_iter()
                .filter(|element| !element.ancestors().any(|node| ids.contains(&node.id())))
                .collect();
        }

        Vec::new()
    }

    /// Extracts a field from an item
    ///
    /// Returns the accepted value and the index of the rule that produced it
    /// (0 is the primary rule, anything higher is a fallback).
    pub fn extract<T>(
        &self,
        item: ElementRef<'_>,
        field: Field,
        accept: &dyn Fn(&str) -> Option<T>,
    ) -> Option<(T, usize)> {
        self.rules.get(&field)?.iter().enumerate().find_map(|(index, rule)| {
            rule.apply(item, accept).map(|value| (value, index))
        })
    }

    /// Strategy for the tgstat catalogue markup
    ///
    /// ```text
    /// <div class="card peer-item-row">
    ///   <a href="https://tgstat.ru/channel/@name/stat">
    ///     <div class="text-truncate font-16">Title</div>
    ///   </a>
    ///   <h4>125 000</h4> подписчиков
    /// </div>
    /// ```
    pub fn tgstat(content_type: ContentType) -> Result<Self, ScoutError> {
        let profile_anchor = format!("a[href*=\"/{}/\"]", content_type.profile_segment());

        Ok(Self::new(&[
            "div.peer-item-row",
            "div.peer-item-box",
            "div[class*=\"peer-item\"]",
            profile_anchor.as_str(),
        ])?
        .replace_rules(
            Field::Title,
            vec![
                FieldRule::text("div.text-truncate.font-16")?,
                FieldRule::text(".media-body .text-truncate")?,
                FieldRule::text("[class*=\"title\"]")?,
                FieldRule::text(&profile_anchor)?,
                FieldRule::own(Extract::Text),
            ],
        )
        .replace_rules(
            Field::Subscribers,
            vec![
                FieldRule::text("[class*=\"subscribers\"]")?,
                FieldRule::text("[class*=\"members\"]")?,
                FieldRule::text("h4")?,
                FieldRule::own(Extract::With(labeled_count_text)),
            ],
        )
        .replace_rules(
            Field::Link,
            vec![
                FieldRule::attr("a[href*=\"t.me/\"]", "href")?,
                FieldRule::with("[data-username]", data_username)?,
                FieldRule::own(Extract::With(data_username)),
                FieldRule::attr(&profile_anchor, "href")?,
                FieldRule::own(Extract::Attr("href")),
                FieldRule::own(Extract::With(mention_text)),
            ],
        ))
    }
}

fn labeled_count_text(element: ElementRef<'_>) -> Option<String> {
    let text = element.text().collect::<Vec<_>>().join(" ");
    super::counts::extract_labeled_count(&text).map(|count| count.to_string())
}

fn data_username(element: ElementRef<'_>) -> Option<String> {
    element
        .value()
        .attr("data-username")
        .and_then(crate::url::username_link)
}

fn mention_text(element: ElementRef<'_>) -> Option<String> {
    let text = element.text().collect::<Vec<_>>().join(" ");
    crate::url::find_mention(&text)
}
