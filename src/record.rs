//! The record emitted for every listed channel or chat

use serde::Serialize;

/// One parsed catalogue entry
///
/// Field order matches the CSV column order: `title,subscribers,link`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    /// Display title; empty when it could not be recovered
    pub title: String,

    /// Subscriber (or member) count; 0 when it could not be parsed
    pub subscribers: u64,

    /// Absolute `https://t.me/...` link
    pub link: String,
}

impl Record {
    pub fn new(title: impl Into<String>, subscribers: u64, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subscribers,
            link: link.into(),
        }
    }
}
