//! Run report
//!
//! Summary of one scrape run, returned by the coordinator and printed by
//! the binary.

use crate::config::ContentType;
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Content type that was scraped
    pub content_type: ContentType,

    /// Base listing URL the pages were derived from
    pub listing_url: String,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Pages the run was configured to fetch
    pub pages_requested: u32,

    /// Pages that were fetched and parsed
    pub pages_succeeded: u32,

    /// Pages that contributed no records because of an error
    pub failed_pages: Vec<u32>,

    /// HTTP requests sent, retries included
    pub requests_sent: u64,

    /// Records written to the CSV file
    pub records_written: usize,

    /// Records dropped because their link was already seen
    pub duplicates_dropped: usize,

    /// Path of the CSV file
    pub output_path: PathBuf,
}

impl RunReport {
    /// Wall-clock duration of the run in seconds
    pub fn duration_seconds(&self) -> f64 {
        (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }

    /// Returns true if every requested page succeeded
    pub fn is_complete(&self) -> bool {
        self.failed_pages.is_empty() && self.pages_succeeded == self.pages_requested
    }
}

/// Prints the report to stdout
pub fn print_report(report: &RunReport) {
    println!("=== Scrape Report ===\n");

    println!("Run:");
    println!("  Type: {}", report.content_type);
    println!("  Listing: {}", report.listing_url);
    println!("  Started: {}", report.started_at.to_rfc3339());
    println!("  Duration: {:.1}s", report.duration_seconds());
    println!();

    println!("Pages:");
    println!(
        "  Succeeded: {} / {}",
        report.pages_succeeded, report.pages_requested
    );
    if !report.failed_pages.is_empty() {
        let pages: Vec<String> = report.failed_pages.iter().map(u32::to_string).collect();
        println!("  Failed: {}", pages.join(", "));
    }
    println!("  Requests sent: {}", report.requests_sent);
    println!();

    println!("Records:");
    println!("  Written: {}", report.records_written);
    if report.duplicates_dropped > 0 {
        println!("  Duplicates dropped: {}", report.duplicates_dropped);
    }
    println!("  Output: {}", report.output_path.display());
}
