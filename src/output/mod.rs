//! Output module for persisting scrape results
//!
//! This module handles:
//! - Writing records to `<type>.csv`
//! - Summarising a run in a [`RunReport`]

mod csv_writer;
mod report;

pub use csv_writer::{write_records, CSV_HEADER};
pub use report::{print_report, RunReport};

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while writing output files
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to encode CSV into {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },
}
