//! CSV writer for scraped records

use crate::output::OutputError;
use crate::record::Record;
use std::fs;
use std::path::{Path, PathBuf};

/// CSV header row, in column order
pub const CSV_HEADER: [&str; 3] = ["title", "subscribers", "link"];

/// Writes `records` to `path`, replacing any existing file
///
/// Parent directories are created as needed. The rows are first written to
/// `<path>.tmp` next to the target and then renamed over it, so a failed
/// write leaves the previous file intact. An empty slice still produces the
/// header row.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use tgscout::output::write_records;
/// use tgscout::Record;
///
/// let records = vec![Record::new("Новости России", 125000, "https://t.me/news_russia")];
/// write_records(&records, Path::new("output/channels.csv")).unwrap();
/// ```
pub fn write_records(records: &[Record], path: &Path) -> Result<(), OutputError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| OutputError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let tmp_path = temp_path(path);
    if let Err(e) = write_csv(records, &tmp_path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    fs::rename(&tmp_path, path).map_err(|source| OutputError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(path = %path.display(), records = records.len(), "CSV written");
    Ok(())
}

fn write_csv(records: &[Record], path: &Path) -> Result<(), OutputError> {
    let csv_error = |source: csv::Error| OutputError::Csv {
        path: path.to_path_buf(),
        source,
    };

    // Header is written explicitly so an empty run still gets one
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(csv_error)?;

    writer.write_record(CSV_HEADER).map_err(csv_error)?;
    for record in records {
        writer.serialize(record).map_err(csv_error)?;
    }

    writer.flush().map_err(|source| OutputError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("channels.csv");
        let records = vec![Record::new(
            "Новости России",
            125000,
            "https://t.me/news_russia",
        )];

        write_records(&records, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines,
            [
                "title,subscribers,link",
                "Новости России,125000,https://t.me/news_russia",
            ]
        );
    }

    #[test]
    fn test_quoting() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chats.csv");
        let records = vec![Record::new(
            "Rust, \"the\" language",
            10,
            "https://t.me/rust_lang",
        )];

        write_records(&records, &path).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(&row[0], "Rust, \"the\" language");
        assert_eq!(&row[1], "10");
        assert!(fs::read_to_string(&path)
            .unwrap()
            .contains("\"Rust, \"\"the\"\" language\""));
    }

    #[test]
    fn test_empty_run_writes_header_only() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("channels.csv");

        write_records(&[], &path).unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap().trim_end(),
            "title,subscribers,link"
        );
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("out").join("chats.csv");

        write_records(&[Record::new("a", 1, "https://t.me/abcd")], &path).unwrap();

        assert!(path.exists());
        assert!(!dir.path().join("nested/out/chats.csv.tmp").exists());
    }

    #[test]
    fn test_overwrites_previous_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("channels.csv");

        write_records(
            &[
                Record::new("old1", 1, "https://t.me/old_one"),
                Record::new("old2", 2, "https://t.me/old_two"),
            ],
            &path,
        )
        .unwrap();
        write_records(&[Record::new("new", 3, "https://t.me/new_one")], &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(!content.contains("old"));
    }

    #[test]
    fn test_unwritable_directory_is_reported() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();

        let result = write_records(&[], &blocker.join("channels.csv"));
        assert!(matches!(result, Err(OutputError::CreateDir { .. })));
    }
}
