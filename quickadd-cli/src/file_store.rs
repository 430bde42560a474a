//! File-backed message store (`.jsonl` or `.csv`).
//!
//! The file is re-read on every fetch so external appends are picked up.

use quickadd_core::{Folder, MessageStore, RawMessage, StoreError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub struct FileMessageStore {
    path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Jsonl,
    Csv,
}

impl FileMessageStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn format(&self) -> Result<Format, StoreError> {
        match self.path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("jsonl") => Ok(Format::Jsonl),
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Ok(Format::Csv),
            _ => Err(StoreError::Malformed(format!(
                "unsupported store file {} (expected .jsonl or .csv)",
                self.path.display()
            ))),
        }
    }

    /// Every message in the file, in file order.
    pub fn load_all(&self) -> Result<Vec<RawMessage>, StoreError> {
        match self.format()? {
            Format::Jsonl => self.load_jsonl(),
            Format::Csv => self.load_csv(),
        }
    }

    fn load_jsonl(&self) -> Result<Vec<RawMessage>, StoreError> {
        let text = fs::read_to_string(&self.path)?;
        let mut out = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<RawMessage>(line) {
                Ok(m) => out.push(m),
                Err(e) => warn!(line = idx + 1, error = %e, "skipping bad store line"),
            }
        }
        Ok(out)
    }

    fn load_csv(&self) -> Result<Vec<RawMessage>, StoreError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::Headers)
            .from_path(&self.path)
            .map_err(|e| csv_error(&self.path, e))?;

        let mut out = Vec::new();
        for record in rdr.deserialize::<RawMessage>() {
            out.push(record.map_err(|e| csv_error(&self.path, e))?);
        }
        Ok(out)
    }
}

fn csv_error(path: &Path, e: csv::Error) -> StoreError {
    if e.is_io_error() {
        if let csv::ErrorKind::Io(io) = e.into_kind() {
            return StoreError::Io(io);
        }
        return StoreError::Malformed(format!("{}: unreadable", path.display()));
    }
    StoreError::Malformed(format!("{}: {}", path.display(), e))
}

impl MessageStore for FileMessageStore {
    fn fetch_recent(&self, folder: Folder, limit: usize) -> Result<Vec<RawMessage>, StoreError> {
        let mut messages: Vec<RawMessage> = self
            .load_all()?
            .into_iter()
            .filter(|m| folder == Folder::All || m.folder == folder)
            .collect();

        messages.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        messages.truncate(limit);
        debug!(%folder, count = messages.len(), path = %self.path.display(), "fetched");
        Ok(messages)
    }
}
