//! Message store seam.

use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;

use crate::message::{Folder, RawMessage};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("folder {0} is not available")]
    FolderUnavailable(Folder),

    #[error("malformed message record: {0}")]
    Malformed(String),

    #[error("message store I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait MessageStore: Send + Sync {
    /// Up to `limit` messages from `folder`, most recent first.
    fn fetch_recent(&self, folder: Folder, limit: usize) -> Result<Vec<RawMessage>, StoreError>;
}

/// Messages from `folder` received within the last `days_back` days.
///
/// Reads at most `limit` messages and drops the ones older than the cutoff.
/// A window reaching past the representable date range keeps everything.
pub fn recent_messages(
    store: &dyn MessageStore,
    folder: Folder,
    limit: usize,
    days_back: i64,
    now: DateTime<Utc>,
) -> Result<Vec<RawMessage>, StoreError> {
    let cutoff = TimeDelta::try_days(days_back.max(0))
        .and_then(|window| now.checked_sub_signed(window))
        .map_or(i64::MIN, |start| start.timestamp_millis());
    let mut messages = store.fetch_recent(folder, limit)?;
    messages.retain(|m| m.timestamp >= cutoff);
    Ok(messages)
}
