//! Notification watcher: turns "a new message might exist" into a batch.
//!
//! Two paths reach the coordinator for the same real message:
//! - push broadcast, which carries the delivered messages
//! - content change on the message store, which carries nothing, so the
//!   watched folders are re-read
//!
//! Neither path suppresses the other; the coordinator's watermark makes the
//! second arrival a no-op.

use std::collections::HashSet;
use std::sync::Arc;

use quickadd_core::{Folder, MessageStore, RawMessage};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::coordinator::{Coordinator, DispatchResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    Broadcast {
        messages: Vec<RawMessage>,
    },
    ContentChanged {
        #[serde(default)]
        folder_hint: Option<Folder>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchConfig {
    pub folders: Vec<Folder>,
    pub per_folder_limit: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            folders: vec![Folder::Inbox, Folder::Sent, Folder::All],
            per_folder_limit: 10,
        }
    }
}

pub struct NotificationWatcher {
    store: Arc<dyn MessageStore>,
    coordinator: Arc<Coordinator>,
    config: WatchConfig,
}

impl NotificationWatcher {
    pub fn new(
        store: Arc<dyn MessageStore>,
        coordinator: Arc<Coordinator>,
        config: WatchConfig,
    ) -> Self {
        Self {
            store,
            coordinator,
            config,
        }
    }

    pub fn coordinator(&self) -> &Arc<Coordinator> {
        &self.coordinator
    }

    pub fn on_notification(&self, notification: &Notification) -> DispatchResult {
        let batch = self.assemble_batch(notification);
        self.coordinator.handle_batch(&batch)
    }

    /// Build the most-recent-first batch for one notification.
    pub fn assemble_batch(&self, notification: &Notification) -> Vec<RawMessage> {
        match notification {
            Notification::Broadcast { messages } => {
                debug!(count = messages.len(), "broadcast delivered messages");
                merge_most_recent_first(vec![messages.clone()])
            }
            Notification::ContentChanged { folder_hint } => {
                let mut folders = self.config.folders.clone();
                if let Some(hint) = *folder_hint {
                    if !folders.contains(&hint) {
                        folders.push(hint);
                    }
                }

                let mut per_folder = Vec::with_capacity(folders.len());
                for folder in folders {
                    match self.store.fetch_recent(folder, self.config.per_folder_limit) {
                        Ok(messages) => {
                            debug!(%folder, count = messages.len(), "read folder");
                            per_folder.push(messages);
                        }
                        Err(e) => {
                            warn!(%folder, error = %e, "skipping unreadable folder");
                        }
                    }
                }
                merge_most_recent_first(per_folder)
            }
        }
    }
}

/// Merge folder listings into one most-recent-first list.
///
/// The combined folder overlaps inbox and sent, so a message seen twice
/// (same timestamp, sender and body) is kept once, from the first folder
/// that listed it.
pub fn merge_most_recent_first(per_folder: Vec<Vec<RawMessage>>) -> Vec<RawMessage> {
    let mut seen: HashSet<(i64, String, String)> = HashSet::new();
    let mut merged: Vec<RawMessage> = per_folder
        .into_iter()
        .flatten()
        .filter(|m| seen.insert((m.timestamp, m.sender.clone(), m.body.clone())))
        .collect();

    // stable: equal timestamps keep folder order
    merged.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    merged
}
