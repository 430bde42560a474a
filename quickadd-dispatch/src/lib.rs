//! quickadd-dispatch: deduplicated dispatch of candidate expenses, and the notification watcher that feeds it

pub mod coordinator;
pub mod watcher;

pub use coordinator::{
    BatchStats, Coordinator, DispatchReason, DispatchResult, DispatchedEvent, Surface,
};
pub use quickadd_ingest::{Signals, classify_and_extract};
pub use watcher::{Notification, NotificationWatcher, WatchConfig, merge_most_recent_first};
