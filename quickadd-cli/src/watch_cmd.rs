//! `scan`, `watch` and `replay`: drive the notification watcher from the CLI.

use anyhow::{Context, Result};
use quickadd_core::{ActionGateway, MessageStore};
use quickadd_dispatch::{
    Coordinator, DispatchReason, DispatchResult, Notification, NotificationWatcher,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::file_store::FileMessageStore;
use crate::gateway::CommandGateway;

fn build_watcher(cfg: &Config, store_path: PathBuf) -> Result<NotificationWatcher> {
    let store: Arc<dyn MessageStore> = Arc::new(FileMessageStore::new(store_path));
    let gateway: Arc<dyn ActionGateway> = Arc::new(CommandGateway::from_config(cfg)?);
    Ok(NotificationWatcher::new(
        store,
        Arc::new(Coordinator::new(gateway)),
        cfg.watch_config(),
    ))
}

fn print_result(result: &DispatchResult) {
    match &result.dispatched {
        Some(ev) => println!(
            "Dispatched ₹{} ({:?}) from message at {}",
            ev.amount, ev.surface, ev.timestamp_millis
        ),
        None => println!(
            "No dispatch: {:?} (scanned {}, duplicates {}, no amount {}, below threshold {})",
            result.reason,
            result.stats.scanned,
            result.stats.duplicates,
            result.stats.rejected_no_amount,
            result.stats.rejected_below_threshold
        ),
    }
}

/// One content-change pass over the store.
pub fn scan(cfg: &Config, store: Option<PathBuf>) -> Result<()> {
    let store_path = match store {
        Some(p) => p,
        None => cfg.store_path()?,
    };
    let watcher = build_watcher(cfg, store_path)?;
    let result = watcher.on_notification(&Notification::ContentChanged { folder_hint: None });
    print_result(&result);
    Ok(())
}

fn modified_at(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Poll the store file and run a content-change pass after each modification.
pub async fn watch(cfg: &Config, store: Option<PathBuf>, interval_secs: u64) -> Result<()> {
    let store_path = match store {
        Some(p) => p,
        None => cfg.store_path()?,
    };
    let watcher = Arc::new(build_watcher(cfg, store_path.clone())?);
    let settle = cfg.settle_delay();

    info!(
        store = %store_path.display(),
        interval_secs,
        settle_ms = settle.as_millis() as u64,
        "watching message store"
    );

    let mut last_seen = modified_at(&store_path);
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!(last_accepted = watcher.coordinator().last_accepted(), "stopping watch");
                return Ok(());
            }
            _ = ticker.tick() => {}
        }

        let current = modified_at(&store_path);
        if current.is_none() || current == last_seen {
            continue;
        }
        last_seen = current;
        debug!("store changed, waiting for it to settle");

        // give the writer time to finish before re-reading
        tokio::time::sleep(settle).await;

        let w = watcher.clone();
        let result = tokio::task::spawn_blocking(move || {
            w.on_notification(&Notification::ContentChanged { folder_hint: None })
        })
        .await
        .context("watch pass panicked")?;

        if result.dispatched.is_some() || result.reason == DispatchReason::FallbackFailedPermanent {
            print_result(&result);
        } else if result.reason == DispatchReason::FallbackFailedTransient {
            warn!("prompt not delivered; will retry on the next change");
        }
    }
}

/// Parse a notification log: one JSON notification per line.
pub fn read_notification_log(text: &str) -> Result<Vec<Notification>> {
    text.lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty())
        .map(|(idx, l)| {
            serde_json::from_str(l).with_context(|| format!("notification log line {}", idx + 1))
        })
        .collect()
}

/// Feed a recorded notification log through one coordinator.
pub fn replay(cfg: &Config, events: &Path, store: Option<PathBuf>) -> Result<()> {
    let text =
        std::fs::read_to_string(events).with_context(|| format!("read {}", events.display()))?;
    let notifications = read_notification_log(&text)?;

    let store_path = match store {
        Some(p) => p,
        None => cfg.store_path()?,
    };
    let watcher = build_watcher(cfg, store_path)?;

    for (idx, n) in notifications.iter().enumerate() {
        let result = watcher.on_notification(n);
        println!("{}", serde_json::to_string(&ReplayLine { index: idx + 1, result: &result })?);
    }
    Ok(())
}

#[derive(serde::Serialize)]
struct ReplayLine<'a> {
    index: usize,
    #[serde(flatten)]
    result: &'a DispatchResult,
}
