use anyhow::{Context, Result};
use chrono::Utc;
use chrono_tz::Tz;
use quickadd_core::time::{format_local_millis, parse_timezone};
use quickadd_core::{Folder, MessageStore, RawMessage, recent_messages};
use quickadd_dispatch::classify_and_extract;
use std::path::PathBuf;

use crate::config::Config;
use crate::file_store::FileMessageStore;

const DUMP_FOLDERS: [Folder; 3] = [Folder::Inbox, Folder::Sent, Folder::Draft];

fn display_tz(cfg: &Config) -> Result<Tz> {
    parse_timezone(&cfg.display.timezone).context("display.timezone in config.toml")
}

fn open_store(cfg: &Config, store: Option<PathBuf>) -> Result<FileMessageStore> {
    Ok(FileMessageStore::new(match store {
        Some(p) => p,
        None => cfg.store_path()?,
    }))
}

fn print_message(m: &RawMessage, tz: Tz) {
    let signals = classify_and_extract(&m.body);
    let amount = signals
        .amount
        .map(|a| format!("₹{a}"))
        .unwrap_or_else(|| "-".to_string());
    println!(
        "[{}] {:<12} {:>10}  {}",
        format_local_millis(m.timestamp, tz),
        m.sender,
        amount,
        m.body.replace('\n', " ")
    );
}

/// Messages from one folder within the last `days_back` days.
pub fn recent(
    cfg: &Config,
    store: Option<PathBuf>,
    folder: Folder,
    limit: usize,
    days_back: i64,
) -> Result<()> {
    let tz = display_tz(cfg)?;
    let store = open_store(cfg, store)?;
    let messages = recent_messages(&store, folder, limit, days_back, Utc::now())
        .with_context(|| format!("read {}", store.path().display()))?;

    if messages.is_empty() {
        println!("No {folder} messages in the last {days_back} days.");
        return Ok(());
    }

    println!("{} {folder} message(s), last {days_back} days:", messages.len());
    for m in &messages {
        print_message(m, tz);
    }
    Ok(())
}

/// Every message in inbox, sent and draft, with per-folder totals.
pub fn dump(cfg: &Config, store: Option<PathBuf>) -> Result<()> {
    let tz = display_tz(cfg)?;
    let store = open_store(cfg, store)?;

    let mut totals = Vec::with_capacity(DUMP_FOLDERS.len());
    for folder in DUMP_FOLDERS {
        let messages = store
            .fetch_recent(folder, usize::MAX)
            .with_context(|| format!("read {} from {}", folder, store.path().display()))?;

        println!("=== {folder} ({}) ===", messages.len());
        for m in &messages {
            print_message(m, tz);
        }
        println!();
        totals.push((folder, messages.len()));
    }

    println!("Totals:");
    for (folder, count) in &totals {
        println!("- {folder}: {count}");
    }
    println!("- overall: {}", totals.iter().map(|(_, c)| c).sum::<usize>());
    Ok(())
}
