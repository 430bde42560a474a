use anyhow::{Context, Result};
use quickadd_core::{Folder, gateway};
use quickadd_dispatch::WatchConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::state::{default_outbox_path, default_store_path, ensure_quickadd_home, quickadd_home};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineSection,
    #[serde(default)]
    pub gateway: GatewaySection,
    #[serde(default)]
    pub display: DisplaySection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    /// Folders re-read on every content-change notification.
    pub watched_folders: Vec<Folder>,
    /// Most-recent messages read per folder.
    pub per_folder_limit: usize,
    /// Wait after a store change before re-reading it.
    pub settle_delay_ms: u64,
    /// Message store file (.jsonl or .csv). Defaults to ~/.quickadd/messages.jsonl
    pub store_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewaySection {
    /// Command that opens the quick-add screen; receives the route as last argument.
    pub launcher_command: Option<String>,
    pub launcher_args: Vec<String>,
    /// Fallback notification outbox. Defaults to ~/.quickadd/notifications.jsonl
    pub outbox_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySection {
    pub timezone: String,
    pub log_level: String,
}

impl Default for EngineSection {
    fn default() -> Self {
        let watch = WatchConfig::default();
        Self {
            watched_folders: watch.folders,
            per_folder_limit: watch.per_folder_limit,
            settle_delay_ms: 1000,
            store_file: None,
        }
    }
}

impl Default for DisplaySection {
    fn default() -> Self {
        Self {
            timezone: "Asia/Kolkata".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn watch_config(&self) -> WatchConfig {
        WatchConfig {
            folders: self.engine.watched_folders.clone(),
            per_folder_limit: self.engine.per_folder_limit,
        }
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.engine.settle_delay_ms)
    }

    pub fn store_path(&self) -> Result<PathBuf> {
        match &self.engine.store_file {
            Some(p) => Ok(p.clone()),
            None => default_store_path(),
        }
    }

    pub fn outbox_path(&self) -> Result<PathBuf> {
        match &self.gateway.outbox_file {
            Some(p) => Ok(p.clone()),
            None => default_outbox_path(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(quickadd_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    parse_config(&s)
}

pub fn parse_config(s: &str) -> Result<Config> {
    toml::from_str(s).context("parse config.toml")
}

pub fn save_config(cfg: &Config) -> Result<()> {
    ensure_quickadd_home()?;
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

pub fn config_check() -> Result<()> {
    let cfg = load_config()?;

    println!("QuickAdd config ({}):\n", config_path()?.display());
    let folders: Vec<&str> = cfg.engine.watched_folders.iter().map(|f| f.label()).collect();
    println!("- watched_folders: {}", folders.join(", "));
    println!("- per_folder_limit: {}", cfg.engine.per_folder_limit);
    println!("- settle_delay_ms: {}", cfg.engine.settle_delay_ms);
    println!("- store_file: {}", cfg.store_path()?.display());
    println!(
        "- launcher_command: {}",
        cfg.gateway.launcher_command.as_deref().unwrap_or("<not set>")
    );
    println!("- outbox_file: {}", cfg.outbox_path()?.display());
    println!(
        "- notification channel: {} ({})",
        gateway::NOTIFICATION_CHANNEL_NAME,
        gateway::NOTIFICATION_CHANNEL_ID
    );
    println!("- timezone: {}", cfg.display.timezone);
    println!("- log_level: {}", cfg.display.log_level);

    if quickadd_core::time::parse_timezone(&cfg.display.timezone).is_err() {
        println!("\nWarning: timezone {:?} is not a valid IANA name", cfg.display.timezone);
    }

    if cfg.gateway.launcher_command.is_none() {
        println!("\nNo launcher configured: every prompt goes to the notification outbox.");
        println!("Set ~/.quickadd/config.toml:");
        println!("[gateway]");
        println!("launcher_command = \"xdg-open\"");
        println!("launcher_args = []");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let cfg = parse_config(
            r#"
[engine]
per_folder_limit = 25

[gateway]
launcher_command = "xdg-open"
"#,
        )
        .unwrap();

        assert_eq!(cfg.engine.per_folder_limit, 25);
        assert_eq!(cfg.engine.settle_delay_ms, 1000);
        assert_eq!(
            cfg.engine.watched_folders,
            vec![Folder::Inbox, Folder::Sent, Folder::All]
        );
        assert_eq!(cfg.gateway.launcher_command.as_deref(), Some("xdg-open"));
        assert_eq!(cfg.display.timezone, "Asia/Kolkata");
    }

    #[test]
    fn test_default_round_trips_through_toml() {
        let s = toml::to_string_pretty(&Config::default()).unwrap();
        let cfg = parse_config(&s).unwrap();
        assert_eq!(cfg.watch_config(), WatchConfig::default());
        assert_eq!(cfg.settle_delay(), Duration::from_millis(1000));
    }

    #[test]
    fn test_folders_parse_from_strings() {
        let cfg = parse_config("[engine]\nwatched_folders = [\"inbox\", \"draft\"]\n").unwrap();
        assert_eq!(cfg.engine.watched_folders, vec![Folder::Inbox, Folder::Draft]);

        let cfg = parse_config("[engine]\nwatched_folders = [\"sms\"]\n").unwrap();
        assert_eq!(cfg.engine.watched_folders, vec![Folder::All]);
    }
}
