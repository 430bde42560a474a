//! Desktop gateway: a launcher command opens the quick-add route, and a JSONL
//! outbox stands in for the notification tray.

use quickadd_core::{
    ActionGateway, CandidateEvent, FailureKind, FallbackOutcome, PresentOutcome, QuickAddRequest,
};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::{debug, info};

use crate::config::Config;

pub struct CommandGateway {
    launcher: Option<String>,
    launcher_args: Vec<String>,
    outbox: PathBuf,
}

impl CommandGateway {
    pub fn new(launcher: Option<String>, launcher_args: Vec<String>, outbox: PathBuf) -> Self {
        Self {
            launcher,
            launcher_args,
            outbox,
        }
    }

    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(
            cfg.gateway.launcher_command.clone(),
            cfg.gateway.launcher_args.clone(),
            cfg.outbox_path()?,
        ))
    }

    fn append_outbox(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.outbox.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.outbox)?;
        writeln!(f, "{line}")
    }
}

impl ActionGateway for CommandGateway {
    fn present(&self, candidate: &CandidateEvent) -> PresentOutcome {
        let Some(launcher) = self.launcher.as_deref().filter(|s| !s.trim().is_empty()) else {
            return PresentOutcome::Refused {
                reason: "no launcher_command configured".to_string(),
            };
        };

        let bin = match which::which(launcher) {
            Ok(p) => p,
            Err(_) => {
                return PresentOutcome::Refused {
                    reason: format!("{launcher} not found on PATH"),
                };
            }
        };

        let route = QuickAddRequest::from(candidate).route();
        debug!(launcher = %bin.display(), %route, "launching quick-add");

        let status = Command::new(&bin)
            .args(&self.launcher_args)
            .arg(&route)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .status();

        match status {
            Ok(s) if s.success() => PresentOutcome::Presented,
            Ok(s) => PresentOutcome::Refused {
                reason: format!("{launcher} exited with {s}"),
            },
            Err(e) => PresentOutcome::Refused {
                reason: format!("{launcher} failed to start: {e}"),
            },
        }
    }

    fn present_fallback(&self, candidate: &CandidateEvent) -> FallbackOutcome {
        let payload = QuickAddRequest::from(candidate).notification();
        let line = match serde_json::to_string(&payload) {
            Ok(s) => s,
            Err(e) => {
                return FallbackOutcome::Failed {
                    kind: FailureKind::Permanent,
                    reason: format!("serialize notification: {e}"),
                };
            }
        };

        match self.append_outbox(&line) {
            Ok(()) => {
                info!(outbox = %self.outbox.display(), title = %payload.title, "notification queued");
                FallbackOutcome::Presented
            }
            Err(e) => FallbackOutcome::Failed {
                kind: FailureKind::Transient,
                reason: format!("write {}: {e}", self.outbox.display()),
            },
        }
    }
}
