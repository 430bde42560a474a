//! Message types shared by the ingest and dispatch crates.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Message folder a raw message was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Folder {
    Inbox,
    Sent,
    Draft,
    /// The combined view over every folder (includes RCS on most devices).
    #[serde(alias = "sms")]
    All,
    #[serde(other)]
    Unknown,
}

impl Folder {
    /// Upper-case label used in log lines.
    pub fn label(&self) -> &'static str {
        match self {
            Folder::Inbox => "INBOX",
            Folder::Sent => "SENT",
            Folder::Draft => "DRAFT",
            Folder::All => "ALL",
            Folder::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Folder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Folder {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "inbox" => Folder::Inbox,
            "sent" => Folder::Sent,
            "draft" => Folder::Draft,
            "all" | "sms" => Folder::All,
            _ => Folder::Unknown,
        })
    }
}

/// One observed message, as handed over by the message store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    #[serde(default = "default_folder")]
    pub folder: Folder,
    /// Originating address; empty when the store did not know it.
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub body: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

fn default_folder() -> Folder {
    Folder::Inbox
}

impl RawMessage {
    pub fn new(
        folder: Folder,
        sender: impl Into<String>,
        body: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            folder,
            sender: sender.into(),
            body: body.into(),
            timestamp,
        }
    }

    /// Convenience for push deliveries, which always land in the inbox.
    pub fn inbox(sender: impl Into<String>, body: impl Into<String>, timestamp: i64) -> Self {
        Self::new(Folder::Inbox, sender, body, timestamp)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("amount must be a positive finite number, got {0}")]
pub struct InvalidAmount(pub f64);

/// A strictly positive, finite monetary amount.
///
/// Zero, negative and non-finite values cannot be represented, so an
/// `Option<Amount>` is the "extracted amount" of a message.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Amount(f64);

impl Amount {
    pub fn new(value: f64) -> Option<Self> {
        if value.is_finite() && value > 0.0 {
            Some(Self(value))
        } else {
            None
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Amount {
    type Error = InvalidAmount;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Amount::new(value).ok_or(InvalidAmount(value))
    }
}

impl From<Amount> for f64 {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// A message accepted as a plausible expense, pending user confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateEvent {
    pub amount: Amount,
    pub body: String,
    pub sender: String,
    pub source_timestamp: i64,
}
