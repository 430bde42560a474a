//! Action gateway seam: how an accepted candidate reaches the user.
//!
//! The primary surface opens the quick-add screen directly. When the host
//! refuses that (app in background, launch restrictions) the caller falls
//! back to a notification the user can tap later.

use serde::{Deserialize, Serialize};

use crate::message::{Amount, CandidateEvent};

pub const NOTIFICATION_CHANNEL_ID: &str = "expense_quick_add";
pub const NOTIFICATION_CHANNEL_NAME: &str = "Quick Add Expense";
const NOTIFICATION_TEXT: &str = "Tap to add expense";
const NOTIFICATION_EMPTY_BODY: &str = "Expense detected from SMS";

/// Result of the primary surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresentOutcome {
    Presented,
    Refused { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// Worth retrying when the same message is observed again.
    Transient,
    /// Retrying the same candidate cannot succeed.
    Permanent,
}

/// Result of the fallback surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackOutcome {
    Presented,
    Failed { kind: FailureKind, reason: String },
}

impl FallbackOutcome {
    /// Terminal outcomes let the caller advance its dedup watermark.
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            FallbackOutcome::Failed {
                kind: FailureKind::Transient,
                ..
            }
        )
    }
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait ActionGateway: Send + Sync {
    /// Open the quick-add surface for `candidate`.
    fn present(&self, candidate: &CandidateEvent) -> PresentOutcome;

    /// Surface `candidate` some other way after [`ActionGateway::present`] was refused.
    fn present_fallback(&self, candidate: &CandidateEvent) -> FallbackOutcome;
}

/// Data the quick-add screen is prefilled with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickAddRequest {
    pub amount: Amount,
    pub sms_body: String,
}

impl QuickAddRequest {
    /// In-app route that opens the quick-add form.
    pub fn route(&self) -> String {
        format!(
            "/quick-add?amount={:?}&smsBody={}",
            self.amount.value(),
            urlencoding::encode(&self.sms_body)
        )
    }

    /// Notification shown when the quick-add screen cannot be opened.
    pub fn notification(&self) -> NotificationPayload {
        let big_text = if self.sms_body.trim().is_empty() {
            NOTIFICATION_EMPTY_BODY.to_string()
        } else {
            self.sms_body.clone()
        };

        NotificationPayload {
            channel_id: NOTIFICATION_CHANNEL_ID.to_string(),
            title: format!("Expense Detected: ₹{}", self.amount),
            text: NOTIFICATION_TEXT.to_string(),
            big_text,
            route: self.route(),
        }
    }
}

impl From<&CandidateEvent> for QuickAddRequest {
    fn from(candidate: &CandidateEvent) -> Self {
        Self {
            amount: candidate.amount,
            sms_body: candidate.body.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub channel_id: String,
    pub title: String,
    pub text: String,
    pub big_text: String,
    /// Route opened when the notification is tapped.
    pub route: String,
}
