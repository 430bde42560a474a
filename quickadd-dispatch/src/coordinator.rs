//! Dispatch coordinator: one batch in, at most one quick-add prompt out.
//!
//! Flow per batch (most recent message first):
//! 1. Skip messages at or below the dedup watermark
//! 2. Normalize; rejected messages leave the watermark alone
//! 3. Present the first accepted candidate, falling back to a notification
//! 4. Advance the watermark on a terminal outcome and stop
//!
//! Only the first qualifying message of a batch is surfaced. Older
//! qualifying messages in the same batch are left behind and will read as
//! "already processed" once the watermark moves past them.

use std::sync::Arc;

use quickadd_core::{
    ActionGateway, Amount, CandidateEvent, DedupClaim, DedupTracker, FailureKind,
    FallbackOutcome, PresentOutcome, RawMessage,
};
use quickadd_ingest::{Normalized, Rejection, normalize};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    QuickAdd,
    Notification,
}

/// What was handed to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchedEvent {
    pub amount: Amount,
    pub body: String,
    pub timestamp_millis: i64,
    pub surface: Surface,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchReason {
    /// The quick-add screen was opened.
    Presented,
    /// The quick-add screen was refused; the notification went out.
    PresentedViaFallback,
    /// Both surfaces failed for good. The watermark moved anyway.
    FallbackFailedPermanent,
    /// Both surfaces failed, fallback may succeed later. Watermark unchanged.
    FallbackFailedTransient,
    /// Every message was at or below the watermark.
    NoNewMessages,
    /// New messages were seen but none qualified.
    NoCandidate,
    EmptyBatch,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    pub scanned: usize,
    pub duplicates: usize,
    pub rejected_no_amount: usize,
    pub rejected_below_threshold: usize,
}

impl BatchStats {
    fn record(&mut self, rejection: Rejection) {
        match rejection {
            Rejection::NoAmount => self.rejected_no_amount += 1,
            Rejection::BelowThreshold { .. } => self.rejected_below_threshold += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchResult {
    pub dispatched: Option<DispatchedEvent>,
    pub reason: DispatchReason,
    /// Whether this batch moved the dedup watermark.
    pub advanced: bool,
    pub stats: BatchStats,
}

/// Owns the dedup watermark; share it between notification paths with `Arc`.
pub struct Coordinator {
    tracker: DedupTracker,
    gateway: Arc<dyn ActionGateway>,
}

impl Coordinator {
    pub fn new(gateway: Arc<dyn ActionGateway>) -> Self {
        Self::with_tracker(gateway, DedupTracker::new())
    }

    pub fn with_tracker(gateway: Arc<dyn ActionGateway>, tracker: DedupTracker) -> Self {
        Self { tracker, gateway }
    }

    pub fn last_accepted(&self) -> i64 {
        self.tracker.last_accepted()
    }

    /// Process one batch, most recent message first.
    #[instrument(skip_all, fields(batch_size = batch.len()))]
    pub fn handle_batch(&self, batch: &[RawMessage]) -> DispatchResult {
        let mut stats = BatchStats::default();

        if batch.is_empty() {
            return DispatchResult {
                dispatched: None,
                reason: DispatchReason::EmptyBatch,
                advanced: false,
                stats,
            };
        }

        for raw in batch {
            stats.scanned += 1;

            let Some(claim) = self.tracker.claim(raw.timestamp) else {
                stats.duplicates += 1;
                debug!(
                    timestamp = raw.timestamp,
                    folder = %raw.folder,
                    last_accepted = self.tracker.last_accepted(),
                    "already processed"
                );
                continue;
            };

            match normalize(raw) {
                Normalized::Accepted(candidate) => {
                    return self.dispatch(claim, candidate, stats);
                }
                Normalized::Rejected(rejection) => {
                    stats.record(rejection);
                    debug!(
                        timestamp = raw.timestamp,
                        reason = rejection.describe(),
                        "skipping message"
                    );
                }
            }
        }

        let reason = if stats.duplicates == stats.scanned {
            DispatchReason::NoNewMessages
        } else {
            DispatchReason::NoCandidate
        };
        debug!(?reason, ?stats, "batch finished without dispatch");

        DispatchResult {
            dispatched: None,
            reason,
            advanced: false,
            stats,
        }
    }

    fn dispatch(
        &self,
        claim: DedupClaim<'_>,
        candidate: CandidateEvent,
        stats: BatchStats,
    ) -> DispatchResult {
        let timestamp = claim.timestamp();

        let (reason, surface) = match self.gateway.present(&candidate) {
            PresentOutcome::Presented => (DispatchReason::Presented, Some(Surface::QuickAdd)),
            PresentOutcome::Refused { reason } => {
                warn!(timestamp, %reason, "quick-add launch refused, falling back to notification");
                match self.gateway.present_fallback(&candidate) {
                    FallbackOutcome::Presented => (
                        DispatchReason::PresentedViaFallback,
                        Some(Surface::Notification),
                    ),
                    FallbackOutcome::Failed { kind, reason } => {
                        warn!(timestamp, ?kind, %reason, "fallback notification failed");
                        match kind {
                            FailureKind::Permanent => {
                                (DispatchReason::FallbackFailedPermanent, None)
                            }
                            FailureKind::Transient => {
                                (DispatchReason::FallbackFailedTransient, None)
                            }
                        }
                    }
                }
            }
        };

        let advanced = reason != DispatchReason::FallbackFailedTransient;
        if advanced {
            claim.commit();
        } else {
            drop(claim);
        }

        if let Some(surface) = surface {
            info!(
                timestamp,
                amount = %candidate.amount,
                ?surface,
                "expense prompt dispatched"
            );
        }

        DispatchResult {
            dispatched: surface.map(|surface| DispatchedEvent {
                amount: candidate.amount,
                body: candidate.body,
                timestamp_millis: candidate.source_timestamp,
                surface,
            }),
            reason,
            advanced,
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickadd_core::MockActionGateway;

    fn msg(body: &str, ts: i64) -> RawMessage {
        RawMessage::inbox("VM-HDFCBK", body, ts)
    }

    fn presenting_gateway(times: usize) -> MockActionGateway {
        let mut gw = MockActionGateway::new();
        gw.expect_present()
            .times(times)
            .returning(|_| PresentOutcome::Presented);
        gw.expect_present_fallback().never();
        gw
    }

    fn refusing_gateway(fallback: FallbackOutcome) -> MockActionGateway {
        let mut gw = MockActionGateway::new();
        gw.expect_present().times(1).returning(|_| PresentOutcome::Refused {
            reason: "background launch blocked".to_string(),
        });
        gw.expect_present_fallback()
            .times(1)
            .returning(move |_| fallback.clone());
        gw
    }

    #[test]
    fn test_debit_dispatches_and_advances() {
        let coord = Coordinator::new(Arc::new(presenting_gateway(1)));
        let res = coord.handle_batch(&[msg("Debit:Rs. 65.00 at Cafe", 1000)]);

        let ev = res.dispatched.unwrap();
        assert_eq!(ev.amount.value(), 65.0);
        assert_eq!(ev.timestamp_millis, 1000);
        assert_eq!(ev.surface, Surface::QuickAdd);
        assert_eq!(res.reason, DispatchReason::Presented);
        assert!(res.advanced);
        assert_eq!(coord.last_accepted(), 1000);
    }

    #[test]
    fn test_otp_does_not_dispatch() {
        let coord = Coordinator::new(Arc::new(presenting_gateway(0)));
        let before = coord.last_accepted();
        let res = coord.handle_batch(&[msg("OTP is 4521", 2000)]);

        assert!(res.dispatched.is_none());
        assert_eq!(res.reason, DispatchReason::NoCandidate);
        assert_eq!(res.stats.rejected_no_amount, 1);
        assert_eq!(coord.last_accepted(), before);
    }

    #[test]
    fn test_cashback_dispatches() {
        let coord = Coordinator::new(Arc::new(presenting_gateway(1)));
        let res = coord.handle_batch(&[msg("You received Rs.200 cashback", 3000)]);
        assert_eq!(res.dispatched.unwrap().amount.value(), 200.0);
    }

    #[test]
    fn test_same_batch_twice_is_idempotent() {
        let coord = Coordinator::new(Arc::new(presenting_gateway(1)));
        let batch = [msg("Rs.500 debited", 5000), msg("Rs.20 debited", 4000)];

        assert!(coord.handle_batch(&batch).dispatched.is_some());
        let second = coord.handle_batch(&batch);
        assert!(second.dispatched.is_none());
        assert_eq!(second.reason, DispatchReason::NoNewMessages);
        assert_eq!(second.stats.duplicates, 2);
    }

    #[test]
    fn test_only_first_qualifying_message_dispatched() {
        let mut gw = MockActionGateway::new();
        gw.expect_present()
            .times(1)
            .withf(|c: &CandidateEvent| c.source_timestamp == 9000)
            .returning(|_| PresentOutcome::Presented);
        let coord = Coordinator::new(Arc::new(gw));

        let res = coord.handle_batch(&[
            msg("OTP is 1234", 9500),
            msg("INR 300 spent at Store", 9000),
            msg("INR 700 spent at Other", 8000),
        ]);

        assert_eq!(res.dispatched.unwrap().timestamp_millis, 9000);
        assert_eq!(res.stats.scanned, 2);
        assert_eq!(res.stats.rejected_no_amount, 1);
        assert_eq!(coord.last_accepted(), 9000);
    }

    #[test]
    fn test_fallback_success_advances() {
        let coord = Coordinator::new(Arc::new(refusing_gateway(FallbackOutcome::Presented)));
        let res = coord.handle_batch(&[msg("Rs.120 paid", 1000)]);

        assert_eq!(res.reason, DispatchReason::PresentedViaFallback);
        assert_eq!(res.dispatched.unwrap().surface, Surface::Notification);
        assert_eq!(coord.last_accepted(), 1000);
    }

    #[test]
    fn test_transient_fallback_failure_keeps_watermark() {
        let coord = Coordinator::new(Arc::new(refusing_gateway(FallbackOutcome::Failed {
            kind: FailureKind::Transient,
            reason: "outbox busy".to_string(),
        })));
        let res = coord.handle_batch(&[msg("Rs.120 paid", 1000)]);

        assert_eq!(res.reason, DispatchReason::FallbackFailedTransient);
        assert!(res.dispatched.is_none());
        assert!(!res.advanced);
        assert!(coord.tracker.is_new(1000));
    }

    #[test]
    fn test_permanent_fallback_failure_advances() {
        let coord = Coordinator::new(Arc::new(refusing_gateway(FallbackOutcome::Failed {
            kind: FailureKind::Permanent,
            reason: "notifications disabled".to_string(),
        })));
        let res = coord.handle_batch(&[msg("Rs.120 paid", 1000)]);

        assert_eq!(res.reason, DispatchReason::FallbackFailedPermanent);
        assert!(res.dispatched.is_none());
        assert!(res.advanced);
        assert_eq!(coord.last_accepted(), 1000);
    }

    #[test]
    fn test_empty_batch() {
        let coord = Coordinator::new(Arc::new(presenting_gateway(0)));
        assert_eq!(coord.handle_batch(&[]).reason, DispatchReason::EmptyBatch);
    }

    #[test]
    fn test_older_message_after_advance_is_duplicate() {
        let coord = Coordinator::with_tracker(
            Arc::new(presenting_gateway(0)),
            DedupTracker::starting_at(10_000),
        );
        let res = coord.handle_batch(&[msg("Rs.50 debited", 9_999)]);
        assert_eq!(res.reason, DispatchReason::NoNewMessages);
    }

    #[test]
    fn test_watermark_never_decreases() {
        let coord = Coordinator::new(Arc::new(presenting_gateway(2)));
        let mut last = coord.last_accepted();
        for batch in [
            vec![msg("Rs.10 debited", 3000)],
            vec![msg("Rs.10 debited", 1000)],
            vec![msg("OTP 5521", 4000)],
            vec![msg("Rs.99 spent", 5000), msg("Rs.1 spent", 2000)],
        ] {
            coord.handle_batch(&batch);
            assert!(coord.last_accepted() >= last);
            last = coord.last_accepted();
        }
        assert_eq!(last, 5000);
    }
}
