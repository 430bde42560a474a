//! Raw message -> candidate expense decision.

use quickadd_core::{Amount, CandidateEvent, RawMessage};
use serde::Serialize;
use tracing::debug;

use crate::parsers::{AmountRule, extract_amount_match, matched_keyword};

/// Amounts at or above this are accepted even without an expense keyword.
pub const KEYWORDLESS_MIN_AMOUNT: f64 = 1.0;

/// Raw signals for callers that want them without dedup/dispatch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signals {
    pub amount: Option<Amount>,
    pub is_expense_like: bool,
    pub keyword: Option<&'static str>,
    pub rule: Option<AmountRule>,
}

pub fn classify_and_extract(body: &str) -> Signals {
    let found = extract_amount_match(body);
    let keyword = matched_keyword(body);
    Signals {
        amount: found.map(|m| m.amount),
        is_expense_like: keyword.is_some(),
        keyword,
        rule: found.map(|m| m.rule),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Rejection {
    NoAmount,
    BelowThreshold { amount: Amount },
}

impl Rejection {
    pub fn describe(&self) -> &'static str {
        match self {
            Rejection::NoAmount => "no amount",
            Rejection::BelowThreshold { .. } => "amount below threshold and no expense keyword",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Accepted(CandidateEvent),
    Rejected(Rejection),
}

impl Normalized {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Normalized::Accepted(_))
    }
}

/// Decide whether `raw` is a candidate expense.
///
/// Accepts when an amount was found and either an expense keyword is present
/// or the amount is at least [`KEYWORDLESS_MIN_AMOUNT`]. Small keyword-less
/// amounts are usually OTP fragments or promo noise.
pub fn normalize(raw: &RawMessage) -> Normalized {
    let Some(found) = extract_amount_match(&raw.body) else {
        debug!(timestamp = raw.timestamp, folder = %raw.folder, "rejected: no amount");
        return Normalized::Rejected(Rejection::NoAmount);
    };

    let keyword = matched_keyword(&raw.body);
    let amount = found.amount;

    if keyword.is_none() && amount.value() < KEYWORDLESS_MIN_AMOUNT {
        debug!(
            timestamp = raw.timestamp,
            folder = %raw.folder,
            %amount,
            "rejected: amount below threshold and no expense keyword"
        );
        return Normalized::Rejected(Rejection::BelowThreshold { amount });
    }

    debug!(
        timestamp = raw.timestamp,
        folder = %raw.folder,
        %amount,
        rule = found.rule.name(),
        keyword = keyword.unwrap_or("-"),
        "accepted candidate expense"
    );

    Normalized::Accepted(CandidateEvent {
        amount,
        body: raw.body.clone(),
        sender: raw.sender.clone(),
        source_timestamp: raw.timestamp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(body: &str, ts: i64) -> RawMessage {
        RawMessage::inbox("VM-HDFCBK", body, ts)
    }

    #[test]
    fn test_debit_is_accepted() {
        match normalize(&msg("Debit:Rs. 65.00 at Cafe", 1000)) {
            Normalized::Accepted(c) => {
                assert_eq!(c.amount.value(), 65.0);
                assert_eq!(c.source_timestamp, 1000);
                assert_eq!(c.sender, "VM-HDFCBK");
            }
            other => panic!("expected acceptance, got {other:?}"),
        }
    }

    #[test]
    fn test_otp_has_no_amount() {
        assert_eq!(
            normalize(&msg("OTP is 4521", 2000)),
            Normalized::Rejected(Rejection::NoAmount)
        );
    }

    #[test]
    fn test_keywordless_large_amount_accepted() {
        let n = normalize(&msg("You received Rs.200 cashback", 3000));
        assert!(n.is_accepted());

        let body = "Your order of Rs.349 is confirmed";
        assert_eq!(matched_keyword(body), None);
        assert!(normalize(&msg(body, 3001)).is_accepted());
    }

    #[test]
    fn test_keywordless_small_amount_rejected() {
        let n = normalize(&msg("Get Rs.0.50 off today", 4000));
        assert_eq!(
            n,
            Normalized::Rejected(Rejection::BelowThreshold {
                amount: Amount::new(0.5).unwrap()
            })
        );
    }

    #[test]
    fn test_threshold_is_inclusive() {
        assert!(normalize(&msg("Rs.1.00 reward", 5000)).is_accepted());
    }

    #[test]
    fn test_keyword_accepts_small_amount() {
        assert!(normalize(&msg("Rs.0.50 debited as fee", 6000)).is_accepted());
    }

    #[test]
    fn test_empty_body() {
        assert_eq!(
            normalize(&RawMessage::inbox("", "", 7000)),
            Normalized::Rejected(Rejection::NoAmount)
        );
    }

    #[test]
    fn test_classify_and_extract_signals() {
        let s = classify_and_extract("INR 500 spent via UPI");
        assert_eq!(s.amount.map(|a| a.value()), Some(500.0));
        assert!(s.is_expense_like);
        assert_eq!(s.keyword, Some("spent"));
        assert_eq!(s.rule, Some(AmountRule::MarkerThenAmount));

        let none = classify_and_extract("hello");
        assert_eq!(none.amount, None);
        assert!(!none.is_expense_like);
    }

    #[test]
    fn test_rejection_descriptions() {
        assert_eq!(Rejection::NoAmount.describe(), "no amount");
    }
}
