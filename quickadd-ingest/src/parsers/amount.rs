//! Amount extraction from free-form bank / wallet SMS text.
//!
//! Observed formats:
//!   "Rs.500 debited from A/c XX1234"
//!   "INR 500 spent on card"
//!   "₹500 paid to merchant"
//!   "500 rs sent via UPI"
//!   "Debit:Rs. 65.00 at Cafe"
//!
//! Rules run in a fixed order against the lowercased body. Each rule only
//! looks at its first match; the first rule that yields a positive amount
//! wins. A numeral that matches but does not parse (non-ASCII digits,
//! overflow) counts as "nothing found" for that rule.

use std::sync::LazyLock;

use quickadd_core::Amount;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

// Marker, optional colon, amount. Word boundary before the letter markers.
static MARKER_THEN_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?:\b(?:rupees?|rs\.?|inr)|₹)",
        r"\s*:?\s*",
        r"(?P<amount>\d+(?:\.\d{2})?)"
    ))
    .expect("marker-then-amount pattern")
});

// Amount, then marker. No boundary on either side of the marker.
static AMOUNT_THEN_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<amount>\d+(?:\.\d{2})?)\s*(?:rs|inr|₹)").expect("amount-then-marker pattern")
});

// "debit:rs. 65.00"
static COLON_MARKER_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r":\s*(?:rs\.?|inr|₹)\s*(?P<amount>\d+(?:\.\d{2})?)")
        .expect("colon-marker-amount pattern")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountRule {
    MarkerThenAmount,
    AmountThenMarker,
    ColonMarkerAmount,
}

impl AmountRule {
    /// Priority order.
    pub const CASCADE: [AmountRule; 3] = [
        AmountRule::MarkerThenAmount,
        AmountRule::AmountThenMarker,
        AmountRule::ColonMarkerAmount,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AmountRule::MarkerThenAmount => "marker_then_amount",
            AmountRule::AmountThenMarker => "amount_then_marker",
            AmountRule::ColonMarkerAmount => "colon_marker_amount",
        }
    }

    fn pattern(&self) -> &'static Regex {
        match self {
            AmountRule::MarkerThenAmount => &MARKER_THEN_AMOUNT,
            AmountRule::AmountThenMarker => &AMOUNT_THEN_MARKER,
            AmountRule::ColonMarkerAmount => &COLON_MARKER_AMOUNT,
        }
    }

    /// Apply this rule alone to already-lowercased text.
    pub fn apply(&self, lowered: &str) -> Option<Amount> {
        let caps = self.pattern().captures(lowered)?;
        let numeral = &caps["amount"];
        match numeral.parse::<f64>() {
            Ok(value) => Amount::new(value),
            Err(e) => {
                debug!(rule = self.name(), numeral, error = %e, "matched numeral did not parse");
                None
            }
        }
    }
}

/// An extracted amount plus the rule that found it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmountMatch {
    pub amount: Amount,
    pub rule: AmountRule,
}

/// Best-guess amount in `body`, or `None` when no rule finds a positive value.
pub fn extract_amount(body: &str) -> Option<Amount> {
    extract_amount_match(body).map(|m| m.amount)
}

pub fn extract_amount_match(body: &str) -> Option<AmountMatch> {
    if body.trim().is_empty() {
        return None;
    }

    let lowered = body.to_lowercase();
    for rule in AmountRule::CASCADE {
        if let Some(amount) = rule.apply(&lowered) {
            debug!(rule = rule.name(), %amount, "extracted amount");
            return Some(AmountMatch { amount, rule });
        }
    }

    debug!("no amount found");
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(body: &str) -> Option<f64> {
        extract_amount(body).map(|a| a.value())
    }

    fn rule(body: &str) -> Option<AmountRule> {
        extract_amount_match(body).map(|m| m.rule)
    }

    #[test]
    fn test_marker_formats() {
        assert_eq!(value("Rs.500"), Some(500.0));
        assert_eq!(value("₹500"), Some(500.0));
        assert_eq!(value("INR 500"), Some(500.0));
        assert_eq!(value("500 rs"), Some(500.0));
        assert_eq!(value("Debit:Rs. 65.00"), Some(65.0));
    }

    #[test]
    fn test_rule_attribution() {
        assert_eq!(rule("Rs.500"), Some(AmountRule::MarkerThenAmount));
        assert_eq!(rule("Debit:Rs. 65.00 at Cafe"), Some(AmountRule::MarkerThenAmount));
        assert_eq!(rule("500 rs sent"), Some(AmountRule::AmountThenMarker));
        assert_eq!(rule("paid 120₹ to shop"), Some(AmountRule::AmountThenMarker));
    }

    #[test]
    fn test_rupee_words_and_colon() {
        assert_eq!(value("Rupees 250 debited"), Some(250.0));
        assert_eq!(value("one rupee: 1 only"), Some(1.0));
        assert_eq!(value("Amt INR: 99.50"), Some(99.5));
    }

    #[test]
    fn test_no_marker_is_absent() {
        assert_eq!(value("OTP is 4521"), None);
        assert_eq!(value("Your meeting is at 10:30"), None);
        assert_eq!(value("Worked 500 hours"), None);
        assert_eq!(value(""), None);
        assert_eq!(value("   "), None);
    }

    #[test]
    fn test_word_boundary_before_marker() {
        // "hours" ends in "rs" but is not a marker
        assert_eq!(value("hours: 12"), None);
    }

    #[test]
    fn test_zero_falls_through_to_next_rule() {
        // first marker-then-amount hit is 0, amount-then-marker finds 50
        assert_eq!(value("Rs 0.00 debited, bal 50 inr"), Some(50.0));
        assert_eq!(rule("Rs 0.00 debited, bal 50 inr"), Some(AmountRule::AmountThenMarker));
    }

    #[test]
    fn test_colon_rule_is_reachable() {
        let body = "Rs 0 cashback. Debit:Rs. 65.00";
        assert_eq!(value(body), Some(65.0));
        assert_eq!(rule(body), Some(AmountRule::ColonMarkerAmount));
    }

    #[test]
    fn test_only_zero_amounts_is_absent() {
        assert_eq!(value("Rs.0 balance"), None);
        assert_eq!(value("INR 0.00"), None);
    }

    #[test]
    fn test_fraction_must_be_two_digits() {
        assert_eq!(value("Rs. 65.5 paid"), Some(65.0));
        assert_eq!(value("Rs. 65.55 paid"), Some(65.55));
    }

    #[test]
    fn test_grouped_thousands_take_leading_group() {
        // digit grouping is not part of the numeral shape
        assert_eq!(value("INR 1,500.00 debited"), Some(1.0));
    }

    #[test]
    fn test_non_ascii_digits_fall_through() {
        // Devanagari digits match \d but do not parse as f64
        assert_eq!(value("Rs. ४५० debited"), None);
        assert_eq!(value("Rs. ४५० debited, Debit:INR 45"), Some(45.0));
    }

    #[test]
    fn test_overflowing_numeral_is_absent() {
        let huge = format!("Rs.{}", "9".repeat(400));
        assert_eq!(value(&huge), None);
    }

    #[test]
    fn test_each_rule_alone() {
        assert_eq!(
            AmountRule::ColonMarkerAmount.apply("debit:rs. 65.00").map(|a| a.value()),
            Some(65.0)
        );
        assert_eq!(AmountRule::ColonMarkerAmount.apply("rs.500"), None);
        assert_eq!(AmountRule::AmountThenMarker.apply("inr 500"), None);
    }
}
