//! Keyword classifier: "is this a financial message at all?"
//!
//! Plain substring match against the lowercased body, no word boundaries.
//! Credit-side words are included on purpose; telling expenses apart from
//! noise is the amount gate's job.

pub const EXPENSE_KEYWORDS: [&str; 26] = [
    "debit",
    "debited",
    "spent",
    "paid",
    "purchase",
    "withdrawal",
    "withdrawn",
    "deducted",
    "transaction",
    "payment",
    "purchased",
    "charged",
    "sent",
    "transfer",
    "credited",
    "credit",
    "withdraw",
    "cash",
    "upi",
    "neft",
    "imps",
    "rtgs",
    "bank",
    "account",
    "a/c",
    "ac",
];

/// First keyword (in list order) contained in `body`.
pub fn matched_keyword(body: &str) -> Option<&'static str> {
    if body.is_empty() {
        return None;
    }
    let lowered = body.to_lowercase();
    EXPENSE_KEYWORDS
        .iter()
        .copied()
        .find(|kw| lowered.contains(kw))
}

pub fn is_expense_like(body: &str) -> bool {
    matched_keyword(body).is_some()
}
