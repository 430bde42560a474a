//! quickadd-ingest: amount extraction, keyword classification and the accept/reject gate for SMS bodies.

pub mod normalize;
pub mod parsers;

pub use normalize::{
    KEYWORDLESS_MIN_AMOUNT, Normalized, Rejection, Signals, classify_and_extract, normalize,
};
pub use parsers::{AmountRule, extract_amount, is_expense_like};
