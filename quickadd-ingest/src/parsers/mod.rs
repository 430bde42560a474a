pub mod amount;
pub mod keywords;

pub use amount::{AmountMatch, AmountRule, extract_amount, extract_amount_match};
pub use keywords::{EXPENSE_KEYWORDS, is_expense_like, matched_keyword};
