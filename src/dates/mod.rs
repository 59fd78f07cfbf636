//! Date normalization: from an arbitrary date-bearing text fragment to a
//! canonical calendar date.
//!
//! Listing pages carry dates in wildly inconsistent shapes — imperial-era
//! Japanese, kanji-delimited Gregorian, mixed-script forms, English month
//! names, bare numerics with assorted separators, full-width digits. The
//! normalizer folds the text once, then walks an ordered list of
//! [`DatePattern`] descriptors and returns the first real calendar date one
//! of them yields. Failure to parse is a legitimate outcome, never an
//! error: the caller gets `None` and keeps the record without a date.

mod patterns;

pub use patterns::{DatePattern, GroupOrder, PatternSpec};

use chrono::NaiveDate;
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

/// Fold input text for matching: NFKC (absorbs full-width digits and
/// punctuation, including the ideographic space), then collapse whitespace
/// runs to a single space and trim.
fn fold(text: &str) -> String {
    let normalized: String = text.nfkc().collect();
    normalized.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Derive a calendar date from `text`, or determine that none can be.
///
/// The caller-supplied `primary` pattern is tried first, then the built-in
/// dialects in precedence order, skipping an exact duplicate of the
/// primary. A pattern that matches but produces an impossible date (month
/// 13, Feb 30) is treated as no match and the walk continues.
pub fn normalize(text: &str, primary: Option<&DatePattern>) -> Option<NaiveDate> {
    let folded = fold(text);
    if folded.is_empty() {
        return None;
    }

    if let Some(pattern) = primary {
        if let Some(date) = pattern.try_extract(&folded) {
            debug!(pattern = pattern.name(), %date, "Derived date");
            return Some(date);
        }
    }

    for pattern in patterns::builtins() {
        if primary.is_some_and(|p| p.regex_str() == pattern.regex_str()) {
            continue;
        }
        if let Some(date) = pattern.try_extract(&folded) {
            debug!(pattern = pattern.name(), %date, "Derived date");
            return Some(date);
        }
    }

    None
}

/// Canonical `YYYY/MM/DD` rendering; re-parsing it with the numeric
/// year-first dialect yields the same date.
pub fn format_ymd(date: NaiveDate) -> String {
    date.format("%Y/%m/%d").to_string()
}
