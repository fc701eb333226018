//! Message and expected-answer canonicalization.
//!
//! Both sides lose the thousands separator, surrounding whitespace and case.
//! The student message is additionally capped so very long replies are
//! treated as free text instead of being scanned for structure.

use serde::{Deserialize, Serialize};

/// Default cap on the student message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 100;

/// Grouping separator removed from both sides ("5,000" == "5000").
pub const THOUSANDS_SEPARATOR: char = ',';

/// Normalized view of one request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedPair {
    pub message: String,
    pub answer: String,
}

impl NormalizedPair {
    pub fn new(student_message: &str, expected_answer: &str, max_message_chars: usize) -> Self {
        Self {
            message: normalize_message(student_message, max_message_chars),
            answer: normalize_text(expected_answer),
        }
    }

    /// Message with every whitespace character removed.
    pub fn compact_message(&self) -> String {
        compact(&self.message)
    }

    /// Expected answer with every whitespace character removed.
    pub fn compact_answer(&self) -> String {
        compact(&self.answer)
    }
}

/// Separator removal, trim and lower-case.
pub fn normalize_text(raw: &str) -> String {
    let without_separator: String = raw.chars().filter(|c| *c != THOUSANDS_SEPARATOR).collect();
    without_separator.trim().to_lowercase()
}

/// `normalize_text` followed by truncation to `max_chars` characters.
/// Trailing whitespace exposed by the cut is trimmed so the result is a fixed point.
pub fn normalize_message(raw: &str, max_chars: usize) -> String {
    let text = normalize_text(raw);
    if text.chars().count() <= max_chars {
        return text;
    }
    let truncated: String = text.chars().take(max_chars).collect();
    truncated.trim_end().to_string()
}

/// Removes all whitespace, including whitespace inside the string.
pub fn compact(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separator_removed_before_trim() {
        assert_eq!(normalize_text("5 ,"), "5");
        assert_eq!(normalize_text(" ,5"), "5");
    }

    #[test]
    fn test_truncation_counts_chars_not_bytes() {
        let message = "é".repeat(120);
        assert_eq!(normalize_message(&message, 100).chars().count(), 100);
    }
}
