//! Numeric parsing: float and integer literals plus spelled-out number words.
//!
//! Parsers return `None` when the text is not a number; no value is reserved
//! as an error code.

use once_cell::sync::Lazy;
use regex::Regex;

/// A number recovered from student text.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedNumber {
    Integer(i64),
    /// Keeps the literal so "102.0" is reported as typed.
    Float { value: f64, literal: String },
}

impl ParsedNumber {
    pub fn as_f64(&self) -> f64 {
        match self {
            ParsedNumber::Integer(v) => *v as f64,
            ParsedNumber::Float { value, .. } => *value,
        }
    }

    /// String carried as verdict data.
    pub fn display(&self) -> String {
        match self {
            ParsedNumber::Integer(v) => v.to_string(),
            ParsedNumber::Float { literal, .. } => literal.clone(),
        }
    }

    pub fn numerically_equals(&self, other: &ParsedNumber) -> bool {
        match (self, other) {
            (ParsedNumber::Integer(a), ParsedNumber::Integer(b)) => a == b,
            _ => self.as_f64() == other.as_f64(),
        }
    }
}

//=============================================================================
// Literals
//=============================================================================

/// Parses a float literal. Integers come back as `Integer`.
/// Rejects `inf`/`nan` spellings and anything without a digit.
pub fn parse_float_literal(text: &str) -> Option<ParsedNumber> {
    let text = text.trim();
    if !text.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    if let Ok(v) = text.parse::<i64>() {
        return Some(ParsedNumber::Integer(v));
    }
    let value = text.parse::<f64>().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(ParsedNumber::Float {
        value,
        literal: text.to_string(),
    })
}

/// Parses an integer literal or a phrase made only of number words.
pub fn parse_integer(text: &str) -> Option<ParsedNumber> {
    let text = text.trim();
    if let Ok(v) = text.parse::<i64>() {
        return Some(ParsedNumber::Integer(v));
    }
    let tokens: Vec<&str> = text.split_whitespace().map(strip_trailing_punct).collect();
    if tokens.is_empty() {
        return None;
    }
    let (value, consumed) = words_to_number(&tokens, 0)?;
    if consumed == tokens.len() {
        Some(ParsedNumber::Integer(value))
    } else {
        None
    }
}

/// Float first, then integer (including number words).
pub fn parse_canonical_number(text: &str) -> Option<ParsedNumber> {
    parse_float_literal(text).or_else(|| parse_integer(text))
}

static NUMERIC_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-?\d+(?:\.\d+)?").expect("numeric literal pattern is valid"));

/// First number mentioned anywhere in `text`: a digit literal, else a run of number words.
pub fn first_number_in(text: &str) -> Option<ParsedNumber> {
    if let Some(m) = NUMERIC_LITERAL.find(text) {
        return parse_float_literal(m.as_str());
    }
    let tokens: Vec<&str> = text.split_whitespace().map(strip_trailing_punct).collect();
    (0..tokens.len()).find_map(|start| {
        words_to_number(&tokens, start).map(|(value, _)| ParsedNumber::Integer(value))
    })
}

fn strip_trailing_punct(word: &str) -> &str {
    word.trim_end_matches(|c: char| matches!(c, '.' | ',' | ';' | ':' | '!' | '?'))
}

//=============================================================================
// Number words
//=============================================================================

const ONES: &[(&str, i64)] = &[
    ("zero", 0),
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
    ("ten", 10),
    ("eleven", 11),
    ("twelve", 12),
    ("thirteen", 13),
    ("fourteen", 14),
    ("fifteen", 15),
    ("sixteen", 16),
    ("seventeen", 17),
    ("eighteen", 18),
    ("nineteen", 19),
];

const TENS: &[(&str, i64)] = &[
    ("twenty", 20),
    ("thirty", 30),
    ("forty", 40),
    ("fifty", 50),
    ("sixty", 60),
    ("seventy", 70),
    ("eighty", 80),
    ("ninety", 90),
];

const MAGNITUDES: &[(&str, i64)] = &[
    ("thousand", 1_000),
    ("million", 1_000_000),
    ("billion", 1_000_000_000),
];

fn parse_ones(w: &str) -> Option<i64> {
    ONES.iter().find(|(name, _)| *name == w).map(|(_, v)| *v)
}

fn parse_tens(w: &str) -> Option<i64> {
    TENS.iter().find(|(name, _)| *name == w).map(|(_, v)| *v)
}

fn parse_magnitude(w: &str) -> Option<i64> {
    MAGNITUDES.iter().find(|(name, _)| *name == w).map(|(_, v)| *v)
}

/// "twenty-three"
fn parse_hyphenated(w: &str) -> Option<i64> {
    let (left, right) = w.split_once('-')?;
    let tens = parse_tens(left)?;
    let ones = parse_ones(right)?;
    (1..=9).contains(&ones).then_some(tens + ones)
}

/// Ones, teens, tens, or a tens+ones compound. Returns (value, words consumed).
fn parse_small(words: &[&str], start: usize) -> Option<(i64, usize)> {
    let word = *words.get(start)?;
    if let Some(v) = parse_hyphenated(word) {
        return Some((v, 1));
    }
    if let Some(tens) = parse_tens(word) {
        if let Some(ones) = words.get(start + 1).and_then(|w| parse_ones(w)) {
            if (1..=9).contains(&ones) {
                return Some((tens + ones, 2));
            }
        }
        return Some((tens, 1));
    }
    parse_ones(word).map(|v| (v, 1))
}

/// Parses the longest number-word phrase starting at `start`.
/// "three hundred and forty two thousand" = 342_000. A leading
/// "minus"/"negative" negates. Returns (value, words consumed).
pub fn words_to_number(words: &[&str], start: usize) -> Option<(i64, usize)> {
    let mut i = start;
    let negative = matches!(words.get(i), Some(&"minus") | Some(&"negative"));
    if negative {
        i += 1;
    }

    let mut total: i64 = 0;
    let mut current: i64 = 0;
    let mut found_any = false;
    let mut end = i;

    while i < words.len() {
        let word = words[i];

        if word == "and" && found_any {
            if parse_small(words, i + 1).is_some() {
                i += 1;
                continue;
            }
            break;
        }

        if found_any {
            if word == "hundred" && current > 0 {
                current = current.checked_mul(100)?;
                i += 1;
                end = i;
                continue;
            }
            if let Some(scale) = parse_magnitude(word) {
                let group = if current == 0 { 1 } else { current };
                total = total.checked_add(group.checked_mul(scale)?)?;
                current = 0;
                i += 1;
                end = i;
                continue;
            }
        }

        match parse_small(words, i) {
            Some((value, consumed)) => {
                // "twenty thirty" is two numbers, not one
                if found_any && current % 100 != 0 && value < 100 {
                    break;
                }
                current = current.checked_add(value)?;
                found_any = true;
                i += consumed;
                end = i;
            }
            None => break,
        }
    }

    if !found_any {
        return None;
    }
    let value = total.checked_add(current)?;
    Some((if negative { -value } else { value }, end - start))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hyphenated_compound() {
        assert_eq!(parse_hyphenated("twenty-three"), Some(23));
        assert_eq!(parse_hyphenated("twenty-ten"), None);
    }

    #[test]
    fn test_words_stop_at_non_number() {
        let words = ["five", "apples"];
        assert_eq!(words_to_number(&words, 0), Some((5, 1)));
    }

    #[test]
    fn test_trailing_and_not_consumed() {
        let words = ["two", "and", "apples"];
        assert_eq!(words_to_number(&words, 0), Some((2, 1)));
    }
}
