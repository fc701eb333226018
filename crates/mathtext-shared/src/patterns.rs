//! Numeric sub-format recognition: time, exponent, fraction, decimal.
//!
//! Families are tried in that fixed order and the first one that matches
//! anywhere in the text wins. Matched literals are whitespace-normalized
//! (and otherwise canonicalized per family) and compared by `comparison_key`.

use crate::error::NluError;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;

/// Numeric sub-format families, in match order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternFamily {
    Time,
    Exponent,
    Fraction,
    Decimal,
}

impl PatternFamily {
    pub const ORDER: [PatternFamily; 4] = [
        PatternFamily::Time,
        PatternFamily::Exponent,
        PatternFamily::Fraction,
        PatternFamily::Decimal,
    ];

    fn source(&self) -> &'static str {
        match self {
            // Optional am/pm suffix is matched and dropped.
            Self::Time => r"\b(\d{1,2})\s*:\s*(\d{2})\b(?:\s*[ap]\.?\s?m\b\.?)?",
            Self::Exponent => r"-?\d+(?:\.\d+)?\s*\^\s*-?\d+(?:\.\d+)?",
            Self::Fraction => r"(?:(-?\d+)\s+)?(-?\d+)\s*/\s*(\d+)",
            Self::Decimal => r"-?\d+\s*\.+\s*\d+",
        }
    }

    fn regex(&self) -> Result<&'static Regex, NluError> {
        let compiled: &'static Result<Regex, regex::Error> = match self {
            Self::Time => &*TIME,
            Self::Exponent => &*EXPONENT,
            Self::Fraction => &*FRACTION,
            Self::Decimal => &*DECIMAL,
        };
        compiled.as_ref().map_err(|e| NluError::InvalidPattern(e.clone()))
    }

    fn canonicalize(&self, caps: &Captures<'_>) -> String {
        match self {
            Self::Time => {
                let hour = caps.get(1).map_or("", |m| m.as_str());
                let minutes = caps.get(2).map_or("", |m| m.as_str());
                format!("{}:{}", hour, minutes)
            }
            Self::Exponent => strip_whitespace(&caps[0]),
            Self::Fraction => {
                let numerator = caps.get(2).map_or("", |m| m.as_str());
                let denominator = caps.get(3).map_or("", |m| m.as_str());
                match caps.get(1) {
                    Some(whole) => format!("{} {}/{}", whole.as_str(), numerator, denominator),
                    None => format!("{}/{}", numerator, denominator),
                }
            }
            Self::Decimal => {
                let compact = strip_whitespace(&caps[0]);
                DOT_RUN.replace_all(&compact, ".").into_owned()
            }
        }
    }
}

impl PatternFamily {
    /// Form two literals of this family are compared in. Times ignore
    /// leading zeros on the hour ("09:30" == "9:30").
    pub fn comparison_key(&self, literal: &str) -> String {
        match (self, literal.split_once(':')) {
            (Self::Time, Some((hour, minutes))) => {
                let hour = hour.trim_start_matches('0');
                format!("{}:{}", if hour.is_empty() { "0" } else { hour }, minutes)
            }
            _ => literal.to_string(),
        }
    }
}

impl std::fmt::Display for PatternFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Time => write!(f, "time"),
            Self::Exponent => write!(f, "exponent"),
            Self::Fraction => write!(f, "fraction"),
            Self::Decimal => write!(f, "decimal"),
        }
    }
}

static TIME: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(PatternFamily::Time.source()));
static EXPONENT: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(PatternFamily::Exponent.source()));
static FRACTION: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(PatternFamily::Fraction.source()));
static DECIMAL: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(PatternFamily::Decimal.source()));
static DOT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.+").expect("dot run pattern is valid"));

/// A recognized numeric literal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternMatch {
    pub family: PatternFamily,
    pub literal: String,
}

/// First family match anywhere in `text`.
pub fn find_first(text: &str) -> Result<Option<PatternMatch>, NluError> {
    for family in PatternFamily::ORDER {
        if let Some(caps) = family.regex()?.captures(text) {
            return Ok(Some(PatternMatch {
                family,
                literal: family.canonicalize(&caps),
            }));
        }
    }
    Ok(None)
}

/// Canonical form of an expected answer: if the whole string is one family
/// literal, that family's canonical form; otherwise the whitespace-free text.
pub fn canonical_expected(text: &str) -> Result<String, NluError> {
    let trimmed = text.trim();
    for family in PatternFamily::ORDER {
        if let Some(caps) = family.regex()?.captures(trimmed) {
            if caps[0].len() == trimmed.len() {
                return Ok(family.canonicalize(&caps));
            }
        }
    }
    Ok(strip_whitespace(trimmed))
}

fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}
