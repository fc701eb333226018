//! Curated lookup tables: answer equivalence classes and navigation keywords.
//!
//! Both tables are built once on first use and are read-only afterwards.
//! Spellings are stored lower-case; lookups expect normalized input.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;

/// Family of an equivalence class. Declaration order is precedence order
/// when several classes match the same message (earlier wins).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerCategory {
    Comparison,
    Weekday,
    Parity,
    Boolean,
    MultipleChoice,
}

/// A canonical answer and the literals accepted as meaning it.
#[derive(Debug, Clone, Serialize)]
pub struct EquivalenceClass {
    pub canonical: &'static str,
    /// Literal reported back in `wrong_answer` verdicts.
    pub display: &'static str,
    pub category: AnswerCategory,
    /// Expected answers this class satisfies, besides `canonical` itself.
    pub accepts: &'static [&'static str],
    pub spellings: &'static [&'static str],
}

impl EquivalenceClass {
    /// True when a student answer in this class satisfies `expected`.
    ///
    /// Spellings describe what a student may type, not what a question may
    /// expect: "1" spells yes, but "ok" does not answer "3 - 2".
    pub fn satisfies(&self, expected: &str) -> bool {
        self.canonical == expected || self.accepts.contains(&expected)
    }
}

const YES_SPELLINGS: &[&str] = &[
    "y", "yah", "yeah", "yes", "ok", "okay", "okey", "sure", "yea", "yh", "ys", "yrs", "yep",
    "yee", "yed", "yesh", "yew", "yex", "yey", "yez", "ready", "proceed", "continue", "t",
    "true", "1",
];

const NO_SPELLINGS: &[&str] = &["n", "nah", "no", "nope", "f", "false", "0"];

const CLASSES: &[EquivalenceClass] = &[
    EquivalenceClass {
        canonical: "yes",
        display: "Yes",
        category: AnswerCategory::Boolean,
        accepts: &["t", "true"],
        spellings: YES_SPELLINGS,
    },
    EquivalenceClass {
        canonical: "no",
        display: "No",
        category: AnswerCategory::Boolean,
        accepts: &["f", "false"],
        spellings: NO_SPELLINGS,
    },
    EquivalenceClass {
        canonical: "even",
        display: "Even",
        category: AnswerCategory::Parity,
        accepts: &[],
        spellings: &["even", "evn"],
    },
    EquivalenceClass {
        canonical: "odd",
        display: "Odd",
        category: AnswerCategory::Parity,
        accepts: &[],
        spellings: &["odd", "od"],
    },
    EquivalenceClass {
        canonical: "monday",
        display: "Monday",
        category: AnswerCategory::Weekday,
        accepts: &[],
        spellings: &["monday", "mon"],
    },
    EquivalenceClass {
        canonical: "tuesday",
        display: "Tuesday",
        category: AnswerCategory::Weekday,
        accepts: &[],
        spellings: &["tuesday", "tue", "tues"],
    },
    EquivalenceClass {
        canonical: "wednesday",
        display: "Wednesday",
        category: AnswerCategory::Weekday,
        accepts: &[],
        spellings: &["wednesday", "wed"],
    },
    EquivalenceClass {
        canonical: "thursday",
        display: "Thursday",
        category: AnswerCategory::Weekday,
        accepts: &[],
        spellings: &["thursday", "thu", "thur", "thurs"],
    },
    EquivalenceClass {
        canonical: "friday",
        display: "Friday",
        category: AnswerCategory::Weekday,
        accepts: &[],
        spellings: &["friday", "fri"],
    },
    EquivalenceClass {
        canonical: "saturday",
        display: "Saturday",
        category: AnswerCategory::Weekday,
        accepts: &[],
        spellings: &["saturday", "sat"],
    },
    EquivalenceClass {
        canonical: "sunday",
        display: "Sunday",
        category: AnswerCategory::Weekday,
        accepts: &[],
        spellings: &["sunday", "sun"],
    },
    EquivalenceClass {
        canonical: ">",
        display: ">",
        category: AnswerCategory::Comparison,
        accepts: &[],
        spellings: &[">", "g", "gt", "greater", "greater than"],
    },
    EquivalenceClass {
        canonical: "<",
        display: "<",
        category: AnswerCategory::Comparison,
        accepts: &[],
        spellings: &["<", "l", "lt", "less", "less than"],
    },
    EquivalenceClass {
        canonical: ">=",
        display: ">=",
        category: AnswerCategory::Comparison,
        accepts: &[],
        spellings: &[">=", "gte", "greater than or equal", "greater than or equal to"],
    },
    EquivalenceClass {
        canonical: "<=",
        display: "<=",
        category: AnswerCategory::Comparison,
        accepts: &[],
        spellings: &["<=", "lte", "less than or equal", "less than or equal to"],
    },
    EquivalenceClass {
        canonical: "=",
        display: "=",
        category: AnswerCategory::Comparison,
        accepts: &[],
        spellings: &["=", "e", "equal", "equals", "same"],
    },
    EquivalenceClass {
        canonical: "a",
        display: "A",
        category: AnswerCategory::MultipleChoice,
        accepts: &[],
        spellings: &["a"],
    },
    EquivalenceClass {
        canonical: "b",
        display: "B",
        category: AnswerCategory::MultipleChoice,
        accepts: &[],
        spellings: &["b"],
    },
    EquivalenceClass {
        canonical: "c",
        display: "C",
        category: AnswerCategory::MultipleChoice,
        accepts: &[],
        spellings: &["c"],
    },
    EquivalenceClass {
        canonical: "d",
        display: "D",
        category: AnswerCategory::MultipleChoice,
        accepts: &[],
        spellings: &["d"],
    },
];

/// Spelling -> equivalence class index.
#[derive(Debug)]
pub struct AnswerEquivalenceTable {
    classes: &'static [EquivalenceClass],
    by_spelling: HashMap<&'static str, usize>,
    max_phrase_words: usize,
}

static ANSWER_TABLE: Lazy<AnswerEquivalenceTable> =
    Lazy::new(|| AnswerEquivalenceTable::from_classes(CLASSES));

impl AnswerEquivalenceTable {
    /// Process-wide table.
    pub fn global() -> &'static AnswerEquivalenceTable {
        &ANSWER_TABLE
    }

    fn from_classes(classes: &'static [EquivalenceClass]) -> Self {
        let mut by_spelling = HashMap::new();
        let mut max_phrase_words = 1;
        for (idx, class) in classes.iter().enumerate() {
            for spelling in class.spellings {
                // First class to claim a spelling keeps it.
                by_spelling.entry(*spelling).or_insert(idx);
                max_phrase_words = max_phrase_words.max(spelling.split_whitespace().count());
            }
        }
        Self {
            classes,
            by_spelling,
            max_phrase_words,
        }
    }

    pub fn lookup(&self, literal: &str) -> Option<&'static EquivalenceClass> {
        let classes = self.classes;
        self.by_spelling.get(literal).map(|idx| &classes[*idx])
    }

    /// Class whose canonical label is `canonical`.
    pub fn class(&self, canonical: &str) -> Option<&'static EquivalenceClass> {
        self.classes.iter().find(|c| c.canonical == canonical)
    }

    /// Longest spelling measured in words (multi-word phrases like "less than").
    pub fn max_phrase_words(&self) -> usize {
        self.max_phrase_words
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

// ============================================================================
// Navigation keywords
// ============================================================================

const KEYWORDS: &[(&str, &[&str])] = &[
    ("menu", &["menu", "manu", "menue", "meun", "menus", "mnu"]),
    ("help", &["help", "hlp", "halp"]),
    ("stop", &["stop", "stp", "stopp"]),
    ("support", &["support", "suport", "supprt"]),
    ("hint", &["hint", "hints", "hnt"]),
];

/// Spelling -> canonical keyword.
#[derive(Debug)]
pub struct KeywordTable {
    by_spelling: HashMap<&'static str, &'static str>,
}

static KEYWORD_TABLE: Lazy<KeywordTable> = Lazy::new(|| KeywordTable::from_entries(KEYWORDS));

impl KeywordTable {
    pub fn global() -> &'static KeywordTable {
        &KEYWORD_TABLE
    }

    fn from_entries(entries: &'static [(&'static str, &'static [&'static str])]) -> Self {
        let mut by_spelling = HashMap::new();
        for (canonical, spellings) in entries {
            for spelling in spellings.iter() {
                by_spelling.entry(*spelling).or_insert(*canonical);
            }
        }
        Self { by_spelling }
    }

    pub fn lookup(&self, literal: &str) -> Option<&'static str> {
        self.by_spelling.get(literal).copied()
    }

    /// Canonical keywords, sorted.
    pub fn canonical_keywords(&self) -> Vec<&'static str> {
        let mut keywords: Vec<&'static str> = KEYWORDS.iter().map(|(k, _)| *k).collect();
        keywords.sort_unstable();
        keywords
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multi_word_phrases_are_counted() {
        assert_eq!(AnswerEquivalenceTable::global().max_phrase_words(), 5);
    }

    #[test]
    fn test_category_precedence_order() {
        assert!(AnswerCategory::Comparison < AnswerCategory::Boolean);
        assert!(AnswerCategory::Boolean < AnswerCategory::MultipleChoice);
    }
}
