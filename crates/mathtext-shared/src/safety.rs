//! SafetyGate: profanity and stale UI button detection.
//!
//! Runs ahead of every other stage, including for messages too long for
//! the rule stages, and its verdicts are never shadowed by an answer match.

use crate::cascade::{MatchInput, MatchOutcome, Matcher};
use crate::error::NluError;
use crate::verdict::{Verdict, VerdictKind};
use std::collections::HashSet;

pub const PROFANITY_LABEL: &str = "profanity";
pub const OLD_BUTTON_LABEL: &str = "old_button";

/// Whole-token matches.
const PROFANE_WORDS: &[&str] = &[
    "fuck", "fucking", "fucked", "fucker", "fck", "fuk", "shit", "shitty", "bullshit", "bitch",
    "bastard", "asshole", "ass", "arse", "dick", "dickhead", "cunt", "wanker", "twat", "wtf",
    "stfu", "motherfucker", "piss", "pissed", "slut", "whore",
];

/// Substrings that are profane wherever they appear.
const PROFANE_STEMS: &[&str] = &["fuck", "shit", "cunt", "bitch", "motherf"];

/// Button captions from retired client UIs, compared against the whole message.
const OLD_BUTTONS: &[&str] = &[
    "continue",
    "no 😕",
    // Same caption after a mis-decoded UTF-8 round trip in older clients.
    "no ðÿ˜•",
];

#[derive(Debug, Clone)]
pub struct SafetyGate {
    profane_words: HashSet<String>,
    old_buttons: HashSet<String>,
}

impl Default for SafetyGate {
    fn default() -> Self {
        Self::new()
    }
}

impl SafetyGate {
    pub fn new() -> Self {
        Self {
            profane_words: PROFANE_WORDS.iter().map(|w| w.to_string()).collect(),
            old_buttons: OLD_BUTTONS.iter().map(|b| b.to_string()).collect(),
        }
    }

    /// Adds deployment-specific words and button captions (lower-cased).
    pub fn with_extras(mut self, profanity: &[String], old_buttons: &[String]) -> Self {
        self.profane_words
            .extend(profanity.iter().map(|w| w.trim().to_lowercase()));
        self.old_buttons
            .extend(old_buttons.iter().map(|b| b.trim().to_lowercase()));
        self
    }

    pub fn has_profanity(&self, normalized: &str) -> bool {
        let words: Vec<String> = normalized
            .split_whitespace()
            .map(|t| t.chars().filter(|c| c.is_alphanumeric()).collect::<String>())
            .filter(|t| !t.is_empty())
            .collect();

        if words.iter().any(|w| self.is_profane(w)) {
            return true;
        }

        // "f u c k": join runs of single-letter tokens and test the result.
        let mut run = String::new();
        for word in words.iter().chain(std::iter::once(&String::new())) {
            if word.chars().count() == 1 && word.chars().all(char::is_alphabetic) {
                run.push_str(word);
                continue;
            }
            if run.chars().count() > 1 && self.is_profane(&run) {
                return true;
            }
            run.clear();
        }
        false
    }

    pub fn is_old_button(&self, normalized: &str) -> bool {
        self.old_buttons.contains(normalized.trim())
    }

    fn is_profane(&self, word: &str) -> bool {
        self.profane_words.contains(word) || PROFANE_STEMS.iter().any(|s| word.contains(s))
    }
}

impl Matcher for SafetyGate {
    fn name(&self) -> &'static str {
        "safety"
    }

    fn bypasses_length_gate(&self) -> bool {
        true
    }

    fn attempt(&self, input: &MatchInput<'_>) -> Result<MatchOutcome, NluError> {
        let message = &input.pair.message;
        if self.has_profanity(message) {
            return Ok(MatchOutcome::Decided(Verdict::single_event(
                VerdictKind::Intent,
                PROFANITY_LABEL,
            )));
        }
        if self.is_old_button(message) {
            return Ok(MatchOutcome::Decided(Verdict::single_event(
                VerdictKind::Intent,
                OLD_BUTTON_LABEL,
            )));
        }
        Ok(MatchOutcome::Abstain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spaced_letters_detected() {
        let gate = SafetyGate::new();
        assert!(gate.has_profanity("f u c k this math it's 100"));
        assert!(!gate.has_profanity("a b c d"));
    }

    #[test]
    fn test_punctuation_stripped_from_tokens() {
        let gate = SafetyGate::new();
        assert!(gate.has_profanity("this is shit!!"));
        assert!(!gate.has_profanity("class assignment"));
    }
}
