//! Token-level lookups against the answer-equivalence and keyword tables.

use crate::cascade::{answer, MatchInput, MatchOutcome, Matcher};
use crate::error::NluError;
use crate::numbers::parse_canonical_number;
use crate::tables::{AnswerEquivalenceTable, EquivalenceClass, KeywordTable};
use crate::verdict::VerdictKind;

/// Whitespace tokens with emphasis markers, quotes and trailing punctuation removed.
pub fn tokenize(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .map(clean_token)
        .filter(|t| !t.is_empty())
        .collect()
}

/// "*yes*" -> "yes", "ok!!" -> "ok", "(c)" -> "c".
pub fn clean_token(token: &str) -> &str {
    token
        .trim_start_matches(|c: char| matches!(c, '*' | '_' | '~' | '"' | '\'' | '(' | '['))
        .trim_end_matches(|c: char| {
            matches!(
                c,
                '*' | '_' | '~' | '"' | '\'' | ')' | ']' | '.' | ',' | '!' | '?' | ';' | ':'
            )
        })
}

// ============================================================================
// PhraseAnswerExtractor
// ============================================================================

/// Finds answer-shaped tokens (yes/no, weekdays, comparisons, letters...).
///
/// Resolution order:
/// 1. the expected answer appears verbatim as a token run -> correct
/// 2. a matched class satisfies the expected answer -> correct
/// 3. some other class matched -> deferred to the classifier, which must
///    confirm a math answer attempt before it becomes `wrong_answer`
///
/// Step 3 is skipped for numeric expected answers; those belong to the
/// numeric stages ("1" is also a spelling of "yes").
#[derive(Debug, Clone, Copy)]
pub struct PhraseAnswerExtractor {
    table: &'static AnswerEquivalenceTable,
}

impl Default for PhraseAnswerExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PhraseAnswerExtractor {
    pub fn new() -> Self {
        Self {
            table: AnswerEquivalenceTable::global(),
        }
    }

    /// Classes matched in `tokens`, scanning longest phrases first without overlap.
    pub fn matched_classes(&self, tokens: &[&str]) -> Vec<&'static EquivalenceClass> {
        let mut hits = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            let longest = self.table.max_phrase_words().min(tokens.len() - i);
            let found = (1..=longest).rev().find_map(|n| {
                let phrase = tokens[i..i + n].join(" ");
                self.table.lookup(&phrase).map(|class| (class, n))
            });
            match found {
                Some((class, n)) => {
                    hits.push(class);
                    i += n;
                }
                None => i += 1,
            }
        }
        hits
    }
}

impl Matcher for PhraseAnswerExtractor {
    fn name(&self) -> &'static str {
        "phrase_answer"
    }

    fn attempt(&self, input: &MatchInput<'_>) -> Result<MatchOutcome, NluError> {
        let tokens = tokenize(&input.pair.message);
        if tokens.is_empty() {
            return Ok(MatchOutcome::Abstain);
        }

        let expected_tokens = tokenize(&input.pair.answer);
        if !expected_tokens.is_empty()
            && tokens
                .windows(expected_tokens.len())
                .any(|window| window == expected_tokens.as_slice())
        {
            return Ok(answer(VerdictKind::CorrectAnswer, input.expected_literal()));
        }

        let hits = self.matched_classes(&tokens);
        if hits.is_empty() {
            return Ok(MatchOutcome::Abstain);
        }

        let expected = input.pair.answer.trim();
        if hits.iter().any(|class| class.satisfies(expected)) {
            return Ok(answer(VerdictKind::CorrectAnswer, input.expected_literal()));
        }

        if parse_canonical_number(expected).is_some() {
            return Ok(MatchOutcome::Abstain);
        }

        // Earliest category wins; min_by_key keeps the first of equals.
        match hits.iter().min_by_key(|class| class.category) {
            Some(class) => Ok(MatchOutcome::NeedsAnswerIntent {
                literal: class.display.to_string(),
            }),
            None => Ok(MatchOutcome::Abstain),
        }
    }
}

// ============================================================================
// PhraseKeywordExtractor
// ============================================================================

/// First token that spells a navigation keyword.
#[derive(Debug, Clone, Copy)]
pub struct PhraseKeywordExtractor {
    table: &'static KeywordTable,
}

impl Default for PhraseKeywordExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PhraseKeywordExtractor {
    pub fn new() -> Self {
        Self {
            table: KeywordTable::global(),
        }
    }
}

impl Matcher for PhraseKeywordExtractor {
    fn name(&self) -> &'static str {
        "phrase_keyword"
    }

    fn attempt(&self, input: &MatchInput<'_>) -> Result<MatchOutcome, NluError> {
        let keyword = tokenize(&input.pair.message)
            .into_iter()
            .filter(|t| !t.chars().any(|c| c.is_ascii_digit()))
            .find_map(|t| self.table.lookup(t));

        Ok(match keyword {
            Some(canonical) => answer(VerdictKind::Keyword, canonical),
            None => MatchOutcome::Abstain,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_token_strips_emphasis() {
        assert_eq!(clean_token("*yes*"), "yes");
        assert_eq!(clean_token("_ok_!!"), "ok");
        assert_eq!(clean_token("(c)"), "c");
        assert_eq!(clean_token("<="), "<=");
    }

    #[test]
    fn test_longest_phrase_wins() {
        let extractor = PhraseAnswerExtractor::new();
        let tokens = tokenize("it is less than or equal");
        let hits = extractor.matched_classes(&tokens);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].canonical, "<=");
    }
}
