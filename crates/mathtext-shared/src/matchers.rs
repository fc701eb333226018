//! Exact, regex-numeric and canonical-number matchers.

use crate::cascade::{answer, MatchInput, MatchOutcome, Matcher};
use crate::error::NluError;
use crate::numbers::{parse_canonical_number, parse_float_literal};
use crate::patterns::{self, PatternFamily};
use crate::verdict::VerdictKind;

/// Whole-string equality with all whitespace removed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatcher;

impl Matcher for ExactMatcher {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn attempt(&self, input: &MatchInput<'_>) -> Result<MatchOutcome, NluError> {
        let message = input.pair.compact_message();
        if !message.is_empty() && message == input.pair.compact_answer() {
            return Ok(answer(VerdictKind::CorrectAnswer, input.expected_literal()));
        }
        Ok(MatchOutcome::Abstain)
    }
}

/// Time, exponent, fraction and decimal literals found anywhere in the message.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexNumericExtractor;

impl Matcher for RegexNumericExtractor {
    fn name(&self) -> &'static str {
        "regex_numeric"
    }

    fn attempt(&self, input: &MatchInput<'_>) -> Result<MatchOutcome, NluError> {
        let Some(found) = patterns::find_first(&input.pair.message)? else {
            return Ok(MatchOutcome::Abstain);
        };
        let expected = patterns::canonical_expected(&input.pair.answer)?;

        let numerically_equal = found.family == PatternFamily::Decimal
            && matches!(
                (parse_float_literal(&found.literal), parse_float_literal(&expected)),
                (Some(a), Some(b)) if a.numerically_equals(&b)
            );

        let same_literal =
            found.family.comparison_key(&found.literal) == found.family.comparison_key(&expected);

        let kind = if same_literal || numerically_equal {
            VerdictKind::CorrectAnswer
        } else {
            VerdictKind::WrongAnswer
        };
        Ok(answer(kind, found.literal))
    }
}

/// Whole message as a float, else as an integer or number words.
#[derive(Debug, Clone, Copy, Default)]
pub struct CanonicalNumberExtractor;

impl Matcher for CanonicalNumberExtractor {
    fn name(&self) -> &'static str {
        "canonical_number"
    }

    fn attempt(&self, input: &MatchInput<'_>) -> Result<MatchOutcome, NluError> {
        let Some(parsed) = parse_canonical_number(&input.pair.message) else {
            return Ok(MatchOutcome::Abstain);
        };
        let shown = parsed.display();
        let equal = shown == input.pair.answer
            || parse_canonical_number(&input.pair.answer)
                .map_or(false, |expected| parsed.numerically_equals(&expected));

        if equal {
            Ok(answer(VerdictKind::CorrectAnswer, input.expected_literal()))
        } else {
            Ok(answer(VerdictKind::WrongAnswer, shown))
        }
    }
}
