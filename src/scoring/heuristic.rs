use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

use super::Scorer;
use crate::error::Result;
use crate::sheet::count_squares;
use crate::types::essay_data::{ScoreResult, MAX_SCORE};

/// Marker reported when the essay contains Latin letters ("Latin letters/words detected").
pub const LATIN_MARKER: &str = "영문자/영단어 사용 감지";

// Length at which the length component saturates; matches the sheet capacity.
const TARGET_LENGTH: usize = 700;
const LENGTH_POINTS: usize = 20;
const SENTENCE_POINTS_CAP: usize = 15;
const RICH_VOCABULARY_TOKENS: usize = 100;

fn sentence_splitter() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.!?]\s*").expect("static sentence regex"))
}

/// Component scores, kept separate so callers and tests can see how a total was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeuristicBreakdown {
    pub length: usize,
    pub sentence_count: usize,
    pub length_score: u32,
    pub sentence_score: u32,
    pub vocab_score: u32,
    pub coherence_score: u32,
}

impl HeuristicBreakdown {
    pub fn total(&self) -> u32 {
        (self.length_score + self.sentence_score + self.vocab_score + self.coherence_score)
            .min(MAX_SCORE)
    }
}

pub fn count_sentences(text: &str) -> usize {
    sentence_splitter()
        .split(text)
        .filter(|segment| !segment.is_empty())
        .count()
}

pub fn breakdown(text: &str) -> HeuristicBreakdown {
    let txt = text.trim();
    let length = count_squares(txt);
    let sentence_count = count_sentences(txt);
    let distinct_tokens: HashSet<&str> = txt.split_whitespace().collect();

    HeuristicBreakdown {
        length,
        sentence_count,
        length_score: (length * LENGTH_POINTS / TARGET_LENGTH).min(LENGTH_POINTS) as u32,
        sentence_score: (sentence_count * 2).min(SENTENCE_POINTS_CAP) as u32,
        vocab_score: if distinct_tokens.len() > RICH_VOCABULARY_TOKENS { 10 } else { 5 },
        coherence_score: if sentence_count >= 3 { 5 } else { 2 },
    }
}

/// Local scorer that needs nothing but the text. Always succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicScorer;

impl HeuristicScorer {
    pub fn new() -> Self {
        HeuristicScorer
    }

    pub fn evaluate(&self, text: &str) -> ScoreResult {
        let parts = breakdown(text);
        let total = parts.total();

        let mut mistakes = Vec::new();
        if text.chars().any(|c| c.is_ascii_alphabetic()) {
            mistakes.push(LATIN_MARKER.to_string());
        }

        ScoreResult {
            score: total,
            mistakes,
            corrected_text: text.to_string(),
            feedback: format!(
                "샘플 분석 (대체): 길이={}자, 문장수={}, 예상점수={}/{}.",
                parts.length, parts.sentence_count, total, MAX_SCORE
            ),
        }
    }
}

impl Scorer for HeuristicScorer {
    fn name(&self) -> &str {
        "heuristic"
    }

    fn score(&self, text: &str) -> Result<ScoreResult> {
        Ok(self.evaluate(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn short_two_sentence_essay_scores_eleven() {
        let parts = breakdown("안녕하세요. 반갑습니다.");
        assert_eq!(parts.length_score, 0);
        assert_eq!(parts.sentence_count, 2);
        assert_eq!(parts.sentence_score, 4);
        assert_eq!(parts.vocab_score, 5);
        assert_eq!(parts.coherence_score, 2);
        assert_eq!(parts.total(), 11);
    }

    #[test]
    fn sentence_split_ignores_empty_segments() {
        assert_eq!(count_sentences(""), 0);
        assert_eq!(count_sentences("하나. 둘! 셋?"), 3);
        assert_eq!(count_sentences("...!!"), 0);
        assert_eq!(count_sentences("끝나지 않은 문장"), 1);
    }

    #[test]
    fn length_component_saturates_at_twenty() {
        let text = "가".repeat(700);
        assert_eq!(breakdown(&text).length_score, 20);
        let text = "가".repeat(2000);
        assert_eq!(breakdown(&text).length_score, 20);
        let text = "가".repeat(350);
        assert_eq!(breakdown(&text).length_score, 10);
    }

    #[test]
    fn rich_vocabulary_earns_ten() {
        let text: String = (0..101).map(|i| format!("단어{} ", i)).collect();
        assert_eq!(breakdown(&text).vocab_score, 10);
        let text: String = (0..100).map(|i| format!("단어{} ", i)).collect();
        assert_eq!(breakdown(&text).vocab_score, 5);
    }

    #[test]
    fn latin_letters_are_flagged() {
        let scorer = HeuristicScorer::new();
        assert_eq!(scorer.evaluate("나는 student 이다.").mistakes, vec![LATIN_MARKER.to_string()]);
        assert!(scorer.evaluate("나는 학생이다. 123").mistakes.is_empty());
    }

    #[test]
    fn corrected_text_is_input_and_feedback_reports_numbers() {
        let scorer = HeuristicScorer::new();
        let result = scorer.evaluate("  안녕하세요. 반갑습니다.  ");
        assert_eq!(result.corrected_text, "  안녕하세요. 반갑습니다.  ");
        assert_eq!(result.score, 11);
        assert_eq!(result.feedback, "샘플 분석 (대체): 길이=13자, 문장수=2, 예상점수=11/50.");
    }

    proptest! {
        #[test]
        fn score_in_range_and_deterministic(text in "[가-힣a-zA-Z .!?\n]{0,400}") {
            let scorer = HeuristicScorer::new();
            let first = scorer.evaluate(&text);
            prop_assert!(first.score <= MAX_SCORE);
            prop_assert!(first.mistakes.iter().all(|m| !m.is_empty()));
            prop_assert_eq!(first, scorer.evaluate(&text));
        }
    }
}
