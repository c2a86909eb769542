//! Match quality scoring

use super::NameMatcher;

/// Score for a query whose canonical form equals the entry's
pub const EXACT_MATCH_SCORE: i32 = 150;

/// Trailing edition/trim words that should not carry a match on their own
pub const DEFAULT_MODEL_ENDINGS: &[&str] = &["le", "pro", "premium", "edition", "standard"];

const SUBSTRING_BONUS: i32 = 2;
const MODEL_ENDING_PENALTY: i32 = 2;
const SHORT_WORD_BONUS: i32 = 1;
const MIN_SIGNIFICANT_WORD_LEN: usize = 3;

impl NameMatcher {
    /// Score one catalog entry against a canonical query
    ///
    /// `query_words` is `query_canonical` split on whitespace. Exact matches
    /// short-circuit to [`EXACT_MATCH_SCORE`]; otherwise the score adds a
    /// substring bonus, subtracts a penalty when the entry ends in a model
    /// suffix, and rewards each shared query word by its length. The result
    /// can be negative.
    pub fn score(&self, query_canonical: &str, item_canonical: &str, query_words: &[&str]) -> i32 {
        if query_canonical == item_canonical {
            return EXACT_MATCH_SCORE;
        }

        let mut score = 0;
        if item_canonical.contains(query_canonical) {
            score += SUBSTRING_BONUS;
        }

        let item_words: Vec<&str> = item_canonical.split_whitespace().collect();
        let last_word = item_words.last().copied();
        if last_word.is_some_and(|w| self.is_model_ending(w)) {
            score -= MODEL_ENDING_PENALTY;
        }

        for &word in query_words {
            if Some(word) == last_word {
                continue;
            }
            if item_words.contains(&word) {
                let len = word.chars().count();
                score += if len >= MIN_SIGNIFICANT_WORD_LEN {
                    5 + 2 * len as i32
                } else {
                    SHORT_WORD_BONUS
                };
            }
        }
        score
    }

    fn is_model_ending(&self, word: &str) -> bool {
        self.model_endings.iter().any(|e| e == word)
    }
}
