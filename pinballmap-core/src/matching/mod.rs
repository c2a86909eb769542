//! Machine name matching - resolve free-text names to catalog entries
//!
//! This module turns display names and user queries into a comparable
//! canonical form and ranks catalog entries against a query.
//!
//! # Overview
//!
//! ```text
//! "Attack From Mars (Remake) LE"
//!            │  canonicalize
//!            ▼
//! "attack from mars remake le"      ← stored once per catalog entry
//!            │  score against the canonical query
//!            ▼
//! MatchResult { item, score }       ← filtered by min_score, sorted, truncated
//! ```
//!
//! The scorer is a bag-of-words heuristic, not an edit-distance ranker. An
//! exact canonical match scores [`EXACT_MATCH_SCORE`] and, once any entry
//! reaches it, the ranked list is cut to [`EXACT_MATCH_RESULT_LIMIT`] entries.

mod normalize;
mod score;

pub use normalize::DEFAULT_STOP_WORDS;
pub use score::{DEFAULT_MODEL_ENDINGS, EXACT_MATCH_SCORE};

use serde::Serialize;
use tracing::trace;

/// Default minimum score for search results
pub const DEFAULT_MIN_SCORE: i32 = 2;

/// Maximum number of results kept once an exact match has been seen
pub const EXACT_MATCH_RESULT_LIMIT: usize = 4;

/// A record the matcher can rank: anything with a stable id and a display name
pub trait CatalogItem {
    fn id(&self) -> u64;
    fn display_name(&self) -> &str;
}

/// A catalog entry paired with its canonical name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Canonicalized<T> {
    pub item: T,
    pub canonical: String,
}

/// A ranked search hit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult<T> {
    pub item: T,
    pub score: i32,
}

impl<T: Clone> MatchResult<&T> {
    /// Detach the hit from the catalog it was borrowed from
    pub fn cloned(&self) -> MatchResult<T> {
        MatchResult {
            item: self.item.clone(),
            score: self.score,
        }
    }
}

/// Canonicalizes names and scores catalog entries against queries
///
/// Both word lists are configurable; [`NameMatcher::default`] uses
/// [`DEFAULT_STOP_WORDS`] and [`DEFAULT_MODEL_ENDINGS`].
#[derive(Debug, Clone, PartialEq)]
pub struct NameMatcher {
    stop_words: Vec<String>,
    model_endings: Vec<String>,
}

impl Default for NameMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_STOP_WORDS, DEFAULT_MODEL_ENDINGS)
    }
}

impl NameMatcher {
    /// Create a matcher with custom stop words and model endings
    ///
    /// Entries are tokenized the same way names are, so a multi-word entry
    /// like `"of the"` contributes each of its words.
    pub fn new<S: AsRef<str>>(stop_words: &[S], model_endings: &[S]) -> Self {
        let tokens = |entries: &[S]| {
            let mut words: Vec<String> = Vec::new();
            for word in entries.iter().flat_map(|e| normalize::canonical_words(e.as_ref())) {
                if !words.contains(&word) {
                    words.push(word);
                }
            }
            words
        };
        Self {
            stop_words: tokens(stop_words),
            model_endings: tokens(model_endings),
        }
    }

    pub fn stop_words(&self) -> &[String] {
        &self.stop_words
    }

    pub fn model_endings(&self) -> &[String] {
        &self.model_endings
    }

    /// Pair every item with its canonical name
    pub fn index<T, I>(&self, items: I) -> Vec<Canonicalized<T>>
    where
        T: CatalogItem,
        I: IntoIterator<Item = T>,
    {
        items
            .into_iter()
            .map(|item| {
                let canonical = self.canonicalize(item.display_name());
                Canonicalized { item, canonical }
            })
            .collect()
    }

    /// Rank `catalog` against `query`
    ///
    /// Keeps entries scoring at least `min_score`, sorted by score descending
    /// with ties in catalog order. If any kept entry is an exact match the
    /// list is cut to [`EXACT_MATCH_RESULT_LIMIT`] entries.
    pub fn search<'a, T>(
        &self,
        query: &str,
        catalog: &'a [Canonicalized<T>],
        min_score: i32,
    ) -> Vec<MatchResult<&'a T>> {
        let query_canonical = self.canonicalize(query);
        let query_words: Vec<&str> = query_canonical.split_whitespace().collect();

        let mut results: Vec<MatchResult<&T>> = catalog
            .iter()
            .filter_map(|entry| {
                let score = self.score(&query_canonical, &entry.canonical, &query_words);
                (score >= min_score).then_some(MatchResult {
                    item: &entry.item,
                    score,
                })
            })
            .collect();

        let exact_hit = results.iter().any(|r| r.score >= EXACT_MATCH_SCORE);

        // sort_by is stable: equal scores keep catalog order
        results.sort_by(|a, b| b.score.cmp(&a.score));

        if exact_hit {
            results.truncate(EXACT_MATCH_RESULT_LIMIT);
        }

        trace!(
            "search '{}' (canonical '{}'): {} hit(s) of {} entries, exact_hit={}",
            query,
            query_canonical,
            results.len(),
            catalog.len(),
            exact_hit
        );
        results
    }
}
