//! Canonical name normalization

use once_cell::sync::Lazy;
use regex::Regex;

use super::NameMatcher;

/// Words dropped from names before matching
pub const DEFAULT_STOP_WORDS: &[&str] = &["the", "and", "for", "with", "a", "of"];

/// Any run of non-word characters (Unicode aware; underscore counts as a word character)
static PUNCTUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W+").unwrap());

impl NameMatcher {
    /// Produce the canonical form of a display name or query
    ///
    /// # Rules
    /// 1. Lowercase and replace each run of punctuation with a single space
    /// 2. Drop whole-word stop words
    /// 3. Collapse whitespace and trim
    /// 4. If nothing is left, redo 1 and 3 without dropping stop words
    ///
    /// # Examples
    /// ```
    /// # use pinballmap_core::NameMatcher;
    /// let matcher = NameMatcher::default();
    /// assert_eq!(matcher.canonicalize("The Addams Family"), "addams family");
    /// assert_eq!(matcher.canonicalize("The The"), "the the");
    /// ```
    pub fn canonicalize(&self, name: &str) -> String {
        let spaced = PUNCTUATION.replace_all(&name.to_lowercase(), " ").into_owned();

        let stripped = join_words(spaced.split_whitespace().filter(|w| !self.is_stop_word(w)));
        if !stripped.is_empty() {
            return stripped;
        }

        // A name made only of stop words ("And For The") keeps them
        join_words(spaced.split_whitespace())
    }

    fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.iter().any(|s| s == word)
    }
}

/// Lowercased words of `text` as canonicalization sees them
pub(super) fn canonical_words(text: &str) -> Vec<String> {
    PUNCTUATION
        .replace_all(&text.to_lowercase(), " ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn join_words<'a>(words: impl Iterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for word in words {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}
