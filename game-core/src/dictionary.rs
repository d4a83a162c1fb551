use anyhow::Result;
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

/// Built-in word set used when the external word list cannot be read.
/// Just enough to keep a room playable in degraded mode.
const FALLBACK_WORDS: &str = "\
ale ant ape apple apples arm art ate bat bear beard bed bread cab car card care cart cat \
cater crate create crane cream dear dart date deal dear dog ear earn ears east eat eats era \
game games gate gear goat grain hat heart heat her hire horse house ice idea iron lap late \
later lead leap least let line lion list lit mane mat meal meat mole mouse name near neat \
nest net nose note notes oat onset pale pan pale pea peal pear peat pen pet plan plane plant \
plate plea rain rat rate rates read real ream rest ride rise sale salt sand sat sate sea seal \
seat set slate snake stale star stare steal steam stone store tale tales tame tan tap tea \
teal team tear tears teas ten tent tide tie toe ton tone tones train tree vase vat vote water \
wear west wet win wind wine wire word words";

/// Main words for the subword format when the dictionary is degraded.
/// Each has enough letter variety to yield many valid subwords.
const FALLBACK_MAIN_WORDS: &[&str] = &[
    "painters", "teardrops", "grandiose", "monastery", "calibrate", "orchestra", "hibernate",
];

/// The word-legality predicate: a precomputed set of valid lowercase words.
///
/// Loaded once at startup and never mutated, so it is safe to share behind an
/// `Arc` and read without synchronization.
pub struct Dictionary {
    words: HashSet<String>,
    degraded: bool,
}

impl Dictionary {
    /// Build from a whitespace/newline separated word list. Blank lines and
    /// `#` comments are skipped; words are lowercased and must be alphabetic
    /// and at least 3 characters.
    pub fn from_list(word_list: &str) -> Self {
        let words = word_list
            .lines()
            .filter(|line| !line.trim().is_empty() && !line.starts_with('#'))
            .flat_map(|line| line.split_whitespace())
            .map(|word| word.trim().to_lowercase())
            .filter(|word| word.len() >= 3 && word.chars().all(|c| c.is_ascii_alphabetic()))
            .collect();

        Self {
            words,
            degraded: false,
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(Self::from_list(&contents))
    }

    /// Load the external word list, or fall back to the built-in set so the
    /// server stays operational with reduced coverage instead of failing.
    pub fn load_or_fallback<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(&path) {
            Ok(dict) if !dict.words.is_empty() => {
                info!(
                    "Loaded {} words from {}",
                    dict.words.len(),
                    path.as_ref().display()
                );
                dict
            }
            Ok(_) => {
                warn!(
                    "Word list {} is empty, using built-in fallback set",
                    path.as_ref().display()
                );
                Self::fallback()
            }
            Err(e) => {
                warn!(
                    "Failed to read word list {}: {}. Using built-in fallback set",
                    path.as_ref().display(),
                    e
                );
                Self::fallback()
            }
        }
    }

    pub fn fallback() -> Self {
        let mut dict = Self::from_list(FALLBACK_WORDS);
        dict.degraded = true;
        dict
    }

    /// A word is valid iff it is at least 3 characters, purely alphabetic,
    /// and present in the set. Input is normalized before the lookup; the
    /// length check runs first so junk input never hits the set.
    pub fn is_valid(&self, word: &str) -> bool {
        let word = word.trim().to_lowercase();
        if word.len() < 3 {
            return false;
        }
        if !word.chars().all(|c| c.is_ascii_alphabetic()) {
            return false;
        }
        self.words.contains(&word)
    }

    /// Operating on the fallback set rather than the configured word list.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Candidate main words for the subword format: long enough to contain
    /// multiple valid subwords. Falls back to a curated built-in pool when
    /// the dictionary has no words in range.
    pub fn main_word_pool(&self, min_len: usize, max_len: usize) -> Vec<String> {
        let pool: Vec<String> = self
            .words
            .iter()
            .filter(|word| (min_len..=max_len).contains(&word.len()))
            .cloned()
            .collect();

        if pool.is_empty() {
            FALLBACK_MAIN_WORDS.iter().map(|w| w.to_string()).collect()
        } else {
            pool
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_and_normalization() {
        let dict = Dictionary::from_list("apple\nbanana\ncherry\n# comment\n\ntea");
        assert!(dict.is_valid("apple"));
        assert!(dict.is_valid("APPLE"));
        assert!(dict.is_valid("  tea  "));
        assert!(!dict.is_valid("durian"));
    }

    #[test]
    fn test_short_words_rejected_before_lookup() {
        let dict = Dictionary::from_list("ab\nto\ncat");
        assert!(!dict.is_valid("ab"));
        assert!(!dict.is_valid("to"));
        assert!(!dict.is_valid(""));
        assert!(!dict.is_valid("  "));
        assert!(dict.is_valid("cat"));
        // two-letter entries never make it into the set either
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn test_non_alphabetic_rejected() {
        let dict = Dictionary::from_list("cat\ndog");
        assert!(!dict.is_valid("cat1"));
        assert!(!dict.is_valid("c-at"));
        assert!(!dict.is_valid("ca t"));
    }

    #[test]
    fn test_fallback_is_degraded_and_nonempty() {
        let dict = Dictionary::fallback();
        assert!(dict.is_degraded());
        assert!(!dict.is_empty());
        assert!(dict.is_valid("eats"));
        assert!(dict.is_valid("apple"));
    }

    #[test]
    fn test_load_missing_file_falls_back() {
        let dict = Dictionary::load_or_fallback("/nonexistent/words.txt");
        assert!(dict.is_degraded());
        assert!(dict.is_valid("tea"));
    }

    #[test]
    fn test_main_word_pool_length_filter() {
        let dict = Dictionary::from_list("cat\npainters\nmonastery\ntea");
        let pool = dict.main_word_pool(7, 9);
        assert_eq!(pool.len(), 2);
        assert!(pool.contains(&"painters".to_string()));
        assert!(pool.contains(&"monastery".to_string()));
    }

    #[test]
    fn test_main_word_pool_falls_back_when_out_of_range() {
        let dict = Dictionary::from_list("cat\ntea");
        let pool = dict.main_word_pool(7, 9);
        assert!(!pool.is_empty());
        assert!(pool.iter().all(|w| w.len() >= 7));
    }
}
