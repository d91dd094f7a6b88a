//! Word-validity lookup.
//!
//! The engine only depends on the [`Dictionary`] trait. [`WordList`] is the
//! in-process implementation backed by one word set per language.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("Dictionary unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to read word list {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Word lookup used by the rule engine.
///
/// A lookup error is treated by callers as an invalid word.
pub trait Dictionary: Send + Sync {
    /// Whether `word` exists in `language`. Matching is case-insensitive.
    fn is_valid_word(&self, word: &str, language: &str) -> Result<bool, DictionaryError>;

    /// Count plays of accepted words. Never read by the engine.
    fn record_plays(&self, words: &[String], language: &str);
}

/// In-memory word lists keyed by language code
#[derive(Debug, Default)]
pub struct WordList {
    words: HashMap<String, HashSet<String>>,
    plays: Mutex<HashMap<(String, String), u64>>,
}

impl WordList {
    /// Create an empty dictionary (for testing)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Dictionary holding a single language
    pub fn from_words<I, S>(language: &str, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::empty();
        list.add_words(language, words);
        list
    }

    /// Add words to a language, normalised to uppercase
    pub fn add_words<I, S>(&mut self, language: &str, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set = self.words.entry(language.to_ascii_lowercase()).or_default();
        set.extend(
            words
                .into_iter()
                .map(|w| w.as_ref().trim().to_uppercase())
                .filter(|w| w.chars().count() >= 2),
        );
    }

    /// Load one word per line from a file into `language`
    pub fn load_file<P: AsRef<Path>>(&mut self, language: &str, path: P) -> Result<usize, DictionaryError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| DictionaryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let before = self.len(language);
        self.add_words(language, content.lines());
        let added = self.len(language) - before;

        tracing::info!("Loaded {} words into {} dictionary", added, language);

        Ok(added)
    }

    /// Load `<language>.txt` for every language found in a directory
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Self, DictionaryError> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir).map_err(|source| DictionaryError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut list = Self::empty();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("txt") {
                continue;
            }
            if let Some(language) = path.file_stem().and_then(|s| s.to_str()) {
                let language = language.to_string();
                list.load_file(&language, &path)?;
            }
        }
        Ok(list)
    }

    /// Number of words known for a language
    pub fn len(&self, language: &str) -> usize {
        self.words
            .get(&language.to_ascii_lowercase())
            .map_or(0, HashSet::len)
    }

    /// Check if no language has any words
    pub fn is_empty(&self) -> bool {
        self.words.values().all(HashSet::is_empty)
    }

    /// How often a word has been recorded as played
    pub fn play_count(&self, word: &str, language: &str) -> u64 {
        let key = (language.to_ascii_lowercase(), word.to_uppercase());
        self.plays
            .lock()
            .map(|plays| plays.get(&key).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}

impl Dictionary for WordList {
    fn is_valid_word(&self, word: &str, language: &str) -> Result<bool, DictionaryError> {
        let set = self
            .words
            .get(&language.to_ascii_lowercase())
            .ok_or_else(|| DictionaryError::Unavailable(format!("no word list for '{}'", language)))?;
        Ok(set.contains(&word.to_uppercase()))
    }

    fn record_plays(&self, words: &[String], language: &str) {
        let Ok(mut plays) = self.plays.lock() else {
            tracing::warn!("Play counter poisoned, dropping {} plays", words.len());
            return;
        };
        for word in words {
            *plays
                .entry((language.to_ascii_lowercase(), word.to_uppercase()))
                .or_insert(0) += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_dictionary() {
        let dict = WordList::empty();
        assert!(dict.is_empty());
        assert!(dict.is_valid_word("TEST", "en").is_err());
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let dict = WordList::from_words("en", ["cat", "Dog"]);
        assert!(dict.is_valid_word("CAT", "en").unwrap());
        assert!(dict.is_valid_word("dog", "EN").unwrap());
        assert!(!dict.is_valid_word("cow", "en").unwrap());
    }

    #[test]
    fn test_single_letters_are_dropped() {
        let dict = WordList::from_words("en", ["a", "at", "  "]);
        assert_eq!(dict.len("en"), 1);
    }

    #[test]
    fn test_language_scoping() {
        let mut dict = WordList::from_words("en", ["cat"]);
        dict.add_words("nl", ["kat"]);
        assert!(!dict.is_valid_word("kat", "en").unwrap());
        assert!(dict.is_valid_word("kat", "nl").unwrap());
    }

    #[test]
    fn test_record_plays() {
        let dict = WordList::from_words("en", ["cat"]);
        dict.record_plays(&["cat".to_string(), "CAT".to_string()], "en");
        assert_eq!(dict.play_count("Cat", "en"), 2);
        assert_eq!(dict.play_count("cat", "nl"), 0);
    }

    #[test]
    fn test_load_file() {
        let path = std::env::temp_dir().join(format!("wordsquare-dict-{}.txt", std::process::id()));
        std::fs::write(&path, "helen\nlamp\n\nx\n").unwrap();

        let mut dict = WordList::empty();
        let added = dict.load_file("nl", &path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(added, 2);
        assert!(dict.is_valid_word("HELEN", "nl").unwrap());
    }

    #[test]
    fn test_load_missing_file() {
        let mut dict = WordList::empty();
        let err = dict.load_file("en", "/nonexistent/words.txt").unwrap_err();
        assert!(matches!(err, DictionaryError::Io { .. }));
    }
}
