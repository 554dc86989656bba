//! Stopword filtering
//!
//! Per-language stopword lists from the `stop-words` crate (NLTK lists).

use rustc_hash::FxHashSet;
use stop_words::{get, LANGUAGE};

use crate::models::Language;

/// Case-insensitive stopword lookup for one language
#[derive(Debug, Clone)]
pub struct StopwordFilter {
    /// Set of stopwords, lowercase
    stopwords: FxHashSet<String>,
}

impl Default for StopwordFilter {
    fn default() -> Self {
        Self::new(Language::En)
    }
}

impl StopwordFilter {
    /// Create a stopword filter with the shipped list for `language`
    pub fn new(language: Language) -> Self {
        let lang = match language {
            Language::En => LANGUAGE::English,
            Language::De => LANGUAGE::German,
        };
        Self {
            stopwords: get(lang).iter().map(|s| s.to_lowercase()).collect(),
        }
    }

    pub fn is_stopword(&self, word: &str) -> bool {
        self.stopwords.contains(&word.to_lowercase())
    }
}
