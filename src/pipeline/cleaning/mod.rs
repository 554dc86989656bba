pub mod contractions;

pub use contractions::*;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::models::{ErrorKind, Language, NormalizeOptions};

#[derive(Error, Debug)]
pub enum CleaningError {
    #[error("Cannot read contraction table {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed contraction table: {0}")]
    Table(#[from] serde_json::Error),

    #[error("Contraction table entry {index} has an empty surface form")]
    EmptySurface { index: usize },
}

impl CleaningError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Read { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                ErrorKind::FileNotFound
            }
            Self::Read { .. } => ErrorKind::Processing,
            Self::Table(_) | Self::EmptySurface { .. } => ErrorKind::Validation,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Clean
// ═══════════════════════════════════════════════════════════════════════════

static UNICODE_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\\u[a-f0-9]{4}").unwrap());

// Scheme or www. prefix, a domain label, a dot, then at least two
// non-space characters.
static URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:https?://(?:www\.)?|www\.)[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?\.\S{2,}")
        .unwrap()
});

static DIGIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d").unwrap());

static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_\s.'´`äÄöÖüÜß]").unwrap());

static DOT_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.{2,}").unwrap());

static SPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" {2,}").unwrap());

/// Sentence-level marks removed by normalization.
const SENTENCE_PUNCTUATION: &[char] = &[
    '.', ',', '!', '?', ':', ';', '(', ')', '[', ']', '"', '„', '“', '”', '»', '«', '›', '‹',
    '–',
];

/// Stateless text cleaner and normalizer.
#[derive(Debug, Clone)]
pub struct Cleaner {
    tables: HashMap<Language, ContractionTable>,
}

impl Default for Cleaner {
    fn default() -> Self {
        Self::new()
    }
}

impl Cleaner {
    /// Cleaner with the built-in contraction tables.
    pub fn new() -> Self {
        let tables = Language::ALL
            .iter()
            .map(|&lang| (lang, ContractionTable::builtin(lang).clone()))
            .collect();
        Self { tables }
    }

    /// Replace the contraction table of the table's language.
    pub fn with_table(mut self, table: ContractionTable) -> Self {
        self.tables.insert(table.language(), table);
        self
    }

    pub fn table(&self, language: Language) -> &ContractionTable {
        self.tables
            .get(&language)
            .unwrap_or_else(|| ContractionTable::builtin(language))
    }

    /// Strip escape remnants, URLs, digits and symbols; collapse dot and
    /// space runs.
    pub fn clean(&self, text: &str) -> String {
        let text = text.replace("\\n", "").replace("\\r", "");
        let text = UNICODE_ESCAPE.replace_all(&text, "");
        // URLs go first: the next two passes eat the dots and slashes that
        // identify them.
        let text = URL.replace_all(&text, "");
        let text = DIGIT.replace_all(&text, "");
        let text = DISALLOWED.replace_all(&text, "");
        // Stripping can splice a new URL together.
        let text = URL.replace_all(&text, "");
        let text = DOT_RUN.replace_all(&text, " ");
        SPACE_RUN.replace_all(&text, " ").into_owned()
    }

    /// Remove sentence punctuation, then optionally expand contractions and
    /// lowercase.
    pub fn normalize(&self, text: &str, options: NormalizeOptions, language: Language) -> String {
        let mut text: String = text
            .chars()
            .filter(|c| !SENTENCE_PUNCTUATION.contains(c))
            .collect();
        if options.contractions {
            text = self.table(language).apply(&text);
        }
        if options.lowercase {
            text = text.to_lowercase();
        }
        text
    }

    /// `normalize(clean(text))`, trimmed.
    pub fn process(&self, text: &str, options: NormalizeOptions, language: Language) -> String {
        self.normalize(&self.clean(text), options, language)
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SAMPLE: &str = "Hello, World! This is a test.\nIt's working, isn't it?";

    fn opts(lowercase: bool, contractions: bool) -> NormalizeOptions {
        NormalizeOptions {
            lowercase,
            contractions,
        }
    }

    #[test]
    fn clean_strips_urls_digits_and_symbols() {
        let cleaner = Cleaner::new();
        let out = cleaner.clean("Visit https://www.example.com/path?q=1 or www.test.org now! 42 € #tag");
        assert_eq!(out, "Visit or now tag");
    }

    #[test]
    fn clean_removes_escape_markers() {
        let cleaner = Cleaner::new();
        assert_eq!(cleaner.clean(r"line\nbreak\r and ä"), "linebreak and ä");
    }

    #[test]
    fn clean_keeps_umlauts_and_apostrophes() {
        let cleaner = Cleaner::new();
        assert_eq!(cleaner.clean("Grüße aus Köln, it's ´fine´"), "Grüße aus Köln it's ´fine´");
    }

    #[test]
    fn clean_collapses_dot_and_space_runs() {
        let cleaner = Cleaner::new();
        assert_eq!(cleaner.clean("Wait... what    now"), "Wait what now");
    }

    #[test]
    fn normalize_strips_sentence_punctuation() {
        let cleaner = Cleaner::new();
        let out = cleaner.normalize("„Ja“ – (so) [ist] es: gut; nicht? «doch»!", opts(false, false), Language::De);
        assert_eq!(out, "Ja  so ist es gut nicht doch");
    }

    #[test]
    fn normalize_expands_english_contractions() {
        let cleaner = Cleaner::new();
        let out = cleaner.normalize("It's working, isn't it?", opts(false, true), Language::En);
        assert!(!out.contains("isn't"));
        assert!(out.contains("is not"));
    }

    #[test]
    fn normalize_all_flag_combinations() {
        let cleaner = Cleaner::new();
        let text = "It's fine, isn't it?";
        assert_eq!(cleaner.normalize(text, opts(false, false), Language::En), "It's fine isn't it");
        assert_eq!(cleaner.normalize(text, opts(true, false), Language::En), "it's fine isn't it");
        assert_eq!(cleaner.normalize(text, opts(false, true), Language::En), "It is fine is not it");
        assert_eq!(cleaner.normalize(text, opts(true, true), Language::En), "it is fine is not it");
    }

    #[test]
    fn normalize_german_contractions() {
        let cleaner = Cleaner::new();
        let out = cleaner.normalize("Wir gehen ins Kino.", opts(false, true), Language::De);
        assert_eq!(out, "Wir gehen in das Kino");
    }

    #[test]
    fn process_sample_drops_punctuation() {
        let cleaner = Cleaner::new();
        let out = cleaner.process(SAMPLE, NormalizeOptions::default(), Language::En);
        assert!(!out.contains('!'));
        assert!(!out.contains(','));
        assert!(out.starts_with("Hello World"));
        assert_eq!(out, out.trim());
    }

    #[test]
    fn custom_table_replaces_builtin() {
        let table =
            ContractionTable::from_json(Language::En, MatchMode::Literal, r#"[["gonna", "going to"]]"#)
                .unwrap();
        let cleaner = Cleaner::new().with_table(table);
        let out = cleaner.normalize("gonna win, isn't it", opts(false, true), Language::En);
        assert_eq!(out, "going to win isn't it");
    }

    #[test]
    fn error_kinds() {
        let err = ContractionTable::from_json(Language::En, MatchMode::Literal, "nope").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let err = ContractionTable::load(
            Language::En,
            MatchMode::Literal,
            std::path::Path::new("/nonexistent/table.json"),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
    }

    proptest! {
        #[test]
        fn clean_is_idempotent(text in "\\PC{0,120}") {
            let cleaner = Cleaner::new();
            let once = cleaner.clean(&text);
            prop_assert_eq!(cleaner.clean(&once), once);
        }

        #[test]
        fn clean_is_idempotent_on_url_like_text(
            text in "(www|https?://|[a-z]{1,5}|[.#/:@ ]|[0-9]){0,30}"
        ) {
            let cleaner = Cleaner::new();
            let once = cleaner.clean(&text);
            prop_assert_eq!(cleaner.clean(&once), once);
        }

        #[test]
        fn lowercase_normalization_is_lowercase(
            text in "[a-zA-ZäöüÄÖÜß ,.!?'-]{0,80}",
            contractions in any::<bool>(),
        ) {
            let cleaner = Cleaner::new();
            let out = cleaner.normalize(&text, opts(true, contractions), Language::En);
            prop_assert_eq!(out.to_lowercase(), out);
        }
    }
}
