use std::path::Path;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::models::Language;
use super::CleaningError;

static EN_TABLE: LazyLock<ContractionTable> = LazyLock::new(|| {
    ContractionTable::from_json(
        Language::En,
        MatchMode::Literal,
        include_str!("../../../resources/contractions/en.json"),
    )
    .expect("embedded English contraction table")
});

static DE_TABLE: LazyLock<ContractionTable> = LazyLock::new(|| {
    ContractionTable::from_json(
        Language::De,
        MatchMode::WordBoundary,
        include_str!("../../../resources/contractions/de.json"),
    )
    .expect("embedded German contraction table")
});

/// How a surface form is located in the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Plain substring replacement.
    Literal,
    /// Only where the form is not glued to a word character on either side.
    WordBoundary,
}

/// Ordered surface-form -> expansion substitutions for one language.
///
/// Every entry is applied, in order, to the output of the previous one.
/// Order is part of the contract: a compound form (`can't've`) has to come
/// before its prefix (`can't`) or it is never seen.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractionTable {
    language: Language,
    mode: MatchMode,
    entries: Vec<(String, String)>,
}

impl ContractionTable {
    /// The table shipped for `language`.
    pub fn builtin(language: Language) -> &'static ContractionTable {
        match language {
            Language::En => &EN_TABLE,
            Language::De => &DE_TABLE,
        }
    }

    /// Parse a table from a JSON array of `[surface, expansion]` pairs.
    pub fn from_json(
        language: Language,
        mode: MatchMode,
        json: &str,
    ) -> Result<Self, CleaningError> {
        let entries: Vec<(String, String)> = serde_json::from_str(json)?;
        if let Some(index) = entries.iter().position(|(surface, _)| surface.is_empty()) {
            return Err(CleaningError::EmptySurface { index });
        }
        Ok(Self {
            language,
            mode,
            entries,
        })
    }

    /// Load a custom table from disk.
    pub fn load(language: Language, mode: MatchMode, path: &Path) -> Result<Self, CleaningError> {
        let json = std::fs::read_to_string(path).map_err(|source| CleaningError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_json(language, mode, &json)?;
        tracing::debug!(
            language = language.as_str(),
            entries = table.len(),
            path = %path.display(),
            "Contraction table loaded"
        );
        Ok(table)
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Expand every contraction in `text`.
    pub fn apply(&self, text: &str) -> String {
        let mut out = text.to_string();
        for (surface, expansion) in &self.entries {
            if !out.contains(surface.as_str()) {
                continue;
            }
            out = match self.mode {
                MatchMode::Literal => out.replace(surface.as_str(), expansion),
                MatchMode::WordBoundary => replace_bounded(&out, surface, expansion),
            };
        }
        out
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Replace `needle` where it is preceded by start-of-text or a non-word
/// character and followed by end-of-text or a non-word character.
fn replace_bounded(text: &str, needle: &str, replacement: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut from = 0;

    while let Some(offset) = text[from..].find(needle) {
        let start = from + offset;
        let end = start + needle.len();
        let open = text[..start].chars().next_back().map_or(true, |c| !is_word_char(c));
        let close = text[end..].chars().next().map_or(true, |c| !is_word_char(c));

        if open && close {
            out.push_str(&text[copied..start]);
            out.push_str(replacement);
            copied = end;
            from = end;
        } else {
            from = start + text[start..].chars().next().map_or(1, char::len_utf8);
        }
    }

    out.push_str(&text[copied..]);
    out
}
