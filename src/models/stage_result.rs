use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LemmaPair {
    pub text: String,
    pub lemma: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedToken {
    pub text: String,
    /// Coarse universal part of speech (`NOUN`, `VERB`, ...).
    pub pos: String,
    /// Fine-grained, language-specific tag (`NN`, `VVFIN`, ...).
    pub tag: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub label: String,
}

/// Output of one NLP stage, consumed by the exporter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "records", rename_all = "snake_case")]
pub enum StageResult {
    Tokens(Vec<String>),
    LemmaPairs(Vec<LemmaPair>),
    TaggedTokens(Vec<TaggedToken>),
    Entities(Vec<Entity>),
}

impl StageResult {
    pub fn len(&self) -> usize {
        match self {
            Self::Tokens(v) => v.len(),
            Self::LemmaPairs(v) => v.len(),
            Self::TaggedTokens(v) => v.len(),
            Self::Entities(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
