pub mod rule_based;
pub mod stopwords;

pub use rule_based::*;
pub use stopwords::*;

use thiserror::Error;

use crate::models::{Entity, ErrorKind, Language, LemmaPair, TaggedToken};

#[derive(Error, Debug)]
pub enum NlpError {
    #[error("No model available for {language}: {reason}")]
    ModelUnavailable { language: Language, reason: String },

    #[error("Inference failed: {0}")]
    Inference(String),
}

impl NlpError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ModelUnavailable { .. } => ErrorKind::Validation,
            Self::Inference(_) => ErrorKind::Processing,
        }
    }
}

/// Language model collaborator. Constructed once and shared by every stage.
pub trait NlpEngine {
    fn tokenize(&self, text: &str, language: Language) -> Result<Vec<String>, NlpError>;

    fn lemmatize(&self, text: &str, language: Language) -> Result<Vec<LemmaPair>, NlpError>;

    fn tag(&self, text: &str, language: Language) -> Result<Vec<TaggedToken>, NlpError>;

    fn entities(&self, text: &str, language: Language) -> Result<Vec<Entity>, NlpError>;

    fn is_stop_word(&self, token: &str, language: Language) -> bool;
}
