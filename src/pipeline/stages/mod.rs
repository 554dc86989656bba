pub mod orchestrator;
pub mod project;
pub mod request;

pub use orchestrator::*;
pub use project::*;
pub use request::*;

use std::path::PathBuf;

use thiserror::Error;

use crate::models::ErrorKind;
use super::export::ExportError;
use super::nlp::NlpError;

#[derive(Error, Debug)]
pub enum StageError {
    #[error("Project directory not found: {0}")]
    ProjectMissing(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Token artifact {path} is not a JSON string array: {source}")]
    TokenArtifact {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("NLP engine error: {0}")]
    Nlp(#[from] NlpError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

impl StageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ProjectMissing(_) => ErrorKind::FileNotFound,
            Self::Io(_) | Self::TokenArtifact { .. } | Self::Json(_) => ErrorKind::Processing,
            Self::Nlp(e) => e.kind(),
            Self::Export(e) => e.kind(),
        }
    }

    /// Errors that abort the whole stage instead of a single file.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ProjectMissing(_) | Self::Nlp(NlpError::ModelUnavailable { .. })
        )
    }
}
