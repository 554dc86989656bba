pub mod fetch;
pub mod format;
pub mod importer;
pub mod ingest;
pub mod staging;

pub use fetch::*;
pub use format::*;
pub use importer::*;
pub use ingest::*;
pub use staging::*;

use std::path::PathBuf;

use thiserror::Error;

use crate::models::ErrorKind;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Input is empty")]
    EmptyInput,

    #[error("File or directory not found: {0}")]
    NotFound(PathBuf),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("File too large: {size_mb:.1}MB exceeds {max_mb}MB limit")]
    FileTooLarge { size_mb: f64, max_mb: u64 },

    #[error("File is empty: {0}")]
    EmptyFile(PathBuf),

    #[error("No supported files in directory: {0}")]
    NoSupportedFiles(PathBuf),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not reach {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("{url} answered with HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("Could not extract text: {0}")]
    Extraction(String),

    #[error("Could not create project directory {path}: {source}")]
    Workspace {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ImportError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyInput
            | Self::UnsupportedFormat(_)
            | Self::FileTooLarge { .. }
            | Self::EmptyFile(_)
            | Self::NoSupportedFiles(_)
            | Self::InvalidUrl(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::FileNotFound,
            Self::Io(_) | Self::Fetch { .. } | Self::HttpStatus { .. } | Self::Extraction(_) => {
                ErrorKind::Processing
            }
            Self::Workspace { .. } => ErrorKind::Unexpected,
        }
    }
}
