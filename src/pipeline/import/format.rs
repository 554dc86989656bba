use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::PipelineSettings;
use super::ImportError;

/// How a staged source file becomes seed text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DocumentKind {
    /// Decoded as-is (`.txt`, `.md`, `.markdown`).
    Plain,
    /// Passed through the content ingestor (`.html`, `.xml`).
    Markup,
    /// Staged only; text extraction is left to external tooling.
    Binary,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Markup => "markup",
            Self::Binary => "binary",
        }
    }

    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "html" | "htm" | "xml" => Self::Markup,
            "pdf" | "mp3" | "wav" => Self::Binary,
            _ => Self::Plain,
        }
    }

    pub fn has_text(&self) -> bool {
        !matches!(self, Self::Binary)
    }
}

/// An input reference that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidatedInput {
    File(PathBuf),
    Directory {
        root: PathBuf,
        /// Accepted files, sorted, recursively collected.
        files: Vec<PathBuf>,
        /// Supported files rejected by the size or emptiness checks.
        skipped: Vec<PathBuf>,
    },
    Url(Url),
}

impl ValidatedInput {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Directory { .. } => "directory",
            Self::Url(_) => "url",
        }
    }
}

/// Classify and validate an input reference. Nothing is written.
pub fn validate_input(
    input: &str,
    settings: &PipelineSettings,
) -> Result<ValidatedInput, ImportError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ImportError::EmptyInput);
    }

    let path = Path::new(trimmed);
    if path.is_file() {
        check_file(path, settings)?;
        return Ok(ValidatedInput::File(path.to_path_buf()));
    }

    if path.is_dir() {
        let mut files = Vec::new();
        let mut skipped = Vec::new();
        collect_candidates(path, settings, &mut files, &mut skipped)?;
        if files.is_empty() {
            return Err(ImportError::NoSupportedFiles(path.to_path_buf()));
        }
        files.sort();
        skipped.sort();
        for file in &skipped {
            tracing::warn!(file = %file.display(), "Skipping file that failed validation");
        }
        return Ok(ValidatedInput::Directory {
            root: path.to_path_buf(),
            files,
            skipped,
        });
    }

    match Url::parse(trimmed) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() => {
            Ok(ValidatedInput::Url(url))
        }
        _ if !trimmed.contains("://") && looks_like_path(trimmed) => {
            Err(ImportError::NotFound(path.to_path_buf()))
        }
        _ => Err(ImportError::InvalidUrl(trimmed.to_string())),
    }
}

/// Extension, size and emptiness checks for one regular file.
pub fn check_file(path: &Path, settings: &PipelineSettings) -> Result<u64, ImportError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    if !settings.is_supported_extension(extension) {
        return Err(ImportError::UnsupportedFormat(
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        ));
    }

    let size = std::fs::metadata(path)?.len();
    if size > settings.max_file_size {
        return Err(ImportError::FileTooLarge {
            size_mb: size as f64 / (1024.0 * 1024.0),
            max_mb: settings.max_file_size / (1024 * 1024),
        });
    }
    if size == 0 {
        return Err(ImportError::EmptyFile(path.to_path_buf()));
    }
    Ok(size)
}

fn collect_candidates(
    dir: &Path,
    settings: &PipelineSettings,
    files: &mut Vec<PathBuf>,
    skipped: &mut Vec<PathBuf>,
) -> Result<(), ImportError> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let p = entry.path();
        if file_type.is_dir() {
            collect_candidates(&p, settings, files, skipped)?;
            continue;
        }
        // Symlinked directories are not descended into; they may loop.
        if file_type.is_symlink() && p.is_dir() {
            tracing::debug!(path = %p.display(), "Not following directory symlink");
            continue;
        }
        match check_file(&p, settings) {
            Ok(_) => files.push(p),
            // Unsupported types are not candidates at all.
            Err(ImportError::UnsupportedFormat(_)) => {}
            Err(ImportError::Io(e)) => return Err(ImportError::Io(e)),
            Err(_) => skipped.push(p),
        }
    }
    Ok(())
}

fn looks_like_path(input: &str) -> bool {
    input.contains('/')
        || input.contains('\\')
        || Path::new(input).extension().is_some()
}

/// Strip path components and NUL bytes; cap at 255 characters.
pub fn sanitize_filename(original: &str) -> String {
    let name = Path::new(original)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document");

    let clean: String = name
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | '\0'))
        .take(255)
        .collect();

    if clean.is_empty() {
        "document".to_string()
    } else {
        clean
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> PipelineSettings {
        PipelineSettings::default()
    }

    #[test]
    fn empty_input_rejected() {
        let err = validate_input("   ", &settings()).unwrap_err();
        assert!(matches!(err, ImportError::EmptyInput));
        assert_eq!(err.kind(), crate::models::ErrorKind::Validation);
    }

    #[test]
    fn every_supported_extension_accepted() {
        let dir = tempfile::tempdir().unwrap();
        for ext in ["txt", "html", "xml", "md", "markdown", "pdf", "mp3", "wav", "TXT"] {
            let path = dir.path().join(format!("sample.{ext}"));
            std::fs::write(&path, "content").unwrap();
            let validated = validate_input(path.to_str().unwrap(), &settings()).unwrap();
            assert_eq!(validated, ValidatedInput::File(path));
        }
    }

    #[test]
    fn unsupported_extension_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("program.exe");
        std::fs::write(&path, "MZ").unwrap();
        let err = validate_input(path.to_str().unwrap(), &settings()).unwrap_err();
        assert!(matches!(err, ImportError::UnsupportedFormat(_)));
    }

    #[test]
    fn oversized_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.txt");
        let file = std::fs::File::create(&path).unwrap();
        file.set_len(settings().max_file_size + 1).unwrap();
        let err = validate_input(path.to_str().unwrap(), &settings()).unwrap_err();
        assert!(matches!(err, ImportError::FileTooLarge { .. }));
        assert_eq!(err.kind(), crate::models::ErrorKind::Validation);
    }

    #[test]
    fn file_at_limit_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("limit.txt");
        let file = std::fs::File::create(&path).unwrap();
        file.set_len(settings().max_file_size).unwrap();
        assert!(validate_input(path.to_str().unwrap(), &settings()).is_ok());
    }

    #[test]
    fn empty_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        std::fs::write(&path, "").unwrap();
        let err = validate_input(path.to_str().unwrap(), &settings()).unwrap_err();
        assert!(matches!(err, ImportError::EmptyFile(_)));
    }

    #[test]
    fn directory_keeps_valid_subset() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested/b.html"), "<p>beta</p>").unwrap();
        std::fs::write(dir.path().join("empty.md"), "").unwrap();
        std::fs::write(dir.path().join("ignored.exe"), "MZ").unwrap();

        match validate_input(dir.path().to_str().unwrap(), &settings()).unwrap() {
            ValidatedInput::Directory { files, skipped, .. } => {
                assert_eq!(files.len(), 2);
                assert_eq!(skipped, vec![dir.path().join("empty.md")]);
            }
            other => panic!("expected directory, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn directory_symlinks_not_followed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("loop")).unwrap();

        match validate_input(dir.path().to_str().unwrap(), &settings()).unwrap() {
            ValidatedInput::Directory { files, .. } => {
                assert_eq!(files, vec![dir.path().join("a.txt")]);
            }
            other => panic!("expected directory, got {other:?}"),
        }
    }

    #[test]
    fn directory_without_supported_files_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tool.exe"), "MZ").unwrap();
        let err = validate_input(dir.path().to_str().unwrap(), &settings()).unwrap_err();
        assert!(matches!(err, ImportError::NoSupportedFiles(_)));
    }

    #[test]
    fn http_urls_accepted() {
        for url in ["https://example.com/articles/news.html", "http://example.org"] {
            let validated = validate_input(url, &settings()).unwrap();
            assert_eq!(validated.as_str(), "url");
        }
    }

    #[test]
    fn non_http_urls_rejected() {
        for input in ["ftp://example.com/file.txt", "just some words", "https://"] {
            let err = validate_input(input, &settings()).unwrap_err();
            assert!(matches!(err, ImportError::InvalidUrl(_)), "{input}: {err:?}");
        }
    }

    #[test]
    fn missing_path_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.txt");
        let err = validate_input(path.to_str().unwrap(), &settings()).unwrap_err();
        assert!(matches!(err, ImportError::NotFound(_)));
        assert_eq!(err.kind(), crate::models::ErrorKind::FileNotFound);
    }

    #[test]
    fn document_kind_by_extension() {
        assert_eq!(DocumentKind::from_path(Path::new("a.TXT")), DocumentKind::Plain);
        assert_eq!(DocumentKind::from_path(Path::new("a.markdown")), DocumentKind::Plain);
        assert_eq!(DocumentKind::from_path(Path::new("a.html")), DocumentKind::Markup);
        assert_eq!(DocumentKind::from_path(Path::new("a.xml")), DocumentKind::Markup);
        assert_eq!(DocumentKind::from_path(Path::new("a.wav")), DocumentKind::Binary);
        assert!(!DocumentKind::Binary.has_text());
    }

    #[test]
    fn sanitize_path_traversal() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("normal_file.txt"), "normal_file.txt");
        assert_eq!(sanitize_filename(""), "document");
        assert_eq!(sanitize_filename("file\0name.txt"), "filename.txt");
    }
}
