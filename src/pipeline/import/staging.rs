use std::path::{Path, PathBuf};

use super::ImportError;

/// Directory inside a project that keeps untouched copies of the sources.
pub const ORIGINALS_DIR: &str = "originals";

/// Copy a source file into the project's originals/ directory.
/// `relative` is the path the copy should have below originals/.
/// Returns the path of the staged copy.
pub fn stage_file(
    source_path: &Path,
    project_dir: &Path,
    relative: &Path,
) -> Result<PathBuf, ImportError> {
    let target_path = project_dir.join(ORIGINALS_DIR).join(relative);
    if let Some(parent) = target_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let size = std::fs::copy(source_path, &target_path)?;

    tracing::debug!(
        source = %source_path.display(),
        staged = %target_path.display(),
        size,
        "File staged"
    );

    Ok(target_path)
}

/// Store fetched bytes under originals/ as if they had been copied from disk.
pub fn stage_bytes(
    bytes: &[u8],
    project_dir: &Path,
    file_name: &str,
) -> Result<PathBuf, ImportError> {
    let target_dir = project_dir.join(ORIGINALS_DIR);
    std::fs::create_dir_all(&target_dir)?;
    let target_path = target_dir.join(file_name);
    std::fs::write(&target_path, bytes)?;

    tracing::debug!(staged = %target_path.display(), size = bytes.len(), "Payload staged");
    Ok(target_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_file_copies_content() {
        let project = tempfile::tempdir().unwrap();
        let source_dir = tempfile::tempdir().unwrap();
        let source_path = source_dir.path().join("notes.txt");
        std::fs::write(&source_path, b"raw notes").unwrap();

        let staged = stage_file(&source_path, project.path(), Path::new("notes.txt")).unwrap();

        assert_eq!(staged, project.path().join("originals/notes.txt"));
        assert_eq!(std::fs::read(&staged).unwrap(), b"raw notes");
        // Source untouched
        assert!(source_path.exists());
    }

    #[test]
    fn stage_file_keeps_relative_layout() {
        let project = tempfile::tempdir().unwrap();
        let source_dir = tempfile::tempdir().unwrap();
        let source_path = source_dir.path().join("page.html");
        std::fs::write(&source_path, b"<p>x</p>").unwrap();

        let staged =
            stage_file(&source_path, project.path(), Path::new("chapter1/page.html")).unwrap();
        assert_eq!(staged, project.path().join("originals/chapter1/page.html"));
        assert!(staged.exists());
    }

    #[test]
    fn stage_bytes_writes_payload() {
        let project = tempfile::tempdir().unwrap();
        let staged = stage_bytes(b"<html></html>", project.path(), "index.html").unwrap();
        assert_eq!(std::fs::read_to_string(staged).unwrap(), "<html></html>");
    }
}
