use std::io::Write;
use std::path::{Path, PathBuf};

use url::Url;

use crate::config::PipelineSettings;
use crate::models::parse_stage_chain;
use crate::pipeline::stages::Project;
use super::fetch::UrlFetcher;
use super::format::{sanitize_filename, validate_input, DocumentKind, ValidatedInput};
use super::ingest::{decode_text, ContentIngestor};
use super::staging::{stage_bytes, stage_file};
use super::ImportError;

/// Creates project workspaces and seeds them from a file, directory or URL.
pub struct ProjectWorkspace {
    settings: PipelineSettings,
    ingestor: Box<dyn ContentIngestor + Send + Sync>,
    fetcher: Box<dyn UrlFetcher + Send + Sync>,
}

impl ProjectWorkspace {
    pub fn new(
        settings: PipelineSettings,
        ingestor: Box<dyn ContentIngestor + Send + Sync>,
        fetcher: Box<dyn UrlFetcher + Send + Sync>,
    ) -> Self {
        Self {
            settings,
            ingestor,
            fetcher,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Validate `input`, create a uniquely named project directory under the
    /// output root and write one seed artifact per ingested document.
    ///
    /// Validation happens before anything touches the disk. A single file
    /// that fails to ingest is an error; failing members of a directory and
    /// a failing URL fetch are tallied in the project stats instead.
    pub fn create(&self, input: &str, name: &str) -> Result<Project, ImportError> {
        let validated = validate_input(input, &self.settings)?;

        let name = sanitize_filename(name.trim());
        let directory = unique_project_dir(&self.settings.output_root, &name);
        std::fs::create_dir_all(&directory).map_err(|source| ImportError::Workspace {
            path: directory.clone(),
            source,
        })?;

        tracing::info!(
            project = %name,
            directory = %directory.display(),
            input = validated.as_str(),
            "Creating project"
        );

        let mut project = Project::new(name, directory);

        match validated {
            ValidatedInput::File(path) => {
                let relative = PathBuf::from(file_name_of(&path));
                match self.ingest_file(&path, &relative, &mut project)? {
                    Some(_) => project.stats_mut().record_processed(),
                    None => project.stats_mut().record_warning(),
                }
            }
            ValidatedInput::Directory {
                root,
                files,
                skipped,
            } => {
                for _ in &skipped {
                    project.stats_mut().record_warning();
                }
                for file in &files {
                    let relative = file.strip_prefix(&root).unwrap_or(file).to_path_buf();
                    match self.ingest_file(file, &relative, &mut project) {
                        Ok(Some(_)) => project.stats_mut().record_processed(),
                        Ok(None) => project.stats_mut().record_warning(),
                        Err(e) => {
                            tracing::warn!(file = %file.display(), error = %e, "Ingestion failed");
                            project.stats_mut().record_failed();
                        }
                    }
                }
            }
            ValidatedInput::Url(url) => match self.ingest_url(&url, &mut project) {
                Ok(_) => project.stats_mut().record_processed(),
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "URL ingestion failed");
                    project.stats_mut().record_failed();
                }
            },
        }

        tracing::info!(
            project = %project.name(),
            seeds = project.seed_file_count(),
            stats = %project.stats(),
            "Project created"
        );
        Ok(project)
    }

    /// Stage one file and write its seed. `None` for binary sources, which
    /// are staged but carry no text.
    fn ingest_file(
        &self,
        source: &Path,
        relative: &Path,
        project: &mut Project,
    ) -> Result<Option<PathBuf>, ImportError> {
        let staged = stage_file(source, project.directory(), relative)?;
        let kind = DocumentKind::from_path(source);
        if !kind.has_text() {
            tracing::info!(file = %source.display(), "Binary source staged without text extraction");
            return Ok(None);
        }

        let bytes = std::fs::read(&staged)?;
        let text = self.extract(&bytes, kind)?;
        let stem = stem_of(relative);
        let seed = write_seed(project.directory(), &stem, &text)?;
        project.add_seed(seed.clone());

        tracing::debug!(file = %source.display(), seed = %seed.display(), "Seed written");
        Ok(Some(seed))
    }

    fn ingest_url(&self, url: &Url, project: &mut Project) -> Result<PathBuf, ImportError> {
        let bytes = self.fetcher.fetch(url)?;
        let file_name = url_file_name(url);
        stage_bytes(&bytes, project.directory(), &file_name)?;

        // Pages rarely carry an extension; anything not plainly text is markup.
        let kind = match DocumentKind::from_path(Path::new(&file_name)) {
            DocumentKind::Plain if Path::new(&file_name).extension().is_some() => DocumentKind::Plain,
            _ => DocumentKind::Markup,
        };
        let text = self.extract(&bytes, kind)?;
        let seed = write_seed(project.directory(), &stem_of(Path::new(&file_name)), &text)?;
        project.add_seed(seed.clone());

        tracing::debug!(url = %url, seed = %seed.display(), "Seed written");
        Ok(seed)
    }

    fn extract(&self, bytes: &[u8], kind: DocumentKind) -> Result<String, ImportError> {
        match kind {
            DocumentKind::Markup => Ok(self.ingestor.extract_text(bytes)?.join("\n")),
            _ => Ok(decode_text(bytes).into_owned()),
        }
    }
}

/// `root/name`, or `root/name1`, `root/name2`, ... if taken.
pub fn unique_project_dir(root: &Path, name: &str) -> PathBuf {
    let candidate = root.join(name);
    if !candidate.exists() {
        return candidate;
    }
    let mut i = 1u32;
    loop {
        let candidate = root.join(format!("{name}{i}"));
        if !candidate.exists() {
            return candidate;
        }
        i += 1;
    }
}

/// Name a fetched payload after the last path segment, or the host.
pub fn url_file_name(url: &Url) -> String {
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
        .map(str::to_string);
    let name = segment
        .or_else(|| url.host_str().map(str::to_string))
        .unwrap_or_default();
    sanitize_filename(&name)
}

fn file_name_of(path: &Path) -> String {
    sanitize_filename(&path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default())
}

fn stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "document".into())
}

/// Write `<stem>.txt`, or `<stem>1.txt`, ... when a seed of that name exists
/// or the stem would read as a stage output (`a_cl` becomes `a_cl1`).
fn write_seed(dir: &Path, stem: &str, text: &str) -> Result<PathBuf, ImportError> {
    let mut i = 0u32;
    loop {
        let candidate = if i == 0 {
            stem.to_string()
        } else {
            format!("{stem}{i}")
        };
        if !parse_stage_chain(&candidate).1.is_empty() {
            i += 1;
            continue;
        }
        let path = dir.join(format!("{candidate}.txt"));
        match std::fs::OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(text.as_bytes())?;
                return Ok(path);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => i += 1,
            Err(e) => return Err(e.into()),
        }
    }
}
