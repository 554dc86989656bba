use std::io::Write;
use std::path::{Path, PathBuf};

use crate::models::{
    stage_output_paths, Artifact, ArtifactKind, Language, NormalizeOptions, Stage, StageResult,
};
use crate::pipeline::cleaning::Cleaner;
use crate::pipeline::export::{export, ExportError, ExportFormat};
use crate::pipeline::nlp::NlpEngine;
use super::{Project, StageError, StageOutcome};

/// Runs pipeline stages over a project.
///
/// Every stage reads the latest suitable artifact of each document, writes
/// its output next to it and returns a [`StageOutcome`]. A failing document
/// is logged and counted; the rest of the batch still runs. Only a missing
/// project directory or an engine without a model for the language aborts
/// the call.
pub struct StageOrchestrator {
    engine: Box<dyn NlpEngine + Send + Sync>,
    cleaner: Cleaner,
}

impl StageOrchestrator {
    pub fn new(engine: Box<dyn NlpEngine + Send + Sync>, cleaner: Cleaner) -> Self {
        Self { engine, cleaner }
    }

    pub fn cleaner(&self) -> &Cleaner {
        &self.cleaner
    }

    /// Run a single stage. Token stages tokenize first when the session has
    /// not done so yet.
    pub fn run_stage(
        &self,
        project: &Project,
        stage: Stage,
        language: Language,
    ) -> Result<StageOutcome, StageError> {
        match stage {
            Stage::Clean => self.clean(project),
            Stage::Normalize(options) => self.normalize(project, options, language),
            Stage::Tokenize => self.tokenize(project, language),
            Stage::Stopwords => self.remove_stopwords(project, language),
            Stage::Lemmatize => self.lemmatize(project, language),
            Stage::Tag => self.tag(project, language),
            Stage::Ner => self.recognize_entities(project, language),
        }
    }

    pub fn clean(&self, project: &Project) -> Result<StageOutcome, StageError> {
        self.run_over(project, Stage::Clean, |input| {
            let text = std::fs::read_to_string(&input.path)?;
            Ok(vec![self.cleaner.clean(&text)])
        })
    }

    pub fn normalize(
        &self,
        project: &Project,
        options: NormalizeOptions,
        language: Language,
    ) -> Result<StageOutcome, StageError> {
        let mut outcome = self.run_over(project, Stage::Normalize(options), |input| {
            let text = std::fs::read_to_string(&input.path)?;
            Ok(vec![self.cleaner.normalize(&text, options, language)])
        })?;
        outcome.units += u32::from(options.lowercase) + u32::from(options.contractions);
        Ok(outcome)
    }

    pub fn tokenize(&self, project: &Project, language: Language) -> Result<StageOutcome, StageError> {
        self.run_over(project, Stage::Tokenize, |input| {
            let text = std::fs::read_to_string(&input.path)?;
            let tokens = self.engine.tokenize(&text, language)?;
            Ok(vec![serde_json::to_string(&tokens)?])
        })
    }

    pub fn remove_stopwords(
        &self,
        project: &Project,
        language: Language,
    ) -> Result<StageOutcome, StageError> {
        self.with_tokens(project, language, |project| {
            self.run_over(project, Stage::Stopwords, |input| {
                let kept: Vec<String> = read_tokens(&input.path)?
                    .into_iter()
                    .filter(|t| !self.engine.is_stop_word(t, language))
                    .collect();
                Ok(vec![serde_json::to_string(&kept)?])
            })
        })
    }

    pub fn lemmatize(&self, project: &Project, language: Language) -> Result<StageOutcome, StageError> {
        self.with_tokens(project, language, |project| {
            self.run_over(project, Stage::Lemmatize, |input| {
                let text = read_tokens(&input.path)?.join(" ");
                let pairs = self.engine.lemmatize(&text, language)?;
                exports(&StageResult::LemmaPairs(pairs), Stage::Lemmatize)
            })
        })
    }

    pub fn tag(&self, project: &Project, language: Language) -> Result<StageOutcome, StageError> {
        self.with_tokens(project, language, |project| {
            self.run_over(project, Stage::Tag, |input| {
                let text = read_tokens(&input.path)?.join(" ");
                let tagged = self.engine.tag(&text, language)?;
                exports(&StageResult::TaggedTokens(tagged), Stage::Tag)
            })
        })
    }

    pub fn recognize_entities(
        &self,
        project: &Project,
        language: Language,
    ) -> Result<StageOutcome, StageError> {
        self.with_tokens(project, language, |project| {
            self.run_over(project, Stage::Ner, |input| {
                let text = read_tokens(&input.path)?.join(" ");
                let entities = self.engine.entities(&text, language)?;
                exports(&StageResult::Entities(entities), Stage::Ner)
            })
        })
    }

    /// Tokenize ahead of `run` unless this session already did, and report
    /// both stages as one outcome.
    fn with_tokens<F>(&self, project: &Project, language: Language, run: F) -> Result<StageOutcome, StageError>
    where
        F: FnOnce(&Project) -> Result<StageOutcome, StageError>,
    {
        if project.tokenized_this_session() {
            return run(project);
        }

        tracing::info!(project = %project.name(), "Tokenizing before dependent stage");
        let tokenized = self.tokenize(project, language)?;
        let mut view = project.clone();
        view.apply(tokenized.clone());
        let next = run(&view)?;
        Ok(tokenized.then(next))
    }

    /// Apply `work` to the input artifact of every document. `work` returns
    /// the file contents in the order of [`Stage::extensions`].
    fn run_over<F>(&self, project: &Project, stage: Stage, work: F) -> Result<StageOutcome, StageError>
    where
        F: Fn(&Artifact) -> Result<Vec<String>, StageError>,
    {
        if !project.directory().is_dir() {
            tracing::error!(
                stage = stage.as_str(),
                directory = %project.directory().display(),
                "Project directory missing"
            );
            return Err(StageError::ProjectMissing(project.directory().to_path_buf()));
        }

        tracing::info!(
            stage = stage.as_str(),
            project = %project.name(),
            documents = project.seed_file_count(),
            "Stage started"
        );

        let mut outcome = StageOutcome::new(stage);
        for (index, lineage) in project.lineages().iter().enumerate() {
            let Some(input) = lineage.input_for(stage) else {
                tracing::warn!(
                    stage = stage.as_str(),
                    seed = %lineage.seed().path.display(),
                    "No input artifact for stage"
                );
                outcome.stats.record_warning();
                continue;
            };

            let paths = stage_output_paths(&input.path, stage);
            let artifact = Artifact {
                path: paths[0].clone(),
                kind: ArtifactKind::Stage(stage),
            };

            if artifact.path.exists() {
                // Only a file this document already produced may stand in for the output.
                if lineage.artifacts().iter().any(|a| a.path == artifact.path) {
                    tracing::warn!(file = %artifact.path.display(), "Artifact exists, reusing it");
                    outcome.stats.record_warning();
                    outcome.artifacts.push((index, artifact));
                } else {
                    tracing::warn!(
                        stage = stage.as_str(),
                        file = %artifact.path.display(),
                        "Target exists but belongs to no known artifact of this document"
                    );
                    outcome.stats.record_failed();
                }
                continue;
            }

            match work(input).and_then(|contents| write_new(&paths, &contents)) {
                Ok(()) => {
                    tracing::debug!(
                        stage = stage.as_str(),
                        input = %input.path.display(),
                        output = %artifact.path.display(),
                        "Artifact written"
                    );
                    outcome.stats.record_processed();
                    outcome.artifacts.push((index, artifact));
                }
                Err(e) if e.is_fatal() => {
                    tracing::error!(stage = stage.as_str(), error = %e, "Stage aborted");
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(
                        stage = stage.as_str(),
                        file = %input.path.display(),
                        error = %e,
                        "Stage failed for file"
                    );
                    outcome.stats.record_failed();
                }
            }
        }

        tracing::info!(
            stage = stage.as_str(),
            processed = outcome.stats.processed,
            failed = outcome.stats.failed,
            warnings = outcome.stats.warnings,
            "Stage finished"
        );
        Ok(outcome)
    }
}

fn read_tokens(path: &Path) -> Result<Vec<String>, StageError> {
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|source| StageError::TokenArtifact {
        path: path.to_path_buf(),
        source,
    })
}

/// Export `result` once per file the stage writes.
fn exports(result: &StageResult, stage: Stage) -> Result<Vec<String>, StageError> {
    stage
        .extensions()
        .iter()
        .map(|ext| -> Result<String, StageError> {
            let format = ExportFormat::from_extension(ext)
                .ok_or_else(|| ExportError::UnsupportedFormat(ext.to_string()))?;
            Ok(export(result, format)?)
        })
        .collect()
}

/// Write each file at its final path. Never overwrites.
fn write_new(paths: &[PathBuf], contents: &[String]) -> Result<(), StageError> {
    for (path, content) in paths.iter().zip(contents) {
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)?;
        file.write_all(content.as_bytes())?;
    }
    Ok(())
}
