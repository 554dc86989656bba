//! Pipeline runner.
//!
//! Single entry point for interactive surfaces: create or reopen a project,
//! then run a [`StageRequest`] over it while reporting progress.
//!
//! Collaborators (content ingestor, URL fetcher, NLP engine) are injected as
//! trait objects so the runner is testable with mock implementations.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::{ConfigError, PipelineSettings};
use crate::models::{ErrorKind, InvalidEnum, Language, ProcessingStats};
use crate::pipeline::cleaning::{Cleaner, CleaningError};
use crate::pipeline::import::{HtmlIngestor, HttpFetcher, ImportError, ProjectWorkspace};
use crate::pipeline::nlp::RuleBasedEngine;
use crate::pipeline::stages::{
    PipelineEvent, PlannedStep, ProgressTracker, Project, StageError, StageOrchestrator,
    StageRequest,
};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Project creation failed: {0}")]
    Import(#[from] ImportError),

    #[error("Stage failed: {0}")]
    Stage(#[from] StageError),

    #[error("Contraction table error: {0}")]
    Cleaning(#[from] CleaningError),

    #[error("Unsupported language: {0}")]
    Language(#[from] InvalidEnum),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(e) => e.kind(),
            Self::Import(e) => e.kind(),
            Self::Stage(e) => e.kind(),
            Self::Cleaning(e) => e.kind(),
            Self::Language(_) => ErrorKind::Validation,
        }
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// What a call to [`Crumbler::run`] did.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub project: String,
    pub language: Language,
    pub steps: Vec<PlannedStep>,
    /// Counts for this run only.
    pub stats: ProcessingStats,
    /// Counts since the project was created or opened.
    pub project_stats: ProcessingStats,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    pub fn duration_ms(&self) -> u64 {
        (self.finished_at - self.started_at).num_milliseconds().max(0) as u64
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Owns the workspace and the orchestrator for the lifetime of a session.
pub struct Crumbler {
    workspace: ProjectWorkspace,
    orchestrator: StageOrchestrator,
}

impl Crumbler {
    pub fn new(workspace: ProjectWorkspace, orchestrator: StageOrchestrator) -> Self {
        Self {
            workspace,
            orchestrator,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        self.workspace.settings()
    }

    pub fn orchestrator(&self) -> &StageOrchestrator {
        &self.orchestrator
    }

    /// Validate `input` and create a seeded project named after `name`.
    pub fn new_project(&self, input: &str, name: &str) -> Result<Project, PipelineError> {
        Ok(self.workspace.create(input, name)?)
    }

    /// Continue a project created in an earlier session.
    pub fn open_project(&self, directory: &Path) -> Result<Project, PipelineError> {
        Ok(Project::open(directory)?)
    }

    /// Run every stage `request` selects, in pipeline order.
    ///
    /// Per-document failures only show up in the returned stats. A fatal
    /// stage error stops the run; stages already finished keep their output.
    pub fn run(
        &self,
        project: &mut Project,
        request: &StageRequest,
        language: Language,
        progress_fn: Option<&dyn Fn(PipelineEvent)>,
    ) -> Result<RunSummary, PipelineError> {
        let started_at = Utc::now();
        let steps = request.plan();
        let mut tracker = ProgressTracker::for_plan(&steps);
        let mut stats = ProcessingStats::default();

        tracing::info!(
            project = %project.name(),
            language = language.as_str(),
            steps = steps.len(),
            total_units = tracker.total(),
            "Pipeline run started"
        );
        if let Some(progress) = progress_fn {
            progress(PipelineEvent::Started {
                project: project.name().to_string(),
                steps: steps.len() as u32,
                total_units: tracker.total(),
            });
        }

        for step in &steps {
            let outcome = self
                .orchestrator
                .run_stage(project, step.stage, language)
                .inspect_err(|e| {
                    tracing::error!(stage = step.stage.as_str(), error = %e, "Pipeline run aborted");
                })?;
            let step_stats = outcome.stats;
            stats.absorb(&step_stats);
            project.apply(outcome);

            let percent = tracker.advance(step.units);
            if let Some(progress) = progress_fn {
                progress(PipelineEvent::StageCompleted {
                    stage: step.stage.as_str().to_string(),
                    implicit: step.implicit,
                    units: step.units,
                    percent,
                    stats: step_stats,
                });
            }
        }

        let summary = RunSummary {
            project: project.name().to_string(),
            language,
            steps,
            stats,
            project_stats: *project.stats(),
            started_at,
            finished_at: Utc::now(),
        };

        tracing::info!(
            project = %summary.project,
            processed = stats.processed,
            failed = stats.failed,
            warnings = stats.warnings,
            duration_ms = summary.duration_ms(),
            "Pipeline run finished"
        );
        if let Some(progress) = progress_fn {
            progress(PipelineEvent::Finished {
                stats,
                duration_ms: summary.duration_ms(),
            });
        }
        Ok(summary)
    }
}

/// Build a runner with the default collaborators: HTML ingestion, blocking
/// HTTP fetching and the rule-based NLP engine.
pub fn build_crumbler(settings: PipelineSettings, cleaner: Cleaner) -> Result<Crumbler, PipelineError> {
    let fetcher = HttpFetcher::new(settings.fetch_timeout_secs)?;
    let workspace = ProjectWorkspace::new(settings, Box::new(HtmlIngestor), Box::new(fetcher));
    let orchestrator = StageOrchestrator::new(Box::new(RuleBasedEngine::new()), cleaner);
    tracing::debug!("Pipeline runner built with rule-based engine");
    Ok(Crumbler::new(workspace, orchestrator))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::path::PathBuf;

    use url::Url;

    use super::*;
    use crate::pipeline::import::UrlFetcher;

    struct OfflineFetcher;

    impl UrlFetcher for OfflineFetcher {
        fn fetch(&self, url: &Url) -> Result<Vec<u8>, ImportError> {
            Err(ImportError::Fetch {
                url: url.to_string(),
                reason: "offline".into(),
            })
        }
    }

    fn crumbler(root: &Path) -> Crumbler {
        let settings = PipelineSettings {
            output_root: root.to_path_buf(),
            ..PipelineSettings::default()
        };
        let workspace = ProjectWorkspace::new(settings, Box::new(HtmlIngestor), Box::new(OfflineFetcher));
        let orchestrator = StageOrchestrator::new(Box::new(RuleBasedEngine::new()), Cleaner::new());
        Crumbler::new(workspace, orchestrator)
    }

    fn sample_input(dir: &Path) -> PathBuf {
        let path = dir.join("sample.txt");
        std::fs::write(&path, "Hello, World! This is a test.\nIt's working, isn't it?").unwrap();
        path
    }

    fn collect(
        runner: &Crumbler,
        project: &mut Project,
        request: &StageRequest,
    ) -> (RunSummary, Vec<PipelineEvent>) {
        let events = RefCell::new(Vec::new());
        let summary = {
            let record = |event: PipelineEvent| events.borrow_mut().push(event);
            runner
                .run(project, request, Language::En, Some(&record))
                .unwrap()
        };
        (summary, events.into_inner())
    }

    fn percents(events: &[PipelineEvent]) -> Vec<u8> {
        events
            .iter()
            .filter_map(|e| match e {
                PipelineEvent::StageCompleted { percent, .. } => Some(*percent),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn full_run_reports_progress() {
        let out = tempfile::tempdir().unwrap();
        let src = tempfile::tempdir().unwrap();
        let runner = crumbler(out.path());
        let input = sample_input(src.path());
        let mut project = runner.new_project(input.to_str().unwrap(), "demo").unwrap();

        let request = StageRequest {
            clean: true,
            normalize: true,
            tokenize: true,
            stopwords: true,
            lemmatize: true,
            tag: true,
            ner: true,
            ..Default::default()
        };
        let (summary, events) = collect(&runner, &mut project, &request);

        assert!(matches!(
            events.first(),
            Some(PipelineEvent::Started { total_units: 7, .. })
        ));
        assert!(matches!(events.last(), Some(PipelineEvent::Finished { .. })));
        assert_eq!(percents(&events), vec![14, 29, 43, 57, 71, 86, 100]);

        assert_eq!(summary.steps.len(), 7);
        assert_eq!(summary.stats.processed, 7);
        assert_eq!(summary.stats.failed, 0);
        // Ingestion plus the run.
        assert_eq!(summary.project_stats.processed, 8);

        let dir = project.directory();
        // Token stages read the latest token artifact, here the filtered one.
        assert!(dir.join("sample_cl_n_tok_nost.txt").exists());
        assert!(dir.join("sample_cl_n_tok_nost_lem.txt").exists());
        assert!(dir.join("sample_cl_n_tok_nost_pos.xml").exists());
        assert!(dir.join("sample_cl_n_tok_nost_ner.csv").exists());
    }

    #[test]
    fn implicit_tokenize_counts_two_units() {
        let out = tempfile::tempdir().unwrap();
        let src = tempfile::tempdir().unwrap();
        let runner = crumbler(out.path());
        let input = sample_input(src.path());
        let mut project = runner.new_project(input.to_str().unwrap(), "demo").unwrap();

        let request = StageRequest {
            ner: true,
            ..Default::default()
        };
        let (summary, events) = collect(&runner, &mut project, &request);

        assert!(matches!(
            events.first(),
            Some(PipelineEvent::Started { total_units: 2, steps: 2, .. })
        ));
        assert_eq!(percents(&events), vec![50, 100]);
        assert!(summary.steps[0].implicit);
        assert!(project.directory().join("sample_tok_ner.txt").exists());
    }

    #[test]
    fn empty_request_finishes_immediately() {
        let out = tempfile::tempdir().unwrap();
        let src = tempfile::tempdir().unwrap();
        let runner = crumbler(out.path());
        let input = sample_input(src.path());
        let mut project = runner.new_project(input.to_str().unwrap(), "demo").unwrap();

        let (summary, events) = collect(&runner, &mut project, &StageRequest::default());
        assert_eq!(events.len(), 2);
        assert!(summary.steps.is_empty());
        assert_eq!(summary.stats, ProcessingStats::default());
    }

    #[test]
    fn reopened_project_continues() {
        let out = tempfile::tempdir().unwrap();
        let src = tempfile::tempdir().unwrap();
        let runner = crumbler(out.path());
        let input = sample_input(src.path());
        let mut project = runner.new_project(input.to_str().unwrap(), "demo").unwrap();

        let clean = StageRequest {
            clean: true,
            ..Default::default()
        };
        runner.run(&mut project, &clean, Language::En, None).unwrap();

        let mut reopened = runner.open_project(project.directory()).unwrap();
        assert_eq!(reopened.seed_file_count(), 1);

        let tokenize = StageRequest {
            tokenize: true,
            ..Default::default()
        };
        let summary = runner
            .run(&mut reopened, &tokenize, Language::En, None)
            .unwrap();
        assert_eq!(summary.stats.processed, 1);
        assert!(reopened.directory().join("sample_cl_tok.txt").exists());
    }

    #[test]
    fn invalid_input_is_validation_error() {
        let out = tempfile::tempdir().unwrap();
        let runner = crumbler(out.path());
        let err = runner.new_project("", "demo").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn missing_project_is_not_found() {
        let out = tempfile::tempdir().unwrap();
        let runner = crumbler(out.path());
        let err = runner.open_project(&out.path().join("nope")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
    }

    #[test]
    fn unknown_language_code_is_rejected() {
        let err: PipelineError = Language::from_code("fr").unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn default_runner_builds() {
        let out = tempfile::tempdir().unwrap();
        let settings = PipelineSettings {
            output_root: out.path().to_path_buf(),
            ..PipelineSettings::default()
        };
        let runner = build_crumbler(settings, Cleaner::new()).unwrap();
        assert_eq!(runner.settings().output_root, out.path());
    }

    #[test]
    fn summary_serializes() {
        let now = Utc::now();
        let summary = RunSummary {
            project: "p".into(),
            language: Language::De,
            steps: Vec::new(),
            stats: ProcessingStats::default(),
            project_stats: ProcessingStats::default(),
            started_at: now,
            finished_at: now,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["language"], "DE");
        assert_eq!(summary.duration_ms(), 0);
    }
}
