use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::models::{
    parse_stage_chain, Artifact, ArtifactClass, ArtifactKind, ProcessingStats, Stage,
};
use super::StageError;

/// Every artifact derived from one seed, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentLineage {
    artifacts: Vec<Artifact>,
}

impl DocumentLineage {
    pub fn new(seed: PathBuf) -> Self {
        Self {
            artifacts: vec![Artifact::seed(seed)],
        }
    }

    pub fn seed(&self) -> &Artifact {
        &self.artifacts[0]
    }

    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    /// Most recent artifact of `class`.
    pub fn latest(&self, class: ArtifactClass) -> Option<&Artifact> {
        self.artifacts.iter().rev().find(|a| a.class() == class)
    }

    /// The artifact `stage` should consume.
    pub fn input_for(&self, stage: Stage) -> Option<&Artifact> {
        self.latest(stage.input_class())
    }

    fn record(&mut self, artifact: Artifact) {
        self.artifacts.retain(|a| a.path != artifact.path);
        self.artifacts.push(artifact);
    }
}

/// A project directory and what the pipeline knows about its contents.
#[derive(Debug, Clone, Serialize)]
pub struct Project {
    name: String,
    directory: PathBuf,
    lineages: Vec<DocumentLineage>,
    stats: ProcessingStats,
    #[serde(skip)]
    tokenized: bool,
}

impl Project {
    pub fn new(name: String, directory: PathBuf) -> Self {
        Self {
            name,
            directory,
            lineages: Vec::new(),
            stats: ProcessingStats::default(),
            tokenized: false,
        }
    }

    /// Rebuild a project from the `.txt` artifacts in an existing directory.
    ///
    /// File names are parsed back into suffix chains and grouped by seed.
    /// Chains whose seed file is gone are ignored. Tokenization is not
    /// considered done for the new session even when token files exist.
    pub fn open(directory: &Path) -> Result<Self, StageError> {
        if !directory.is_dir() {
            return Err(StageError::ProjectMissing(directory.to_path_buf()));
        }
        let name = directory
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut groups: BTreeMap<String, Vec<(Vec<Stage>, PathBuf)>> = BTreeMap::new();
        for entry in std::fs::read_dir(directory)? {
            let path = entry?.path();
            let is_txt = path
                .extension()
                .is_some_and(|e| e.eq_ignore_ascii_case("txt"));
            if !path.is_file() || !is_txt {
                continue;
            }
            let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                continue;
            };
            let (seed, chain) = parse_stage_chain(&stem);
            groups.entry(seed).or_default().push((chain, path));
        }

        let mut project = Self::new(name, directory.to_path_buf());
        for (seed, mut members) in groups {
            let Some(pos) = members.iter().position(|(chain, _)| chain.is_empty()) else {
                tracing::debug!(seed = %seed, "Artifacts without a seed file ignored");
                continue;
            };
            let (_, seed_path) = members.swap_remove(pos);
            members.sort_by_key(|(chain, _)| {
                (chain.len(), chain.last().map(|s| s.rank()).unwrap_or(0))
            });

            let mut lineage = DocumentLineage::new(seed_path);
            for (chain, path) in members {
                if let Some(&stage) = chain.last() {
                    lineage.record(Artifact {
                        path,
                        kind: ArtifactKind::Stage(stage),
                    });
                }
            }
            project.lineages.push(lineage);
        }

        tracing::info!(
            project = %project.name,
            seeds = project.lineages.len(),
            artifacts = project.artifact_count(),
            "Project opened"
        );
        Ok(project)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn lineages(&self) -> &[DocumentLineage] {
        &self.lineages
    }

    pub fn seed_file_count(&self) -> usize {
        self.lineages.len()
    }

    pub fn artifact_count(&self) -> usize {
        self.lineages.iter().map(|l| l.artifacts.len()).sum()
    }

    pub fn stats(&self) -> &ProcessingStats {
        &self.stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut ProcessingStats {
        &mut self.stats
    }

    pub(crate) fn add_seed(&mut self, path: PathBuf) {
        self.lineages.push(DocumentLineage::new(path));
    }

    /// Whether a tokenization stage has completed in this session.
    pub fn tokenized_this_session(&self) -> bool {
        self.tokenized
    }

    /// Register what a stage call produced.
    pub fn apply(&mut self, outcome: StageOutcome) {
        for (index, artifact) in outcome.artifacts {
            match self.lineages.get_mut(index) {
                Some(lineage) => lineage.record(artifact),
                None => tracing::warn!(index, "Outcome refers to an unknown document"),
            }
        }
        self.stats.absorb(&outcome.stats);
        if outcome.stages.contains(&Stage::Tokenize) {
            self.tokenized = true;
        }
    }
}

/// What one stage call did. Apply it to the project to advance it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StageOutcome {
    /// Stages that ran, including an implicit tokenization.
    pub stages: Vec<Stage>,
    /// New artifacts, keyed by lineage index.
    pub artifacts: Vec<(usize, Artifact)>,
    pub stats: ProcessingStats,
    /// Progress units consumed.
    pub units: u32,
}

impl StageOutcome {
    pub fn new(stage: Stage) -> Self {
        Self {
            stages: vec![stage],
            units: 1,
            ..Default::default()
        }
    }

    /// Combine with a stage that ran after this one.
    pub fn then(mut self, next: StageOutcome) -> Self {
        self.stages.extend(next.stages);
        self.artifacts.extend(next.artifacts);
        self.stats.absorb(&next.stats);
        self.units += next.units;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, "x").unwrap();
        path
    }

    #[test]
    fn open_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = Project::open(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, StageError::ProjectMissing(_)));
        assert_eq!(err.kind(), crate::models::ErrorKind::FileNotFound);
    }

    #[test]
    fn open_rebuilds_lineages() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "report.txt");
        touch(dir.path(), "report_cl_tok.txt");
        touch(dir.path(), "report_cl.txt");
        touch(dir.path(), "report_cl_tok_pos.txt");
        touch(dir.path(), "report_cl_tok_pos.csv");
        touch(dir.path(), "memo.txt");
        touch(dir.path(), "orphan_cl.txt");
        std::fs::create_dir(dir.path().join("originals")).unwrap();

        let project = Project::open(dir.path()).unwrap();
        assert_eq!(project.seed_file_count(), 2);
        assert!(!project.tokenized_this_session());

        let report = project
            .lineages()
            .iter()
            .find(|l| l.seed().path.ends_with("report.txt"))
            .unwrap();
        assert_eq!(report.artifacts().len(), 4);
        assert!(report
            .latest(ArtifactClass::Text)
            .unwrap()
            .path
            .ends_with("report_cl.txt"));
        assert!(report
            .input_for(Stage::Ner)
            .unwrap()
            .path
            .ends_with("report_cl_tok.txt"));
        assert_eq!(
            report.latest(ArtifactClass::Terminal).unwrap().kind,
            ArtifactKind::Stage(Stage::Tag)
        );
    }

    #[test]
    fn open_orders_same_length_chains_by_stage() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.txt");
        touch(dir.path(), "a_nl.txt");
        touch(dir.path(), "a_cl.txt");

        let project = Project::open(dir.path()).unwrap();
        let lineage = &project.lineages()[0];
        assert!(lineage
            .latest(ArtifactClass::Text)
            .unwrap()
            .path
            .ends_with("a_nl.txt"));
    }

    #[test]
    fn apply_records_artifacts_and_tokenization() {
        let dir = tempfile::tempdir().unwrap();
        let mut project = Project::new("p".into(), dir.path().to_path_buf());
        project.add_seed(dir.path().join("a.txt"));

        let mut outcome = StageOutcome::new(Stage::Tokenize);
        outcome.artifacts.push((
            0,
            Artifact {
                path: dir.path().join("a_tok.txt"),
                kind: ArtifactKind::Stage(Stage::Tokenize),
            },
        ));
        outcome.stats.record_processed();
        project.apply(outcome.clone());
        project.apply(outcome);

        assert!(project.tokenized_this_session());
        assert_eq!(project.lineages()[0].artifacts().len(), 2);
        assert_eq!(project.stats().processed, 2);
    }

    #[test]
    fn outcomes_chain() {
        let mut first = StageOutcome::new(Stage::Tokenize);
        first.stats.record_processed();
        let mut second = StageOutcome::new(Stage::Tag);
        second.stats.record_failed();

        let combined = first.then(second);
        assert_eq!(combined.stages, vec![Stage::Tokenize, Stage::Tag]);
        assert_eq!(combined.units, 2);
        assert_eq!(combined.stats.processed, 1);
        assert_eq!(combined.stats.failed, 1);
    }
}
