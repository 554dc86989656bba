use serde::{Deserialize, Serialize};

use crate::models::{NormalizeOptions, ProcessingStats, Stage};

/// Stages selected by an interactive surface (GUI checkboxes, CLI flags).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageRequest {
    pub clean: bool,
    pub normalize: bool,
    pub lowercase: bool,
    pub contractions: bool,
    pub tokenize: bool,
    pub stopwords: bool,
    pub lemmatize: bool,
    pub tag: bool,
    pub ner: bool,
}

/// One step of an execution plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedStep {
    pub stage: Stage,
    /// Progress units this step accounts for.
    pub units: u32,
    /// Inserted because a later stage needs tokens.
    pub implicit: bool,
}

impl StageRequest {
    /// Normalization runs when any of its three options is selected.
    pub fn normalize_options(&self) -> Option<NormalizeOptions> {
        (self.normalize || self.lowercase || self.contractions).then_some(NormalizeOptions {
            lowercase: self.lowercase,
            contractions: self.contractions,
        })
    }

    pub fn needs_tokens(&self) -> bool {
        self.stopwords || self.lemmatize || self.tag || self.ner
    }

    pub fn is_empty(&self) -> bool {
        self.plan().is_empty()
    }

    /// Ordered steps: clean, normalize, tokenize, stopwords, lemmatize, tag,
    /// ner. Tokenization is added when a token stage is selected without it.
    pub fn plan(&self) -> Vec<PlannedStep> {
        let mut steps = Vec::new();
        let explicit = |stage, units| PlannedStep {
            stage,
            units,
            implicit: false,
        };

        if self.clean {
            steps.push(explicit(Stage::Clean, 1));
        }
        if let Some(options) = self.normalize_options() {
            let units = 1 + u32::from(options.lowercase) + u32::from(options.contractions);
            steps.push(explicit(Stage::Normalize(options), units));
        }
        if self.tokenize {
            steps.push(explicit(Stage::Tokenize, 1));
        } else if self.needs_tokens() {
            steps.push(PlannedStep {
                stage: Stage::Tokenize,
                units: 1,
                implicit: true,
            });
        }
        for (selected, stage) in [
            (self.stopwords, Stage::Stopwords),
            (self.lemmatize, Stage::Lemmatize),
            (self.tag, Stage::Tag),
            (self.ner, Stage::Ner),
        ] {
            if selected {
                steps.push(explicit(stage, 1));
            }
        }
        steps
    }

    pub fn total_units(&self) -> u32 {
        self.plan().iter().map(|s| s.units).sum()
    }
}

/// Completed-units counter behind the progress percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressTracker {
    total: u32,
    completed: u32,
}

impl ProgressTracker {
    pub fn new(total: u32) -> Self {
        Self { total, completed: 0 }
    }

    pub fn for_plan(plan: &[PlannedStep]) -> Self {
        Self::new(plan.iter().map(|s| s.units).sum())
    }

    /// Record finished units and return the new percentage.
    pub fn advance(&mut self, units: u32) -> u8 {
        self.completed += units;
        self.percent()
    }

    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        let pct = (f64::from(self.completed) * 100.0 / f64::from(self.total)).round();
        pct.min(100.0) as u8
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn completed(&self) -> u32 {
        self.completed
    }
}

/// Progress notifications for a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PipelineEvent {
    Started {
        project: String,
        steps: u32,
        total_units: u32,
    },
    StageCompleted {
        stage: String,
        implicit: bool,
        units: u32,
        percent: u8,
        stats: ProcessingStats,
    },
    Finished {
        stats: ProcessingStats,
        duration_ms: u64,
    },
}
