use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Options that change what normalization does, and therefore its suffix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NormalizeOptions {
    pub lowercase: bool,
    pub contractions: bool,
}

/// One transformation step of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum Stage {
    Clean,
    Normalize(NormalizeOptions),
    Tokenize,
    Stopwords,
    Lemmatize,
    Tag,
    Ner,
}

/// What an artifact holds, which decides which stages may consume it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactClass {
    /// Running text (seed, cleaned, normalized).
    Text,
    /// JSON array of tokens.
    Tokens,
    /// Exported annotation output; never fed back into a stage.
    Terminal,
}

const TEXT_EXTENSIONS: &[&str] = &["txt"];
const EXPORT_EXTENSIONS: &[&str] = &["txt", "csv", "xml"];

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clean => "clean",
            Self::Normalize(_) => "normalize",
            Self::Tokenize => "tokenize",
            Self::Stopwords => "stopwords",
            Self::Lemmatize => "lemmatize",
            Self::Tag => "tag",
            Self::Ner => "ner",
        }
    }

    /// Position in the fixed pipeline order.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Clean => 0,
            Self::Normalize(_) => 1,
            Self::Tokenize => 2,
            Self::Stopwords => 3,
            Self::Lemmatize => 4,
            Self::Tag => 5,
            Self::Ner => 6,
        }
    }

    /// File-name suffix, including the leading underscore.
    pub fn suffix(&self) -> String {
        match self {
            Self::Clean => "_cl".into(),
            Self::Normalize(opts) => {
                let mut s = String::from("_n");
                if opts.lowercase {
                    s.push('l');
                }
                if opts.contractions {
                    s.push('c');
                }
                s
            }
            Self::Tokenize => "_tok".into(),
            Self::Stopwords => "_nost".into(),
            Self::Lemmatize => "_lem".into(),
            Self::Tag => "_pos".into(),
            Self::Ner => "_ner".into(),
        }
    }

    /// Parses a suffix segment without its underscore (`cl`, `nlc`, `tok`, ...).
    pub fn from_suffix(segment: &str) -> Option<Stage> {
        let stage = match segment {
            "cl" => Self::Clean,
            "n" => Self::Normalize(NormalizeOptions::default()),
            "nl" => Self::Normalize(NormalizeOptions { lowercase: true, contractions: false }),
            "nc" => Self::Normalize(NormalizeOptions { lowercase: false, contractions: true }),
            "nlc" => Self::Normalize(NormalizeOptions { lowercase: true, contractions: true }),
            "tok" => Self::Tokenize,
            "nost" => Self::Stopwords,
            "lem" => Self::Lemmatize,
            "pos" => Self::Tag,
            "ner" => Self::Ner,
            _ => return None,
        };
        Some(stage)
    }

    /// Class of artifact this stage consumes.
    pub fn input_class(&self) -> ArtifactClass {
        match self {
            Self::Clean | Self::Normalize(_) | Self::Tokenize => ArtifactClass::Text,
            Self::Stopwords | Self::Lemmatize | Self::Tag | Self::Ner => ArtifactClass::Tokens,
        }
    }

    /// Class of artifact this stage produces.
    pub fn output_class(&self) -> ArtifactClass {
        match self {
            Self::Clean | Self::Normalize(_) => ArtifactClass::Text,
            Self::Tokenize | Self::Stopwords => ArtifactClass::Tokens,
            Self::Lemmatize | Self::Tag | Self::Ner => ArtifactClass::Terminal,
        }
    }

    /// Extensions written for this stage. The first one is the primary file.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Tag | Self::Ner => EXPORT_EXTENSIONS,
            _ => TEXT_EXTENSIONS,
        }
    }

    /// Stages that need a token artifact to run.
    pub fn needs_tokens(&self) -> bool {
        self.input_class() == ArtifactClass::Tokens
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Seed,
    Stage(Stage),
}

impl ArtifactKind {
    pub fn class(&self) -> ArtifactClass {
        match self {
            Self::Seed => ArtifactClass::Text,
            Self::Stage(stage) => stage.output_class(),
        }
    }
}

/// A file in the project directory written by ingestion or by one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Primary file. Multi-format stages keep their siblings next to it.
    pub path: PathBuf,
    pub kind: ArtifactKind,
}

impl Artifact {
    pub fn seed(path: PathBuf) -> Self {
        Self { path, kind: ArtifactKind::Seed }
    }

    pub fn class(&self) -> ArtifactClass {
        self.kind.class()
    }

    /// Every file belonging to this artifact (all export formats).
    pub fn files(&self) -> Vec<PathBuf> {
        match self.kind {
            ArtifactKind::Seed => vec![self.path.clone()],
            ArtifactKind::Stage(stage) => stage
                .extensions()
                .iter()
                .map(|ext| self.path.with_extension(ext))
                .collect(),
        }
    }
}

/// Paths of the files `stage` writes when run over `input`, primary first.
///
/// `report_cl.txt` run through tokenization becomes `report_cl_tok.txt`.
pub fn stage_output_paths(input: &Path, stage: Stage) -> Vec<PathBuf> {
    let dir = input.parent().unwrap_or_else(|| Path::new(""));
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let base = format!("{stem}{}", stage.suffix());
    stage
        .extensions()
        .iter()
        .map(|ext| dir.join(format!("{base}.{ext}")))
        .collect()
}

/// Splits a file stem into the seed stem and the stages applied to it,
/// oldest first. A chain that could not have been produced by the pipeline
/// is treated as part of the seed name.
pub fn parse_stage_chain(stem: &str) -> (String, Vec<Stage>) {
    let mut rest = stem;
    let mut chain = Vec::new();
    while let Some(idx) = rest.rfind('_') {
        let (head, segment) = (&rest[..idx], &rest[idx + 1..]);
        if head.is_empty() {
            break;
        }
        match Stage::from_suffix(segment) {
            Some(stage) => {
                chain.push(stage);
                rest = head;
            }
            None => break,
        }
    }
    chain.reverse();

    if is_valid_chain(&chain) {
        (rest.to_string(), chain)
    } else {
        (stem.to_string(), Vec::new())
    }
}

fn is_valid_chain(chain: &[Stage]) -> bool {
    let mut current = ArtifactClass::Text;
    for stage in chain {
        if stage.input_class() != current {
            return false;
        }
        current = stage.output_class();
    }
    true
}
