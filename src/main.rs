//! Command-line front end.
//!
//! Usage:
//!   crumbler `<input>` [--name `<name>`] [--language EN] [stage flags] - New project
//!   crumbler --project `<dir>` [--language EN] [stage flags]          - Continue a project

use std::path::PathBuf;

use clap::Parser;

use crumbler_lib::config::PipelineSettings;
use crumbler_lib::models::Language;
use crumbler_lib::pipeline::cleaning::{Cleaner, ContractionTable};
use crumbler_lib::pipeline::stages::{PipelineEvent, StageRequest};
use crumbler_lib::{build_crumbler, PipelineError, RunSummary};

#[derive(Parser, Debug)]
#[command(name = "crumbler", version, about = "Stage documents into a project and run text-processing stages over it")]
struct Cli {
    /// File, directory or http(s) URL to ingest
    #[arg(required_unless_present = "project")]
    input: Option<String>,

    /// Project name, uniquified under the output root (default: input file stem)
    #[arg(long)]
    name: Option<String>,

    /// Existing project directory to continue
    #[arg(long, conflicts_with_all = ["input", "name"])]
    project: Option<PathBuf>,

    /// Language code (EN or DE)
    #[arg(long, short, default_value = "EN")]
    language: String,

    /// Custom contraction table (JSON array of [surface, expansion] pairs)
    #[arg(long)]
    contraction_table: Option<PathBuf>,

    /// Override the output root
    #[arg(long)]
    output: Option<PathBuf>,

    #[arg(long)]
    clean: bool,
    #[arg(long)]
    normalize: bool,
    #[arg(long)]
    lowercase: bool,
    #[arg(long)]
    contractions: bool,
    #[arg(long)]
    tokenize: bool,
    #[arg(long)]
    stopwords: bool,
    #[arg(long)]
    lemmatize: bool,
    #[arg(long)]
    tag: bool,
    #[arg(long)]
    ner: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn request(&self) -> StageRequest {
        StageRequest {
            clean: self.clean,
            normalize: self.normalize,
            lowercase: self.lowercase,
            contractions: self.contractions,
            tokenize: self.tokenize,
            stopwords: self.stopwords,
            lemmatize: self.lemmatize,
            tag: self.tag,
            ner: self.ner,
        }
    }
}

fn main() {
    crumbler_lib::init_tracing();
    let cli = Cli::parse();

    match execute(&cli) {
        Ok(summary) => print_summary(&summary, cli.json),
        Err(e) => {
            eprintln!("Error ({}): {}", e.kind(), e);
            std::process::exit(1);
        }
    }
}

fn execute(cli: &Cli) -> Result<RunSummary, PipelineError> {
    let language = Language::from_code(&cli.language)?;

    let mut settings = PipelineSettings::load()?;
    if let Some(output) = &cli.output {
        settings.output_root = output.clone();
    }

    let mut cleaner = Cleaner::new();
    if let Some(path) = &cli.contraction_table {
        let mode = ContractionTable::builtin(language).mode();
        cleaner = cleaner.with_table(ContractionTable::load(language, mode, path)?);
    }

    let runner = build_crumbler(settings, cleaner)?;
    let mut project = match &cli.project {
        Some(dir) => runner.open_project(dir)?,
        None => {
            let input = cli.input.as_deref().unwrap_or_default();
            let name = cli.name.clone().unwrap_or_else(|| default_name(input));
            runner.new_project(input, &name)?
        }
    };
    println!(
        "Project '{}' at {} ({} seed files, {})",
        project.name(),
        project.directory().display(),
        project.seed_file_count(),
        project.stats()
    );

    let report = |event: PipelineEvent| match event {
        PipelineEvent::Started { total_units, .. } => {
            println!("Running {total_units} units of work");
        }
        PipelineEvent::StageCompleted {
            stage,
            implicit,
            percent,
            stats,
            ..
        } => {
            let note = if implicit { " (implicit)" } else { "" };
            println!("[{percent:>3}%] {stage}{note}: {stats}");
        }
        PipelineEvent::Finished { .. } => {}
    };
    runner.run(&mut project, &cli.request(), language, Some(&report))
}

/// Last path or URL segment without its extension.
fn default_name(input: &str) -> String {
    let trimmed = input.trim().trim_end_matches(['/', '\\']);
    let last = trimmed.rsplit(['/', '\\']).next().unwrap_or(trimmed);
    let stem = last.split('.').next().unwrap_or(last);
    if stem.is_empty() {
        "project".to_string()
    } else {
        stem.to_string()
    }
}

fn print_summary(summary: &RunSummary, json: bool) {
    if json {
        match serde_json::to_string_pretty(summary) {
            Ok(s) => println!("{s}"),
            Err(e) => eprintln!("Error formatting summary: {e}"),
        }
        return;
    }
    println!(
        "Done in {} ms. This run: {}. Project total: {}.",
        summary.duration_ms(),
        summary.stats,
        summary.project_stats
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_map_to_request() {
        let cli = Cli::parse_from(["crumbler", "doc.txt", "--clean", "--lowercase", "--ner"]);
        let request = cli.request();
        assert!(request.clean && request.lowercase && request.ner);
        assert!(!request.tokenize);
        assert_eq!(cli.language, "EN");
    }

    #[test]
    fn project_flag_replaces_input() {
        let cli = Cli::parse_from(["crumbler", "--project", "output/demo", "--tag"]);
        assert_eq!(cli.project, Some(PathBuf::from("output/demo")));
        assert!(Cli::try_parse_from(["crumbler", "--tag"]).is_err());
    }

    #[test]
    fn default_name_from_input() {
        assert_eq!(default_name("/data/report.final.txt"), "report");
        assert_eq!(default_name("corpus/"), "corpus");
        assert_eq!(default_name("https://example.com/news/article"), "article");
        assert_eq!(default_name(""), "project");
    }
}
