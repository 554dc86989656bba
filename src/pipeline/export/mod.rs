//! Serialization of stage results to text, CSV and XML.
//!
//! Pure projections: callers decide where the payload is written.

use std::str::FromStr;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{ErrorKind, StageResult};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),

    #[error("XML serialization failed: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Serialized output is not UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

impl ExportError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedFormat(_) => ErrorKind::Validation,
            Self::Xml(_) | Self::Encoding(_) => ErrorKind::Processing,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Text,
    Csv,
    Xml,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [Self::Text, Self::Csv, Self::Xml];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Csv => "csv",
            Self::Xml => "xml",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Csv => "csv",
            Self::Xml => "xml",
        }
    }

    /// Format written to a file with this extension.
    pub fn from_extension(extension: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.extension().eq_ignore_ascii_case(extension))
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "csv" => Ok(Self::Csv),
            "xml" => Ok(Self::Xml),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Serialize `result` in `format`.
pub fn export(result: &StageResult, format: ExportFormat) -> Result<String, ExportError> {
    match format {
        ExportFormat::Text => Ok(to_text(result)),
        ExportFormat::Csv => Ok(to_csv(result)),
        ExportFormat::Xml => to_xml(result),
    }
}

const TOKEN_COLUMNS: &[&str] = &["token"];
const LEMMA_COLUMNS: &[&str] = &["text", "lemma"];
const TAG_COLUMNS: &[&str] = &["text", "pos", "tag"];
const ENTITY_COLUMNS: &[&str] = &["text", "label"];

/// Column names followed by each record's fields, in column order.
fn table(result: &StageResult) -> (&'static [&'static str], Vec<Vec<&str>>) {
    match result {
        StageResult::Tokens(tokens) => (TOKEN_COLUMNS, tokens.iter().map(|t| vec![t.as_str()]).collect()),
        StageResult::LemmaPairs(pairs) => (
            LEMMA_COLUMNS,
            pairs.iter().map(|p| vec![p.text.as_str(), p.lemma.as_str()]).collect(),
        ),
        StageResult::TaggedTokens(tagged) => (
            TAG_COLUMNS,
            tagged
                .iter()
                .map(|t| vec![t.text.as_str(), t.pos.as_str(), t.tag.as_str()])
                .collect(),
        ),
        StageResult::Entities(entities) => (
            ENTITY_COLUMNS,
            entities
                .iter()
                .map(|e| vec![e.text.as_str(), e.label.as_str()])
                .collect(),
        ),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Text
// ═══════════════════════════════════════════════════════════════════════════

fn to_text(result: &StageResult) -> String {
    let lines: Vec<String> = match result {
        StageResult::Tokens(tokens) => tokens.clone(),
        StageResult::LemmaPairs(pairs) => pairs
            .iter()
            .map(|p| format!("{}: lemma:{}", p.text, p.lemma))
            .collect(),
        StageResult::TaggedTokens(tagged) => tagged
            .iter()
            .map(|t| format!("{}: pos:{}, tag:{}", t.text, t.pos, t.tag))
            .collect(),
        StageResult::Entities(entities) => entities
            .iter()
            .map(|e| format!("{}: label:{}", e.text, e.label))
            .collect(),
    };
    lines.iter().map(|l| format!("{l}\n")).collect()
}

// ═══════════════════════════════════════════════════════════════════════════
// CSV
// ═══════════════════════════════════════════════════════════════════════════

fn to_csv(result: &StageResult) -> String {
    let (header, rows) = table(result);
    let mut out = String::new();
    push_csv_row(&mut out, header);
    for row in &rows {
        push_csv_row(&mut out, row);
    }
    out
}

fn push_csv_row(out: &mut String, fields: &[&str]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        if field.contains([',', '"', '\n', '\r']) {
            out.push('"');
            out.push_str(&field.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(field);
        }
    }
    out.push('\n');
}

// ═══════════════════════════════════════════════════════════════════════════
// XML
// ═══════════════════════════════════════════════════════════════════════════

fn to_xml(result: &StageResult) -> Result<String, ExportError> {
    let (header, rows) = table(result);
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(BytesStart::new("root")))?;

    for row in &rows {
        let mut record = BytesStart::new("tokens");
        record.push_attribute(("token", row[0]));
        if row.len() == 1 {
            writer.write_event(Event::Empty(record))?;
            continue;
        }
        writer.write_event(Event::Start(record))?;
        for (name, value) in header.iter().zip(row.iter()).skip(1) {
            writer.write_event(Event::Start(BytesStart::new(*name)))?;
            writer.write_event(Event::Text(BytesText::new(value)))?;
            writer.write_event(Event::End(BytesEnd::new(*name)))?;
        }
        writer.write_event(Event::End(BytesEnd::new("tokens")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("root")))?;
    let mut xml = String::from_utf8(writer.into_inner())?;
    xml.push('\n');
    Ok(xml)
}
