use std::borrow::Cow;

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use super::ImportError;

/// Extracts visible paragraphs from a markup payload.
pub trait ContentIngestor {
    fn extract_text(&self, markup: &[u8]) -> Result<Vec<String>, ImportError>;
}

/// Decode raw bytes as UTF-8, falling back to ISO-8859-1.
///
/// A leading byte-order mark is dropped. Latin-1 maps every byte to a code
/// point, so the fallback never fails.
pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(e) => {
            tracing::debug!(valid_up_to = e.valid_up_to(), "Not UTF-8, decoding as ISO-8859-1");
            Cow::Owned(bytes.iter().map(|&b| b as char).collect())
        }
    }
}

/// HTML/XML ingestion over html5ever.
///
/// Returns the text of every `<p>` element. Documents without paragraphs
/// yield their whole visible text as a single paragraph.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlIngestor;

const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "head", "noscript", "template"];
const BLOCK_ELEMENTS: &[&str] = &[
    "br", "div", "li", "tr", "td", "th", "h1", "h2", "h3", "h4", "h5", "h6", "section",
    "article", "blockquote", "pre",
];

impl ContentIngestor for HtmlIngestor {
    fn extract_text(&self, markup: &[u8]) -> Result<Vec<String>, ImportError> {
        let text = decode_text(markup).into_owned();
        let dom = parse_document(RcDom::default(), Default::default()).one(text);

        let mut paragraphs = Vec::new();
        collect_paragraphs(&dom.document, &mut paragraphs);

        if paragraphs.is_empty() {
            let mut body = String::new();
            collect_text(&dom.document, &mut body);
            let body = collapse_whitespace(&body);
            if !body.is_empty() {
                paragraphs.push(body);
            }
        }

        tracing::debug!(paragraphs = paragraphs.len(), "Markup ingested");
        Ok(paragraphs)
    }
}

fn element_name(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.to_ascii_lowercase().to_string()),
        _ => None,
    }
}

fn collect_paragraphs(node: &Handle, out: &mut Vec<String>) {
    match element_name(node).as_deref() {
        Some(name) if SKIPPED_ELEMENTS.contains(&name) => return,
        Some("p") => {
            let mut text = String::new();
            collect_text(node, &mut text);
            let text = collapse_whitespace(&text);
            if !text.is_empty() {
                out.push(text);
            }
            return;
        }
        _ => {}
    }
    for child in node.children.borrow().iter() {
        collect_paragraphs(child, out);
    }
}

fn collect_text(node: &Handle, out: &mut String) {
    let name = element_name(node);
    match (&node.data, name.as_deref()) {
        (_, Some(name)) if SKIPPED_ELEMENTS.contains(&name) => return,
        (NodeData::Text { contents }, _) => out.push_str(&contents.borrow()),
        _ => {}
    }

    let block = name
        .as_deref()
        .is_some_and(|n| n == "p" || BLOCK_ELEMENTS.contains(&n));
    if block {
        out.push(' ');
    }
    for child in node.children.borrow().iter() {
        collect_text(child, out);
    }
    if block {
        out.push(' ');
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
