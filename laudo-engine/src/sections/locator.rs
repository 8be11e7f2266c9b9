//! Insertion point discovery
//!
//! The fixed part of a template ends with a sentinel sentence ("Nada mais havendo…"). It is
//! found by content: the top-level body paragraphs are scanned for any configured phrase,
//! and the last paragraph containing one wins. A template without the sentence gets its
//! sections at the end of the body.

use crate::docx::paragraph::paragraph_text;
use crate::docx::xml::NodeId;
use crate::docx::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertionPoint {
    After(NodeId),
    /// End of the body, before the final section properties.
    Tail,
}

pub fn locate(document: &Document, phrases: &[String]) -> InsertionPoint {
    let phrases: Vec<&str> = phrases
        .iter()
        .map(String::as_str)
        .filter(|phrase| !phrase.trim().is_empty())
        .collect();
    document
        .body_paragraphs()
        .into_iter()
        .rev()
        .find(|p| {
            let text = paragraph_text(document.tree(), *p);
            phrases.iter().any(|phrase| text.contains(phrase))
        })
        .map(InsertionPoint::After)
        .unwrap_or(InsertionPoint::Tail)
}
