//! Template inspection
//!
//! Lists every placeholder of a template without modifying it: body paragraphs first,
//! then table cells, each with its classification and, against a dataset, whether
//! generation would resolve it.

use super::placeholder::{tokens, Placeholder, PlaceholderResolver};
use super::tables;
use crate::config::{BlockCatalog, CatalogEntry, EngineConfig};
use crate::dataset::Dataset;
use crate::docx::paragraph::paragraph_text;
use crate::docx::Document;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// Index among the top-level body paragraphs.
    Body { paragraph: usize },
    /// Index of the top-level table and of the paragraph among its cell paragraphs.
    Table { table: usize, paragraph: usize },
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Body { paragraph } => write!(f, "body:{}", paragraph + 1),
            Location::Table { table, paragraph } => {
                write!(f, "table{}:{}", table + 1, paragraph + 1)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderReport {
    pub token: String,
    pub placeholder: Placeholder,
    pub location: Location,
    pub resolves: bool,
}

pub fn scan_placeholders(
    document: &Document,
    catalog: &BlockCatalog,
    dataset: &Dataset,
) -> Vec<PlaceholderReport> {
    let labels = EngineConfig::default().labels;
    let resolver = PlaceholderResolver::new(dataset, catalog, &labels);
    let tree = document.tree();
    let mut reports = Vec::new();

    for (index, p) in document.body_paragraphs().into_iter().enumerate() {
        let text = paragraph_text(tree, p);
        collect(&resolver, &text, Location::Body { paragraph: index }, &mut reports);
    }
    for (table_index, table) in document.body_tables().into_iter().enumerate() {
        for (index, p) in tables::cell_paragraphs(tree, table).into_iter().enumerate() {
            let text = paragraph_text(tree, p);
            let location = Location::Table {
                table: table_index,
                paragraph: index,
            };
            collect(&resolver, &text, location, &mut reports);
        }
    }
    reports
}

fn collect(
    resolver: &PlaceholderResolver<'_>,
    text: &str,
    location: Location,
    reports: &mut Vec<PlaceholderReport>,
) {
    for token in tokens(text) {
        let placeholder = resolver.classify(&token.key);
        let resolves = match &placeholder {
            Placeholder::Simple(key) => resolver.resolve(key).is_ok(),
            Placeholder::ListMarker(key) => resolver.dataset().contains_key(key),
            Placeholder::BlockMarker(key) => match resolver.catalog().lookup(key) {
                Some(CatalogEntry::Dynamic(block)) => {
                    resolver.dataset().contains_key(block.source_key())
                }
                Some(CatalogEntry::Header(header)) => header
                    .lines
                    .iter()
                    .all(|line| resolver.dataset().contains_key(&line.key)),
                _ => false,
            },
        };
        reports.push(PlaceholderReport {
            token: token.raw.to_string(),
            placeholder,
            location,
            resolves,
        });
    }
}
