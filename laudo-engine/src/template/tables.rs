//! Table cells
//!
//! Every paragraph of every cell goes through the [ParagraphRewriter], nested tables
//! included. Cells only get scalar substitution: a block or list marker inside a cell is
//! left as written.

use super::rewriter::{ParagraphRewriter, RewriteOutcome};
use crate::docx::paragraph::PARAGRAPH;
use crate::docx::xml::{NodeId, XmlTree};
use crate::error::Warnings;

pub const TABLE: &str = "w:tbl";
const ROW: &str = "w:tr";
const CELL: &str = "w:tc";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableStats {
    pub cells: usize,
    pub rewritten: usize,
    pub deferred: usize,
}

pub struct TableRewriter<'p, 'r, 'a> {
    rewriter: &'p ParagraphRewriter<'r, 'a>,
}

impl<'p, 'r, 'a> TableRewriter<'p, 'r, 'a> {
    pub fn new(rewriter: &'p ParagraphRewriter<'r, 'a>) -> Self {
        Self { rewriter }
    }

    pub fn rewrite(&self, tree: &mut XmlTree, table: NodeId, warnings: &mut Warnings) -> TableStats {
        let mut stats = TableStats::default();
        for cell in cells(tree, table) {
            stats.cells += 1;
            for p in tree.children_named(cell, PARAGRAPH) {
                match self.rewriter.rewrite(tree, p, warnings) {
                    RewriteOutcome::Rewritten => stats.rewritten += 1,
                    RewriteOutcome::Deferred => {
                        tracing::debug!("block marker inside a table cell left as is");
                        stats.deferred += 1;
                    }
                    RewriteOutcome::Unchanged => {}
                }
            }
        }
        stats
    }
}

/// Cells of `table` row by row; a nested table's cells follow the cell holding it.
pub fn cells(tree: &XmlTree, table: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    for row in tree.children_named(table, ROW) {
        for cell in tree.children_named(row, CELL) {
            out.push(cell);
            for nested in tree.children_named(cell, TABLE) {
                out.extend(cells(tree, nested));
            }
        }
    }
    out
}

/// Paragraphs of every cell of `table`, cell by cell.
pub fn cell_paragraphs(tree: &XmlTree, table: NodeId) -> Vec<NodeId> {
    cells(tree, table)
        .into_iter()
        .flat_map(|cell| tree.children_named(cell, PARAGRAPH))
        .collect()
}
