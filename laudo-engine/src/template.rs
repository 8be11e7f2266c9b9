//! Placeholder resolution and paragraph rewriting
//!
//! Body paragraphs go through the [rewriter::ParagraphRewriter] first. Paragraphs it
//! defers (they hold a list or block marker) are handed to the [blocks::BlockExpander].
//! Table cells only get the rewriter.

pub mod blocks;
pub mod dynamic;
pub mod extenso;
pub mod inspect;
pub mod placeholder;
pub mod rewriter;
pub mod tables;

pub use blocks::{BlockExpander, Expansion};
pub use inspect::{scan_placeholders, Location, PlaceholderReport};
pub use placeholder::{Placeholder, PlaceholderResolver};
pub use rewriter::{ParagraphRewriter, RewriteOutcome};
pub use tables::TableRewriter;
