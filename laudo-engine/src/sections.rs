//! Insertion point and attachment sections

pub mod composer;
pub mod locator;

pub use composer::{CompositionStats, SectionComposer};
pub use locator::{locate, InsertionPoint};
