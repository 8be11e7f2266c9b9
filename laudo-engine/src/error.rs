//! Error taxonomy
//!
//! Two families:
//! - [GenerationError]: structural failures. They abort the whole pipeline and nothing is
//!   written to the destination.
//! - [Warning]: per-item defects. They are collected in order and returned next to a
//!   successfully produced document.

use crate::attachments::AttachmentKind;
use crate::docx::package::PackageError;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors. Any of these means no output file was produced.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("template not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    #[error("template {} could not be read: {source}", .path.display())]
    TemplateMalformed {
        path: PathBuf,
        #[source]
        source: PackageError,
    },

    #[error("output path {} is not writable: {reason}", .path.display())]
    OutputPathUnwritable { path: PathBuf, reason: String },

    #[error("document could not be serialized: {0}")]
    Serialization(#[from] PackageError),
}

/// Non-fatal defects collected during generation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Warning {
    /// The token names a key the dataset does not have; it is left literal in the output.
    #[error("unresolved placeholder {token}")]
    UnresolvedPlaceholder { token: String },

    /// A spelled-out key whose base value is not a non-negative integer.
    #[error("placeholder {token} needs a non-negative integer, the token was left as is")]
    NotANumber { token: String },

    /// The image of one attachment item was skipped; its caption was still rendered.
    #[error("{kind} {id}: image skipped ({reason})")]
    ImageUnreadable {
        kind: AttachmentKind,
        id: u32,
        reason: String,
    },
}

/// Collected warnings for one generation pass.
///
/// Every warning is also emitted as a `tracing` event when it is pushed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Warnings {
    items: Vec<Warning>,
}

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, warning: Warning) {
        tracing::warn!(%warning, "generation warning");
        self.items.push(warning);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Warning> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<Warning> {
        self.items
    }
}

impl Extend<Warning> for Warnings {
    fn extend<T: IntoIterator<Item = Warning>>(&mut self, iter: T) {
        for warning in iter {
            self.push(warning);
        }
    }
}
