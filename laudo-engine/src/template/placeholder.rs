//! Placeholder tokens
//!
//! Three delimiter forms are accepted and are interchangeable spellings of one key:
//!
//!     [NUMERO_PROCESSO]   {numero processo}   <<Numero_Processo>>
//!
//! A token is parsed once into a [Placeholder], which decides who owns it:
//! - [Placeholder::BlockMarker]: header or dynamic blocks from the [BlockCatalog],
//! - [Placeholder::ListMarker]: configured list markers and any sequence-valued key,
//! - [Placeholder::Simple]: everything else, resolved here to a string.
//!
//! Keys ending in `_EXTENSO` spell the integer value of their base key in full.

use super::extenso;
use crate::config::{BlockCatalog, CatalogEntry, LabelsConfig};
use crate::dataset::{normalize_key, Dataset, Value};
use crate::error::{Warning, Warnings};
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

static TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[(\w[\w ]*)\]|\{(\w[\w ]*)\}|<<(\w[\w ]*)>>").expect("valid token pattern")
});

const EXTENSO_SUFFIX: &str = "_EXTENSO";

/// One token occurrence inside a piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'t> {
    pub range: Range<usize>,
    /// The token as written, delimiters included.
    pub raw: &'t str,
    /// Normalized key.
    pub key: String,
}

/// All tokens in `text`, left to right.
pub fn tokens(text: &str) -> Vec<Token<'_>> {
    TOKEN
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let inner = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3))?;
            Some(Token {
                range: whole.range(),
                raw: whole.as_str(),
                key: normalize_key(inner.as_str()),
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placeholder {
    Simple(String),
    ListMarker(String),
    BlockMarker(String),
}

impl Placeholder {
    pub fn classify(key: &str, catalog: &BlockCatalog, dataset: &Dataset) -> Self {
        let key = normalize_key(key);
        match catalog.lookup(&key) {
            Some(CatalogEntry::Header(_)) | Some(CatalogEntry::Dynamic(_)) => {
                Placeholder::BlockMarker(key)
            }
            Some(CatalogEntry::List(_)) => Placeholder::ListMarker(key),
            None if dataset.get(&key).is_some_and(Value::is_sequence) => {
                Placeholder::ListMarker(key)
            }
            None => Placeholder::Simple(key),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Placeholder::Simple(key) | Placeholder::ListMarker(key) | Placeholder::BlockMarker(key) => key,
        }
    }

    pub fn is_block_content(&self) -> bool {
        !matches!(self, Placeholder::Simple(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveError {
    Unknown,
    NotANumber,
    /// The key holds a list or records; only block expansion may render it.
    Sequence,
}

/// Typed lookup of scalar keys against one dataset.
#[derive(Debug, Clone, Copy)]
pub struct PlaceholderResolver<'a> {
    dataset: &'a Dataset,
    catalog: &'a BlockCatalog,
    labels: &'a LabelsConfig,
}

impl<'a> PlaceholderResolver<'a> {
    pub fn new(dataset: &'a Dataset, catalog: &'a BlockCatalog, labels: &'a LabelsConfig) -> Self {
        Self {
            dataset,
            catalog,
            labels,
        }
    }

    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    pub fn catalog(&self) -> &'a BlockCatalog {
        self.catalog
    }

    pub fn labels(&self) -> &'a LabelsConfig {
        self.labels
    }

    pub fn classify(&self, key: &str) -> Placeholder {
        Placeholder::classify(key, self.catalog, self.dataset)
    }

    /// String value of a scalar key.
    ///
    /// A key that exists in the dataset is used as is, even when it ends in `_EXTENSO`.
    pub fn resolve(&self, key: &str) -> Result<String, ResolveError> {
        let key = normalize_key(key);
        match self.dataset.get(&key) {
            Some(Value::Scalar(scalar)) => Ok(scalar.render(&self.labels.yes, &self.labels.no)),
            Some(_) => Err(ResolveError::Sequence),
            None => match key.strip_suffix(EXTENSO_SUFFIX) {
                Some(base) if !base.is_empty() => self
                    .dataset
                    .scalar(base)
                    .and_then(|scalar| scalar.as_non_negative_integer())
                    .map(extenso::to_words)
                    .ok_or(ResolveError::NotANumber),
                _ => Err(ResolveError::Unknown),
            },
        }
    }

    /// True when any token of `text` belongs to a list or block expansion.
    pub fn has_block_content(&self, text: &str) -> bool {
        tokens(text)
            .iter()
            .any(|token| self.classify(&token.key).is_block_content())
    }

    /// Substitute every simple placeholder of `text`; block and list markers stay literal.
    pub fn substitute(&self, text: &str, warnings: &mut Warnings) -> String {
        self.substitute_with(text, warnings, |_| None)
    }

    /// Like [Self::substitute], with `blocks` producing the text for block markers.
    ///
    /// A marker for which `blocks` returns `None` stays literal.
    pub fn substitute_with<F>(&self, text: &str, warnings: &mut Warnings, mut blocks: F) -> String
    where
        F: FnMut(&Placeholder) -> Option<String>,
    {
        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;
        for token in tokens(text) {
            out.push_str(&text[cursor..token.range.start]);
            cursor = token.range.end;
            let placeholder = self.classify(&token.key);
            let replacement = match &placeholder {
                Placeholder::Simple(key) => match self.resolve(key) {
                    Ok(value) => Some(value),
                    Err(err) => {
                        if let Some(warning) = warning_for(err, token.raw) {
                            warnings.push(warning);
                        }
                        None
                    }
                },
                other => blocks(other),
            };
            out.push_str(replacement.as_deref().unwrap_or(token.raw));
        }
        out.push_str(&text[cursor..]);
        out
    }
}

fn warning_for(err: ResolveError, token: &str) -> Option<Warning> {
    match err {
        ResolveError::Unknown => Some(Warning::UnresolvedPlaceholder {
            token: token.to_string(),
        }),
        ResolveError::NotANumber => Some(Warning::NotANumber {
            token: token.to_string(),
        }),
        ResolveError::Sequence => None,
    }
}
