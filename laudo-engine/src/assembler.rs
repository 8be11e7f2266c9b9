//! The generation pipeline
//!
//! One call runs these stages strictly in order:
//!
//!     Loaded → HeaderResolved → ParagraphsRewritten → TablesRewritten
//!            → InsertionPointResolved → SectionsComposed → Serialized
//!
//! Only loading the template and writing the output can fail. Everything in between
//! degrades to a [Warning]. The document is serialized in memory first; the destination
//! is replaced by renaming a finished sibling file, so a failed call never leaves a partial
//! document behind.

use crate::attachments::Attachments;
use crate::config::{BlockCatalog, CatalogEntry, EngineConfig};
use crate::dataset::Dataset;
use crate::docx::paragraph::paragraph_text;
use crate::docx::styles::ResolvedStyles;
use crate::docx::Document;
use crate::error::{GenerationError, Warning, Warnings};
use crate::sections::{self, SectionComposer};
use crate::template::placeholder::tokens;
use crate::template::{
    BlockExpander, ParagraphRewriter, PlaceholderResolver, RewriteOutcome, TableRewriter,
};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Loaded,
    HeaderResolved,
    ParagraphsRewritten,
    TablesRewritten,
    InsertionPointResolved,
    SectionsComposed,
    Serialized,
}

/// A finished document held in memory.
#[derive(Debug, Clone)]
pub struct AssembledDocument {
    pub bytes: Vec<u8>,
    pub warnings: Vec<Warning>,
}

impl AssembledDocument {
    /// Write the document to `path`, replacing any existing file.
    pub fn write_to(&self, path: &Path) -> Result<(), GenerationError> {
        write_replacing(path, &self.bytes)
    }
}

/// Outcome of a successful generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    pub output: PathBuf,
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Clone)]
pub struct DocumentAssembler {
    config: EngineConfig,
    catalog: BlockCatalog,
}

impl DocumentAssembler {
    pub fn new(config: EngineConfig) -> Self {
        let catalog = BlockCatalog::from_config(&config);
        Self { config, catalog }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &BlockCatalog {
        &self.catalog
    }

    /// Run the pipeline on a template file and return the document bytes.
    pub fn assemble(
        &self,
        template: &Path,
        dataset: &Dataset,
        attachments: &Attachments,
    ) -> Result<AssembledDocument, GenerationError> {
        let document = Document::open(template)?;
        self.assemble_document(document, dataset, attachments)
    }

    /// Run the pipeline on an already loaded template.
    pub fn assemble_document(
        &self,
        mut document: Document,
        dataset: &Dataset,
        attachments: &Attachments,
    ) -> Result<AssembledDocument, GenerationError> {
        enter(Stage::Loaded);
        let mut warnings = Warnings::new();
        let resolver = PlaceholderResolver::new(dataset, &self.catalog, &self.config.labels);
        let styles = ResolvedStyles::resolve(document.styles(), &self.config.styles);
        let expander = BlockExpander::new(&resolver, &styles);
        let rewriter = ParagraphRewriter::new(&resolver);

        // Header values are final once written; they are not scanned for tokens again.
        let mut headers = HashSet::new();
        for p in document.body_paragraphs() {
            let text = paragraph_text(document.tree(), p);
            let has_header = tokens(&text).iter().any(|token| {
                matches!(self.catalog.lookup(&token.key), Some(CatalogEntry::Header(_)))
            });
            if has_header {
                expander.expand(document.tree_mut(), p, &mut warnings);
                headers.insert(p);
            }
        }
        enter(Stage::HeaderResolved);

        for p in document.body_paragraphs() {
            if headers.contains(&p) {
                continue;
            }
            if rewriter.rewrite(document.tree_mut(), p, &mut warnings) == RewriteOutcome::Deferred {
                expander.expand(document.tree_mut(), p, &mut warnings);
            }
        }
        enter(Stage::ParagraphsRewritten);

        let tables = TableRewriter::new(&rewriter);
        for table in document.body_tables() {
            tables.rewrite(document.tree_mut(), table, &mut warnings);
        }
        enter(Stage::TablesRewritten);

        let point = sections::locate(&document, &self.config.sentinel.phrases);
        tracing::debug!(?point, "insertion point");
        enter(Stage::InsertionPointResolved);

        SectionComposer::new(&self.config, &styles).compose(
            &mut document,
            point,
            attachments,
            &mut warnings,
        );
        enter(Stage::SectionsComposed);

        let bytes = document.to_bytes()?;
        enter(Stage::Serialized);

        Ok(AssembledDocument {
            bytes,
            warnings: warnings.into_vec(),
        })
    }

    /// Run the pipeline and write the result to `output`.
    pub fn generate(
        &self,
        template: &Path,
        dataset: &Dataset,
        attachments: &Attachments,
        output: &Path,
    ) -> Result<GenerationReport, GenerationError> {
        let assembled = self.assemble(template, dataset, attachments)?;
        assembled.write_to(output)?;
        tracing::info!(
            output = %output.display(),
            warnings = assembled.warnings.len(),
            "document generated"
        );
        Ok(GenerationReport {
            output: output.to_path_buf(),
            warnings: assembled.warnings,
        })
    }
}

impl Default for DocumentAssembler {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

/// Generate one document with the given settings.
pub fn generate(
    template: &Path,
    dataset: &Dataset,
    attachments: &Attachments,
    output: &Path,
    config: &EngineConfig,
) -> Result<GenerationReport, GenerationError> {
    DocumentAssembler::new(config.clone()).generate(template, dataset, attachments, output)
}

fn enter(stage: Stage) {
    tracing::debug!(?stage, "pipeline stage");
}

/// Write to a sibling temporary file, then rename it over `path`.
fn write_replacing(path: &Path, bytes: &[u8]) -> Result<(), GenerationError> {
    let unwritable = |reason: String| GenerationError::OutputPathUnwritable {
        path: path.to_path_buf(),
        reason,
    };
    let temp = sibling(path, "tmp").ok_or_else(|| unwritable("path has no file name".to_string()))?;

    if let Err(err) = fs::write(&temp, bytes) {
        let _ = fs::remove_file(&temp);
        return Err(unwritable(err.to_string()));
    }
    let result = match fs::rename(&temp, path) {
        // Renaming over an existing file is refused on some platforms
        Err(_) if path.is_file() => replace_with_backup(&temp, path),
        other => other,
    };
    result.map_err(|err| {
        let _ = fs::remove_file(&temp);
        unwritable(err.to_string())
    })
}

/// Move the current file aside, put `temp` in its place, and restore the old file if that
/// fails.
fn replace_with_backup(temp: &Path, path: &Path) -> std::io::Result<()> {
    let backup = sibling(path, "bak")
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"))?;
    fs::rename(path, &backup)?;
    match fs::rename(temp, path) {
        Ok(()) => {
            let _ = fs::remove_file(&backup);
            Ok(())
        }
        Err(err) => {
            if let Err(restore) = fs::rename(&backup, path) {
                tracing::warn!(
                    backup = %backup.display(),
                    error = %restore,
                    "previous output could not be restored"
                );
            }
            Err(err)
        }
    }
}

fn sibling(path: &Path, suffix: &str) -> Option<PathBuf> {
    let name = path.file_name()?;
    Some(path.with_file_name(format!(".{}.{}", name.to_string_lossy(), suffix)))
}
