//! WordprocessingML document model
//!
//! [Document] owns everything one generation pass touches: the zip [package::Package], the
//! main part parsed into an [xml::XmlTree], the style sheet and the media registry. The
//! generation call that opens a document is its only owner; nothing here is shared.

pub mod media;
pub mod package;
pub mod paragraph;
pub mod styles;
pub mod xml;

use crate::error::GenerationError;
use media::{EmbeddedImage, ImageError, MediaRegistry, RELATIONSHIPS_NS};
use package::{Package, PackageError};
use std::path::Path;
use styles::StyleSheet;
use xml::{NodeId, XmlTree};

const CONTENT_TYPES: &str = "[Content_Types].xml";
const ROOT_RELATIONSHIPS: &str = "_rels/.rels";
const DEFAULT_MAIN_PART: &str = "word/document.xml";
const OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";

#[derive(Debug, Clone)]
pub struct Document {
    package: Package,
    main_part: String,
    tree: XmlTree,
    body: NodeId,
    styles: StyleSheet,
    media: MediaRegistry,
}

impl Document {
    /// Open a template from disk. A missing file is [GenerationError::TemplateNotFound].
    pub fn open(path: &Path) -> Result<Self, GenerationError> {
        let bytes = std::fs::read(path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => GenerationError::TemplateNotFound(path.to_path_buf()),
            _ => GenerationError::TemplateMalformed {
                path: path.to_path_buf(),
                source: PackageError::Io(err),
            },
        })?;
        Self::from_bytes(&bytes).map_err(|source| GenerationError::TemplateMalformed {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PackageError> {
        let package = Package::from_bytes(bytes)?;
        let main_part = main_part_name(&package);
        let tree = package.xml_part(&main_part)?;
        let body = tree
            .find_descendant(tree.root(), "w:body")
            .ok_or_else(|| PackageError::MissingPart(format!("{}#w:body", main_part)))?;

        let (part_dir, part_file) = main_part
            .rsplit_once('/')
            .unwrap_or(("", main_part.as_str()));
        let styles_part = join_part(part_dir, "styles.xml");
        let styles = match package.part(&styles_part) {
            Some(_) => StyleSheet::from_tree(&package.xml_part(&styles_part)?),
            None => StyleSheet::default(),
        };

        let rels_part = relationships_part(part_dir, part_file);
        let relationships = match package.part(&rels_part) {
            Some(_) => package.xml_part(&rels_part)?,
            None => XmlTree::parse(&format!(r#"<Relationships xmlns="{}"/>"#, RELATIONSHIPS_NS))
                .map_err(|source| PackageError::Xml {
                    part: rels_part.clone(),
                    source,
                })?,
        };
        let content_types = package.xml_part(CONTENT_TYPES)?;
        let existing: Vec<&str> = package.part_names().collect();
        let media = MediaRegistry::new(
            relationships,
            content_types,
            &join_part(part_dir, "media"),
            &existing,
            media::max_doc_pr_id(&tree),
        );

        Ok(Self {
            package,
            main_part,
            tree,
            body,
            styles,
            media,
        })
    }

    pub fn tree(&self) -> &XmlTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut XmlTree {
        &mut self.tree
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn styles(&self) -> &StyleSheet {
        &self.styles
    }

    /// Top-level body paragraphs in document order.
    pub fn body_paragraphs(&self) -> Vec<NodeId> {
        self.tree.children_named(self.body, paragraph::PARAGRAPH)
    }

    /// Top-level body tables in document order.
    pub fn body_tables(&self) -> Vec<NodeId> {
        self.tree.children_named(self.body, "w:tbl")
    }

    /// Append a block at the end of the body, keeping the final `w:sectPr` last.
    pub fn append_block(&mut self, block: NodeId) {
        let children = self.tree.children(self.body);
        let index = match children.last() {
            Some(last) if self.tree.is(*last, "w:sectPr") => children.len() - 1,
            _ => children.len(),
        };
        self.tree.insert_child(self.body, index, block);
    }

    /// Register an image part and return a detached run holding the drawing.
    pub fn image_run(&mut self, bytes: &[u8], width_emu: u64) -> Result<NodeId, ImageError> {
        let image: EmbeddedImage = self.media.embed(bytes, width_emu)?;
        let run = self.tree.create_element(paragraph::RUN, &[]);
        let drawing = media::inline_drawing(&mut self.tree, &image);
        self.tree.append_child(run, drawing);
        Ok(run)
    }

    /// Logical text of every top-level body paragraph.
    pub fn paragraph_texts(&self) -> Vec<String> {
        self.body_paragraphs()
            .into_iter()
            .map(|p| paragraph::paragraph_text(&self.tree, p))
            .collect()
    }

    /// Serialize the document into a complete package.
    pub fn to_bytes(&self) -> Result<Vec<u8>, PackageError> {
        let mut package = self.package.clone();
        package.set_part(&self.main_part, self.tree.to_xml_string().into_bytes());
        if !self.media.new_parts().is_empty() {
            let (part_dir, part_file) = self
                .main_part
                .rsplit_once('/')
                .unwrap_or(("", self.main_part.as_str()));
            package.set_part(
                &relationships_part(part_dir, part_file),
                self.media.relationships().to_xml_string().into_bytes(),
            );
            package.set_part(
                CONTENT_TYPES,
                self.media.content_types().to_xml_string().into_bytes(),
            );
            for (name, bytes) in self.media.new_parts() {
                package.set_part(name, bytes.clone());
            }
        }
        package.to_bytes()
    }
}

/// Main part from the root relationships, `word/document.xml` when they say nothing.
fn main_part_name(package: &Package) -> String {
    let Ok(rels) = package.xml_part(ROOT_RELATIONSHIPS) else {
        return DEFAULT_MAIN_PART.to_string();
    };
    rels.children_named(rels.root(), "Relationship")
        .into_iter()
        .find(|rel| rels.attr(*rel, "Type") == Some(OFFICE_DOCUMENT))
        .and_then(|rel| rels.attr(rel, "Target"))
        .map(|target| target.trim_start_matches('/').to_string())
        .filter(|target| package.has_part(target))
        .unwrap_or_else(|| DEFAULT_MAIN_PART.to_string())
}

fn join_part(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}

fn relationships_part(dir: &str, file: &str) -> String {
    join_part(dir, &format!("_rels/{}.rels", file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{png_bytes, TemplateBuilder};

    #[test]
    fn test_open_missing_template() {
        let result = Document::open(Path::new("/definitely/not/here/modelo.docx"));
        assert!(matches!(result, Err(GenerationError::TemplateNotFound(_))));
    }

    #[test]
    fn test_open_garbage_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.docx");
        std::fs::write(&path, b"not a zip").unwrap();
        let result = Document::open(&path);
        assert!(matches!(
            result,
            Err(GenerationError::TemplateMalformed { .. })
        ));
    }

    #[test]
    fn test_reads_body_paragraphs() {
        let bytes = TemplateBuilder::new()
            .paragraph("Primeiro")
            .paragraph("Segundo")
            .build();
        let doc = Document::from_bytes(&bytes).unwrap();
        assert_eq!(doc.paragraph_texts(), vec!["Primeiro", "Segundo"]);
    }

    #[test]
    fn test_append_block_keeps_section_properties_last() {
        let bytes = TemplateBuilder::new().paragraph("Texto").build();
        let mut doc = Document::from_bytes(&bytes).unwrap();
        let p = paragraph::new_text_paragraph(doc.tree_mut(), "Fim", None, None);
        doc.append_block(p);
        let body = doc.body();
        let last = *doc.tree().children(body).last().unwrap();
        assert!(doc.tree().is(last, "w:sectPr"));
        assert_eq!(doc.paragraph_texts(), vec!["Texto", "Fim"]);
    }

    #[test]
    fn test_serialized_package_contains_media() {
        let bytes = TemplateBuilder::new().paragraph("Figura").build();
        let mut doc = Document::from_bytes(&bytes).unwrap();
        let run = doc.image_run(&png_bytes(8, 4), 1_000).unwrap();
        let p = paragraph::new_paragraph(doc.tree_mut(), None);
        doc.tree_mut().append_child(p, run);
        doc.append_block(p);

        let out = doc.to_bytes().unwrap();
        let package = Package::from_bytes(&out).unwrap();
        assert!(package.has_part("word/media/laudo_image1.png"));
        let rels = String::from_utf8(
            package
                .part("word/_rels/document.xml.rels")
                .unwrap()
                .to_vec(),
        )
        .unwrap();
        assert!(rels.contains("media/laudo_image1.png"));

        let reopened = Document::from_bytes(&out).unwrap();
        assert_eq!(reopened.body_paragraphs().len(), 2);
    }
}
