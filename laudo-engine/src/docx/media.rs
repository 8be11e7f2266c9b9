//! Embedded images
//!
//! Embedding one picture touches three parts of the package:
//! - a new `word/media/…` part with the raw bytes,
//! - an image relationship in the main part's `.rels`,
//! - a `Default` content type for the extension in `[Content_Types].xml`.
//!
//! The run content itself is an inline `w:drawing` whose extent keeps the picture's aspect
//! ratio at the requested width.

use super::xml::{NodeId, XmlTree};
use image::{ImageFormat, ImageReader};
use std::io::Cursor;
use thiserror::Error;

pub const EMU_PER_CM: u64 = 360_000;

const IMAGE_RELATIONSHIP: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
pub const RELATIONSHIPS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("empty payload")]
    Empty,
    #[error("unrecognized image data")]
    UnknownFormat,
    #[error("unsupported image format {0}")]
    UnsupportedFormat(String),
    #[error("image cannot be decoded: {0}")]
    Undecodable(String),
    #[error("image of {width_px}x{height_px} px does not fit {width_emu} EMU wide")]
    TooLarge {
        width_px: u32,
        height_px: u32,
        width_emu: u64,
    },
}

/// A picture that has been registered in the package and can be referenced from a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedImage {
    pub relationship_id: String,
    pub file_name: String,
    pub doc_pr_id: u32,
    pub width_emu: u64,
    pub height_emu: u64,
}

/// Media bookkeeping for one document: relationships, content types and new parts.
#[derive(Debug, Clone)]
pub struct MediaRegistry {
    relationships: XmlTree,
    content_types: XmlTree,
    parts: Vec<(String, Vec<u8>)>,
    media_dir: String,
    next_relationship: u32,
    next_doc_pr: u32,
    next_image: u32,
}

impl MediaRegistry {
    /// `media_dir` is relative to the package root (`word/media`); `existing_doc_pr` is the
    /// highest `wp:docPr` id already used by the main part.
    pub fn new(
        relationships: XmlTree,
        content_types: XmlTree,
        media_dir: &str,
        existing_parts: &[&str],
        existing_doc_pr: u32,
    ) -> Self {
        let next_relationship = relationships
            .children_named(relationships.root(), "Relationship")
            .into_iter()
            .filter_map(|rel| relationships.attr(rel, "Id"))
            .filter_map(|id| id.strip_prefix("rId"))
            .filter_map(|n| n.parse::<u32>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        let prefix = format!("{}/laudo_image", media_dir);
        let next_image = existing_parts
            .iter()
            .filter_map(|name| name.strip_prefix(prefix.as_str()))
            .filter_map(|rest| rest.split('.').next())
            .filter_map(|n| n.parse::<u32>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        Self {
            relationships,
            content_types,
            parts: Vec::new(),
            media_dir: media_dir.to_string(),
            next_relationship,
            next_doc_pr: existing_doc_pr + 1,
            next_image,
        }
    }

    /// Validate `bytes`, register a media part and return its reference.
    pub fn embed(&mut self, bytes: &[u8], width_emu: u64) -> Result<EmbeddedImage, ImageError> {
        if bytes.is_empty() {
            return Err(ImageError::Empty);
        }
        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|err| ImageError::Undecodable(err.to_string()))?;
        let format = reader.format().ok_or(ImageError::UnknownFormat)?;
        let (extension, content_type) = match format {
            ImageFormat::Png => ("png", "image/png"),
            ImageFormat::Jpeg => ("jpeg", "image/jpeg"),
            ImageFormat::Gif => ("gif", "image/gif"),
            ImageFormat::Bmp => ("bmp", "image/bmp"),
            other => return Err(ImageError::UnsupportedFormat(format!("{:?}", other))),
        };
        let (width_px, height_px) = reader
            .into_dimensions()
            .map_err(|err| ImageError::Undecodable(err.to_string()))?;
        if width_px == 0 || height_px == 0 {
            return Err(ImageError::Undecodable("zero-sized image".to_string()));
        }
        let height_emu = u128::from(width_emu) * u128::from(height_px) / u128::from(width_px);
        let height_emu = u64::try_from(height_emu).map_err(|_| ImageError::TooLarge {
            width_px,
            height_px,
            width_emu,
        })?;

        let file_name = format!("laudo_image{}.{}", self.next_image, extension);
        self.next_image += 1;
        let relationship_id = format!("rId{}", self.next_relationship);
        self.next_relationship += 1;
        let doc_pr_id = self.next_doc_pr;
        self.next_doc_pr += 1;

        let media_target = match self.media_dir.rsplit_once('/') {
            Some((_, dir)) => format!("{}/{}", dir, file_name),
            None => file_name.clone(),
        };
        let root = self.relationships.root();
        let rel = self.relationships.create_element(
            "Relationship",
            &[
                ("Id", relationship_id.as_str()),
                ("Type", IMAGE_RELATIONSHIP),
                ("Target", media_target.as_str()),
            ],
        );
        self.relationships.append_child(root, rel);
        self.ensure_content_type(extension, content_type);
        self.parts.push((
            format!("{}/{}", self.media_dir, file_name),
            bytes.to_vec(),
        ));

        Ok(EmbeddedImage {
            relationship_id,
            file_name,
            doc_pr_id,
            width_emu,
            height_emu,
        })
    }

    fn ensure_content_type(&mut self, extension: &str, content_type: &str) {
        let root = self.content_types.root();
        let known = self
            .content_types
            .children_named(root, "Default")
            .into_iter()
            .any(|node| {
                self.content_types
                    .attr(node, "Extension")
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
            });
        if !known {
            let node = self.content_types.create_element(
                "Default",
                &[("Extension", extension), ("ContentType", content_type)],
            );
            self.content_types.insert_child(root, 0, node);
        }
    }

    pub fn relationships(&self) -> &XmlTree {
        &self.relationships
    }

    pub fn content_types(&self) -> &XmlTree {
        &self.content_types
    }

    pub fn new_parts(&self) -> &[(String, Vec<u8>)] {
        &self.parts
    }
}

/// Build a detached `w:drawing` for `image` inside `tree`.
pub fn inline_drawing(tree: &mut XmlTree, image: &EmbeddedImage) -> NodeId {
    let xml = format!(
        concat!(
            r#"<w:drawing xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
            r#"<wp:inline distT="0" distB="0" distL="0" distR="0" xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing">"#,
            r#"<wp:extent cx="{cx}" cy="{cy}"/>"#,
            r#"<wp:docPr id="{id}" name="Picture {id}"/>"#,
            r#"<wp:cNvGraphicFramePr><a:graphicFrameLocks xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" noChangeAspect="1"/></wp:cNvGraphicFramePr>"#,
            r#"<a:graphic xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main">"#,
            r#"<a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
            r#"<pic:pic xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
            r#"<pic:nvPicPr><pic:cNvPr id="0" name="{name}"/><pic:cNvPicPr/></pic:nvPicPr>"#,
            r#"<pic:blipFill><a:blip r:embed="{rel}" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
            r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr>"#,
            r#"</pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing>"#
        ),
        cx = image.width_emu,
        cy = image.height_emu,
        id = image.doc_pr_id,
        name = image.file_name,
        rel = image.relationship_id,
    );
    match XmlTree::parse(&xml) {
        Ok(fragment) => tree.import(&fragment, fragment.root()),
        // The fragment is built from known-good markup and ASCII identifiers
        Err(_) => tree.create_element("w:drawing", &[]),
    }
}

/// Highest `wp:docPr` id in a part, 0 when there is none.
pub fn max_doc_pr_id(tree: &XmlTree) -> u32 {
    tree.descendants(tree.root())
        .into_iter()
        .filter(|node| tree.is(*node, "wp:docPr"))
        .filter_map(|node| tree.attr(node, "id"))
        .filter_map(|id| id.parse::<u32>().ok())
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::png_bytes;

    fn registry() -> MediaRegistry {
        let rels = XmlTree::parse(&format!(
            r#"<Relationships xmlns="{}"><Relationship Id="rId1" Type="x" Target="styles.xml"/><Relationship Id="rId7" Type="x" Target="theme.xml"/></Relationships>"#,
            RELATIONSHIPS_NS
        ))
        .unwrap();
        let types = XmlTree::parse(r#"<Types><Default Extension="xml" ContentType="application/xml"/></Types>"#).unwrap();
        MediaRegistry::new(rels, types, "word/media", &["word/media/image1.png"], 3)
    }

    #[test]
    fn test_embed_registers_relationship_and_part() {
        let mut registry = registry();
        let image = registry.embed(&png_bytes(40, 20), 15 * EMU_PER_CM).unwrap();
        assert_eq!(image.relationship_id, "rId8");
        assert_eq!(image.doc_pr_id, 4);
        assert_eq!(image.file_name, "laudo_image1.png");
        assert_eq!(image.width_emu, 5_400_000);
        assert_eq!(image.height_emu, 2_700_000);

        let rels = registry.relationships().to_xml_string();
        assert!(rels.contains(r#"Id="rId8""#));
        assert!(rels.contains(r#"Target="media/laudo_image1.png""#));
        let types = registry.content_types().to_xml_string();
        assert!(types.contains(r#"Extension="png""#));
        assert_eq!(registry.new_parts()[0].0, "word/media/laudo_image1.png");
    }

    #[test]
    fn test_second_embed_reuses_content_type() {
        let mut registry = registry();
        registry.embed(&png_bytes(2, 2), EMU_PER_CM).unwrap();
        let second = registry.embed(&png_bytes(2, 2), EMU_PER_CM).unwrap();
        assert_eq!(second.relationship_id, "rId9");
        assert_eq!(second.file_name, "laudo_image2.png");
        let types = registry.content_types().to_xml_string();
        assert_eq!(types.matches(r#"Extension="png""#).count(), 1);
    }

    #[test]
    fn test_rejects_garbage() {
        let mut registry = registry();
        assert_eq!(registry.embed(&[], EMU_PER_CM), Err(ImageError::Empty));
        assert!(registry.embed(b"not an image at all", EMU_PER_CM).is_err());
        assert!(registry.new_parts().is_empty());
    }

    #[test]
    fn test_oversized_width_is_an_error() {
        let mut registry = registry();
        assert_eq!(
            registry.embed(&png_bytes(1, 4), u64::MAX),
            Err(ImageError::TooLarge {
                width_px: 1,
                height_px: 4,
                width_emu: u64::MAX,
            })
        );
        assert!(registry.new_parts().is_empty());
        let next = registry.embed(&png_bytes(2, 2), EMU_PER_CM).unwrap();
        assert_eq!(next.file_name, "laudo_image1.png");
    }

    #[test]
    fn test_inline_drawing_references_image() {
        let mut tree = XmlTree::parse("<w:r/>").unwrap();
        let image = EmbeddedImage {
            relationship_id: "rId5".to_string(),
            file_name: "laudo_image1.png".to_string(),
            doc_pr_id: 9,
            width_emu: 100,
            height_emu: 50,
        };
        let drawing = inline_drawing(&mut tree, &image);
        let xml = tree.subtree_to_string(drawing);
        assert!(xml.contains(r#"r:embed="rId5""#));
        assert!(xml.contains(r#"<wp:extent cx="100" cy="50"/>"#));
        assert!(xml.contains(r#"<wp:docPr id="9" name="Picture 9"/>"#));
    }
}
