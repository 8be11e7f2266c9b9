//! Test support
//!
//! [TemplateBuilder] assembles a small but complete `.docx` package in memory, so tests
//! never depend on binary fixtures. [png_bytes] encodes a solid PNG of a given size.

use image::{ImageFormat, Rgb, RgbImage};
use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

#[derive(Debug, Clone)]
enum Block {
    Paragraph(Vec<String>),
    Table(Vec<Vec<String>>),
}

/// Builder for minimal WordprocessingML packages.
#[derive(Debug, Clone)]
pub struct TemplateBuilder {
    blocks: Vec<Block>,
    styles: Vec<(String, String)>,
}

impl Default for TemplateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateBuilder {
    /// A template with a `Normal` paragraph style and nothing in the body.
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            styles: vec![("Normal".to_string(), "Normal".to_string())],
        }
    }

    /// A paragraph with one run.
    pub fn paragraph(self, text: &str) -> Self {
        self.paragraph_runs(&[text])
    }

    /// A paragraph with one run per piece, to model tokens split by the editor.
    pub fn paragraph_runs(mut self, runs: &[&str]) -> Self {
        self.blocks
            .push(Block::Paragraph(runs.iter().map(|r| r.to_string()).collect()));
        self
    }

    /// A table with one single-run paragraph per cell.
    pub fn table(mut self, rows: &[&[&str]]) -> Self {
        self.blocks.push(Block::Table(
            rows.iter()
                .map(|row| row.iter().map(|cell| cell.to_string()).collect())
                .collect(),
        ));
        self
    }

    /// Declare a paragraph style.
    pub fn with_style(mut self, id: &str, name: &str) -> Self {
        self.styles.push((id.to_string(), name.to_string()));
        self
    }

    pub fn with_heading_style(self) -> Self {
        self.with_style("Heading1", "heading 1")
    }

    pub fn with_bullet_style(self) -> Self {
        self.with_style("ListBullet", "List Bullet")
    }

    pub fn document_xml(&self) -> String {
        let mut body = String::new();
        for block in &self.blocks {
            match block {
                Block::Paragraph(runs) => body.push_str(&paragraph_xml(runs)),
                Block::Table(rows) => {
                    body.push_str("<w:tbl>");
                    for row in rows {
                        body.push_str("<w:tr>");
                        for cell in row {
                            body.push_str("<w:tc>");
                            body.push_str(&paragraph_xml(std::slice::from_ref(cell)));
                            body.push_str("</w:tc>");
                        }
                        body.push_str("</w:tr>");
                    }
                    body.push_str("</w:tbl>");
                }
            }
        }
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{}"><w:body>{}<w:sectPr><w:pgSz w:w="11906" w:h="16838"/></w:sectPr></w:body></w:document>"#,
            W_NS, body
        )
    }

    fn styles_xml(&self) -> String {
        let styles: String = self
            .styles
            .iter()
            .map(|(id, name)| {
                format!(
                    r#"<w:style w:type="paragraph" w:styleId="{}"><w:name w:val="{}"/></w:style>"#,
                    escape(id),
                    escape(name)
                )
            })
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="{}">{}</w:styles>"#,
            W_NS, styles
        )
    }

    /// The package bytes. Panics only if writing to memory fails.
    pub fn build(&self) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        let parts = [
            ("[Content_Types].xml", CONTENT_TYPES.to_string()),
            ("_rels/.rels", ROOT_RELS.to_string()),
            ("word/document.xml", self.document_xml()),
            ("word/_rels/document.xml.rels", DOCUMENT_RELS.to_string()),
            ("word/styles.xml", self.styles_xml()),
        ];
        for (name, content) in parts {
            writer.start_file(name, options).expect("zip entry in memory");
            writer
                .write_all(content.as_bytes())
                .expect("zip write in memory");
        }
        writer.finish().expect("zip finish in memory").into_inner()
    }

    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, self.build())
    }
}

fn paragraph_xml(runs: &[String]) -> String {
    let mut xml = String::from("<w:p>");
    for run in runs {
        xml.push_str(r#"<w:r><w:t xml:space="preserve">"#);
        xml.push_str(&escape(run));
        xml.push_str("</w:t></w:r>");
    }
    xml.push_str("</w:p>");
    xml
}

fn escape(text: &str) -> String {
    quick_xml::escape::escape(text).into_owned()
}

/// A solid-color PNG of `width` x `height` pixels.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb([200, 120, 40]));
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, ImageFormat::Png)
        .expect("PNG encoding in memory");
    bytes.into_inner()
}
