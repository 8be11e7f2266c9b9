//! Attachment sections
//!
//! Three optional sections are appended after the insertion point, always in this order:
//!
//!     APÊNDICES               caption, image, page break after an embedded image
//!     IMAGENS DAS RESPOSTAS   caption, image (an item without payload is a warning)
//!     ANEXOS                  caption, optional image
//!
//! A section heading is written only when its collection is non-empty. An image that
//! cannot be embedded is skipped with a warning; its caption is written regardless.

use super::locator::InsertionPoint;
use crate::attachments::{AttachmentItem, AttachmentKind, Attachments};
use crate::config::{EngineConfig, SectionConfig};
use crate::docx::media::EMU_PER_CM;
use crate::docx::paragraph;
use crate::docx::styles::ResolvedStyles;
use crate::docx::xml::NodeId;
use crate::docx::Document;
use crate::error::{Warning, Warnings};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompositionStats {
    pub headings: usize,
    pub captions: usize,
    pub images: usize,
}

pub struct SectionComposer<'c> {
    config: &'c EngineConfig,
    styles: &'c ResolvedStyles,
}

/// Where the next generated block goes.
struct Cursor(InsertionPoint);

impl Cursor {
    fn place(&mut self, document: &mut Document, block: NodeId) {
        match self.0 {
            InsertionPoint::After(anchor) => {
                document.tree_mut().insert_after(anchor, block);
                self.0 = InsertionPoint::After(block);
            }
            InsertionPoint::Tail => document.append_block(block),
        }
    }
}

impl<'c> SectionComposer<'c> {
    pub fn new(config: &'c EngineConfig, styles: &'c ResolvedStyles) -> Self {
        Self { config, styles }
    }

    pub fn compose(
        &self,
        document: &mut Document,
        point: InsertionPoint,
        attachments: &Attachments,
        warnings: &mut Warnings,
    ) -> CompositionStats {
        let mut cursor = Cursor(point);
        let mut stats = CompositionStats::default();
        let sections = &self.config.sections;
        for (kind, section) in [
            (AttachmentKind::Appendix, &sections.appendices),
            (AttachmentKind::AnswerImage, &sections.answer_images),
            (AttachmentKind::Attachment, &sections.attachments),
        ] {
            let items = attachments.collection(kind);
            if items.is_empty() {
                continue;
            }
            tracing::debug!(%kind, items = items.len(), "composing section");
            self.heading(document, &mut cursor, &section.heading);
            stats.headings += 1;
            for item in items {
                self.item(document, &mut cursor, section, item, warnings, &mut stats);
            }
        }
        stats
    }

    fn heading(&self, document: &mut Document, cursor: &mut Cursor, text: &str) {
        let block = match self.styles.heading.as_deref() {
            Some(style) => paragraph::new_text_paragraph(document.tree_mut(), text, Some(style), None),
            None => {
                let tree = document.tree_mut();
                let p = paragraph::new_paragraph(tree, None);
                let run = paragraph::new_bold_run(tree, text);
                tree.append_child(p, run);
                p
            }
        };
        cursor.place(document, block);
    }

    fn item(
        &self,
        document: &mut Document,
        cursor: &mut Cursor,
        section: &SectionConfig,
        item: &AttachmentItem,
        warnings: &mut Warnings,
        stats: &mut CompositionStats,
    ) {
        let caption = section.caption_for(item.id, &item.caption);
        let plain = self.styles.plain.clone();
        let block = paragraph::new_text_paragraph(document.tree_mut(), &caption, plain.as_deref(), None);
        cursor.place(document, block);
        stats.captions += 1;

        let Some(payload) = &item.image else {
            if item.kind == AttachmentKind::AnswerImage {
                warnings.push(Warning::ImageUnreadable {
                    kind: item.kind,
                    id: item.id,
                    reason: "no image payload".to_string(),
                });
            }
            return;
        };
        match document.image_run(payload.as_bytes(), self.image_width_emu()) {
            Ok(run) => {
                let tree = document.tree_mut();
                let p = paragraph::new_paragraph(tree, plain.as_deref());
                tree.append_child(p, run);
                cursor.place(document, p);
                stats.images += 1;
                if item.kind == AttachmentKind::Appendix {
                    let page_break = paragraph::new_page_break(document.tree_mut());
                    cursor.place(document, page_break);
                }
            }
            Err(err) => warnings.push(Warning::ImageUnreadable {
                kind: item.kind,
                id: item.id,
                reason: err.to_string(),
            }),
        }
    }

    fn image_width_emu(&self) -> u64 {
        let width = self.config.images.width_cm * EMU_PER_CM as f64;
        if width.is_finite() && width > 0.0 {
            width.round() as u64
        } else {
            15 * EMU_PER_CM
        }
    }
}
