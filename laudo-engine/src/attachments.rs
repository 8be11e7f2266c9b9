//! Attachment collections
//!
//! Three ordered collections feed the sections appended after the fixed content. An item
//! belongs to exactly one collection and is identified by its position there; `id` is the
//! number printed in its caption.
//!
//! Image payloads are owned byte buffers. Sources that can only be read once (uploads,
//! network bodies) are drained with [ImagePayload::from_reader] before generation starts.

use std::fmt;
use std::io::{Cursor, Read};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentKind {
    Appendix,
    AnswerImage,
    Attachment,
}

impl fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttachmentKind::Appendix => "appendix",
            AttachmentKind::AnswerImage => "answer image",
            AttachmentKind::Attachment => "attachment",
        };
        f.write_str(name)
    }
}

/// Materialized, re-readable image bytes.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct ImagePayload(Vec<u8>);

impl ImagePayload {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Drain a reader into memory.
    pub fn from_reader<R: Read>(mut reader: R) -> std::io::Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A fresh cursor over the bytes; can be called any number of times.
    pub fn reader(&self) -> Cursor<&[u8]> {
        Cursor::new(&self.0)
    }
}

impl fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImagePayload({} bytes)", self.0.len())
    }
}

impl From<Vec<u8>> for ImagePayload {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentItem {
    pub id: u32,
    pub caption: String,
    pub image: Option<ImagePayload>,
    pub kind: AttachmentKind,
}

impl AttachmentItem {
    pub fn new(kind: AttachmentKind, id: u32, caption: impl Into<String>) -> Self {
        Self {
            id,
            caption: caption.into(),
            image: None,
            kind,
        }
    }

    pub fn with_image(mut self, image: impl Into<ImagePayload>) -> Self {
        self.image = Some(image.into());
        self
    }
}

/// The three collections, each in caller order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attachments {
    pub appendices: Vec<AttachmentItem>,
    pub answer_images: Vec<AttachmentItem>,
    pub attachments: Vec<AttachmentItem>,
}

impl Attachments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item to the collection its kind belongs to.
    pub fn push(&mut self, item: AttachmentItem) {
        match item.kind {
            AttachmentKind::Appendix => self.appendices.push(item),
            AttachmentKind::AnswerImage => self.answer_images.push(item),
            AttachmentKind::Attachment => self.attachments.push(item),
        }
    }

    pub fn with(mut self, item: AttachmentItem) -> Self {
        self.push(item);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.appendices.is_empty() && self.answer_images.is_empty() && self.attachments.is_empty()
    }

    pub fn collection(&self, kind: AttachmentKind) -> &[AttachmentItem] {
        match kind {
            AttachmentKind::Appendix => &self.appendices,
            AttachmentKind::AnswerImage => &self.answer_images,
            AttachmentKind::Attachment => &self.attachments,
        }
    }
}
