//! Attachment manifests
//!
//! The CLI takes the three attachment collections as one JSON file:
//!
//!     {
//!       "appendices":    [{"id": 1, "caption": "Planta baixa", "image": "planta.png"}],
//!       "answer_images": [{"id": 1, "caption": "Fachada", "image": "fachada.jpg"}],
//!       "attachments":   [{"id": 1, "caption": "Contrato"}]
//!     }
//!
//! Image paths are relative to the manifest. Every image is read into memory before the
//! engine runs; a file that cannot be read becomes an empty payload, which the engine
//! reports as an unreadable image while still writing the caption.

use laudo_engine::{AttachmentItem, AttachmentKind, Attachments, ImagePayload};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("cannot read attachment manifest {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid attachment manifest {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Manifest {
    appendices: Vec<Entry>,
    answer_images: Vec<Entry>,
    attachments: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    id: u32,
    #[serde(default)]
    caption: String,
    #[serde(default)]
    image: Option<PathBuf>,
}

pub fn load(path: &Path) -> Result<Attachments, ManifestError> {
    let source = fs::read_to_string(path).map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let manifest: Manifest = serde_json::from_str(&source).map_err(|source| ManifestError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));

    let mut attachments = Attachments::new();
    for (kind, entries) in [
        (AttachmentKind::Appendix, manifest.appendices),
        (AttachmentKind::AnswerImage, manifest.answer_images),
        (AttachmentKind::Attachment, manifest.attachments),
    ] {
        for entry in entries {
            let mut item = AttachmentItem::new(kind, entry.id, entry.caption);
            if let Some(image) = entry.image {
                item = item.with_image(read_image(&base.join(image)));
            }
            attachments.push(item);
        }
    }
    Ok(attachments)
}

fn read_image(path: &Path) -> ImagePayload {
    match fs::File::open(path).and_then(ImagePayload::from_reader) {
        Ok(payload) => payload,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "image file unreadable");
            ImagePayload::default()
        }
    }
}
