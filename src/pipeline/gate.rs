//! File acquisition gate: reject unusable uploads before any other work.
//!
//! The gate runs on declared metadata only — media type and byte size — so a
//! rejected file costs no encoding work and, more importantly, no model
//! call. Anything that passes the gate is guaranteed to map onto one of the
//! three payload families the encoder knows how to build.

use crate::error::ExtractError;
use std::path::Path;
use tracing::debug;

/// Upload ceiling: 10 MiB.
pub const MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// The user-supplied input to one pipeline invocation.
///
/// Owned by the invocation and discarded after encoding; nothing in the
/// pipeline retains the raw bytes once the payload is built.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Raw file content.
    pub bytes: Vec<u8>,
    /// Declared media type, e.g. `image/png`.
    pub media_type: String,
    /// Original filename, forwarded with file-tagged payloads.
    pub filename: String,
}

impl SourceFile {
    /// Build a source file from raw parts.
    pub fn new(
        bytes: Vec<u8>,
        media_type: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            bytes,
            media_type: media_type.into(),
            filename: filename.into(),
        }
    }
}

/// The three payload families the pipeline can transmit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// JPEG, PNG, or WebP raster image.
    Image,
    /// PDF document.
    Pdf,
    /// Plain UTF-8 text.
    Text,
}

/// Map a declared media type onto its payload family.
///
/// Returns `None` for anything the pipeline does not accept. `image/jpg` is
/// kept alongside `image/jpeg` because browsers and form libraries disagree
/// on which one a .jpg upload declares.
pub fn media_kind(media_type: &str) -> Option<MediaKind> {
    match media_type {
        "image/jpeg" | "image/jpg" | "image/png" | "image/webp" => Some(MediaKind::Image),
        "application/pdf" => Some(MediaKind::Pdf),
        "text/plain" => Some(MediaKind::Text),
        _ => None,
    }
}

/// Infer a declared media type from a file extension.
///
/// Used by the path-based entry point; byte-based callers declare the type
/// themselves.
pub fn media_type_for_path(path: &Path) -> Option<&'static str> {
    match path
        .extension()
        .and_then(|e| e.to_str())?
        .to_lowercase()
        .as_str()
    {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "pdf" => Some("application/pdf"),
        "txt" => Some("text/plain"),
        _ => None,
    }
}

/// Admit or reject a source file.
///
/// Checks the declared media type first, then the size ceiling; the first
/// failing check is the reported one. No partial processing happens for a
/// rejected file.
pub fn admit(source: &SourceFile) -> Result<MediaKind, ExtractError> {
    let kind = media_kind(&source.media_type).ok_or_else(|| {
        ExtractError::UnsupportedMediaType {
            media_type: source.media_type.clone(),
        }
    })?;

    let size = source.bytes.len() as u64;
    if size > MAX_FILE_BYTES {
        return Err(ExtractError::FileTooLarge {
            size,
            limit: MAX_FILE_BYTES,
        });
    }

    debug!("Admitted {} ({} bytes, {:?})", source.filename, size, kind);
    Ok(kind)
}
