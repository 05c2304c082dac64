//! Binary encoding: [`SourceFile`] → transport-ready [`EncodedPayload`].
//!
//! Vision APIs accept images and PDFs as base64 strings embedded in the JSON
//! request body; plain text travels as decoded text. The encoder consumes
//! the source file — the raw bytes are owned by the invocation only and are
//! dropped here once the payload exists.

use crate::error::ExtractError;
use crate::pipeline::gate::{MediaKind, SourceFile};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

/// A source file converted into its transport representation.
///
/// Exactly one of the two tags applies, determined solely by the media type
/// admitted at the gate.
#[derive(Debug, Clone)]
pub enum EncodedPayload {
    /// Raster image as raw base64 (no data-URL prefix).
    Image {
        /// Original declared media type.
        media_type: String,
        /// Base64 of the image bytes.
        data: String,
    },
    /// Non-image document, base64 or decoded text.
    File {
        /// Original declared media type.
        media_type: String,
        /// Original filename, forwarded to the model as the document title.
        filename: String,
        /// The document body.
        data: FileData,
    },
}

/// Body of a file-tagged payload.
#[derive(Debug, Clone)]
pub enum FileData {
    /// Base64 of the raw bytes (PDF).
    Base64(String),
    /// Decoded UTF-8 text (plain text files).
    Text(String),
}

/// Drop everything up to and including the first `,` of a data-URL.
///
/// Browser file readers hand back `data:<mime>;base64,<payload>` strings;
/// only the payload after the first separator is valid base64. Strings
/// without a separator pass through unchanged.
fn strip_data_url_prefix(encoded: String) -> String {
    match encoded.split_once(',') {
        Some((_, payload)) => payload.to_string(),
        None => encoded,
    }
}

/// Encode an admitted source file.
///
/// `kind` must be the [`MediaKind`] the gate returned for this file;
/// unsupported types never reach this stage.
pub fn encode(source: SourceFile, kind: MediaKind) -> Result<EncodedPayload, ExtractError> {
    let SourceFile {
        bytes,
        media_type,
        filename,
    } = source;

    let payload = match kind {
        MediaKind::Image => {
            let data = strip_data_url_prefix(STANDARD.encode(&bytes));
            debug!("Encoded image {} → {} bytes base64", filename, data.len());
            EncodedPayload::Image { media_type, data }
        }
        MediaKind::Pdf => {
            let data = STANDARD.encode(&bytes);
            debug!("Encoded PDF {} → {} bytes base64", filename, data.len());
            EncodedPayload::File {
                media_type,
                filename,
                data: FileData::Base64(data),
            }
        }
        MediaKind::Text => {
            let text = String::from_utf8(bytes).map_err(|e| ExtractError::FileRead {
                detail: format!("not valid UTF-8: {e}"),
            })?;
            EncodedPayload::File {
                media_type,
                filename,
                data: FileData::Text(text),
            }
        }
    };

    Ok(payload)
}
