//! Error types for the doc2invoice library.
//!
//! Every failure the pipeline can produce is one variant of [`ExtractError`].
//! Two views exist onto the same error:
//!
//! * [`std::fmt::Display`] — the developer-facing message, with enough detail
//!   (paths, offending values, provider output) to debug a failing run.
//!
//! * [`ExtractError::user_message`] — the fixed, end-user-facing sentence for
//!   each failure mode. Callers embedding the pipeline behind a form surface
//!   this string verbatim.
//!
//! One outcome is deliberately *not* a malfunction: the model looked at the
//! document and reported it is not an invoice. That sentinel must stay
//! distinguishable from real failures, so [`ExtractError::classification`]
//! collapses the taxonomy into the two terminal classes callers map to UI
//! states.

use thiserror::Error;

/// All errors returned by the doc2invoice library.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Input rejection ───────────────────────────────────────────────────
    /// The declared media type is not one the pipeline accepts.
    #[error(
        "Unsupported media type '{media_type}'\nAccepted: image/jpeg, image/jpg, image/png, image/webp, application/pdf, text/plain."
    )]
    UnsupportedMediaType { media_type: String },

    /// The file exceeds the 10 MiB upload ceiling.
    #[error("File is {size} bytes, over the {limit}-byte limit")]
    FileTooLarge { size: u64, limit: u64 },

    // ── I/O ───────────────────────────────────────────────────────────────
    /// The file could not be read or decoded.
    #[error("Failed to read the file: {detail}")]
    FileRead { detail: String },

    // ── Precondition ──────────────────────────────────────────────────────
    /// No model API key available; reported before any network attempt.
    #[error("API key is not configured.\nSet ANTHROPIC_API_KEY or pass one via the config.")]
    MissingApiKey,

    // ── Transport / model ─────────────────────────────────────────────────
    /// The provider rejected the request or the transport failed.
    #[error("Extraction request failed: {message}")]
    Api { message: String },

    // ── Response shape ────────────────────────────────────────────────────
    /// The response was not a structured object in any shape we accept.
    #[error("Model response did not match the declared extraction schema")]
    UnableToAnalyze,

    // ── Sentinel classification ───────────────────────────────────────────
    /// The model classified the document as not being an invoice.
    ///
    /// A valid model response, not a malfunction; see
    /// [`ExtractError::classification`].
    #[error("Document classified as not an invoice")]
    NotAnInvoice,

    // ── Semantic validation ───────────────────────────────────────────────
    /// Multi-item extraction produced no line items.
    #[error("No line items found in the extracted data")]
    NoLineItems,

    /// A pay rate was outside [0, 100 000 000] subunits.
    #[error("Pay rate {value} subunits is outside the allowed range 0–100000000")]
    InvalidPayRate { value: f64 },

    /// A quantity failed to parse, or was outside (0, 10000].
    #[error("Quantity '{value}' is not a number in (0, 10000]")]
    InvalidQuantity { value: String },

    /// A line item carried an empty service description.
    #[error("Line item {index} has an empty service description")]
    InvalidDescription { index: usize },

    /// The invoice date did not match YYYY-MM-DD.
    #[error("Invoice date '{value}' does not match YYYY-MM-DD")]
    InvalidDate { value: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A required environment setting is absent or empty at startup.
    #[error("Required setting {name} is missing or empty")]
    MissingSetting { name: &'static str },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse terminal classification of a failure.
///
/// The pipeline exposes no structured error codes to form callers — just a
/// message plus one of these two classes, so "not an invoice" can render as
/// its own UI state rather than a generic error banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// A genuine failure: bad input, transport error, invalid fields.
    Error,
    /// The model's verdict that the document is not an invoice.
    NotInvoice,
}

impl ExtractError {
    /// Collapse this error into its terminal classification.
    pub fn classification(&self) -> Classification {
        match self {
            ExtractError::NotAnInvoice => Classification::NotInvoice,
            _ => Classification::Error,
        }
    }

    /// True when this is the not-an-invoice sentinel.
    pub fn is_not_invoice(&self) -> bool {
        matches!(self, ExtractError::NotAnInvoice)
    }

    /// The fixed end-user-facing message for this failure.
    ///
    /// Underlying causes are surfaced only for transport/model failures,
    /// where the provider message is appended to a fixed prefix; I/O detail
    /// is never shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            ExtractError::UnsupportedMediaType { .. } => {
                "Invalid file format. Please upload a JPEG, PNG, or WebP image, a PDF, or a plain text file.".into()
            }
            ExtractError::FileTooLarge { .. } => {
                "File is too large. The maximum size is 10 MB.".into()
            }
            ExtractError::FileRead { .. } => "Failed to read the file.".into(),
            ExtractError::MissingApiKey => "API key is not configured.".into(),
            ExtractError::Api { message } => format!("Processing failed: {message}"),
            ExtractError::UnableToAnalyze => "Unable to analyze the document.".into(),
            ExtractError::NotAnInvoice => {
                "The uploaded document does not appear to be an invoice.".into()
            }
            ExtractError::NoLineItems => "No line items found in the document.".into(),
            ExtractError::InvalidPayRate { .. } => "Invalid payment amount.".into(),
            ExtractError::InvalidQuantity { .. } => "Invalid quantity/hours.".into(),
            ExtractError::InvalidDescription { .. } => "Invalid service description.".into(),
            ExtractError::InvalidDate { .. } => "Invalid or missing invoice date.".into(),
            other => other.to_string(),
        }
    }
}
