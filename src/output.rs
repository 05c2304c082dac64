//! Output types: the validated extraction result and its run statistics.
//!
//! [`ExtractedInvoice`] is built only after every validation gate has
//! passed — it is never partially constructed, and the `isInvoice`
//! classification field is already stripped by the time one exists. All
//! three schema variants produce the same typed shape; single-item variants
//! simply yield a one-element `line_items`.
//!
//! Field names serialise in camelCase so JSON output matches the wire shape
//! the model populated (`payRateInSubunits`, `invoiceDate`, …).

use serde::{Deserialize, Serialize};

/// One billed service or product line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// What is being billed.
    pub description: String,
    /// Units or hours billed, as the decimal string the model reported.
    pub quantity: String,
    /// Whether the line is billed per hour.
    pub hourly: bool,
    /// Price per unit/hour in currency subunits (cents).
    pub pay_rate_in_subunits: i64,
}

/// The validated, caller-facing extraction result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedInvoice {
    /// The billed lines, in document order. Never empty.
    pub line_items: Vec<LineItem>,
    /// Invoice issue date, `YYYY-MM-DD`.
    pub invoice_date: String,
}

/// Statistics for one extraction run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Prompt tokens consumed by the model call.
    pub input_tokens: u64,
    /// Completion tokens produced by the model call.
    pub output_tokens: u64,
    /// Time spent reading and encoding the file.
    pub encode_duration_ms: u64,
    /// Time spent inside the model call.
    pub model_duration_ms: u64,
    /// Wall-clock time for the whole pipeline.
    pub total_duration_ms: u64,
}

/// Result of a successful pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutput {
    /// The validated invoice data.
    pub invoice: ExtractedInvoice,
    /// Run statistics.
    pub stats: ExtractionStats,
}
