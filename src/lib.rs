//! # doc2invoice
//!
//! Extract structured invoice data from user-supplied documents (images,
//! PDFs, plain text) using a large language model.
//!
//! ## Why this crate?
//!
//! Template- and regex-based invoice parsers break on every new layout.
//! Instead this crate ships the document to a vision-capable LLM with a
//! declared output schema, then distrusts the answer: every returned field
//! passes hand-written bounds checks (rates, quantities, date format)
//! before anything reaches the caller. The model does the reading; the
//! crate does the gatekeeping.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Document (image / PDF / text)
//!  │
//!  ├─ 1. Gate       declared media type + 10 MiB ceiling, no network
//!  ├─ 2. Encode     bytes → base64 image / base64 file / decoded text
//!  ├─ 3. Model      ONE call, zero retries, schema declared as a tool
//!  ├─ 4. Normalise  unwrap the occasional schema-echo envelope
//!  ├─ 5. Validate   bounds + date format, first failure wins
//!  └─ 6. Output     typed line items + run stats
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use doc2invoice::{extract, ExtractionConfig, SchemaVariant};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Credential read from ANTHROPIC_API_KEY
//!     let config = ExtractionConfig::builder()
//!         .variant(SchemaVariant::MultiItem)
//!         .build()?;
//!     let output = extract("invoice.pdf", &config).await?;
//!     for item in &output.invoice.line_items {
//!         println!("{}  x{}  {} subunits", item.description, item.quantity,
//!             item.pay_rate_in_subunits);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Outcome classes
//!
//! Failures collapse into two caller-visible classes
//! ([`ExtractError::classification`]): a generic error, or the sentinel
//! "not an invoice" — a *valid* model verdict that deserves its own UI
//! state, not an error banner. [`Session`] tracks exactly that distinction
//! for drop-surface hosts.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `doc2invoice` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! doc2invoice = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod provider;
pub mod schema;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder, Settings};
pub use error::{Classification, ExtractError};
pub use extract::{extract, extract_source, extract_sync};
pub use output::{ExtractedInvoice, ExtractionOutput, ExtractionStats, LineItem};
pub use pipeline::encode::{EncodedPayload, FileData};
pub use pipeline::gate::{MediaKind, SourceFile, MAX_FILE_BYTES};
pub use provider::{AnthropicExtractor, ExtractionModel, ExtractionRequest, ModelReply};
pub use schema::{SchemaVariant, MAX_PAY_RATE_SUBUNITS, MAX_QUANTITY};
pub use session::{Phase, Session};
