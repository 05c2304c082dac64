//! Pipeline stages for document-to-invoice extraction.
//!
//! Each submodule implements exactly one transformation step. Keeping the
//! stages separate makes each independently testable and keeps the model
//! call the only stage with network I/O.
//!
//! ## Data Flow
//!
//! ```text
//! gate ──▶ encode ──▶ model ──▶ normalize ──▶ validate
//! (type/size) (base64)  (LLM)    (envelope)    (bounds)
//! ```
//!
//! 1. [`gate`]      — admit or reject the upload on declared media type and
//!    size, before any encoding or network work
//! 2. [`encode`]    — convert the admitted bytes into the transport payload
//!    (base64 image, base64 PDF, or decoded text)
//! 3. the provider  — one request, zero retries (see [`crate::provider`])
//! 4. [`normalize`] — unwrap the occasional schema-echo envelope
//! 5. [`validate`]  — ordered field checks; first failure wins

pub mod encode;
pub mod gate;
pub mod normalize;
pub mod validate;
