//! The model seam: one trait, one bundled request type.
//!
//! The pipeline talks to the model through [`ExtractionModel`] so the
//! network edge stays swappable — tests inject a mock, callers with special
//! needs (proxies, custom middleware) supply their own implementation via
//! [`crate::config::ExtractionConfig`], and everyone else gets the bundled
//! [`AnthropicExtractor`].
//!
//! The contract is deliberately narrow: one request in, one structured value
//! out. Retry policy is fixed at zero — a failed call surfaces immediately
//! and the user decides whether to resubmit.

use crate::error::ExtractError;
use crate::pipeline::encode::EncodedPayload;
use async_trait::async_trait;
use serde_json::Value;

pub mod anthropic;

pub use anthropic::AnthropicExtractor;

/// The fully assembled request handed to a provider.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    /// The fixed instruction text (date already substituted).
    pub instruction: String,
    /// The encoded document.
    pub payload: EncodedPayload,
    /// JSON Schema of the declared output shape.
    pub schema: Value,
    /// Name of the single tool the model must call.
    pub tool_name: String,
    /// One-line tool description.
    pub tool_description: String,
}

/// What a provider returns: the raw structured value plus token accounting.
///
/// The value is *raw* on purpose — normalisation and validation are pipeline
/// stages, not provider responsibilities, so every provider misbehaves in
/// the same observable way.
#[derive(Debug, Clone)]
pub struct ModelReply {
    /// The structured value the model populated.
    pub value: Value,
    /// Prompt tokens consumed.
    pub input_tokens: u64,
    /// Completion tokens produced.
    pub output_tokens: u64,
}

/// A model endpoint able to run one extraction request.
#[async_trait]
pub trait ExtractionModel: Send + Sync + std::fmt::Debug {
    /// Submit the request and return the structured reply.
    ///
    /// Implementations make exactly one attempt; the pipeline never retries.
    async fn extract(&self, request: &ExtractionRequest) -> Result<ModelReply, ExtractError>;
}
