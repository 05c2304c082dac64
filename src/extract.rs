//! Extraction entry points.
//!
//! The pipeline is strictly sequential — gate, encode, one model call,
//! normalise, validate — with a single suspend point for the file read and
//! one for the network call. Nothing is retried and nothing is cancelled:
//! a failure at any stage converts into one [`ExtractError`] at this
//! boundary and the user decides whether to resubmit.

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::output::{ExtractionOutput, ExtractionStats};
use crate::pipeline::{encode, gate, normalize, validate};
use crate::provider::{AnthropicExtractor, ExtractionModel, ExtractionRequest};
use crate::prompts;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Extract invoice data from a file on disk.
///
/// This is the primary entry point for the library. The declared media type
/// is inferred from the file extension; callers that already hold the bytes
/// and a declared type should use [`extract_source`].
///
/// # Errors
/// Every failure mode of the pipeline surfaces here as an [`ExtractError`];
/// see [`ExtractError::classification`] for the terminal classification and
/// [`ExtractError::user_message`] for the fixed user-facing text.
pub async fn extract(
    path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    let path = path.as_ref();

    let media_type = gate::media_type_for_path(path).ok_or_else(|| {
        ExtractError::UnsupportedMediaType {
            media_type: format!("unknown ({})", path.display()),
        }
    })?;

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ExtractError::FileRead {
            detail: format!("{}: {e}", path.display()),
        })?;

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());

    extract_source(gate::SourceFile::new(bytes, media_type, filename), config).await
}

/// Extract invoice data from an in-memory source file.
///
/// The source is consumed: its bytes are dropped once the transport payload
/// has been built.
pub async fn extract_source(
    source: gate::SourceFile,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    let total_start = Instant::now();
    info!(
        "Starting extraction: {} ({}, {} bytes)",
        source.filename,
        source.media_type,
        source.bytes.len()
    );

    // ── Step 1: Gate ─────────────────────────────────────────────────────
    let kind = gate::admit(&source)?;

    // ── Step 2: Resolve provider (credential precondition) ───────────────
    let provider = resolve_provider(config, std::env::var("ANTHROPIC_API_KEY").ok())?;

    // ── Step 3: Encode ───────────────────────────────────────────────────
    let encode_start = Instant::now();
    let payload = encode::encode(source, kind)?;
    let encode_duration_ms = encode_start.elapsed().as_millis() as u64;

    // ── Step 4: One model call ───────────────────────────────────────────
    let descriptor = config.variant.descriptor();
    let request = ExtractionRequest {
        instruction: prompts::extraction_instruction(&config.today()),
        payload,
        schema: descriptor.json_schema(),
        tool_name: descriptor.tool_name().to_string(),
        tool_description: descriptor.tool_description().to_string(),
    };

    let model_start = Instant::now();
    let reply = provider.extract(&request).await?;
    let model_duration_ms = model_start.elapsed().as_millis() as u64;
    debug!(
        "Model replied in {}ms ({} in / {} out tokens)",
        model_duration_ms, reply.input_tokens, reply.output_tokens
    );

    // ── Step 5: Normalise and validate ───────────────────────────────────
    let flat = normalize::normalize(reply.value, descriptor);
    let invoice = validate::validate(&flat, descriptor)?;

    let stats = ExtractionStats {
        input_tokens: reply.input_tokens,
        output_tokens: reply.output_tokens,
        encode_duration_ms,
        model_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };
    info!(
        "Extraction complete: {} line item(s), {}ms total",
        invoice.line_items.len(),
        stats.total_duration_ms
    );

    Ok(ExtractionOutput { invoice, stats })
}

/// Synchronous wrapper around [`extract`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_sync(
    path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ExtractError::Internal(format!("failed to create tokio runtime: {e}")))?
        .block_on(extract(path, config))
}

/// Resolve the model provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`) — used as-is; this is how
///    tests inject a mock and how callers add middleware.
/// 2. **Config key** (`config.api_key`) — an [`AnthropicExtractor`] is built
///    with the config's model/limits.
/// 3. **Environment key** (`ANTHROPIC_API_KEY`) — same construction.
///
/// No key anywhere is a precondition failure, reported before any network
/// attempt.
fn resolve_provider(
    config: &ExtractionConfig,
    env_key: Option<String>,
) -> Result<Arc<dyn ExtractionModel>, ExtractError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    let api_key = config
        .api_key
        .clone()
        .or(env_key)
        .filter(|k| !k.trim().is_empty())
        .ok_or(ExtractError::MissingApiKey)?;

    let mut provider = AnthropicExtractor::with_timeout(
        api_key,
        Duration::from_secs(config.api_timeout_secs),
    )?
    .with_max_tokens(config.max_tokens)
    .with_temperature(config.temperature);
    if let Some(ref model) = config.model {
        provider = provider.with_model(model);
    }
    Ok(Arc::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ModelReply;
    use async_trait::async_trait;

    #[derive(Debug)]
    struct NeverCalled;

    #[async_trait]
    impl ExtractionModel for NeverCalled {
        async fn extract(
            &self,
            _request: &ExtractionRequest,
        ) -> Result<ModelReply, ExtractError> {
            panic!("provider must not be reached");
        }
    }

    #[test]
    fn prebuilt_provider_wins() {
        let config = ExtractionConfig::builder()
            .provider(Arc::new(NeverCalled))
            .api_key("ignored")
            .build()
            .unwrap();
        assert!(resolve_provider(&config, None).is_ok());
    }

    #[test]
    fn config_key_beats_environment_key() {
        let config = ExtractionConfig::builder().api_key("sk-config").build().unwrap();
        assert!(resolve_provider(&config, Some("sk-env".into())).is_ok());
    }

    #[test]
    fn no_key_anywhere_is_a_precondition_failure() {
        let config = ExtractionConfig::default();
        let err = resolve_provider(&config, None).unwrap_err();
        assert!(matches!(err, ExtractError::MissingApiKey));

        // An empty environment value counts as absent.
        let err = resolve_provider(&config, Some("  ".into())).unwrap_err();
        assert!(matches!(err, ExtractError::MissingApiKey));
    }

    #[tokio::test]
    async fn unknown_extension_is_rejected_without_reading() {
        let config = ExtractionConfig::builder()
            .provider(Arc::new(NeverCalled))
            .build()
            .unwrap();
        // The path does not exist; the extension check fires first.
        let err = extract("/definitely/not/here.zip", &config).await.unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedMediaType { .. }), "{err}");
    }

    #[tokio::test]
    async fn missing_file_is_a_read_failure() {
        let config = ExtractionConfig::builder()
            .provider(Arc::new(NeverCalled))
            .build()
            .unwrap();
        let err = extract("/definitely/not/here.pdf", &config).await.unwrap_err();
        assert!(matches!(err, ExtractError::FileRead { .. }), "{err}");
        assert_eq!(err.user_message(), "Failed to read the file.");
    }
}
