//! Anthropic Messages API provider.
//!
//! Structured output is obtained by declaring a single tool whose
//! `input_schema` is the extraction schema and forcing the model to call it
//! (`tool_choice: {type: "tool"}`). The reply's `tool_use` block then carries
//! the populated fields as JSON — no free-text parsing.
//!
//! Images travel as base64 `image` content blocks; PDFs as base64 `document`
//! blocks; plain text as text-source `document` blocks. The original
//! filename rides along as the document title.

use crate::error::ExtractError;
use crate::pipeline::encode::{EncodedPayload, FileData};
use crate::provider::{ExtractionModel, ExtractionRequest, ModelReply};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

const API_BASE: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_MAX_TOKENS: u32 = 1024;
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// [`ExtractionModel`] implementation backed by the Anthropic Messages API.
#[derive(Clone)]
pub struct AnthropicExtractor {
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: Option<f32>,
    client: reqwest::Client,
}

impl AnthropicExtractor {
    /// Create a provider with the default model and a 60 s transport timeout.
    ///
    /// The timeout lives on the HTTP client; the pipeline itself imposes
    /// none.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ExtractError> {
        Self::with_timeout(api_key, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a provider with an explicit transport timeout.
    pub fn with_timeout(
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ExtractError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExtractError::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
            client,
        })
    }

    /// Override the model identifier.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the completion token ceiling.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the sampling temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature.clamp(0.0, 1.0));
        self
    }

    fn messages_url(&self) -> String {
        format!("{API_BASE}/messages")
    }
}

impl std::fmt::Debug for AnthropicExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicExtractor")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}

// ── Request payload ──────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<MessagePayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    tools: Vec<ToolPayload<'a>>,
    tool_choice: ToolChoicePayload<'a>,
}

#[derive(Debug, Serialize)]
struct MessagePayload {
    role: &'static str,
    content: Vec<ContentBlock>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    Image {
        source: MediaSource,
    },
    Document {
        source: MediaSource,
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum MediaSource {
    Base64 { media_type: String, data: String },
    Text { media_type: String, data: String },
}

#[derive(Debug, Serialize)]
struct ToolPayload<'a> {
    name: &'a str,
    description: &'a str,
    input_schema: &'a Value,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ToolChoicePayload<'a> {
    Tool { name: &'a str },
}

/// Build the single user turn: the document block first, instruction after.
fn content_blocks(request: &ExtractionRequest) -> Vec<ContentBlock> {
    let document = match &request.payload {
        EncodedPayload::Image { media_type, data } => ContentBlock::Image {
            source: MediaSource::Base64 {
                media_type: media_type.clone(),
                data: data.clone(),
            },
        },
        EncodedPayload::File {
            media_type,
            filename,
            data,
        } => {
            let source = match data {
                FileData::Base64(b64) => MediaSource::Base64 {
                    media_type: media_type.clone(),
                    data: b64.clone(),
                },
                FileData::Text(text) => MediaSource::Text {
                    media_type: media_type.clone(),
                    data: text.clone(),
                },
            };
            ContentBlock::Document {
                source,
                title: Some(filename.clone()),
            }
        }
    };

    vec![
        document,
        ContentBlock::Text {
            text: request.instruction.clone(),
        },
    ]
}

// ── Response payload ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseBlock>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text {
        #[allow(dead_code)]
        text: String,
    },
    ToolUse {
        #[allow(dead_code)]
        name: String,
        input: Value,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Pull the forced tool call out of a parsed response.
///
/// A response with no `tool_use` block did not populate the schema — that is
/// a shape failure, not a transport failure.
fn reply_from(response: MessagesResponse) -> Result<ModelReply, ExtractError> {
    let (input_tokens, output_tokens) = response
        .usage
        .map(|u| (u.input_tokens, u.output_tokens))
        .unwrap_or_default();

    let value = response
        .content
        .into_iter()
        .find_map(|block| match block {
            ResponseBlock::ToolUse { input, .. } => Some(input),
            _ => None,
        })
        .ok_or(ExtractError::UnableToAnalyze)?;

    Ok(ModelReply {
        value,
        input_tokens,
        output_tokens,
    })
}

/// Prefer the structured API error message over the raw body when present.
fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) => format!("{status}: {body}"),
    }
}

#[async_trait]
impl ExtractionModel for AnthropicExtractor {
    async fn extract(&self, request: &ExtractionRequest) -> Result<ModelReply, ExtractError> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: vec![MessagePayload {
                role: "user",
                content: content_blocks(request),
            }],
            temperature: self.temperature,
            tools: vec![ToolPayload {
                name: &request.tool_name,
                description: &request.tool_description,
                input_schema: &request.schema,
            }],
            tool_choice: ToolChoicePayload::Tool {
                name: &request.tool_name,
            },
        };

        debug!("Submitting extraction request to model {}", self.model);

        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ExtractError::Api {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Messages API returned {status}");
            return Err(ExtractError::Api {
                message: error_message(status, &body),
            });
        }

        let parsed: MessagesResponse = response.json().await.map_err(|e| ExtractError::Api {
            message: format!("malformed response body: {e}"),
        })?;

        let reply = reply_from(parsed)?;
        debug!(
            "Model call used {} input / {} output tokens",
            reply.input_tokens, reply.output_tokens
        );
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request_with(payload: EncodedPayload) -> ExtractionRequest {
        ExtractionRequest {
            instruction: "extract".into(),
            payload,
            schema: json!({"type": "object"}),
            tool_name: "record_invoice".into(),
            tool_description: "record".into(),
        }
    }

    #[test]
    fn image_payload_serialises_as_image_block() {
        let request = request_with(EncodedPayload::Image {
            media_type: "image/png".into(),
            data: "AAAA".into(),
        });
        let blocks = content_blocks(&request);
        let json = serde_json::to_value(&blocks).unwrap();
        assert_eq!(json[0]["type"], "image");
        assert_eq!(json[0]["source"]["type"], "base64");
        assert_eq!(json[0]["source"]["media_type"], "image/png");
        assert_eq!(json[1]["type"], "text");
    }

    #[test]
    fn pdf_payload_serialises_as_document_with_title() {
        let request = request_with(EncodedPayload::File {
            media_type: "application/pdf".into(),
            filename: "march.pdf".into(),
            data: FileData::Base64("JVBERg==".into()),
        });
        let json = serde_json::to_value(content_blocks(&request)).unwrap();
        assert_eq!(json[0]["type"], "document");
        assert_eq!(json[0]["source"]["type"], "base64");
        assert_eq!(json[0]["title"], "march.pdf");
    }

    #[test]
    fn text_payload_uses_a_text_source() {
        let request = request_with(EncodedPayload::File {
            media_type: "text/plain".into(),
            filename: "invoice.txt".into(),
            data: FileData::Text("Total: 10.50".into()),
        });
        let json = serde_json::to_value(content_blocks(&request)).unwrap();
        assert_eq!(json[0]["source"]["type"], "text");
        assert_eq!(json[0]["source"]["data"], "Total: 10.50");
    }

    #[test]
    fn tool_choice_serialises_to_named_tool() {
        let choice = ToolChoicePayload::Tool { name: "record_invoice" };
        let json = serde_json::to_value(&choice).unwrap();
        assert_eq!(json["type"], "tool");
        assert_eq!(json["name"], "record_invoice");
    }

    #[test]
    fn reply_is_taken_from_the_tool_use_block() {
        let raw = json!({
            "content": [
                {"type": "text", "text": "Recording the data now."},
                {"type": "tool_use", "id": "tu_1", "name": "record_invoice",
                 "input": {"description": "Consulting"}},
            ],
            "usage": {"input_tokens": 900, "output_tokens": 120},
        });
        let parsed: MessagesResponse = serde_json::from_value(raw).unwrap();
        let reply = reply_from(parsed).unwrap();
        assert_eq!(reply.value["description"], "Consulting");
        assert_eq!(reply.input_tokens, 900);
        assert_eq!(reply.output_tokens, 120);
    }

    #[test]
    fn missing_tool_use_is_a_shape_failure() {
        let raw = json!({"content": [{"type": "text", "text": "I cannot read this."}]});
        let parsed: MessagesResponse = serde_json::from_value(raw).unwrap();
        let err = reply_from(parsed).unwrap_err();
        assert!(matches!(err, ExtractError::UnableToAnalyze));
    }

    #[test]
    fn api_error_body_is_unwrapped() {
        let body = r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#;
        let msg = error_message(reqwest::StatusCode::INTERNAL_SERVER_ERROR, body);
        assert_eq!(msg, "Overloaded");

        let msg = error_message(reqwest::StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert!(msg.contains("502"));
    }
}
