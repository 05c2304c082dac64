//! Configuration for document extraction.
//!
//! All pipeline behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. Keeping every knob in one struct
//! makes configs trivial to share, log, and diff between runs.
//!
//! [`Settings`] is the separate process-startup surface: the two
//! environment-sourced credentials the hosting application requires before
//! serving anything at all. Library callers normally never touch it — the
//! per-request credential travels in the config.

use crate::error::ExtractError;
use crate::provider::ExtractionModel;
use crate::schema::SchemaVariant;
use std::fmt;
use std::sync::Arc;

/// Configuration for one extraction pipeline instance.
///
/// Built via [`ExtractionConfig::builder()`] or [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use doc2invoice::{ExtractionConfig, SchemaVariant};
///
/// let config = ExtractionConfig::builder()
///     .variant(SchemaVariant::MultiItem)
///     .model("claude-sonnet-4-20250514")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Which extraction schema to declare. Default: single-item.
    pub variant: SchemaVariant,

    /// Model identifier. If None, the provider default is used.
    pub model: Option<String>,

    /// Model API key. If None, `ANTHROPIC_API_KEY` is read at invocation
    /// time; a missing key is a precondition failure reported before any
    /// network attempt.
    pub api_key: Option<String>,

    /// Pre-constructed provider. Takes precedence over `model`/`api_key`.
    pub provider: Option<Arc<dyn ExtractionModel>>,

    /// Sampling temperature. Default: 0.1.
    ///
    /// Low temperature keeps the model faithful to what is printed on the
    /// document — exactly what transcription-style extraction wants.
    pub temperature: f32,

    /// Completion token ceiling for the model call. Default: 1024.
    ///
    /// The structured reply is small; 1024 covers even long multi-item
    /// invoices with room to spare.
    pub max_tokens: u32,

    /// Transport timeout in seconds for the model call. Default: 60.
    ///
    /// Enforced by the HTTP client, not by the pipeline — the pipeline
    /// itself never cancels an issued request.
    pub api_timeout_secs: u64,

    /// Fixed current date (`YYYY-MM-DD`) used as the invoice-date fallback
    /// in the instruction text. If None, today's local date is used.
    /// Pin this in tests for deterministic prompts.
    pub current_date: Option<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            variant: SchemaVariant::default(),
            model: None,
            api_key: None,
            provider: None,
            temperature: 0.1,
            max_tokens: 1024,
            api_timeout_secs: 60,
            current_date: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("variant", &self.variant)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("provider", &self.provider.as_ref().map(|_| "<dyn ExtractionModel>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("current_date", &self.current_date)
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// The `YYYY-MM-DD` date substituted into the instruction text.
    pub fn today(&self) -> String {
        self.current_date
            .clone()
            .unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d").to_string())
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn variant(mut self, variant: SchemaVariant) -> Self {
        self.config.variant = variant;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn ExtractionModel>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 1.0);
        self
    }

    pub fn max_tokens(mut self, n: u32) -> Self {
        self.config.max_tokens = n.max(1);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs.max(1);
        self
    }

    pub fn current_date(mut self, date: impl Into<String>) -> Self {
        self.config.current_date = Some(date.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        let c = &self.config;
        if let Some(ref date) = c.current_date {
            if chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
                return Err(ExtractError::InvalidConfig(format!(
                    "current_date must be YYYY-MM-DD, got '{date}'"
                )));
            }
        }
        Ok(self.config)
    }
}

// ── Startup settings ─────────────────────────────────────────────────────

/// Environment-sourced credentials the hosting process requires at startup.
///
/// Both must be present and non-empty; a missing one fails startup rather
/// than surfacing later as a mid-request error.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Model provider API key (`ANTHROPIC_API_KEY`).
    pub anthropic_api_key: String,
    /// Payment-provider publishable key (`STRIPE_PUBLISHABLE_KEY`), owned by
    /// the surrounding billing flow, validated here with everything else.
    pub stripe_publishable_key: String,
}

impl Settings {
    /// Load and validate settings from the process environment.
    pub fn from_env() -> Result<Self, ExtractError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ExtractError> {
        let require = |name: &'static str| -> Result<String, ExtractError> {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ExtractError::MissingSetting { name })
        };
        Ok(Self {
            anthropic_api_key: require("ANTHROPIC_API_KEY")?,
            stripe_publishable_key: require("STRIPE_PUBLISHABLE_KEY")?,
        })
    }
}
