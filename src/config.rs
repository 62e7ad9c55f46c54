//! Configuration types for receipt extraction.
//!
//! All extraction behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs across threads and to diff two runs to
//! understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! A ten-field constructor is unreadable and breaks on every new field. The
//! builder lets callers set only what they care about and rely on documented
//! defaults for the rest.

use crate::error::ReceiptError;
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;

/// Model used when neither the config nor the CLI names one.
pub const DEFAULT_MODEL: &str = "gpt-5-nano-2025-08-07";

/// Configuration for one receipt extraction run.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use receipt2json::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .max_width(800)
///     .model("gpt-4o-mini")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Maximum width of the normalized image in pixels. Default: 1024.
    ///
    /// Receipts are tall and narrow; width is the dimension that decides
    /// whether small print stays legible. Images at or under this width pass
    /// through untouched — normalization never upscales.
    pub max_width: u32,

    /// Maximum dimension (width or height) of the encoded payload. Default: 2048.
    ///
    /// A second cap, independent of `max_width`, sized to the remote model's
    /// input limits rather than to legibility. It matters when normalization
    /// is skipped: the encoder then sees the raw image and this is the only
    /// thing standing between a 48 MP phone photo and the request body.
    pub max_dimension: u32,

    /// Model identifier, e.g. "gpt-4o-mini". If None, uses [`DEFAULT_MODEL`].
    pub model: Option<String>,

    /// API key. If None, read from `OPENAI_API_KEY` at client construction.
    pub api_key: Option<String>,

    /// Alternate API endpoint. If None, read from `OPENAI_BASE_URL`, falling
    /// back to the public OpenAI endpoint.
    pub base_url: Option<String>,

    /// Desired shape of the extracted data, rendered into the prompt.
    /// If None, uses [`crate::prompts::default_schema`]. Guidance only —
    /// the reply is never validated against it.
    pub schema: Option<Value>,

    /// Persist the normalized image to this path. Convenience write; failure
    /// of downstream stages does not depend on it.
    pub save_preprocessed: Option<PathBuf>,

    /// Bypass normalization and hand the raw decoded image to the encoder.
    /// Default: false.
    pub skip_normalization: bool,

    /// Sampling temperature for the model call. Default: 1.0.
    pub temperature: f32,

    /// Reasoning effort requested from the model. Default: "minimal".
    ///
    /// Receipt transcription needs vision, not chain-of-thought; minimal
    /// effort keeps latency and reply variance down.
    pub reasoning_effort: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_width: 1024,
            max_dimension: 2048,
            model: None,
            api_key: None,
            base_url: None,
            schema: None,
            save_preprocessed: None,
            skip_normalization: false,
            temperature: 1.0,
            reasoning_effort: "minimal".to_string(),
        }
    }
}

// Manual Debug: the API key must never end up in logs.
impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("max_width", &self.max_width)
            .field("max_dimension", &self.max_dimension)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("schema", &self.schema.as_ref().map(|_| "<custom>"))
            .field("save_preprocessed", &self.save_preprocessed)
            .field("skip_normalization", &self.skip_normalization)
            .field("temperature", &self.temperature)
            .field("reasoning_effort", &self.reasoning_effort)
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

    /// The model identifier to use, applying the default.
    pub fn model_id(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn max_width(mut self, px: u32) -> Self {
        self.config.max_width = px;
        self
    }

    pub fn max_dimension(mut self, px: u32) -> Self {
        self.config.max_dimension = px;
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

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    pub fn schema(mut self, schema: Value) -> Self {
        self.config.schema = Some(schema);
        self
    }

    pub fn save_preprocessed(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.save_preprocessed = Some(path.into());
        self
    }

    pub fn skip_normalization(mut self, v: bool) -> Self {
        self.config.skip_normalization = v;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn reasoning_effort(mut self, effort: impl Into<String>) -> Self {
        self.config.reasoning_effort = effort.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ReceiptError> {
        let c = &self.config;
        if c.max_width == 0 {
            return Err(ReceiptError::InvalidConfig(
                "max_width must be ≥ 1".into(),
            ));
        }
        if c.max_dimension == 0 {
            return Err(ReceiptError::InvalidConfig(
                "max_dimension must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}
