//! Output types: the extraction result and its run statistics.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// What came back from one pipeline run.
///
/// Exactly one of two shapes: the model's reply parsed as a JSON document, or
/// a failure record carrying the decoder's complaint and the raw reply text.
/// Callers branch on the variant — a parse failure is a value, not an error,
/// so a run that reaches the model always returns `Ok`.
///
/// Serialized, `Parsed` is the document itself and `Failure` is
/// `{"error": ..., "raw_response": ...}`, matching what callers see on the
/// CLI and in saved result files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtractionResult {
    /// Reply was not valid JSON. Recoverable; the raw text is preserved for
    /// debugging.
    Failure(ParseFailure),
    /// Reply decoded as a JSON document. Returned unmodified — the shape the
    /// schema asked for is trusted, not enforced.
    Parsed(Value),
}

/// The typed failure record for an unparseable model reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseFailure {
    /// "Failed to parse JSON response: <decoder message>"
    pub error: String,
    /// The reply text after trimming and fence-stripping, verbatim.
    pub raw_response: String,
}

impl ExtractionResult {
    /// True when the reply could not be decoded.
    pub fn is_failure(&self) -> bool {
        matches!(self, ExtractionResult::Failure(_))
    }

    /// The parsed document, if there is one.
    pub fn as_parsed(&self) -> Option<&Value> {
        match self {
            ExtractionResult::Parsed(v) => Some(v),
            ExtractionResult::Failure(_) => None,
        }
    }

    /// Render either variant as a `serde_json::Value`, the shape callers
    /// print or save.
    pub fn to_value(&self) -> Value {
        match self {
            ExtractionResult::Parsed(v) => v.clone(),
            ExtractionResult::Failure(f) => json!({
                "error": f.error,
                "raw_response": f.raw_response,
            }),
        }
    }
}

/// Token and timing metrics for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Tokens the API billed for the prompt (instructions + image).
    pub prompt_tokens: u64,
    /// Tokens the API billed for the reply.
    pub completion_tokens: u64,
    /// Wall-clock spent decoding, resizing, and encoding the image.
    pub preprocess_duration_ms: u64,
    /// Wall-clock spent inside the remote call.
    pub llm_duration_ms: u64,
    /// Wall-clock for the whole run.
    pub total_duration_ms: u64,
}

/// Result plus stats — what the top-level `extract` functions return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutput {
    pub result: ExtractionResult,
    pub stats: ExtractionStats,
}
