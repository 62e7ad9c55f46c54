//! Tolerant recovery of a JSON document from the model's text reply.
//!
//! ## Why tolerate fences at all?
//!
//! Even with `response_format: json_object` requested, models occasionally
//! wrap the document in a Markdown code fence — the prompt itself shows the
//! worked example inside one. Stripping a single leading and trailing fence
//! marker before decoding recovers those replies without touching the
//! payload.
//!
//! ## Why never error?
//!
//! A reply that fails to decode is still the most useful artefact the run
//! produced: it is what the model actually said. Returning a typed failure
//! value with the raw text attached lets callers log, save, or inspect it;
//! raising would throw that text away.
//!
//! Deliberately permissive beyond that: any valid JSON document is accepted
//! as-is, with no validation against the requested schema.

use crate::output::{ExtractionResult, ParseFailure};
use serde_json::Value;
use tracing::debug;

/// Parse the model's raw reply into an [`ExtractionResult`].
///
/// Trims whitespace, strips one leading ```` ```json ```` or bare ```` ``` ````
/// marker and one trailing ```` ``` ```` marker (each independently), then
/// decodes. Decode failure is returned as a value, never as an error.
pub fn parse_reply(raw: &str) -> ExtractionResult {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    let text = text.trim();

    match serde_json::from_str::<Value>(text) {
        Ok(value) => ExtractionResult::Parsed(value),
        Err(e) => {
            debug!("Reply did not decode as JSON: {e}");
            ExtractionResult::Failure(ParseFailure {
                error: format!("Failed to parse JSON response: {e}"),
                raw_response: text.to_string(),
            })
        }
    }
}
