//! Error types for the receipt2json library.
//!
//! One fatal enum, one recoverable value:
//!
//! * [`ReceiptError`] — **Fatal**: the extraction cannot proceed at all
//!   (unreadable image, no API key, the remote call itself failed). Returned
//!   as `Err(ReceiptError)` from the top-level `extract*` functions.
//!
//! * A model reply that is not valid JSON is **not** an error here. It is an
//!   expected outcome of talking to an LLM and is represented as
//!   [`crate::output::ExtractionResult::Failure`], a normal return value that
//!   keeps the raw reply text for debugging.
//!
//! The separation means callers never need a catch-all around the parse
//! stage: `Err` always means the pipeline stopped, `Ok` always carries a
//! result — possibly a parse failure, but a result.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the receipt2json library.
///
/// Parse failures of the model reply use
/// [`crate::output::ExtractionResult::Failure`] and are returned as values
/// rather than propagated here.
#[derive(Debug, Error)]
pub enum ReceiptError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input image was not found at the given path.
    #[error("Image file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a decodable raster image.
    #[error("Could not decode image '{path}': {detail}")]
    DecodeFailed { path: PathBuf, detail: String },

    /// Re-encoding the in-memory image for the API payload failed.
    #[error("Image encoding failed: {0}")]
    EncodeFailed(String),

    // ── Auth errors ───────────────────────────────────────────────────────
    /// No API key anywhere: not in config, not in the environment.
    #[error(
        "No API key provided.\nSet the OPENAI_API_KEY environment variable or pass --api-key."
    )]
    MissingApiKey,

    // ── Transport errors ──────────────────────────────────────────────────
    /// The request never completed at the network layer.
    #[error("Request to the vision model failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-success HTTP status.
    #[error("Vision model API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// The API answered 2xx but the response body had no reply content.
    #[error("Vision model response contained no message content")]
    EmptyReply,

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not write the preprocessed image or the JSON result file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}
