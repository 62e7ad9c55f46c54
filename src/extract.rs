//! Top-level extraction entry points.
//!
//! One receipt in, one result out. The pipeline is strictly sequential —
//! normalize, encode, call, parse — with a single remote round trip and no
//! shared state between runs, so concurrent callers are safe as long as each
//! run owns its own config.

use crate::config::ExtractionConfig;
use crate::error::ReceiptError;
use crate::output::{ExtractionOutput, ExtractionStats};
use crate::pipeline::{encode, llm, normalize, parse};
use crate::prompts;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Extract structured data from a receipt photo.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `image_path` — Local path to the receipt photo (PNG or JPEG)
/// * `config` — Extraction configuration
///
/// # Returns
/// `Ok(ExtractionOutput)` whenever the model replied — including when the
/// reply was not valid JSON (check `output.result.is_failure()`).
///
/// # Errors
/// Returns `Err(ReceiptError)` only for fatal errors: unreadable or
/// undecodable image, no resolvable API key, or a failed remote call. Each
/// surfaces from the stage that detected it, untranslated.
pub async fn extract(
    image_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ReceiptError> {
    let total_start = Instant::now();
    let image_path = image_path.as_ref();
    info!("Starting extraction: {}", image_path.display());

    // ── Step 1: Resolve the client ───────────────────────────────────────
    // Credential resolution happens before any image work so a missing key
    // fails fast, long before a network call could be attempted.
    let client = llm::ExtractionClient::from_config(config)?;

    // ── Step 2: Normalize (or load raw) ──────────────────────────────────
    let preprocess_start = Instant::now();
    let img = if config.skip_normalization {
        info!("Skipping normalization");
        normalize::load(image_path).await?
    } else {
        info!("Preprocessing receipt image (max width {})", config.max_width);
        normalize::normalize(
            image_path,
            config.max_width,
            config.save_preprocessed.as_deref(),
        )
        .await?
    };

    // ── Step 3: Encode the payload ───────────────────────────────────────
    info!("Encoding image");
    let max_dimension = config.max_dimension;
    let image_b64 =
        tokio::task::spawn_blocking(move || encode::encode_image(&img, max_dimension))
            .await
            .map_err(|e| ReceiptError::Internal(format!("Encode task panicked: {e}")))??;
    let preprocess_duration_ms = preprocess_start.elapsed().as_millis() as u64;

    // ── Step 4: Build instructions ───────────────────────────────────────
    let schema = config
        .schema
        .clone()
        .unwrap_or_else(prompts::default_schema);
    let instructions = prompts::build_instructions(&schema);
    debug!("Rendered {} bytes of instructions", instructions.len());

    // ── Step 5: Call the model ───────────────────────────────────────────
    let llm_start = Instant::now();
    let reply = client.extract(&instructions, &image_b64, config).await?;
    let llm_duration_ms = llm_start.elapsed().as_millis() as u64;

    // ── Step 6: Parse the reply ──────────────────────────────────────────
    // The one failure mode that becomes a value instead of an error.
    let result = parse::parse_reply(&reply.content);
    if result.is_failure() {
        info!("Model reply was not valid JSON; returning failure record");
    }

    let stats = ExtractionStats {
        prompt_tokens: reply.prompt_tokens,
        completion_tokens: reply.completion_tokens,
        preprocess_duration_ms,
        llm_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Extraction complete: {} completion tokens, {}ms total",
        stats.completion_tokens, stats.total_duration_ms
    );

    Ok(ExtractionOutput { result, stats })
}

/// Extract and write the pretty-printed JSON result to a file.
///
/// Uses atomic write (temp file + rename) to prevent partial files. The
/// result is written whether or not the reply parsed — a failure record is
/// still a result.
pub async fn extract_to_file(
    image_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionStats, ReceiptError> {
    let output = extract(image_path, config).await?;
    let path = output_path.as_ref();

    let json = serde_json::to_string_pretty(&output.result.to_value())
        .map_err(|e| ReceiptError::Internal(format!("Result serialisation failed: {e}")))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ReceiptError::OutputWriteFailed {
                    path: path.to_path_buf(),
                    source: e,
                })?;
        }
    }

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, &json)
        .await
        .map_err(|e| ReceiptError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| ReceiptError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    Ok(output.stats)
}

/// Synchronous wrapper around [`extract`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_sync(
    image_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ReceiptError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ReceiptError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(extract(image_path, config))
}
