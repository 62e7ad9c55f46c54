//! # receipt2json
//!
//! Extract structured JSON from receipt photos using Vision Language Models.
//!
//! ## Why this crate?
//!
//! Classical OCR on crumpled thermal paper produces token soup — line items,
//! quantities, and discounts come out misaligned and unlabelled. Instead this
//! crate downsizes the photo just enough to stay legible, hands it to a VLM
//! with a schema-bearing prompt, and tolerantly recovers the JSON document
//! from the reply.
//!
//! ## Pipeline Overview
//!
//! ```text
//! photo
//!  │
//!  ├─ 1. Normalize  decode + cap width at 1024 px (Lanczos, never upscale)
//!  ├─ 2. Encode     RGB8 → PNG → base64, independent 2048 px cap
//!  ├─ 3. Prompt     instruction template + worked example + output schema
//!  ├─ 4. Extract    one chat-completions call, JSON-object reply mode
//!  └─ 5. Parse      fence-tolerant JSON decode, failure as a value
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use receipt2json::{extract, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // API key read from OPENAI_API_KEY
//!     let config = ExtractionConfig::default();
//!     let output = extract("receipt.jpg", &config).await?;
//!     println!("{}", serde_json::to_string_pretty(&output.result.to_value())?);
//!     eprintln!("tokens: {} in / {} out",
//!         output.stats.prompt_tokens,
//!         output.stats.completion_tokens);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `receipt2json` and `enrich-check` binaries (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! receipt2json = { version = "0.3", default-features = false }
//! ```
//!
//! ## Error model
//!
//! Unreadable images, a missing API key, and failed remote calls are `Err`
//! ([`ReceiptError`]); a model reply that is not valid JSON is `Ok` with
//! [`ExtractionResult::Failure`] — an expected outcome, preserved with the
//! raw reply text for debugging.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder, DEFAULT_MODEL};
pub use error::ReceiptError;
pub use extract::{extract, extract_sync, extract_to_file};
pub use output::{ExtractionOutput, ExtractionResult, ExtractionStats, ParseFailure};
