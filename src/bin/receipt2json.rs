//! CLI binary for receipt2json.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig` and prints the resulting JSON.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use receipt2json::{extract, extract_to_file, ExtractionConfig, DEFAULT_MODEL};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Basic extraction (stdout)
  receipt2json receipt.jpg

  # Keep the preprocessed image for inspection
  receipt2json receipt.jpg --save-preprocessed processed.png

  # Different model, no preprocessing
  receipt2json receipt.jpg --model gpt-4o-mini --skip-normalization

  # Custom output schema
  receipt2json receipt.jpg --schema-path custom_schema.json

  # Write the result to a file
  receipt2json receipt.jpg -o result.json

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY    API key (or use --api-key)
  OPENAI_BASE_URL   Alternate API endpoint (or use --base-url)
  OPENAI_MODEL      Default model ID (or use --model)

SETUP:
  1. Set API key:   export OPENAI_API_KEY=sk-...
  2. Extract:       receipt2json receipt.jpg -o result.json
"#;

/// Extract structured JSON from receipt photos using a vision LLM.
#[derive(Parser, Debug)]
#[command(
    name = "receipt2json",
    version,
    about = "Extract structured JSON from receipt photos using a vision LLM",
    long_about = "Extract structured data (merchant, line items, discounts, totals) from a \
photo of a paper receipt. The image is downscaled for legibility, sent to a vision-capable \
model in JSON-object reply mode, and the reply is tolerantly parsed.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Path to the receipt image file (PNG or JPEG).
    image_path: PathBuf,

    /// Write the JSON result to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to a custom JSON schema file describing the desired output shape.
    #[arg(long)]
    schema_path: Option<PathBuf>,

    /// Model ID to use.
    #[arg(long, env = "OPENAI_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// API key (or set OPENAI_API_KEY).
    #[arg(long)]
    api_key: Option<String>,

    /// Alternate API endpoint (or set OPENAI_BASE_URL).
    #[arg(long)]
    base_url: Option<String>,

    /// Save the preprocessed image to this path.
    #[arg(long)]
    save_preprocessed: Option<PathBuf>,

    /// Skip the normalization step and send the raw image.
    #[arg(long)]
    skip_normalization: bool,

    /// Maximum width of the normalized image in pixels.
    #[arg(long, default_value_t = 1024)]
    max_width: u32,

    /// Maximum dimension of the encoded payload in pixels.
    #[arg(long, default_value_t = 2048)]
    max_dimension: u32,

    /// Disable the progress spinner.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except the result and errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs while the spinner is active; the
    // spinner provides the feedback that matters.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli)?;

    // ── Run extraction ───────────────────────────────────────────────────
    let spinner = if show_progress {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_message(format!("Extracting with {}…", cli.model));
        bar.enable_steady_tick(Duration::from_millis(80));
        Some(bar)
    } else {
        None
    };

    let outcome = if let Some(ref output_path) = cli.output {
        extract_to_file(&cli.image_path, output_path, &config)
            .await
            .map(|stats| (None, stats))
    } else {
        extract(&cli.image_path, &config)
            .await
            .map(|out| (Some(out.result), out.stats))
    };

    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }

    let (result, stats) = outcome.context("Extraction failed")?;

    // ── Print result ─────────────────────────────────────────────────────
    match (result, &cli.output) {
        (Some(result), _) => {
            let json = serde_json::to_string_pretty(&result.to_value())
                .context("Failed to serialise result")?;

            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(json.as_bytes())
                .context("Failed to write to stdout")?;
            handle.write_all(b"\n").ok();

            if !cli.quiet && result.is_failure() {
                eprintln!(
                    "{} model reply was not valid JSON — raw text preserved in raw_response",
                    yellow("⚠")
                );
            }
        }
        (None, Some(output_path)) => {
            if !cli.quiet {
                eprintln!(
                    "{} Results saved to {}",
                    green("✔"),
                    bold(&output_path.display().to_string())
                );
            }
        }
        (None, None) => unreachable!("result is present whenever no output file was given"),
    }

    if !cli.quiet {
        eprintln!(
            "   {} tokens in  /  {} tokens out  —  {}ms total",
            dim(&stats.prompt_tokens.to_string()),
            dim(&stats.completion_tokens.to_string()),
            stats.total_duration_ms,
        );
    }

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(cli: &Cli) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .max_width(cli.max_width)
        .max_dimension(cli.max_dimension)
        .model(cli.model.as_str())
        .skip_normalization(cli.skip_normalization);

    if let Some(ref path) = cli.schema_path {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Schema file not found: {}", path.display()))?;
        let schema = serde_json::from_str(&raw)
            .with_context(|| format!("Schema file is not valid JSON: {}", path.display()))?;
        builder = builder.schema(schema);
    }
    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key.as_str());
    }
    if let Some(ref url) = cli.base_url {
        builder = builder.base_url(url.as_str());
    }
    if let Some(ref path) = cli.save_preprocessed {
        builder = builder.save_preprocessed(path);
    }

    builder.build().context("Invalid configuration")
}
