//! Image normalization: load a receipt photo and downscale it for legibility.
//!
//! ## Why spawn_blocking?
//!
//! Decoding a multi-megapixel JPEG and running a Lanczos resample are
//! CPU-bound. `tokio::task::spawn_blocking` moves the work onto the blocking
//! thread pool so the async worker threads are not stalled while pixels are
//! being pushed around.
//!
//! ## Why Lanczos?
//!
//! Receipts are small print on low-contrast thermal paper. Nearest-neighbour
//! or triangle filters smear that print into illegibility at 1024 px; Lanczos3
//! keeps glyph edges sharp enough for the vision model to read.

use crate::error::ReceiptError;
use image::{imageops::FilterType, DynamicImage};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Load a receipt image and downscale it to at most `max_width` pixels wide,
/// preserving aspect ratio. Images already at or under the cap pass through
/// unchanged — this never upscales.
///
/// `save_to` persists the normalized image as a convenience for inspection;
/// downstream stages never read it back.
pub async fn normalize(
    path: &Path,
    max_width: u32,
    save_to: Option<&Path>,
) -> Result<DynamicImage, ReceiptError> {
    let path = path.to_path_buf();
    let save_to = save_to.map(Path::to_path_buf);

    tokio::task::spawn_blocking(move || normalize_blocking(&path, max_width, save_to.as_deref()))
        .await
        .map_err(|e| ReceiptError::Internal(format!("Normalize task panicked: {e}")))?
}

/// Load a receipt image without touching it — the `skip_normalization` path.
/// The encoder's own dimension cap is then the only resize applied.
pub async fn load(path: &Path) -> Result<DynamicImage, ReceiptError> {
    let path = path.to_path_buf();

    tokio::task::spawn_blocking(move || decode_file(&path))
        .await
        .map_err(|e| ReceiptError::Internal(format!("Decode task panicked: {e}")))?
}

fn normalize_blocking(
    path: &Path,
    max_width: u32,
    save_to: Option<&Path>,
) -> Result<DynamicImage, ReceiptError> {
    let img = decode_file(path)?;
    let (w, h) = (img.width(), img.height());

    let img = if w > max_width {
        // new_height = round(h * max_width / w); resize_exact so the formula
        // is honoured to the pixel rather than left to the library's own
        // aspect-ratio arithmetic.
        let new_h = ((h as f64 * max_width as f64 / w as f64).round() as u32).max(1);
        debug!("Normalizing {w}x{h} → {max_width}x{new_h}");
        img.resize_exact(max_width, new_h, FilterType::Lanczos3)
    } else {
        debug!("Image {w}x{h} already within max_width={max_width}, passing through");
        img
    };

    if let Some(out) = save_to {
        save_image(&img, out)?;
        info!("Saved preprocessed image to {}", out.display());
    }

    Ok(img)
}

/// Decode the file at `path`, mapping filesystem and format failures to the
/// input-error variants.
fn decode_file(path: &Path) -> Result<DynamicImage, ReceiptError> {
    if !path.exists() {
        return Err(ReceiptError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    // Check read permission by attempting to open before handing the path to
    // the decoder, so the caller gets a filesystem error rather than a
    // generic decode failure.
    if let Err(e) = std::fs::File::open(path) {
        return Err(match e.kind() {
            std::io::ErrorKind::PermissionDenied => ReceiptError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => ReceiptError::FileNotFound {
                path: path.to_path_buf(),
            },
        });
    }

    let img = image::open(path).map_err(|e| ReceiptError::DecodeFailed {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;

    debug!("Decoded {} → {}x{} px", path.display(), img.width(), img.height());
    Ok(img)
}

fn save_image(img: &DynamicImage, out: &Path) -> Result<(), ReceiptError> {
    img.save(out).map_err(|e| {
        let source = match e {
            image::ImageError::IoError(io) => io,
            other => std::io::Error::other(other),
        };
        ReceiptError::OutputWriteFailed {
            path: PathBuf::from(out),
            source,
        }
    })
}
