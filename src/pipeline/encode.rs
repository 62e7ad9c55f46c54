//! Payload encoding: `DynamicImage` → base64 PNG for the vision API.
//!
//! Vision APIs accept images as base64 data-URIs embedded in the JSON request
//! body. PNG is chosen over JPEG because it is lossless — text crispness
//! matters far more than file size when the model has to read 6 pt thermal
//! print.
//!
//! ## Why convert to RGB8 first?
//!
//! Decoded receipts arrive in whatever layout the source format used — RGBA
//! with an alpha channel, greyscale, 16-bit. A channel-order mismatch corrupts
//! colours silently rather than failing loudly, so the conversion to one
//! defined layout must happen here, unconditionally. It also makes the PNG
//! bytes — and therefore the base64 — deterministic for a given input.

use crate::error::ReceiptError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{imageops::FilterType, DynamicImage, ImageFormat};
use std::io::Cursor;
use tracing::debug;

/// Encode an image as a base64 PNG string, capping the larger dimension at
/// `max_dimension`.
///
/// This cap is independent of the normalizer's `max_width`: it exists to keep
/// the request body within the remote model's input limits, not to tune
/// legibility. Never upscales. Pure — same image and cap always yield
/// byte-identical output.
pub fn encode_image(img: &DynamicImage, max_dimension: u32) -> Result<String, ReceiptError> {
    let rgb = img.to_rgb8();
    let (w, h) = rgb.dimensions();

    let rgb = if w.max(h) > max_dimension {
        let (new_w, new_h) = capped_dimensions(w, h, max_dimension);
        debug!("Capping payload {w}x{h} → {new_w}x{new_h}");
        image::imageops::resize(&rgb, new_w, new_h, FilterType::Lanczos3)
    } else {
        rgb
    };

    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(rgb)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| ReceiptError::EncodeFailed(e.to_string()))?;

    let b64 = STANDARD.encode(&buf);
    debug!("Encoded image → {} bytes base64", b64.len());
    Ok(b64)
}

/// Scale `(w, h)` so the larger dimension equals `max_dimension`, rounding
/// the other and keeping both at least 1 px.
fn capped_dimensions(w: u32, h: u32, max_dimension: u32) -> (u32, u32) {
    if w >= h {
        let new_h = ((h as f64 * max_dimension as f64 / w as f64).round() as u32).max(1);
        (max_dimension, new_h)
    } else {
        let new_w = ((w as f64 * max_dimension as f64 / h as f64).round() as u32).max(1);
        (new_w, max_dimension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    fn gradient(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        }))
    }

    fn decode(b64: &str) -> DynamicImage {
        let bytes = STANDARD.decode(b64).expect("valid base64");
        image::load_from_memory(&bytes).expect("valid PNG")
    }

    #[test]
    fn encoding_is_deterministic() {
        let img = gradient(300, 200);
        let a = encode_image(&img, 2048).unwrap();
        let b = encode_image(&img, 2048).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn round_trip_preserves_capped_dimensions() {
        let img = gradient(3000, 1500);
        let b64 = encode_image(&img, 2048).unwrap();
        let back = decode(&b64);
        assert_eq!((back.width(), back.height()), (2048, 1024));
    }

    #[test]
    fn under_cap_dimensions_are_unchanged() {
        let img = gradient(2000, 1000);
        let b64 = encode_image(&img, 2048).unwrap();
        let back = decode(&b64);
        assert_eq!((back.width(), back.height()), (2000, 1000));
    }

    #[test]
    fn tall_image_caps_height() {
        let img = gradient(1500, 3000);
        let b64 = encode_image(&img, 2048).unwrap();
        let back = decode(&b64);
        assert_eq!((back.width(), back.height()), (1024, 2048));
    }

    #[test]
    fn alpha_channel_is_stripped() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            10,
            10,
            Rgba([255, 0, 0, 128]),
        ));
        let b64 = encode_image(&img, 2048).unwrap();
        let back = decode(&b64);
        assert_eq!((back.width(), back.height()), (10, 10));
        assert_eq!(back.color(), image::ColorType::Rgb8);
    }

    #[test]
    fn capped_dimensions_round() {
        // 1000 * 2048 / 3000 = 682.67 → 683
        assert_eq!(capped_dimensions(3000, 1000, 2048), (2048, 683));
        assert_eq!(capped_dimensions(1000, 3000, 2048), (683, 2048));
    }
}
