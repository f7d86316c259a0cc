//! Image encoding: embedded `DynamicImage` → JPEG bytes.
//!
//! Embedded PDF images arrive in every colour model pdfium understands
//! (RGBA, palette, grey, CMYK-converted). JPEG has no alpha channel, so each
//! image is flattened to RGB first. JPEG keeps photos and scans small, which
//! matters because every image travels base64-encoded inside a JSON body.

use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use tracing::debug;

/// Encode an extracted image as RGB JPEG.
pub fn encode_jpeg(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut buf = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)?;
    debug!(
        "Encoded {}x{} image → {} bytes JPEG",
        rgb.width(),
        rgb.height(),
        buf.len()
    );
    Ok(buf)
}
