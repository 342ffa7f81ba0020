//! Image encoding: `DynamicImage` → PNG bytes, and bytes → `data:` URIs.
//!
//! Crops are stored as PNG so chart lines and small print survive intact;
//! the HTML viewer embeds them (and the CSV downloads) as base64 data-URIs
//! so a single `index.html` is self-contained.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode an image as PNG.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    debug!(
        "Encoded {}x{} image → {} bytes PNG",
        img.width(),
        img.height(),
        buf.len()
    );
    Ok(buf)
}

/// Wrap raw bytes in a base64 `data:` URI with the given MIME type.
pub fn data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}
