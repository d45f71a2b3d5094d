//! Image encoding: `DynamicImage` → base64 PNG wrapped in [`EncodedImagePart`].
//!
//! Hosted vision APIs accept images as base64 payloads embedded in the JSON
//! request body. PNG is lossless, which keeps small resume fonts legible.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use tracing::debug;

/// MIME type of every image part this crate produces.
pub const PNG_MIME_TYPE: &str = "image/png";

/// The wire payload unit for one rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedImagePart {
    /// Always [`PNG_MIME_TYPE`].
    pub mime_type: String,
    /// Base64 (standard alphabet, padded) PNG bytes.
    pub data: String,
}

impl EncodedImagePart {
    /// Wrap already base64-encoded PNG data.
    pub fn png(data: impl Into<String>) -> Self {
        Self {
            mime_type: PNG_MIME_TYPE.to_string(),
            data: data.into(),
        }
    }

    /// Convert into the edgequake-llm attachment type.
    ///
    /// `detail: "high"` keeps fine print readable on OpenAI-style tiling.
    pub fn to_image_data(&self) -> ImageData {
        ImageData::new(self.data.clone(), self.mime_type.as_str()).with_detail("high")
    }
}

/// Encode a rasterised page as a base64 PNG ready for the hosted model.
pub fn encode_page(img: &DynamicImage) -> Result<EncodedImagePart, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

    let b64 = STANDARD.encode(&buf);
    debug!("Encoded page 1 → {} bytes base64", b64.len());

    Ok(EncodedImagePart::png(b64))
}
