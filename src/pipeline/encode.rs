//! Image encoding: `DynamicImage` → base64 PNG ([`EncodedImage`]).
//!
//! Whatever format a product photo arrived in, it leaves this stage as a
//! base64-encoded PNG. Generation APIs accept base64 images in the request
//! body, and normalising to one lossless container means the backend never
//! sees a mix of progressive JPEGs, interlaced PNGs, and whatever else the
//! shops serve.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use tracing::debug;

use crate::error::ExtractionError;

/// A base64 text string holding one PNG-serialised bitmap.
///
/// This is the unit of exchange with the generation backend, in both
/// directions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedImage(String);

impl EncodedImage {
    /// Wrap an already-base64-encoded payload.
    pub fn from_base64(b64: impl Into<String>) -> Self {
        Self(b64.into())
    }

    /// Base64-encode raw bytes (used by the augmentation hook, which ships
    /// file bytes untranscoded).
    pub fn from_raw_bytes(bytes: &[u8]) -> Self {
        Self(STANDARD.encode(bytes))
    }

    /// The base64 text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode back to the underlying binary stream.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.0)
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Serialise a bitmap to PNG in memory and base64-encode the result.
pub fn encode_image(img: &DynamicImage) -> Result<EncodedImage, ExtractionError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| ExtractionError::EncodeFailed {
            detail: e.to_string(),
        })?;

    let encoded = EncodedImage::from_raw_bytes(&buf);
    debug!("Encoded {}×{} bitmap → {} bytes base64", img.width(), img.height(), encoded.as_str().len());
    Ok(encoded)
}
