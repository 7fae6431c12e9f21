use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageFormat};
use sha2::{Digest, Sha256};

use crate::domain::DomainError;

/// Largest accepted upload
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Longest side of a normalized image
pub const MAX_IMAGE_DIMENSION: u32 = 1024;

pub const INVALID_IMAGE_MESSAGE: &str = "Invalid image file";

const NORMALIZED_MEDIA_TYPE: &str = "image/jpeg";

/// An uploaded medical image
#[derive(Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub data: Vec<u8>,
    /// MIME type as declared by the client, e.g. `image/png`
    pub media_type: String,
}

impl ImageAttachment {
    pub fn new(data: Vec<u8>, media_type: impl Into<String>) -> Self {
        Self {
            data,
            media_type: media_type.into(),
        }
    }

    /// Decodes an upload, shrinks it to fit 1024x1024 and re-encodes it as RGB JPEG.
    ///
    /// Anything that does not decode as a raster image is a validation error.
    pub fn normalize(data: &[u8]) -> Result<Self, DomainError> {
        let decoded = image::load_from_memory(data).map_err(|e| {
            tracing::debug!(error = %e, "Rejected undecodable image upload");
            DomainError::validation(INVALID_IMAGE_MESSAGE)
        })?;

        let resized = if decoded.width() > MAX_IMAGE_DIMENSION
            || decoded.height() > MAX_IMAGE_DIMENSION
        {
            decoded.thumbnail(MAX_IMAGE_DIMENSION, MAX_IMAGE_DIMENSION)
        } else {
            decoded
        };

        let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());
        let mut buffer = Cursor::new(Vec::new());
        rgb.write_to(&mut buffer, ImageFormat::Jpeg)
            .map_err(|e| DomainError::internal(format!("Failed to encode image: {}", e)))?;

        Ok(Self::new(buffer.into_inner(), NORMALIZED_MEDIA_TYPE))
    }

    /// Hex SHA-256 of the bytes
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(&self.data))
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.data)
    }
}

impl std::fmt::Debug for ImageAttachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageAttachment")
            .field("media_type", &self.media_type)
            .field("bytes", &self.data.len())
            .finish()
    }
}
