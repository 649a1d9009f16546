//! PNG and JPEG encoding through the `image` crate's encoders.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during raster encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The underlying encoder failed
    #[error("{format} encoding failed: {message}")]
    EncodingFailed {
        format: &'static str,
        message: String,
    },
}

/// Encoded raster format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RasterFormat {
    /// Lossless, keeps the alpha channel.
    #[default]
    Png,
    /// Lossy, quality 1-100. Transparent pixels lose their alpha.
    Jpeg { quality: u8 },
}

impl RasterFormat {
    /// MIME type of the encoded bytes.
    pub fn mime_type(self) -> &'static str {
        match self {
            RasterFormat::Png => "image/png",
            RasterFormat::Jpeg { .. } => "image/jpeg",
        }
    }

    /// Short uppercase name, as used by document layout engines.
    pub fn name(self) -> &'static str {
        match self {
            RasterFormat::Png => "PNG",
            RasterFormat::Jpeg { .. } => "JPEG",
        }
    }
}

/// Encode an RGBA raster.
///
/// # Errors
///
/// Returns `EncodeError::InvalidDimensions` for an empty raster and
/// `EncodeError::EncodingFailed` if the codec rejects the data.
pub fn encode_raster(raster: &RgbaImage, format: RasterFormat) -> Result<Vec<u8>, EncodeError> {
    let (width, height) = raster.dimensions();
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let mut buffer = Cursor::new(Vec::new());

    match format {
        RasterFormat::Png => {
            PngEncoder::new(&mut buffer)
                .write_image(raster.as_raw(), width, height, ExtendedColorType::Rgba8)
                .map_err(|e| EncodeError::EncodingFailed {
                    format: format.name(),
                    message: e.to_string(),
                })?;
        }
        RasterFormat::Jpeg { quality } => {
            // JPEG has no alpha channel
            let rgb = image::DynamicImage::ImageRgba8(raster.clone()).into_rgb8();
            JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
                .write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
                .map_err(|e| EncodeError::EncodingFailed {
                    format: format.name(),
                    message: e.to_string(),
                })?;
        }
    }

    Ok(buffer.into_inner())
}
