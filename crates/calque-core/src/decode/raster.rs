//! Raster decoding with format detection.

use std::io::Cursor;

use image::{ImageReader, RgbaImage};
use thiserror::Error;

/// Error types for snapshot decoding.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// No bytes were provided.
    #[error("Empty snapshot")]
    Empty,

    /// The bytes are not a recognized image format.
    #[error("Invalid or unsupported image format")]
    InvalidFormat,

    /// The image is corrupted or incomplete.
    #[error("Corrupted or incomplete image data: {0}")]
    CorruptedData(String),
}

/// Decode encoded snapshot bytes into an RGBA raster.
///
/// # Errors
///
/// Returns `DecodeError::Empty` for zero-length input,
/// `DecodeError::InvalidFormat` if the format cannot be guessed and
/// `DecodeError::CorruptedData` if decoding fails.
pub fn decode_raster(bytes: &[u8]) -> Result<RgbaImage, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedData(e.to_string()))?;

    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }

    let img = reader
        .decode()
        .map_err(|e| DecodeError::CorruptedData(e.to_string()))?;

    Ok(img.into_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::{encode_raster, RasterFormat};
    use image::Rgba;

    #[test]
    fn test_decode_png_snapshot() {
        let raster = RgbaImage::from_pixel(3, 2, Rgba([200, 100, 50, 128]));
        let bytes = encode_raster(&raster, RasterFormat::Png).unwrap();

        let decoded = decode_raster(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.get_pixel(2, 1).0, [200, 100, 50, 128]);
    }

    #[test]
    fn test_decode_jpeg_snapshot_is_opaque() {
        let raster = RgbaImage::from_pixel(8, 8, Rgba([90, 90, 90, 255]));
        let bytes = encode_raster(&raster, RasterFormat::Jpeg { quality: 95 }).unwrap();

        let decoded = decode_raster(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (8, 8));
        assert!(decoded.pixels().all(|p| p.0[3] == 255));
    }

    #[test]
    fn test_decode_empty() {
        assert!(matches!(decode_raster(&[]), Err(DecodeError::Empty)));
    }

    #[test]
    fn test_decode_garbage() {
        let result = decode_raster(&[0x00, 0x01, 0x02, 0x03]);
        assert!(matches!(result, Err(DecodeError::InvalidFormat)));
    }

    #[test]
    fn test_decode_truncated_png() {
        let raster = RgbaImage::from_pixel(16, 16, Rgba([1, 2, 3, 255]));
        let bytes = encode_raster(&raster, RasterFormat::Png).unwrap();

        let result = decode_raster(&bytes[..bytes.len() / 2]);
        assert!(matches!(result, Err(DecodeError::CorruptedData(_))));
    }

    #[test]
    fn test_decode_error_display() {
        assert_eq!(
            DecodeError::InvalidFormat.to_string(),
            "Invalid or unsupported image format"
        );
    }
}
