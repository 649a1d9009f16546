//! Raster encoding for layer snapshots and exports.
//!
//! This module provides functionality for:
//! - Encoding RGBA rasters to PNG (lossless, keeps transparency)
//! - Encoding RGBA rasters to JPEG with configurable quality (alpha dropped)
//!
//! # Examples
//!
//! ```ignore
//! use calque_core::encode::{encode_raster, RasterFormat};
//!
//! let raster = image::RgbaImage::new(100, 100);
//! let png = encode_raster(&raster, RasterFormat::Png).unwrap();
//! ```

mod raster;

pub use raster::{encode_raster, EncodeError, RasterFormat};
