//! WASM-compatible wrapper types.
//!
//! This module provides JavaScript-friendly types that wrap the core Calque
//! types, handling the conversion between Rust and JavaScript data
//! representations.

use std::fmt::Display;

use calque_core::export::ExportReport;
use image::RgbaImage;
use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;

/// An RGBA raster wrapper for JavaScript.
///
/// # Memory Management
///
/// The pixel data is stored in WASM memory. When you call `pixels()`, a copy is made
/// to JavaScript memory as a `Uint8Array`, ready for `new ImageData(...)`.
///
/// The `free()` method can be called to explicitly release WASM memory, but this is
/// optional as wasm-bindgen's finalizer will handle cleanup automatically.
#[wasm_bindgen]
pub struct JsRaster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl JsRaster {
    /// Create a raster from dimensions and RGBA data (4 bytes per pixel, row-major).
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> JsRaster {
        JsRaster {
            width,
            height,
            pixels,
        }
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of bytes in the pixel buffer (width * height * 4).
    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.pixels.len()
    }

    /// Returns RGBA pixel data as Uint8Array (copied).
    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.clone()
    }

    /// Explicitly free WASM memory.
    pub fn free(self) {
        // Dropping self releases the memory
    }
}

impl JsRaster {
    pub(crate) fn from_rgba(raster: RgbaImage) -> Self {
        let (width, height) = raster.dimensions();
        Self {
            width,
            height,
            pixels: raster.into_raw(),
        }
    }

    /// Convert back to a core raster. `None` if the buffer size is wrong.
    #[cfg(test)]
    pub(crate) fn to_rgba(&self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
    }
}

/// Summary of an export, returned to JavaScript as a plain object.
#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JsExportSummary {
    pub width: u32,
    pub height: u32,
    pub reference: u32,
    pub crop_left: Option<f64>,
    pub crop_top: Option<f64>,
    pub composited: usize,
    pub skipped: usize,
}

impl From<&ExportReport> for JsExportSummary {
    fn from(report: &ExportReport) -> Self {
        Self {
            width: report.width,
            height: report.height,
            reference: report.reference.0,
            crop_left: report.crop.map(|c| c.bounds.left),
            crop_top: report.crop.map(|c| c.bounds.top),
            composited: report.composited,
            skipped: report.skipped,
        }
    }
}

/// Turn any displayable error into a JavaScript exception value.
pub(crate) fn js_error(err: impl Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Deserialize optional settings; `undefined` and `null` give the defaults.
pub(crate) fn settings_or_default<T: DeserializeOwned + Default>(value: JsValue) -> Result<T, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(T::default());
    }
    serde_wasm_bindgen::from_value(value).map_err(|e| js_error(format!("Invalid settings: {}", e)))
}
