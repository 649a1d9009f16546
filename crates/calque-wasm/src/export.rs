//! Export WASM bindings.
//!
//! # Functions
//!
//! - [`JsWorkspace::export_png`] - Flatten the workspace to PNG bytes
//! - [`JsWorkspace::export_raster`] - Flatten to raw RGBA pixels
//! - [`JsWorkspace::export_document`] - Drive a JavaScript document layout
//!
//! # Document Layout Object
//!
//! `export_document` expects an object with these methods (lengths in mm):
//!
//! ```typescript
//! interface DocumentLayout {
//!   createDocument(orientation: "portrait" | "landscape", width: number, height: number): void;
//!   addImage(bytes: Uint8Array, format: "PNG" | "JPEG", x: number, y: number, w: number, h: number): void;
//!   setFontSize(size: number): void;
//!   drawText(text: string, x: number, y: number): void;
//!   save(fileName: string): void;
//! }
//! ```

use calque_core::encode::RasterFormat;
use calque_core::export::{
    DocumentError, DocumentLayout, GlyphLabelPainter, Orientation, ScaleSettings,
};
use calque_core::Rect;
use js_sys::{Array, Function, Reflect, Uint8Array};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::transform::JsWorkspace;
use crate::types::{js_error, settings_or_default, JsExportSummary, JsRaster};

/// [`DocumentLayout`] calling methods on a JavaScript object.
///
/// Elements and `save` are refused until `createDocument` succeeded.
struct JsDocumentLayout {
    target: JsValue,
    created: bool,
}

impl JsDocumentLayout {
    fn new(target: JsValue) -> Self {
        Self {
            target,
            created: false,
        }
    }

    fn require_document(&self) -> Result<(), DocumentError> {
        if self.created {
            Ok(())
        } else {
            Err(DocumentError::NotCreated)
        }
    }

    fn call(&self, method: &str, args: &[JsValue]) -> Result<(), DocumentError> {
        let function = Reflect::get(&self.target, &JsValue::from_str(method))
            .ok()
            .and_then(|f| f.dyn_into::<Function>().ok())
            .ok_or_else(|| DocumentError::Layout(format!("layout has no '{}' method", method)))?;

        let args: Array = args.iter().collect();
        function
            .apply(&self.target, &args)
            .map(|_| ())
            .map_err(|e| DocumentError::Layout(format!("{} threw: {:?}", method, e)))
    }
}

pub(crate) fn orientation_name(orientation: Orientation) -> &'static str {
    match orientation {
        Orientation::Portrait => "portrait",
        Orientation::Landscape => "landscape",
    }
}

impl DocumentLayout for JsDocumentLayout {
    fn create_document(&mut self, orientation: Orientation, width: f64, height: f64) -> Result<(), DocumentError> {
        self.call(
            "createDocument",
            &[
                JsValue::from_str(orientation_name(orientation)),
                JsValue::from(width),
                JsValue::from(height),
            ],
        )?;
        self.created = true;
        Ok(())
    }

    fn add_image(&mut self, encoded: &[u8], format: RasterFormat, bounds: Rect) -> Result<(), DocumentError> {
        self.require_document()?;
        self.call(
            "addImage",
            &[
                Uint8Array::from(encoded).into(),
                JsValue::from_str(format.name()),
                JsValue::from(bounds.left),
                JsValue::from(bounds.top),
                JsValue::from(bounds.width),
                JsValue::from(bounds.height),
            ],
        )
    }

    fn set_font_size(&mut self, size: f64) {
        if let Err(e) = self.call("setFontSize", &[JsValue::from(size)]) {
            web_sys::console::warn_1(&js_error(e));
        }
    }

    fn draw_text(&mut self, text: &str, x: f64, y: f64) -> Result<(), DocumentError> {
        self.require_document()?;
        self.call("drawText", &[JsValue::from_str(text), JsValue::from(x), JsValue::from(y)])
    }

    fn save(&mut self, file_name: &str) -> Result<(), DocumentError> {
        self.require_document()?;
        self.call("save", &[JsValue::from_str(file_name)])
    }
}

#[wasm_bindgen]
impl JsWorkspace {
    /// Set the scale bar settings (`ScaleSettings`, `undefined` to disable).
    pub fn set_scale(&mut self, settings: JsValue) -> Result<(), JsValue> {
        let scale: ScaleSettings = settings_or_default(settings)?;
        self.compositor.set_scale(scale);
        Ok(())
    }

    /// Load the font used for scale bar labels (TTF/OTF bytes).
    pub fn set_label_font(&mut self, font: Vec<u8>) -> Result<(), JsValue> {
        let painter = GlyphLabelPainter::from_bytes(font).map_err(js_error)?;
        self.compositor.set_label_painter(Some(Box::new(painter)));
        Ok(())
    }

    /// Flatten every visible layer and encode as PNG.
    ///
    /// # Errors
    ///
    /// Throws when there is no layer or the output has no area.
    pub fn export_png(&self) -> Result<Vec<u8>, JsValue> {
        let (bytes, _) = self
            .compositor
            .export_encoded(&self.layers, RasterFormat::Png)
            .map_err(js_error)?;
        Ok(bytes)
    }

    /// Flatten every visible layer into raw RGBA pixels.
    pub fn export_raster(&self) -> Result<JsRaster, JsValue> {
        let (raster, _) = self.compositor.export_raster(&self.layers).map_err(js_error)?;
        Ok(JsRaster::from_rgba(raster))
    }

    /// Flatten on the document background and lay out one page through `layout`.
    ///
    /// Returns `{width, height, reference, cropLeft, cropTop, composited, skipped}`.
    pub fn export_document(&self, title: &str, legend: &str, layout: JsValue) -> Result<JsValue, JsValue> {
        let mut layout = JsDocumentLayout::new(layout);
        let report = self
            .compositor
            .export_document(&self.layers, title, legend, &mut layout)
            .map_err(js_error)?;
        serde_wasm_bindgen::to_value(&JsExportSummary::from(&report)).map_err(js_error)
    }
}
