//! Layer construction from JavaScript.
//!
//! Layers are assembled with a [`JsLayerBuilder`] and then handed to a
//! workspace, which takes ownership.
//!
//! # Example
//!
//! ```typescript
//! const layer = new JsLayerBuilder(2, "Vue drone 1", 1200, 800);
//! layer.set_position(40, 60);
//! layer.set_background(droneJpegBytes, 0.5, 0.5);
//! layer.set_calibrated(true);
//! workspace.push_layer(layer, true);
//! ```

use calque_core::decode::decode_raster;
use calque_core::{Layer, LayerId, PixelSurface, Rect, RenderSurface};
use wasm_bindgen::prelude::*;

use crate::types::js_error;

/// Builder for a layer backed by an in-memory surface.
#[wasm_bindgen]
pub struct JsLayerBuilder {
    id: u32,
    name: String,
    x: f64,
    y: f64,
    angle: f64,
    opacity: f64,
    visible: bool,
    calibrated: bool,
    surface: PixelSurface,
}

#[wasm_bindgen]
impl JsLayerBuilder {
    /// Start a transparent `width` x `height` layer.
    #[wasm_bindgen(constructor)]
    pub fn new(id: u32, name: &str, width: f64, height: f64) -> JsLayerBuilder {
        JsLayerBuilder {
            id,
            name: name.to_string(),
            x: 0.0,
            y: 0.0,
            angle: 0.0,
            opacity: 1.0,
            visible: true,
            calibrated: false,
            surface: PixelSurface::new(width, height),
        }
    }

    pub fn set_position(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
    }

    pub fn set_angle(&mut self, angle: f64) {
        self.angle = angle;
    }

    pub fn set_opacity(&mut self, opacity: f64) {
        self.opacity = opacity;
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn set_calibrated(&mut self, calibrated: bool) {
        self.calibrated = calibrated;
    }

    /// Decode `bytes` (PNG or JPEG) and use it as the background image.
    pub fn set_background(&mut self, bytes: &[u8], scale_x: f64, scale_y: f64) -> Result<(), JsValue> {
        let image = decode_raster(bytes).map_err(js_error)?;
        self.surface.set_background(image, scale_x, scale_y);
        Ok(())
    }

    /// Add a filled rectangle. `rgba` holds 4 bytes; missing bytes default to opaque black.
    pub fn add_rect(&mut self, left: f64, top: f64, width: f64, height: f64, rgba: &[u8]) {
        self.surface.add_rect(Rect::new(left, top, width, height), fill_color(rgba));
    }
}

impl JsLayerBuilder {
    pub(crate) fn build(self) -> Layer {
        let mut surface = self.surface;
        surface.render_all();

        let mut layer = Layer::new(LayerId(self.id), self.name, Box::new(surface))
            .with_position(self.x, self.y)
            .with_angle(self.angle)
            .with_opacity(self.opacity)
            .with_calibrated(self.calibrated);
        layer.visible = self.visible;
        layer
    }
}

fn fill_color(rgba: &[u8]) -> [u8; 4] {
    let mut color = [0, 0, 0, 255];
    for (dst, src) in color.iter_mut().zip(rgba) {
        *dst = *src;
    }
    color
}
