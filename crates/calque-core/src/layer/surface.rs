//! Rendering surface contract consumed by the engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::encode::{EncodeError, RasterFormat};
use crate::geometry::Rect;

/// Errors reported by a rendering surface.
#[derive(Debug, Error)]
pub enum SurfaceError {
    /// The surface could not be encoded into the requested format.
    #[error("Snapshot encoding failed: {0}")]
    Encode(#[from] EncodeError),

    /// The backing store of the surface is no longer available.
    #[error("Surface unavailable: {0}")]
    Unavailable(String),
}

/// Background image occupying a layer.
///
/// The image is drawn at its natural size multiplied by its own scale factors,
/// independently of the layer's raster dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BackgroundRaster {
    pub scale_x: f64,
    pub scale_y: f64,
    pub natural_width: f64,
    pub natural_height: f64,
}

impl BackgroundRaster {
    /// Drawn width (`natural_width * scale_x`).
    pub fn scaled_width(&self) -> f64 {
        self.natural_width * self.scale_x
    }

    /// Drawn height (`natural_height * scale_y`).
    pub fn scaled_height(&self) -> f64 {
        self.natural_height * self.scale_y
    }
}

/// Bounds of a vector object held by a surface, in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceObject {
    pub bounds: Rect,
    pub visible: bool,
}

/// A layer's drawing surface.
///
/// Implementations own the raster dimensions, the optional background raster
/// and the vector children of the layer. The engine mutates dimensions and
/// background scale during resize, reads object bounds for auto-crop, and
/// rasterizes the surface through [`RenderSurface::snapshot`] when exporting.
pub trait RenderSurface {
    fn width(&self) -> f64;

    fn height(&self) -> f64;

    fn set_dimensions(&mut self, width: f64, height: f64);

    fn background(&self) -> Option<BackgroundRaster>;

    /// Update the background scale factors. No-op without a background.
    fn set_background_scale(&mut self, scale_x: f64, scale_y: f64);

    /// Bounding boxes of the surface's vector children.
    ///
    /// Callers still check [`SurfaceObject::visible`].
    fn visible_objects(&self) -> Vec<SurfaceObject>;

    /// Encode the surface exactly as rendered.
    fn snapshot(&self, format: RasterFormat) -> Result<Vec<u8>, SurfaceError>;

    /// Redraw after a mutation.
    fn render_all(&mut self);
}
