//! Layer model shared by the transform controller and the export compositor.
//!
//! A [`Layer`] carries its placement in the workspace (`x`, `y`, `angle`),
//! its compositing attributes (`opacity`, `visible`) and a boxed
//! [`RenderSurface`] that owns the raster dimensions, the optional background
//! raster and the vector content.
//!
//! # Stack Order
//!
//! [`LayerStack`] stores layers top-most first: index 0 is drawn last.
//! The compositor therefore walks the stack in reverse (back-to-front).
//!
//! # Ownership
//!
//! Layers are created and removed by the host application. The engine only
//! mutates `x`, `y`, `angle`, the surface dimensions and the background scale.

mod pixel;
mod surface;
#[cfg(test)]
pub(crate) mod testing;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::{normalize_angle, Point, Rect};

pub(crate) use pixel::fill_rect;
pub use pixel::PixelSurface;
pub use surface::{BackgroundRaster, RenderSurface, SurfaceError, SurfaceObject};

/// Name of the cropped site plan layer.
pub const CROPPED_PLAN_NAME: &str = "Plan rogné";

/// Name of the free-hand drawing layer.
pub const DRAWING_LAYER_NAME: &str = "Dessin";

/// Stable layer identifier assigned by the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(pub u32);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An independently positioned, rotated and alpha-blended surface.
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    /// Left edge of the untransformed raster.
    pub x: f64,
    /// Top edge of the untransformed raster.
    pub y: f64,
    /// Rotation in degrees about the layer center, always in `[0, 360)`.
    angle: f64,
    /// Compositing alpha (0.0 to 1.0).
    pub opacity: f64,
    pub visible: bool,
    /// Set once the real-world scale of the layer has been established.
    pub calibrated: bool,
    surface: Box<dyn RenderSurface>,
}

impl Layer {
    /// Create a visible, opaque, unrotated layer at the workspace origin.
    pub fn new(id: LayerId, name: impl Into<String>, surface: Box<dyn RenderSurface>) -> Self {
        Self {
            id,
            name: name.into(),
            x: 0.0,
            y: 0.0,
            angle: 0.0,
            opacity: 1.0,
            visible: true,
            calibrated: false,
            surface,
        }
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_angle(mut self, angle: f64) -> Self {
        self.set_angle(angle);
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.set_opacity(opacity);
        self
    }

    pub fn with_calibrated(mut self, calibrated: bool) -> Self {
        self.calibrated = calibrated;
        self
    }

    #[inline]
    pub fn angle(&self) -> f64 {
        self.angle
    }

    /// Set the rotation, normalized into `[0, 360)`.
    pub fn set_angle(&mut self, angle: f64) {
        self.angle = normalize_angle(angle);
    }

    /// Set the opacity, clamped into `[0, 1]`.
    pub fn set_opacity(&mut self, opacity: f64) {
        self.opacity = if opacity.is_nan() {
            1.0
        } else {
            opacity.clamp(0.0, 1.0)
        };
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.surface.width()
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.surface.height()
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Geometric center, the pivot for rotation.
    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    /// Untransformed bounds in workspace coordinates.
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width(), self.height())
    }

    pub fn background(&self) -> Option<BackgroundRaster> {
        self.surface.background()
    }

    pub fn surface(&self) -> &dyn RenderSurface {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> &mut dyn RenderSurface {
        self.surface.as_mut()
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("x", &self.x)
            .field("y", &self.y)
            .field("angle", &self.angle)
            .field("width", &self.width())
            .field("height", &self.height())
            .field("opacity", &self.opacity)
            .field("visible", &self.visible)
            .field("calibrated", &self.calibrated)
            .finish_non_exhaustive()
    }
}

/// Ordered layer list, top-most layer first.
#[derive(Debug, Default)]
pub struct LayerStack {
    layers: Vec<Layer>,
}

impl LayerStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a layer above every existing layer.
    pub fn push_top(&mut self, layer: Layer) {
        self.layers.insert(0, layer);
    }

    /// Place a layer below every existing layer.
    pub fn push_bottom(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    pub fn remove(&mut self, id: LayerId) -> Option<Layer> {
        let idx = self.layers.iter().position(|l| l.id == id)?;
        Some(self.layers.remove(idx))
    }

    pub fn get(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn get_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id == id)
    }

    /// First layer (in stack order) whose name matches exactly.
    pub fn find_by_name(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name == name)
    }

    /// Layers in stack order, top-most first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Layer> {
        self.layers.iter()
    }

    /// Layers in drawing order, bottom-most first.
    pub fn iter_back_to_front(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter().rev()
    }

    pub fn first(&self) -> Option<&Layer> {
        self.layers.first()
    }

    pub fn last(&self) -> Option<&Layer> {
        self.layers.last()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}
