//! Content-based auto-crop.
//!
//! On wide canvases most of the raster is often empty. When the drawing
//! layer's content (plus a margin) covers clearly less than the full width,
//! the export is cropped to that box and every layer is shifted by the crop
//! offset.
//!
//! # Coordinate System
//!
//! - Crop boxes are in output pixels, origin at the top-left
//! - The offset is the translation applied to everything drawn: `(-left, -top)`

use serde::{Deserialize, Serialize};

use super::ExportPolicy;
use crate::geometry::{Point, Rect};
use crate::layer::LayerStack;

/// Output box selected by auto-crop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropBox {
    /// Cropped region of the uncropped output.
    pub bounds: Rect,
    /// Translation applied to every layer when drawing.
    pub offset: Point,
}

impl CropBox {
    fn from_bounds(bounds: Rect) -> Self {
        Self {
            bounds,
            offset: Point::new(-bounds.left, -bounds.top),
        }
    }
}

/// Union of the drawing layer's visible objects, in output coordinates.
///
/// Object bounds are shifted by the drawing layer position. Returns `None`
/// when there is no drawing layer or nothing visible on it.
pub fn drawing_content_bounds(layers: &LayerStack, policy: &ExportPolicy) -> Option<Rect> {
    let drawing = layers.find_by_name(&policy.drawing_layer_name)?;
    let origin = drawing.position();
    let bounds: Vec<Rect> = drawing
        .surface()
        .visible_objects()
        .into_iter()
        .filter(|o| o.visible)
        .map(|o| o.bounds.translate(origin))
        .collect();
    Rect::union_all(&bounds)
}

/// Decide whether to crop an output of `width` x `height`.
///
/// # Behavior
///
/// - No crop at or below `crop_threshold` width
/// - No crop without content
/// - The content box is grown by `crop_margin` and clamped to the output
/// - The crop is kept only when its width is below
///   `crop_coverage_ratio * width`
pub fn auto_crop(width: f64, height: f64, content: Option<Rect>, policy: &ExportPolicy) -> Option<CropBox> {
    if width <= policy.crop_threshold {
        return None;
    }

    let padded = content?.expand(policy.crop_margin).clamp_to(width, height);
    if padded.is_empty() {
        return None;
    }

    if padded.width < width * policy.crop_coverage_ratio {
        Some(CropBox::from_bounds(padded))
    } else {
        None
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
