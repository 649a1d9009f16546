//! Export compositing: flatten the layer stack into one raster.
//!
//! # Pipeline
//!
//! 1. Pick the reference layer ([`select_reference_layer`]) and derive the
//!    output size from it ([`infer_dimensions`])
//! 2. On wide canvases, crop to the drawn content ([`auto_crop`])
//! 3. Snapshot, decode and draw every visible layer back-to-front,
//!    honoring opacity, rotation and position ([`composite_layer`])
//! 4. Overlay the scale bar ([`draw_scale_bar`])
//!
//! The compositor only reads layers. Layers are materialized one at a time,
//! in stack order, and a layer whose snapshot cannot be decoded is skipped.

mod composite;
mod compositor;
mod crop;
mod document;
mod reference;
mod scale_bar;

use serde::{Deserialize, Serialize};

use crate::layer::{CROPPED_PLAN_NAME, DRAWING_LAYER_NAME};

pub use composite::{composite_layer, Placement};
pub use compositor::{ExportCompositor, ExportError, ExportReport};
pub use crop::{auto_crop, drawing_content_bounds, CropBox};
pub use document::{
    document_file_name, plan_page, DocumentError, DocumentLayout, DocumentSettings, Orientation,
    PagePlan,
};
pub use reference::{infer_dimensions, select_reference_layer};
pub use scale_bar::{draw_scale_bar, format_units, GlyphLabelPainter, LabelPainter, ScaleSettings};

/// Thresholds driving output size inference and auto-crop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportPolicy {
    /// A layer whose name contains this marker is the preferred reference.
    pub cropped_plan_marker: String,
    /// Layer whose vector content drives auto-crop.
    pub drawing_layer_name: String,
    /// Difference (px) below which raster and scaled background are "equal".
    pub size_tolerance: f64,
    /// Raster dimension above which a smaller background wins.
    pub large_size_threshold: f64,
    /// Output width above which auto-crop is attempted.
    pub crop_threshold: f64,
    /// Padding (px) around the drawn content.
    pub crop_margin: f64,
    /// Crop only if the padded content is narrower than this share of the width.
    pub crop_coverage_ratio: f64,
}

impl Default for ExportPolicy {
    fn default() -> Self {
        Self {
            cropped_plan_marker: CROPPED_PLAN_NAME.to_string(),
            drawing_layer_name: DRAWING_LAYER_NAME.to_string(),
            size_tolerance: 10.0,
            large_size_threshold: 4000.0,
            crop_threshold: 2000.0,
            crop_margin: 50.0,
            crop_coverage_ratio: 0.8,
        }
    }
}
