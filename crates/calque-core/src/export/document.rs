//! Paginated document export.
//!
//! The engine does not serialize documents. It plans the page (orientation,
//! image box, title and legend positions) and drives a [`DocumentLayout`]
//! implementation supplied by the host.
//!
//! # Page Layout
//!
//! ```text
//! +-----------------------------+
//! | Title                       |   title band
//! |  +-----------------------+  |
//! |  |        raster         |  |   fit into the printable area,
//! |  +-----------------------+  |   centered horizontally
//! | Legend line 1               |
//! | Legend line 2               |   legend band
//! +-----------------------------+
//! ```
//!
//! All lengths are in millimetres.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::encode::RasterFormat;
use crate::geometry::{Point, Rect};

/// Millimetres per typographic point.
const MM_PER_PT: f64 = 25.4 / 72.0;

/// Errors reported by a document layout collaborator.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The collaborator rejected an operation.
    #[error("Document layout failed: {0}")]
    Layout(String),

    /// An element or `save` was requested before `create_document`.
    #[error("No document has been created")]
    NotCreated,
}

/// Page orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// Receives the document export, one call per element.
pub trait DocumentLayout {
    /// Start a new document with one page of `width` x `height` mm.
    fn create_document(&mut self, orientation: Orientation, width: f64, height: f64) -> Result<(), DocumentError>;

    /// Place an encoded image in `bounds` (mm).
    fn add_image(&mut self, encoded: &[u8], format: RasterFormat, bounds: Rect) -> Result<(), DocumentError>;

    /// Font size, in points, for the following `draw_text` calls.
    fn set_font_size(&mut self, size: f64);

    /// Draw one line of text with its baseline starting at `(x, y)` mm.
    fn draw_text(&mut self, text: &str, x: f64, y: f64) -> Result<(), DocumentError>;

    fn save(&mut self, file_name: &str) -> Result<(), DocumentError>;
}

/// Document mode settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentSettings {
    /// Page size in portrait orientation (A4 by default).
    pub page_width: f64,
    pub page_height: f64,
    pub margin: f64,
    pub title_font_size: f64,
    pub legend_font_size: f64,
    /// Line height as a multiple of the font size.
    pub line_spacing: f64,
    /// Raster background behind every layer.
    pub background: [u8; 4],
    /// Encoding of the raster handed to the layout.
    pub image_format: RasterFormat,
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            page_width: 210.0,
            page_height: 297.0,
            margin: 10.0,
            title_font_size: 16.0,
            legend_font_size: 10.0,
            line_spacing: 1.4,
            background: [255, 255, 255, 255],
            image_format: RasterFormat::Png,
        }
    }
}

impl DocumentSettings {
    fn line_height(&self, font_size: f64) -> f64 {
        font_size * MM_PER_PT * self.line_spacing
    }
}

/// Where every element of the document page goes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagePlan {
    pub orientation: Orientation,
    pub page_width: f64,
    pub page_height: f64,
    pub image: Rect,
    pub title_at: Point,
    /// Baseline of each legend line.
    pub legend_at: Vec<Point>,
}

/// Lay out a `raster_width` x `raster_height` px raster with its texts.
///
/// Landscape is used when the raster is wider than tall.
pub fn plan_page(raster_width: u32, raster_height: u32, legend_lines: usize, settings: &DocumentSettings) -> PagePlan {
    let orientation = if raster_width > raster_height {
        Orientation::Landscape
    } else {
        Orientation::Portrait
    };
    let (short, long) = (
        settings.page_width.min(settings.page_height),
        settings.page_width.max(settings.page_height),
    );
    let (page_width, page_height) = match orientation {
        Orientation::Portrait => (short, long),
        Orientation::Landscape => (long, short),
    };

    let title_line = settings.line_height(settings.title_font_size);
    let legend_line = settings.line_height(settings.legend_font_size);

    let title_at = Point::new(settings.margin, settings.margin + title_line);
    let area_top = title_at.y + title_line / 2.0;
    let area_bottom = page_height - settings.margin - legend_line * legend_lines as f64;
    let area_width = (page_width - settings.margin * 2.0).max(0.0);
    let area_height = (area_bottom - area_top).max(0.0);

    let (rw, rh) = (raster_width.max(1) as f64, raster_height.max(1) as f64);
    let scale = (area_width / rw).min(area_height / rh);
    let (iw, ih) = (rw * scale, rh * scale);
    let image = Rect::new(settings.margin + (area_width - iw) / 2.0, area_top, iw, ih);

    let legend_at = (0..legend_lines)
        .map(|i| Point::new(settings.margin, image.bottom() + legend_line * (i + 1) as f64))
        .collect();

    PagePlan {
        orientation,
        page_width,
        page_height,
        image,
        title_at,
        legend_at,
    }
}

/// File name derived from the document title.
///
/// Characters outside letters, digits, `-` and `_` become `_`. An empty title
/// gives `export.pdf`.
pub fn document_file_name(title: &str) -> String {
    let stem: String = title
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if stem.is_empty() {
        "export.pdf".to_string()
    } else {
        format!("{}.pdf", stem)
    }
}
