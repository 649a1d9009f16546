//! Scale bar overlay.
//!
//! A bar of fixed real-world length anchored at the bottom-left of the
//! output, with end ticks, a length label above it and an optional `1:N`
//! label to its right. Text goes through a [`LabelPainter`] so the engine
//! does not ship a font; without one, only the bar and ticks are drawn.

use ab_glyph::{FontArc, InvalidFont, PxScale};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use serde::{Deserialize, Serialize};

use crate::geometry::Rect;
use crate::layer::fill_rect;

/// Scale indicator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleSettings {
    /// Workspace pixels per real-world unit. No bar when unset.
    pub pixels_per_unit: Option<f64>,
    /// Map scale denominator, rendered as `1:N`.
    pub denominator: Option<u32>,
    /// Real-world length of the bar.
    pub bar_units: f64,
    pub unit_label: String,
    /// Distance from the left and bottom edges of the output.
    pub margin: f64,
    pub bar_thickness: f64,
    pub tick_height: f64,
    pub label_size: f32,
    /// Space between the bar elements and the backing block edge.
    pub padding: f64,
    pub color: [u8; 4],
    /// Fill of the opaque block painted behind the bar in documents.
    pub backing_color: [u8; 4],
}

impl Default for ScaleSettings {
    fn default() -> Self {
        Self {
            pixels_per_unit: None,
            denominator: None,
            bar_units: 10.0,
            unit_label: "m".to_string(),
            margin: 20.0,
            bar_thickness: 4.0,
            tick_height: 10.0,
            label_size: 16.0,
            padding: 6.0,
            color: [0, 0, 0, 255],
            backing_color: [255, 255, 255, 255],
        }
    }
}

impl ScaleSettings {
    /// Bar length in output pixels, `None` when no usable ratio is set.
    pub fn bar_length(&self) -> Option<f64> {
        let ppu = self.pixels_per_unit?;
        let length = ppu * self.bar_units;
        (length.is_finite() && length >= 1.0).then_some(length)
    }

    /// Text of the length label, e.g. `10 m`.
    pub fn length_label(&self) -> String {
        format!("{} {}", format_units(self.bar_units), self.unit_label)
    }
}

/// Format a length without a trailing `.0` for whole numbers.
pub fn format_units(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{}", value)
    }
}

/// Renders short text labels onto a raster.
pub trait LabelPainter {
    /// Size of `text` in pixels at `size` px.
    fn measure(&self, text: &str, size: f32) -> (u32, u32);

    /// Draw `text` with its top-left corner at `(x, y)`.
    fn paint(&self, canvas: &mut RgbaImage, text: &str, x: i32, y: i32, size: f32, color: Rgba<u8>);
}

/// [`LabelPainter`] backed by a TrueType/OpenType font.
#[derive(Clone)]
pub struct GlyphLabelPainter {
    font: FontArc,
}

impl GlyphLabelPainter {
    /// Load a font from its file contents.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, InvalidFont> {
        Ok(Self {
            font: FontArc::try_from_vec(bytes)?,
        })
    }

    pub fn from_font(font: FontArc) -> Self {
        Self { font }
    }
}

impl LabelPainter for GlyphLabelPainter {
    fn measure(&self, text: &str, size: f32) -> (u32, u32) {
        text_size(PxScale::from(size), &self.font, text)
    }

    fn paint(&self, canvas: &mut RgbaImage, text: &str, x: i32, y: i32, size: f32, color: Rgba<u8>) {
        draw_text_mut(canvas, color, x, y, PxScale::from(size), &self.font, text);
    }
}

struct Label {
    text: String,
    x: f64,
    y: f64,
}

/// Draw the scale bar. Returns false when no ratio is configured.
///
/// With `backing`, an opaque block is painted behind every element first.
pub fn draw_scale_bar(
    canvas: &mut RgbaImage,
    settings: &ScaleSettings,
    painter: Option<&dyn LabelPainter>,
    backing: bool,
) -> bool {
    let Some(length) = settings.bar_length() else {
        return false;
    };

    let left = settings.margin;
    let bar_bottom = canvas.height() as f64 - settings.margin;
    let bar_top = bar_bottom - settings.bar_thickness;
    let tick_top = bar_top - settings.tick_height;

    let bar = Rect::from_edges(left, bar_top, left + length, bar_bottom);
    let ticks = [
        Rect::from_edges(left, tick_top, left + settings.bar_thickness, bar_bottom),
        Rect::from_edges(left + length - settings.bar_thickness, tick_top, left + length, bar_bottom),
    ];

    let mut labels = Vec::new();
    let mut extent = Rect::from_edges(left, tick_top, left + length, bar_bottom);

    if let Some(painter) = painter {
        let text = settings.length_label();
        let (tw, th) = painter.measure(&text, settings.label_size);
        let label = Label {
            x: left + (length - tw as f64) / 2.0,
            y: tick_top - settings.padding / 2.0 - th as f64,
            text,
        };
        extent = extent.union(&Rect::new(label.x, label.y, tw as f64, th as f64));
        labels.push(label);

        if let Some(denominator) = settings.denominator {
            let text = format!("1:{}", denominator);
            let (tw, th) = painter.measure(&text, settings.label_size);
            let label = Label {
                x: left + length + settings.padding * 2.0,
                y: bar_bottom - th as f64,
                text,
            };
            extent = extent.union(&Rect::new(label.x, label.y, tw as f64, th as f64));
            labels.push(label);
        }
    }

    if backing {
        fill_rect(canvas, &extent.expand(settings.padding), Rgba(settings.backing_color));
    }

    let color = Rgba(settings.color);
    fill_rect(canvas, &bar, color);
    for tick in &ticks {
        fill_rect(canvas, tick, color);
    }

    if let Some(painter) = painter {
        for label in &labels {
            painter.paint(
                canvas,
                &label.text,
                label.x.round() as i32,
                label.y.round() as i32,
                settings.label_size,
                color,
            );
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Fixed-size glyph boxes; records every painted label.
    #[derive(Default)]
    struct BoxPainter {
        painted: RefCell<Vec<(String, i32, i32)>>,
    }

    impl LabelPainter for BoxPainter {
        fn measure(&self, text: &str, _size: f32) -> (u32, u32) {
            (text.chars().count() as u32 * 8, 12)
        }

        fn paint(&self, _canvas: &mut RgbaImage, text: &str, x: i32, y: i32, _size: f32, _color: Rgba<u8>) {
            self.painted.borrow_mut().push((text.to_string(), x, y));
        }
    }

    fn settings(ppu: Option<f64>) -> ScaleSettings {
        ScaleSettings {
            pixels_per_unit: ppu,
            ..ScaleSettings::default()
        }
    }

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(10.0), "10");
        assert_eq!(format_units(2.5), "2.5");
        assert_eq!(settings(None).length_label(), "10 m");
    }

    #[test]
    fn test_no_ratio_draws_nothing() {
        let mut canvas = RgbaImage::new(200, 100);
        assert!(!draw_scale_bar(&mut canvas, &settings(None), None, true));
        assert!(!draw_scale_bar(&mut canvas, &settings(Some(0.0)), None, true));
        assert!(canvas.pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn test_bar_and_ticks_without_painter() {
        // 10 units at 5 px/unit = 50 px bar from x=20
        let mut canvas = RgbaImage::new(200, 100);
        assert!(draw_scale_bar(&mut canvas, &settings(Some(5.0)), None, false));

        // Bar: y in [76, 80)
        assert_eq!(canvas.get_pixel(45, 78).0, [0, 0, 0, 255]);
        assert_eq!(canvas.get_pixel(69, 78).0, [0, 0, 0, 255]);
        assert_eq!(canvas.get_pixel(70, 78).0[3], 0);
        // Ticks rise above the bar at both ends
        assert_eq!(canvas.get_pixel(21, 68).0, [0, 0, 0, 255]);
        assert_eq!(canvas.get_pixel(68, 68).0, [0, 0, 0, 255]);
        assert_eq!(canvas.get_pixel(45, 68).0[3], 0);
        // Raster variant: no backing
        assert_eq!(canvas.get_pixel(18, 82).0[3], 0);
    }

    #[test]
    fn test_backing_block_is_opaque() {
        let mut canvas = RgbaImage::new(200, 100);
        draw_scale_bar(&mut canvas, &settings(Some(5.0)), None, true);
        assert_eq!(canvas.get_pixel(45, 68).0, [255, 255, 255, 255]);
        assert_eq!(canvas.get_pixel(16, 84).0, [255, 255, 255, 255]);
        assert_eq!(canvas.get_pixel(45, 78).0, [0, 0, 0, 255]);
        assert_eq!(canvas.get_pixel(150, 20).0[3], 0);
    }

    #[test]
    fn test_labels_are_placed_around_bar() {
        let mut canvas = RgbaImage::new(200, 100);
        let painter = BoxPainter::default();
        let mut s = settings(Some(5.0));
        s.denominator = Some(500);
        draw_scale_bar(&mut canvas, &s, Some(&painter), false);

        let painted = painter.painted.borrow();
        // "10 m" is 32 px wide, centered over the 50 px bar; bottom 3 px above the ticks
        assert_eq!(painted[0], ("10 m".to_string(), 29, 51));
        // "1:500" sits right of the bar, bottom-aligned with it
        assert_eq!(painted[1], ("1:500".to_string(), 82, 68));
    }

    #[test]
    fn test_backing_covers_labels() {
        let mut canvas = RgbaImage::new(200, 100);
        let painter = BoxPainter::default();
        let mut s = settings(Some(5.0));
        s.denominator = Some(500);
        draw_scale_bar(&mut canvas, &s, Some(&painter), true);

        // Inside the "1:500" box and the length label box
        assert_eq!(canvas.get_pixel(100, 70).0, [255, 255, 255, 255]);
        assert_eq!(canvas.get_pixel(40, 55).0, [255, 255, 255, 255]);
    }
}
