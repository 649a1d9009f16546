//! Export orchestration: size inference, crop, compositing and overlays.

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use super::composite::{composite_layer, Placement};
use super::crop::{auto_crop, drawing_content_bounds, CropBox};
use super::document::{document_file_name, plan_page, DocumentError, DocumentLayout, DocumentSettings};
use super::reference::{infer_dimensions, select_reference_layer};
use super::scale_bar::{draw_scale_bar, LabelPainter, ScaleSettings};
use super::ExportPolicy;
use crate::decode::decode_raster;
use crate::encode::{encode_raster, EncodeError, RasterFormat};
use crate::geometry::Point;
use crate::layer::{Layer, LayerId, LayerStack};

/// Errors that abort an export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// There is nothing to export.
    #[error("No layers to export")]
    NoLayers,

    /// The inferred output has no area.
    #[error("Export canvas is empty ({width}x{height})")]
    EmptyCanvas { width: f64, height: f64 },

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// Summary of a finished export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportReport {
    pub width: u32,
    pub height: u32,
    /// Layer that seeded the output size.
    pub reference: LayerId,
    /// Crop applied to the output, if any.
    pub crop: Option<CropBox>,
    /// Layers drawn onto the output.
    pub composited: usize,
    /// Visible layers dropped because their snapshot was unusable.
    pub skipped: usize,
}

/// Output geometry decided before any layer is drawn.
struct Frame {
    width: u32,
    height: u32,
    reference: LayerId,
    crop: Option<CropBox>,
}

impl Frame {
    fn offset(&self) -> Point {
        self.crop.map(|c| c.offset).unwrap_or(Point::ZERO)
    }
}

/// Flattens a layer stack into a raster or a document.
///
/// Never mutates layers and never looks at transform sessions.
pub struct ExportCompositor {
    policy: ExportPolicy,
    scale: ScaleSettings,
    document: DocumentSettings,
    painter: Option<Box<dyn LabelPainter>>,
}

impl ExportCompositor {
    pub fn new(policy: ExportPolicy, scale: ScaleSettings) -> Self {
        Self {
            policy,
            scale,
            document: DocumentSettings::default(),
            painter: None,
        }
    }

    pub fn with_document_settings(mut self, document: DocumentSettings) -> Self {
        self.document = document;
        self
    }

    /// Use `painter` for scale bar labels.
    pub fn with_label_painter(mut self, painter: Box<dyn LabelPainter>) -> Self {
        self.painter = Some(painter);
        self
    }

    pub fn policy(&self) -> &ExportPolicy {
        &self.policy
    }

    pub fn scale(&self) -> &ScaleSettings {
        &self.scale
    }

    /// Replace the scale settings, e.g. after calibration.
    pub fn set_scale(&mut self, scale: ScaleSettings) {
        self.scale = scale;
    }

    pub fn set_label_painter(&mut self, painter: Option<Box<dyn LabelPainter>>) {
        self.painter = painter;
    }

    /// Flatten `layers` on a transparent background.
    #[instrument(skip_all, fields(layers = layers.len()))]
    pub fn export_raster(&self, layers: &LayerStack) -> Result<(RgbaImage, ExportReport), ExportError> {
        let frame = self.frame(layers)?;
        let (raster, report) = self.render(layers, &frame, None, false);
        info!(
            width = report.width,
            height = report.height,
            skipped = report.skipped,
            "raster export complete"
        );
        Ok((raster, report))
    }

    /// Flatten `layers` and encode the result.
    pub fn export_encoded(
        &self,
        layers: &LayerStack,
        format: RasterFormat,
    ) -> Result<(Vec<u8>, ExportReport), ExportError> {
        let (raster, report) = self.export_raster(layers)?;
        Ok((encode_raster(&raster, format)?, report))
    }

    /// Flatten `layers` on the document background and hand it to `layout`
    /// with a title and a legend (one line per `\n`).
    #[instrument(skip_all, fields(layers = layers.len(), title = %title))]
    pub fn export_document(
        &self,
        layers: &LayerStack,
        title: &str,
        legend: &str,
        layout: &mut dyn DocumentLayout,
    ) -> Result<ExportReport, ExportError> {
        let frame = self.frame(layers)?;
        let (raster, report) = self.render(layers, &frame, Some(Rgba(self.document.background)), true);

        let legend_lines: Vec<&str> = if legend.trim().is_empty() {
            Vec::new()
        } else {
            legend.lines().collect()
        };
        let plan = plan_page(report.width, report.height, legend_lines.len(), &self.document);
        let encoded = encode_raster(&raster, self.document.image_format)?;

        layout.create_document(plan.orientation, plan.page_width, plan.page_height)?;
        layout.add_image(&encoded, self.document.image_format, plan.image)?;
        layout.set_font_size(self.document.title_font_size);
        layout.draw_text(title, plan.title_at.x, plan.title_at.y)?;
        if !legend_lines.is_empty() {
            layout.set_font_size(self.document.legend_font_size);
            for (line, at) in legend_lines.iter().zip(&plan.legend_at) {
                layout.draw_text(line, at.x, at.y)?;
            }
        }
        let file_name = document_file_name(title);
        layout.save(&file_name)?;

        info!(
            file = %file_name,
            width = report.width,
            height = report.height,
            skipped = report.skipped,
            "document export complete"
        );
        Ok(report)
    }

    /// Decide output size and crop.
    fn frame(&self, layers: &LayerStack) -> Result<Frame, ExportError> {
        let reference = select_reference_layer(layers, &self.policy).ok_or(ExportError::NoLayers)?;
        let (width, height) = infer_dimensions(reference, &self.policy);
        debug!(reference = %reference.id, width, height, "output size inferred");

        let crop = auto_crop(width, height, drawing_content_bounds(layers, &self.policy), &self.policy);
        let (width, height) = match crop {
            Some(c) => {
                debug!(
                    left = c.bounds.left,
                    top = c.bounds.top,
                    width = c.bounds.width,
                    height = c.bounds.height,
                    "auto-crop applied"
                );
                (c.bounds.width, c.bounds.height)
            }
            None => (width, height),
        };

        let (w, h) = (width.round(), height.round());
        if !(w >= 1.0 && h >= 1.0) {
            return Err(ExportError::EmptyCanvas { width, height });
        }

        Ok(Frame {
            width: w as u32,
            height: h as u32,
            reference: reference.id,
            crop,
        })
    }

    /// Draw every visible layer back-to-front, then the scale bar.
    ///
    /// Layers are materialized and drawn one at a time.
    fn render(
        &self,
        layers: &LayerStack,
        frame: &Frame,
        background: Option<Rgba<u8>>,
        backing: bool,
    ) -> (RgbaImage, ExportReport) {
        let mut canvas = match background {
            Some(color) => RgbaImage::from_pixel(frame.width, frame.height, color),
            None => RgbaImage::new(frame.width, frame.height),
        };
        let offset = frame.offset();
        let (mut composited, mut skipped) = (0, 0);

        for layer in layers.iter_back_to_front().filter(|l| l.visible) {
            let Some(source) = materialize(layer) else {
                skipped += 1;
                continue;
            };
            let placement = Placement {
                origin: layer.position().offset(offset),
                angle: layer.angle(),
                opacity: layer.opacity,
            };
            composite_layer(&mut canvas, &source, placement);
            composited += 1;
        }

        draw_scale_bar(&mut canvas, &self.scale, self.painter.as_deref(), backing);

        let report = ExportReport {
            width: frame.width,
            height: frame.height,
            reference: frame.reference,
            crop: frame.crop,
            composited,
            skipped,
        };
        (canvas, report)
    }
}

/// Snapshot and decode one layer. Failures are logged and yield `None`.
fn materialize(layer: &Layer) -> Option<RgbaImage> {
    let bytes = match layer.surface().snapshot(RasterFormat::Png) {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(layer = %layer.id, error = %err, "snapshot failed, layer skipped");
            return None;
        }
    };
    match decode_raster(&bytes) {
        Ok(raster) => Some(raster),
        Err(err) => {
            warn!(layer = %layer.id, error = %err, "snapshot decode failed, layer skipped");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::encode_raster;
    use crate::export::Orientation;
    use crate::geometry::Rect;
    use crate::layer::testing::SizedSurface;
    use crate::layer::{PixelSurface, SurfaceObject, CROPPED_PLAN_NAME, DRAWING_LAYER_NAME};

    fn solid(id: u32, name: &str, w: u32, h: u32, color: [u8; 4]) -> Layer {
        let surface = PixelSurface::new(w as f64, h as f64).with_rect(Rect::new(0.0, 0.0, w as f64, h as f64), color);
        Layer::new(LayerId(id), name, Box::new(surface))
    }

    fn compositor() -> ExportCompositor {
        ExportCompositor::new(ExportPolicy::default(), ScaleSettings::default())
    }

    #[test]
    fn test_empty_stack_is_rejected() {
        let result = compositor().export_raster(&LayerStack::new());
        assert!(matches!(result, Err(ExportError::NoLayers)));
    }

    #[test]
    fn test_zero_area_reference_is_rejected() {
        let mut layers = LayerStack::new();
        layers.push_top(Layer::new(LayerId(1), "empty", Box::new(SizedSurface::new(0.0, 40.0))));
        let result = compositor().export_raster(&layers);
        assert!(matches!(result, Err(ExportError::EmptyCanvas { .. })));
    }

    #[test]
    fn test_half_opacity_layer_blends_with_bottom() {
        let mut layers = LayerStack::new();
        layers.push_bottom(solid(1, "Haut", 8, 8, [0, 0, 200, 255]).with_opacity(0.5));
        layers.push_bottom(solid(2, "Fond", 8, 8, [200, 100, 0, 255]));

        let (raster, report) = compositor().export_raster(&layers).unwrap();
        assert_eq!((raster.width(), raster.height()), (8, 8));
        assert_eq!(report.composited, 2);
        for p in raster.pixels() {
            let expected = [100, 50, 100, 255];
            for c in 0..4 {
                assert!((p.0[c] as i32 - expected[c] as i32).abs() <= 1, "{:?}", p.0);
            }
        }
    }

    #[test]
    fn test_stack_order_top_layer_wins() {
        let mut layers = LayerStack::new();
        layers.push_bottom(solid(1, "top", 4, 4, [255, 0, 0, 255]));
        layers.push_bottom(solid(2, "bottom", 4, 4, [0, 255, 0, 255]));

        let (raster, _) = compositor().export_raster(&layers).unwrap();
        assert_eq!(raster.get_pixel(1, 1).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_hidden_layers_are_not_drawn() {
        let mut layers = LayerStack::new();
        let mut hidden = solid(1, "hidden", 4, 4, [255, 0, 0, 255]);
        hidden.visible = false;
        layers.push_bottom(hidden);
        layers.push_bottom(solid(2, "shown", 4, 4, [0, 255, 0, 255]));

        let (raster, report) = compositor().export_raster(&layers).unwrap();
        assert_eq!(raster.get_pixel(1, 1).0, [0, 255, 0, 255]);
        assert_eq!((report.composited, report.skipped), (1, 0));
    }

    #[test]
    fn test_corrupt_snapshot_is_skipped() {
        let mut layers = LayerStack::new();
        let broken = SizedSurface::new(4.0, 4.0).with_snapshot(vec![0x89, b'P', b'N', b'G', 0, 1, 2]);
        layers.push_bottom(Layer::new(LayerId(1), "broken", Box::new(broken)));
        layers.push_bottom(solid(2, "base", 4, 4, [0, 0, 255, 255]));
        layers.push_bottom(Layer::new(LayerId(3), "gone", Box::new(SizedSurface::new(4.0, 4.0))));

        let (raster, report) = compositor().export_raster(&layers).unwrap();
        assert_eq!(raster.get_pixel(0, 0).0, [0, 0, 255, 255]);
        assert_eq!((report.composited, report.skipped), (1, 2));
    }

    #[test]
    fn test_reference_layer_sets_output_size() {
        let mut layers = LayerStack::new();
        layers.push_bottom(solid(1, "Background", 30, 30, [0, 0, 0, 255]));
        layers.push_bottom(solid(2, CROPPED_PLAN_NAME, 12, 10, [0, 0, 0, 255]));

        let (raster, report) = compositor().export_raster(&layers).unwrap();
        assert_eq!((raster.width(), raster.height()), (12, 10));
        assert_eq!(report.reference, LayerId(2));
    }

    #[test]
    fn test_layer_position_and_rotation() {
        let mut layers = LayerStack::new();
        layers.push_bottom(solid(1, "bar", 6, 2, [255, 0, 0, 255]).with_position(2.0, 4.0).with_angle(90.0));
        layers.push_bottom(Layer::new(LayerId(2), CROPPED_PLAN_NAME, Box::new(PixelSurface::new(10.0, 10.0))));

        let (raster, _) = compositor().export_raster(&layers).unwrap();
        assert_eq!((raster.width(), raster.height()), (10, 10));
        assert!(raster.get_pixel(5, 2).0[3] > 250);
        assert_eq!(raster.get_pixel(2, 5).0[3], 0);
    }

    #[test]
    fn test_auto_crop_shifts_layers() {
        // 3000 px wide reference with content in a 200 px box
        let plan = SizedSurface::new(3000.0, 1000.0)
            .with_snapshot(encode_raster(&RgbaImage::new(1, 1), RasterFormat::Png).unwrap());
        let mut drawing = SizedSurface::new(3000.0, 1000.0);
        drawing.objects.push(SurfaceObject {
            bounds: Rect::new(1000.0, 400.0, 100.0, 100.0),
            visible: true,
        });

        let mut layers = LayerStack::new();
        layers.push_bottom(Layer::new(LayerId(1), DRAWING_LAYER_NAME, Box::new(drawing)));
        layers.push_bottom(solid(2, "marker", 10, 10, [0, 255, 0, 255]).with_position(1000.0, 400.0));
        layers.push_bottom(Layer::new(LayerId(3), CROPPED_PLAN_NAME, Box::new(plan)));

        let (raster, report) = compositor().export_raster(&layers).unwrap();
        let crop = report.crop.unwrap();
        assert_eq!(crop.bounds, Rect::new(950.0, 350.0, 200.0, 200.0));
        assert_eq!((raster.width(), raster.height()), (200, 200));
        // The marker layer lands at its workspace position minus the crop origin
        assert_eq!(raster.get_pixel(55, 55).0, [0, 255, 0, 255]);
        assert_eq!(raster.get_pixel(45, 45).0[3], 0);
        // The drawing layer has no usable snapshot
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn test_scale_bar_drawn_when_calibrated() {
        let mut layers = LayerStack::new();
        layers.push_bottom(Layer::new(LayerId(1), "Fond", Box::new(PixelSurface::new(200.0, 100.0))));
        let scale = ScaleSettings {
            pixels_per_unit: Some(5.0),
            ..ScaleSettings::default()
        };
        let (raster, _) = ExportCompositor::new(ExportPolicy::default(), scale)
            .export_raster(&layers)
            .unwrap();
        assert_eq!(raster.get_pixel(45, 78).0, [0, 0, 0, 255]);
        // Raster export has no backing block
        assert_eq!(raster.get_pixel(45, 68).0[3], 0);
    }

    #[derive(Debug, PartialEq)]
    enum Call {
        Create(Orientation, f64, f64),
        Image(usize, Rect),
        FontSize(f64),
        Text(String),
        Save(String),
    }

    #[derive(Default)]
    struct RecordingLayout {
        calls: Vec<Call>,
        image: Vec<u8>,
    }

    impl DocumentLayout for RecordingLayout {
        fn create_document(&mut self, orientation: Orientation, width: f64, height: f64) -> Result<(), DocumentError> {
            self.calls.push(Call::Create(orientation, width, height));
            Ok(())
        }

        fn add_image(&mut self, encoded: &[u8], _format: RasterFormat, bounds: Rect) -> Result<(), DocumentError> {
            self.image = encoded.to_vec();
            self.calls.push(Call::Image(encoded.len(), bounds));
            Ok(())
        }

        fn set_font_size(&mut self, size: f64) {
            self.calls.push(Call::FontSize(size));
        }

        fn draw_text(&mut self, text: &str, _x: f64, _y: f64) -> Result<(), DocumentError> {
            self.calls.push(Call::Text(text.to_string()));
            Ok(())
        }

        fn save(&mut self, file_name: &str) -> Result<(), DocumentError> {
            self.calls.push(Call::Save(file_name.to_string()));
            Ok(())
        }
    }

    #[test]
    fn test_document_export_drives_layout() {
        let mut layers = LayerStack::new();
        layers.push_bottom(Layer::new(LayerId(1), "Fond", Box::new(PixelSurface::new(30.0, 20.0))));

        let mut layout = RecordingLayout::default();
        let report = compositor()
            .export_document(&layers, "Plan masse", "Echelle 1:500\nNord en haut", &mut layout)
            .unwrap();
        assert_eq!((report.width, report.height), (30, 20));

        assert!(matches!(layout.calls[0], Call::Create(Orientation::Landscape, w, h) if w == 297.0 && h == 210.0));
        assert!(matches!(layout.calls[1], Call::Image(len, _) if len > 0));
        assert_eq!(
            layout.calls[2..],
            [
                Call::FontSize(16.0),
                Call::Text("Plan masse".to_string()),
                Call::FontSize(10.0),
                Call::Text("Echelle 1:500".to_string()),
                Call::Text("Nord en haut".to_string()),
                Call::Save("Plan_masse.pdf".to_string()),
            ]
        );

        // Transparent layers sit on the document background
        let page = decode_raster(&layout.image).unwrap();
        assert_eq!(page.get_pixel(5, 5).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_document_export_propagates_layout_errors() {
        struct Failing;
        impl DocumentLayout for Failing {
            fn create_document(&mut self, _: Orientation, _: f64, _: f64) -> Result<(), DocumentError> {
                Err(DocumentError::Layout("no page".to_string()))
            }
            fn add_image(&mut self, _: &[u8], _: RasterFormat, _: Rect) -> Result<(), DocumentError> {
                Ok(())
            }
            fn set_font_size(&mut self, _: f64) {}
            fn draw_text(&mut self, _: &str, _: f64, _: f64) -> Result<(), DocumentError> {
                Ok(())
            }
            fn save(&mut self, _: &str) -> Result<(), DocumentError> {
                Ok(())
            }
        }

        let mut layers = LayerStack::new();
        layers.push_bottom(Layer::new(LayerId(1), "Fond", Box::new(PixelSurface::new(3.0, 3.0))));
        let result = compositor().export_document(&layers, "t", "", &mut Failing);
        assert!(matches!(result, Err(ExportError::Document(_))));
    }

    #[test]
    fn test_document_export_of_empty_stack_is_rejected() {
        let mut layout = RecordingLayout::default();
        let result = compositor().export_document(&LayerStack::new(), "t", "", &mut layout);
        assert!(matches!(result, Err(ExportError::NoLayers)));
        assert!(layout.calls.is_empty());
    }
}
