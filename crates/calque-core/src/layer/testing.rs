//! Lightweight surfaces for tests that never need real pixels.

use super::surface::{BackgroundRaster, RenderSurface, SurfaceError, SurfaceObject};
use crate::encode::RasterFormat;

/// Dimensions and metadata only. Snapshots return the configured bytes.
#[derive(Debug, Clone, Default)]
pub struct SizedSurface {
    pub width: f64,
    pub height: f64,
    pub background: Option<BackgroundRaster>,
    pub objects: Vec<SurfaceObject>,
    pub snapshot: Option<Vec<u8>>,
}

impl SizedSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn with_background(mut self, natural_width: f64, natural_height: f64, scale: f64) -> Self {
        self.background = Some(BackgroundRaster {
            scale_x: scale,
            scale_y: scale,
            natural_width,
            natural_height,
        });
        self
    }

    pub fn with_snapshot(mut self, bytes: Vec<u8>) -> Self {
        self.snapshot = Some(bytes);
        self
    }
}

impl RenderSurface for SizedSurface {
    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn set_dimensions(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    fn background(&self) -> Option<BackgroundRaster> {
        self.background
    }

    fn set_background_scale(&mut self, scale_x: f64, scale_y: f64) {
        if let Some(bg) = self.background.as_mut() {
            bg.scale_x = scale_x;
            bg.scale_y = scale_y;
        }
    }

    fn visible_objects(&self) -> Vec<SurfaceObject> {
        self.objects.iter().copied().filter(|o| o.visible).collect()
    }

    fn snapshot(&self, _format: RasterFormat) -> Result<Vec<u8>, SurfaceError> {
        self.snapshot
            .clone()
            .ok_or_else(|| SurfaceError::Unavailable("no snapshot configured".to_string()))
    }

    fn render_all(&mut self) {}
}
