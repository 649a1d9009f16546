//! In-memory retained-mode surface.
//!
//! Holds an optional background image and a list of filled rectangular
//! objects. Rendering draws the background resampled by its scale factors at
//! the origin, then fills each visible object in insertion order.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect as PixelRect;

use super::surface::{BackgroundRaster, RenderSurface, SurfaceError, SurfaceObject};
use crate::encode::{encode_raster, RasterFormat};
use crate::geometry::Rect;

#[derive(Debug, Clone)]
struct Background {
    image: RgbaImage,
    scale_x: f64,
    scale_y: f64,
}

#[derive(Debug, Clone)]
struct FilledObject {
    bounds: Rect,
    fill: Rgba<u8>,
    visible: bool,
}

/// A [`RenderSurface`] backed by `image` buffers.
#[derive(Debug, Clone)]
pub struct PixelSurface {
    width: f64,
    height: f64,
    background: Option<Background>,
    objects: Vec<FilledObject>,
    /// Last frame produced by `render_all`.
    frame: RgbaImage,
}

impl PixelSurface {
    /// Create an empty transparent surface.
    pub fn new(width: f64, height: f64) -> Self {
        let mut surface = Self {
            width: width.max(1.0),
            height: height.max(1.0),
            background: None,
            objects: Vec::new(),
            frame: RgbaImage::new(1, 1),
        };
        surface.render_all();
        surface
    }

    /// Set the background image with its scale factors.
    pub fn set_background(&mut self, image: RgbaImage, scale_x: f64, scale_y: f64) {
        self.background = Some(Background {
            image,
            scale_x,
            scale_y,
        });
    }

    pub fn with_background(mut self, image: RgbaImage, scale_x: f64, scale_y: f64) -> Self {
        self.set_background(image, scale_x, scale_y);
        self.render_all();
        self
    }

    /// Add a filled rectangle on top of the existing content.
    pub fn add_rect(&mut self, bounds: Rect, fill: [u8; 4]) {
        self.objects.push(FilledObject {
            bounds,
            fill: Rgba(fill),
            visible: true,
        });
    }

    pub fn with_rect(mut self, bounds: Rect, fill: [u8; 4]) -> Self {
        self.add_rect(bounds, fill);
        self.render_all();
        self
    }

    /// Show or hide the object at `index`. Returns false if it does not exist.
    pub fn set_object_visible(&mut self, index: usize, visible: bool) -> bool {
        match self.objects.get_mut(index) {
            Some(obj) => {
                obj.visible = visible;
                true
            }
            None => false,
        }
    }

    /// The frame produced by the last [`RenderSurface::render_all`].
    pub fn frame(&self) -> &RgbaImage {
        &self.frame
    }

    fn pixel_size(&self) -> (u32, u32) {
        (
            self.width.round().max(1.0) as u32,
            self.height.round().max(1.0) as u32,
        )
    }

    fn rasterize(&self) -> RgbaImage {
        let (w, h) = self.pixel_size();
        let mut canvas = RgbaImage::new(w, h);

        if let Some(bg) = &self.background {
            let bw = (bg.image.width() as f64 * bg.scale_x).round();
            let bh = (bg.image.height() as f64 * bg.scale_y).round();
            if bw >= 1.0 && bh >= 1.0 {
                let scaled = if bw as u32 == bg.image.width() && bh as u32 == bg.image.height() {
                    bg.image.clone()
                } else {
                    imageops::resize(&bg.image, bw as u32, bh as u32, FilterType::Triangle)
                };
                imageops::overlay(&mut canvas, &scaled, 0, 0);
            }
        }

        for obj in self.objects.iter().filter(|o| o.visible) {
            fill_rect(&mut canvas, &obj.bounds, obj.fill);
        }

        canvas
    }
}

/// Fill `bounds` (clipped to the canvas, snapped outwards to whole pixels).
pub(crate) fn fill_rect(canvas: &mut RgbaImage, bounds: &Rect, color: Rgba<u8>) {
    let clipped = bounds.clamp_to(canvas.width() as f64, canvas.height() as f64);
    let left = clipped.left.floor();
    let top = clipped.top.floor();
    let width = (clipped.right().ceil() - left) as u32;
    let height = (clipped.bottom().ceil() - top) as u32;
    if width == 0 || height == 0 {
        return;
    }
    let rect = PixelRect::at(left as i32, top as i32).of_size(width, height);
    draw_filled_rect_mut(canvas, rect, color);
}

impl RenderSurface for PixelSurface {
    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn set_dimensions(&mut self, width: f64, height: f64) {
        self.width = width.max(1.0);
        self.height = height.max(1.0);
    }

    fn background(&self) -> Option<BackgroundRaster> {
        self.background.as_ref().map(|bg| BackgroundRaster {
            scale_x: bg.scale_x,
            scale_y: bg.scale_y,
            natural_width: bg.image.width() as f64,
            natural_height: bg.image.height() as f64,
        })
    }

    fn set_background_scale(&mut self, scale_x: f64, scale_y: f64) {
        if let Some(bg) = self.background.as_mut() {
            bg.scale_x = scale_x;
            bg.scale_y = scale_y;
        }
    }

    fn visible_objects(&self) -> Vec<SurfaceObject> {
        self.objects
            .iter()
            .filter(|o| o.visible)
            .map(|o| SurfaceObject {
                bounds: o.bounds,
                visible: o.visible,
            })
            .collect()
    }

    fn snapshot(&self, format: RasterFormat) -> Result<Vec<u8>, SurfaceError> {
        Ok(encode_raster(&self.rasterize(), format)?)
    }

    fn render_all(&mut self) {
        self.frame = self.rasterize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode_raster;

    #[test]
    fn test_new_surface_is_transparent() {
        let s = PixelSurface::new(4.0, 3.0);
        assert_eq!(s.frame().dimensions(), (4, 3));
        assert!(s.frame().pixels().all(|p| p.0[3] == 0));
        assert!(s.background().is_none());
    }

    #[test]
    fn test_filled_rect_is_rendered() {
        let s = PixelSurface::new(10.0, 10.0).with_rect(Rect::new(2.0, 2.0, 3.0, 3.0), [255, 0, 0, 255]);
        assert_eq!(s.frame().get_pixel(3, 3).0, [255, 0, 0, 255]);
        assert_eq!(s.frame().get_pixel(0, 0).0[3], 0);
        assert_eq!(s.frame().get_pixel(5, 5).0[3], 0);
    }

    #[test]
    fn test_rect_outside_surface_is_ignored() {
        let s = PixelSurface::new(10.0, 10.0).with_rect(Rect::new(50.0, 50.0, 3.0, 3.0), [255, 0, 0, 255]);
        assert!(s.frame().pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn test_hidden_objects_are_not_listed() {
        let mut s = PixelSurface::new(10.0, 10.0);
        s.add_rect(Rect::new(0.0, 0.0, 1.0, 1.0), [0, 0, 0, 255]);
        s.add_rect(Rect::new(5.0, 5.0, 1.0, 1.0), [0, 0, 0, 255]);
        assert!(s.set_object_visible(0, false));
        assert!(!s.set_object_visible(9, false));

        let objects = s.visible_objects();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].bounds.left, 5.0);
    }

    #[test]
    fn test_background_scale_round_trip() {
        let bg = RgbaImage::from_pixel(40, 20, Rgba([0, 0, 255, 255]));
        let mut s = PixelSurface::new(40.0, 20.0).with_background(bg, 1.0, 1.0);
        s.set_background_scale(0.5, 2.0);

        let info = s.background().unwrap();
        assert_eq!(info.natural_width, 40.0);
        assert_eq!(info.scaled_width(), 20.0);
        assert_eq!(info.scaled_height(), 40.0);
    }

    #[test]
    fn test_background_drawn_at_scale() {
        let bg = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 255, 255]));
        let mut s = PixelSurface::new(20.0, 20.0).with_background(bg, 1.0, 1.0);
        assert_eq!(s.frame().get_pixel(15, 15).0[3], 0);

        s.set_background_scale(2.0, 2.0);
        s.render_all();
        assert_eq!(s.frame().get_pixel(15, 15).0, [0, 0, 255, 255]);
    }

    #[test]
    fn test_snapshot_decodes_to_frame() {
        let mut s = PixelSurface::new(8.0, 6.0).with_rect(Rect::new(0.0, 0.0, 8.0, 6.0), [10, 20, 30, 255]);
        s.set_dimensions(8.0, 6.0);
        let bytes = s.snapshot(RasterFormat::Png).unwrap();
        let decoded = decode_raster(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (8, 6));
        assert_eq!(decoded.get_pixel(4, 3).0, [10, 20, 30, 255]);
    }

    #[test]
    fn test_dimensions_never_below_one() {
        let mut s = PixelSurface::new(0.0, -5.0);
        assert_eq!(s.width(), 1.0);
        assert_eq!(s.height(), 1.0);
        s.set_dimensions(-1.0, 0.2);
        assert_eq!(s.width(), 1.0);
        assert_eq!(s.height(), 1.0);
    }
}
