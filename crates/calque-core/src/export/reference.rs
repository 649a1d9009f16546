//! Reference layer selection and output size inference.

use tracing::debug;

use super::ExportPolicy;
use crate::layer::{Layer, LayerStack};

/// Layer whose raster seeds the output size.
///
/// First match wins:
/// 1. a layer whose name contains the cropped-plan marker
/// 2. the drawing layer
/// 3. the first layer of the stack
/// 4. the last layer of the stack
///
/// Returns `None` only for an empty stack.
pub fn select_reference_layer<'a>(
    layers: &'a LayerStack,
    policy: &ExportPolicy,
) -> Option<&'a Layer> {
    layers
        .iter()
        .find(|l| l.name.contains(policy.cropped_plan_marker.as_str()))
        .or_else(|| layers.find_by_name(&policy.drawing_layer_name))
        .or_else(|| layers.first())
        .or_else(|| layers.last())
}

/// Output size derived from the reference layer, in pixels.
///
/// Each axis is corrected on its own: when the raster is above the large-size
/// threshold and the scaled background is smaller than it by more than the
/// tolerance, the background size wins. Oversized rasters around a smaller
/// plan would otherwise export mostly empty space. A background that scales
/// below one pixel never replaces the raster size.
pub fn infer_dimensions(reference: &Layer, policy: &ExportPolicy) -> (f64, f64) {
    let (mut width, mut height) = (reference.width(), reference.height());

    if let Some(bg) = reference.background() {
        let (bg_width, bg_height) = (bg.scaled_width(), bg.scaled_height());
        if corrects(width, bg_width, policy) {
            debug!(raster = width, background = bg_width, "width corrected to background");
            width = bg_width;
        }
        if corrects(height, bg_height, policy) {
            debug!(raster = height, background = bg_height, "height corrected to background");
            height = bg_height;
        }
    }

    (width, height)
}

#[inline]
fn corrects(raster: f64, background: f64, policy: &ExportPolicy) -> bool {
    background >= 1.0
        && raster > policy.large_size_threshold
        && raster - background > policy.size_tolerance
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::testing::SizedSurface;
    use crate::layer::{LayerId, CROPPED_PLAN_NAME, DRAWING_LAYER_NAME};

    fn layer(id: u32, name: &str) -> Layer {
        Layer::new(LayerId(id), name, Box::new(SizedSurface::new(100.0, 100.0)))
    }

    fn reference(surface: SizedSurface) -> Layer {
        Layer::new(LayerId(1), CROPPED_PLAN_NAME, Box::new(surface))
    }

    fn stack(names: &[&str]) -> LayerStack {
        let mut layers = LayerStack::new();
        for (i, name) in names.iter().enumerate() {
            layers.push_bottom(layer(i as u32 + 1, name));
        }
        layers
    }

    fn reference_name(layers: &LayerStack) -> Option<String> {
        select_reference_layer(layers, &ExportPolicy::default()).map(|l| l.name.clone())
    }

    #[test]
    fn test_cropped_plan_wins() {
        let layers = stack(&["Background", CROPPED_PLAN_NAME, DRAWING_LAYER_NAME]);
        assert_eq!(reference_name(&layers).as_deref(), Some(CROPPED_PLAN_NAME));
    }

    #[test]
    fn test_marker_match_is_a_substring() {
        let layers = stack(&["Background", "Plan rogné (2)"]);
        assert_eq!(reference_name(&layers).as_deref(), Some("Plan rogné (2)"));
    }

    #[test]
    fn test_falls_through_to_drawing_layer() {
        let layers = stack(&["Background", DRAWING_LAYER_NAME]);
        assert_eq!(reference_name(&layers).as_deref(), Some(DRAWING_LAYER_NAME));
    }

    #[test]
    fn test_falls_through_to_first_layer() {
        let layers = stack(&["Background", "Vue drone"]);
        assert_eq!(reference_name(&layers).as_deref(), Some("Background"));
    }

    #[test]
    fn test_empty_stack_has_no_reference() {
        assert!(reference_name(&LayerStack::new()).is_none());
    }

    #[test]
    fn test_large_raster_shrinks_to_background() {
        let reference = reference(SizedSurface::new(5000.0, 4500.0).with_background(300.0, 200.0, 10.0));
        assert_eq!(infer_dimensions(&reference, &ExportPolicy::default()), (3000.0, 2000.0));
    }

    #[test]
    fn test_small_raster_is_not_corrected() {
        let reference = reference(SizedSurface::new(3000.0, 3000.0).with_background(100.0, 100.0, 10.0));
        assert_eq!(infer_dimensions(&reference, &ExportPolicy::default()), (3000.0, 3000.0));
    }

    #[test]
    fn test_difference_within_tolerance_is_kept() {
        let reference = reference(SizedSurface::new(5000.0, 100.0).with_background(4995.0, 10.0, 1.0));
        assert_eq!(infer_dimensions(&reference, &ExportPolicy::default()), (5000.0, 100.0));
    }

    #[test]
    fn test_vanishing_background_scale_is_ignored() {
        let reference = reference(SizedSurface::new(5000.0, 4500.0).with_background(300.0, 200.0, 0.001));
        assert_eq!(infer_dimensions(&reference, &ExportPolicy::default()), (5000.0, 4500.0));
    }

    #[test]
    fn test_no_background_keeps_raster_size() {
        let reference = reference(SizedSurface::new(8000.0, 6000.0));
        assert_eq!(infer_dimensions(&reference, &ExportPolicy::default()), (8000.0, 6000.0));
    }
}
