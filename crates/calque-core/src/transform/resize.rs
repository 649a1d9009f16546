//! Rotation-aware resize from edge handles.
//!
//! # Algorithm
//!
//! The pointer delta (already in workspace units) is projected onto the
//! layer's rotated axes:
//!
//! ```text
//! proj_dx =  dx * cos(θ) + dy * sin(θ)
//! proj_dy = -dx * sin(θ) + dy * cos(θ)
//! ```
//!
//! Trailing handles (`right`, `bottom`) grow by the projected component,
//! leading handles (`left`, `top`) by its negation. The center then moves by
//! half of the applied size change along the same rotated axis, towards the
//! dragged edge, which keeps the opposite edge fixed in workspace space.
//!
//! Everything is derived from the geometry captured when the drag started, so
//! repeated pointer moves never accumulate rounding error.

use serde::{Deserialize, Serialize};

use super::HandleKind;
use crate::geometry::{project_onto_axes, rotate_vector, Point};
use crate::layer::Layer;

/// Smallest dimension a resize can produce.
const MIN_DIMENSION: f64 = 1.0;

/// Background raster scale factors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BackgroundScale {
    pub scale_x: f64,
    pub scale_y: f64,
}

/// The mutable geometry of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerGeometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub angle: f64,
    pub background_scale: Option<BackgroundScale>,
}

impl LayerGeometry {
    /// Capture the current geometry of a layer.
    pub fn of(layer: &Layer) -> Self {
        Self {
            x: layer.x,
            y: layer.y,
            width: layer.width(),
            height: layer.height(),
            angle: layer.angle(),
            background_scale: layer.background().map(|bg| BackgroundScale {
                scale_x: bg.scale_x,
                scale_y: bg.scale_y,
            }),
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Workspace position of the middle of an edge (or the rotate anchor).
    pub fn edge_midpoint(&self, kind: HandleKind) -> Point {
        let local = kind.local_offset(self.width, self.height, 0.0);
        self.center().offset(rotate_vector(local, self.angle))
    }
}

/// Geometry after dragging `handle` by `delta` workspace units from `start`.
///
/// The dragged dimension never goes below `min_size`, nor below one unit
/// whatever the configured floor. `Rotate` is not a resize handle and
/// returns `start` unchanged.
pub fn resize_geometry(
    start: &LayerGeometry,
    handle: HandleKind,
    delta: Point,
    min_size: f64,
) -> LayerGeometry {
    let floor = min_size.max(MIN_DIMENSION);
    let projected = project_onto_axes(delta, start.angle);

    // (size change requested, direction of the dragged edge)
    let (requested, sign) = match handle {
        HandleKind::Right => (projected.x, 1.0),
        HandleKind::Left => (-projected.x, -1.0),
        HandleKind::Bottom => (projected.y, 1.0),
        HandleKind::Top => (-projected.y, -1.0),
        HandleKind::Rotate => return *start,
    };

    let mut next = *start;
    let shift_local = if handle.is_horizontal() {
        next.width = (start.width + requested).max(floor);
        Point::new(sign * (next.width - start.width) / 2.0, 0.0)
    } else {
        next.height = (start.height + requested).max(floor);
        Point::new(0.0, sign * (next.height - start.height) / 2.0)
    };

    let center = start.center().offset(rotate_vector(shift_local, start.angle));
    next.x = center.x - next.width / 2.0;
    next.y = center.y - next.height / 2.0;

    if let Some(scale) = start.background_scale {
        next.background_scale = Some(if handle.is_horizontal() {
            BackgroundScale {
                scale_x: rescale(scale.scale_x, start.width, next.width),
                scale_y: scale.scale_y,
            }
        } else {
            BackgroundScale {
                scale_x: scale.scale_x,
                scale_y: rescale(scale.scale_y, start.height, next.height),
            }
        });
    }

    next
}

#[inline]
fn rescale(scale: f64, old: f64, new: f64) -> f64 {
    if old > 0.0 {
        scale * new / old
    } else {
        scale
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
