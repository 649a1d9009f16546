//! Interactive layer transforms: handles, resize and rotation sessions.
//!
//! This module turns pointer input on on-canvas handles into layer geometry.
//!
//! # Flow
//!
//! 1. Pointer-down on a handle starts a session ([`session::Session`])
//! 2. Each pointer-move produces new geometry, applied immediately
//! 3. Pointer-up commits the geometry and requests a checkpoint
//!
//! # Coordinate System
//!
//! - Pointer events arrive in pointer (screen) space
//! - Layer geometry lives in workspace space
//! - [`Viewport`] converts between the two using the view zoom
//! - Angles are in degrees, positive = clockwise on screen

mod controller;
mod handles;
mod resize;
mod rotation;
mod session;

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

pub use controller::{CheckpointSink, TransformController};
pub use handles::{
    compute_handles, handle_position, EligibilityPolicy, Handle, HandleError, HandleKind,
    HandlePresenter, HandleRegistry,
};
pub use resize::{resize_geometry, BackgroundScale, LayerGeometry};
pub use rotation::rotated_angle;
pub use session::{transition, Effect, PointerEvent, ResizeSession, RotateSession, Session, Transition};

/// Mapping between pointer space and workspace space.
///
/// `pointer = origin + workspace * zoom`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// View zoom factor (> 0).
    pub zoom: f64,
    /// Pointer-space position of the workspace origin.
    pub origin: Point,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            origin: Point::ZERO,
        }
    }
}

impl Viewport {
    pub fn new(zoom: f64, origin: Point) -> Self {
        Self { zoom, origin }
    }

    /// Convert a pointer-space position to workspace coordinates.
    pub fn to_workspace(&self, pointer: Point) -> Point {
        pointer.delta_from(self.origin).unzoom(self.zoom)
    }

    /// Convert a pointer-space delta to a workspace delta.
    pub fn delta_to_workspace(&self, delta: Point) -> Point {
        delta.unzoom(self.zoom)
    }

    /// Convert a workspace position to pointer space.
    pub fn to_screen(&self, workspace: Point) -> Point {
        let zoom = if self.zoom.is_finite() && self.zoom > 0.0 {
            self.zoom
        } else {
            1.0
        };
        Point::new(
            self.origin.x + workspace.x * zoom,
            self.origin.y + workspace.y * zoom,
        )
    }
}

/// Transform controller settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Smallest width/height a resize handle can produce.
    pub min_size: f64,
    /// Distance between the top edge and the rotate handle.
    pub rotate_handle_offset: f64,
    pub eligibility: EligibilityPolicy,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            min_size: 100.0,
            rotate_handle_offset: 30.0,
            eligibility: EligibilityPolicy::default(),
        }
    }
}
