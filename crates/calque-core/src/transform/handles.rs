//! On-canvas handles: placement, eligibility and the layer → handle index.
//!
//! # Placement
//!
//! Each handle has a fixed offset from the layer center in the layer's own
//! (unrotated) frame:
//!
//! ```text
//! left   (-w/2, 0)          right  (w/2, 0)
//! top    (0, -h/2)          bottom (0, h/2)
//! rotate (0, -h/2 - offset)
//! ```
//!
//! The workspace position is `center + R(θ) · offset`. Handle visuals are
//! rotated by θ as well so their edges stay parallel to the layer boundary.
//!
//! # Presentation
//!
//! The engine never creates visual nodes. [`HandleRegistry`] keeps the
//! `LayerId → [Handle]` association and notifies a [`HandlePresenter`]
//! whenever the handle set of a layer changes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::Viewport;
use crate::geometry::{rotate_vector, Point};
use crate::layer::{Layer, LayerId, LayerStack, CROPPED_PLAN_NAME, DRAWING_LAYER_NAME};

/// Errors reported by a handle presenter.
#[derive(Debug, Error)]
pub enum HandleError {
    /// The container the handles should be attached to does not exist.
    #[error("Handle container missing for layer {layer}")]
    MissingContainer { layer: LayerId },
}

/// Handle role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleKind {
    Left,
    Right,
    Top,
    Bottom,
    Rotate,
}

impl HandleKind {
    /// All handles, in attachment order.
    pub const ALL: [HandleKind; 5] = [
        HandleKind::Left,
        HandleKind::Right,
        HandleKind::Top,
        HandleKind::Bottom,
        HandleKind::Rotate,
    ];

    /// Parse the lowercase handle name used by front-ends.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "left" => Some(HandleKind::Left),
            "right" => Some(HandleKind::Right),
            "top" => Some(HandleKind::Top),
            "bottom" => Some(HandleKind::Bottom),
            "rotate" => Some(HandleKind::Rotate),
            _ => None,
        }
    }

    /// True for the four resize handles.
    pub fn is_edge(self) -> bool {
        !matches!(self, HandleKind::Rotate)
    }

    /// True for handles that change the width.
    pub fn is_horizontal(self) -> bool {
        matches!(self, HandleKind::Left | HandleKind::Right)
    }

    /// Offset from the layer center in the layer's unrotated frame.
    pub fn local_offset(self, width: f64, height: f64, rotate_offset: f64) -> Point {
        match self {
            HandleKind::Left => Point::new(-width / 2.0, 0.0),
            HandleKind::Right => Point::new(width / 2.0, 0.0),
            HandleKind::Top => Point::new(0.0, -height / 2.0),
            HandleKind::Bottom => Point::new(0.0, height / 2.0),
            HandleKind::Rotate => Point::new(0.0, -height / 2.0 - rotate_offset),
        }
    }
}

/// A handle as seen by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Handle {
    pub layer: LayerId,
    pub kind: HandleKind,
    /// Position in workspace coordinates.
    pub position: Point,
    /// Position in pointer (screen) coordinates.
    pub screen_position: Point,
    /// Rotation of the handle visual, in degrees.
    pub angle: f64,
}

/// Workspace position of one handle of a layer.
pub fn handle_position(layer: &Layer, kind: HandleKind, rotate_offset: f64) -> Point {
    let local = kind.local_offset(layer.width(), layer.height(), rotate_offset);
    layer.center().offset(rotate_vector(local, layer.angle()))
}

/// Every handle of a layer, in [`HandleKind::ALL`] order.
pub fn compute_handles(layer: &Layer, rotate_offset: f64, viewport: &Viewport) -> Vec<Handle> {
    HandleKind::ALL
        .iter()
        .map(|&kind| {
            let position = handle_position(layer, kind, rotate_offset);
            Handle {
                layer: layer.id,
                kind,
                position,
                screen_position: viewport.to_screen(position),
                angle: layer.angle(),
            }
        })
        .collect()
}

/// Naming rules deciding which layers may be transformed interactively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityPolicy {
    /// Layer name that never receives handles.
    pub drawing_layer_name: String,
    /// A layer is transformable when its name contains one of these.
    pub eligible_name_markers: Vec<String>,
}

impl Default for EligibilityPolicy {
    fn default() -> Self {
        Self {
            drawing_layer_name: DRAWING_LAYER_NAME.to_string(),
            eligible_name_markers: vec!["Vue drone".to_string(), CROPPED_PLAN_NAME.to_string()],
        }
    }
}

impl EligibilityPolicy {
    /// Whether `layer` may hold transform handles.
    ///
    /// Requires: not the drawing layer, a matching name, calibration and a
    /// background raster.
    pub fn is_eligible(&self, layer: &Layer) -> bool {
        layer.name != self.drawing_layer_name
            && self
                .eligible_name_markers
                .iter()
                .any(|marker| layer.name.contains(marker.as_str()))
            && layer.calibrated
            && layer.background().is_some()
    }
}

/// Receives handle set changes. Implemented by the front-end.
pub trait HandlePresenter {
    /// The handle set of `layer` was created or moved.
    fn show(&mut self, layer: LayerId, handles: &[Handle]) -> Result<(), HandleError>;

    /// The handles of `layer` were removed.
    fn hide(&mut self, layer: LayerId);
}

/// Index of the handles currently attached to layers.
pub struct HandleRegistry {
    presenter: Box<dyn HandlePresenter>,
    attached: BTreeMap<LayerId, Vec<Handle>>,
}

impl HandleRegistry {
    pub fn new(presenter: Box<dyn HandlePresenter>) -> Self {
        Self {
            presenter,
            attached: BTreeMap::new(),
        }
    }

    /// Handles attached to `layer`, empty if none.
    pub fn handles(&self, layer: LayerId) -> &[Handle] {
        self.attached.get(&layer).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_handles(&self, layer: LayerId) -> bool {
        self.attached.contains_key(&layer)
    }

    /// Layers currently holding handles, in id order.
    pub fn attached_layers(&self) -> Vec<LayerId> {
        self.attached.keys().copied().collect()
    }

    /// Create or reposition the handles of `layer`.
    ///
    /// A presenter failure is logged and leaves the layer without handles.
    pub fn attach(&mut self, layer: &Layer, rotate_offset: f64, viewport: &Viewport) -> bool {
        let handles = compute_handles(layer, rotate_offset, viewport);
        match self.presenter.show(layer.id, &handles) {
            Ok(()) => {
                self.attached.insert(layer.id, handles);
                true
            }
            Err(err) => {
                warn!(layer = %layer.id, error = %err, "handles not attached");
                self.attached.remove(&layer.id);
                false
            }
        }
    }

    /// Reposition the handles of `layer` if it has any.
    pub fn sync(&mut self, layer: &Layer, rotate_offset: f64, viewport: &Viewport) {
        if self.has_handles(layer.id) {
            self.attach(layer, rotate_offset, viewport);
        }
    }

    /// Remove the handles of `layer`.
    pub fn detach(&mut self, layer: LayerId) {
        if self.attached.remove(&layer).is_some() {
            debug!(layer = %layer, "handles detached");
            self.presenter.hide(layer);
        }
    }

    /// Remove the handles of every layer except `keep`.
    pub fn detach_all_except(&mut self, keep: Option<LayerId>) {
        let doomed: Vec<LayerId> = self
            .attached
            .keys()
            .copied()
            .filter(|id| Some(*id) != keep)
            .collect();
        for id in doomed {
            self.detach(id);
        }
    }

    /// Remove handles of layers that vanished or lost eligibility.
    pub fn prune(&mut self, layers: &LayerStack, policy: &EligibilityPolicy) {
        let doomed: Vec<LayerId> = self
            .attached
            .keys()
            .copied()
            .filter(|id| !layers.get(*id).is_some_and(|l| policy.is_eligible(l)))
            .collect();
        for id in doomed {
            self.detach(id);
        }
    }
}
