//! Transform controller: applies session transitions to the layer stack.

use tracing::{debug, info};

use super::handles::{EligibilityPolicy, Handle, HandleKind, HandlePresenter, HandleRegistry};
use super::resize::LayerGeometry;
use super::session::{transition, Effect, PointerEvent, Session, Transition};
use super::{TransformConfig, Viewport};
use crate::geometry::Point;
use crate::layer::{Layer, LayerId, LayerStack};

/// Receives a save-point request after every completed session.
pub trait CheckpointSink {
    fn force_save(&mut self, layer: &Layer);
}

impl<F: FnMut(&Layer)> CheckpointSink for F {
    fn force_save(&mut self, layer: &Layer) {
        self(layer)
    }
}

/// Owns the session state machine and the handle index.
///
/// The controller is the only geometry writer while a session is active. The
/// layer stack is borrowed per call, so no other writer can exist meanwhile.
pub struct TransformController {
    config: TransformConfig,
    viewport: Viewport,
    session: Session,
    handles: HandleRegistry,
    checkpoint: Box<dyn CheckpointSink>,
}

impl TransformController {
    pub fn new(
        config: TransformConfig,
        presenter: Box<dyn HandlePresenter>,
        checkpoint: Box<dyn CheckpointSink>,
    ) -> Self {
        Self {
            config,
            viewport: Viewport::default(),
            session: Session::Idle,
            handles: HandleRegistry::new(presenter),
            checkpoint,
        }
    }

    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Change the view mapping and move every attached handle accordingly.
    pub fn set_viewport(&mut self, viewport: Viewport, layers: &LayerStack) {
        self.viewport = viewport;
        for id in self.handles.attached_layers() {
            if let Some(layer) = layers.get(id) {
                self.handles
                    .sync(layer, self.config.rotate_handle_offset, &self.viewport);
            }
        }
    }

    /// Handles currently attached to `layer`.
    pub fn handles(&self, layer: LayerId) -> &[Handle] {
        self.handles.handles(layer)
    }

    /// Layers currently holding handles.
    pub fn layers_with_handles(&self) -> Vec<LayerId> {
        self.handles.attached_layers()
    }

    fn eligibility(&self) -> &EligibilityPolicy {
        &self.config.eligibility
    }

    // -- Sessions -------------------------------------------------------------

    /// Start a resize from an edge handle. Returns whether a session started.
    pub fn begin_drag(
        &mut self,
        layers: &LayerStack,
        layer: LayerId,
        handle: HandleKind,
        pointer: Point,
    ) -> bool {
        if !handle.is_edge() {
            debug!(layer = %layer, "begin_drag called with the rotate handle");
            return false;
        }
        self.dispatch_readonly(layers, layer, handle, pointer)
    }

    /// Start a rotation from the rotate handle. Returns whether a session started.
    pub fn begin_rotate(&mut self, layers: &LayerStack, layer: LayerId, pointer: Point) -> bool {
        self.dispatch_readonly(layers, layer, HandleKind::Rotate, pointer)
    }

    fn dispatch_readonly(
        &mut self,
        layers: &LayerStack,
        layer: LayerId,
        handle: HandleKind,
        position: Point,
    ) -> bool {
        let was_idle = self.session.is_idle();
        let t = transition(
            &self.session,
            PointerEvent::Down {
                layer,
                handle,
                position,
            },
            layers,
            &self.viewport,
            self.config.min_size,
        );
        // Pointer-down never produces effects
        debug_assert!(t.effects.is_empty());
        self.session = t.next;
        was_idle && !self.session.is_idle()
    }

    /// Pointer moved. Updates the session layer and its handles.
    pub fn on_pointer_move(&mut self, layers: &mut LayerStack, pointer: Point) {
        self.dispatch(layers, PointerEvent::Move { position: pointer });
    }

    /// Pointer released. Commits the session and requests a checkpoint.
    pub fn on_pointer_up(&mut self, layers: &mut LayerStack) {
        self.dispatch(layers, PointerEvent::Up);
    }

    /// Pointer lost (e.g. capture cancelled). Same as a release.
    pub fn on_pointer_cancel(&mut self, layers: &mut LayerStack) {
        self.dispatch(layers, PointerEvent::Cancel);
    }

    fn dispatch(&mut self, layers: &mut LayerStack, event: PointerEvent) {
        let t = transition(
            &self.session,
            event,
            layers,
            &self.viewport,
            self.config.min_size,
        );
        self.apply(layers, t);
    }

    fn apply(&mut self, layers: &mut LayerStack, t: Transition) {
        self.session = t.next;
        for effect in t.effects {
            match effect {
                Effect::SetGeometry { layer, geometry } => {
                    if let Some(target) = layers.get_mut(layer) {
                        write_geometry(target, &geometry);
                        self.handles
                            .sync(target, self.config.rotate_handle_offset, &self.viewport);
                    }
                }
                Effect::Commit { layer } => {
                    if let Some(target) = layers.get_mut(layer) {
                        target.surface_mut().render_all();
                        info!(
                            layer = %layer,
                            x = target.x,
                            y = target.y,
                            width = target.width(),
                            height = target.height(),
                            angle = target.angle(),
                            "transform committed"
                        );
                        self.checkpoint.force_save(target);
                    }
                }
            }
        }
    }

    // -- Handle visibility ----------------------------------------------------

    /// Re-evaluate handles for single-selection editing.
    ///
    /// Only `active` may keep handles, and only while eligible. Every other
    /// layer loses its handles.
    pub fn refresh_handles(&mut self, layers: &LayerStack, active: Option<LayerId>) {
        self.handles.prune(layers, &self.config.eligibility);
        self.handles.detach_all_except(active);

        let Some(id) = active else {
            return;
        };
        match layers.get(id) {
            Some(layer) if self.eligibility().is_eligible(layer) => {
                self.handles
                    .attach(layer, self.config.rotate_handle_offset, &self.viewport);
            }
            _ => self.handles.detach(id),
        }
    }

    /// Surface handles on every eligible layer, e.g. right after calibration.
    pub fn show_after_calibration(&mut self, layers: &LayerStack) {
        self.handles.prune(layers, &self.config.eligibility);
        for layer in layers.iter() {
            if self.config.eligibility.is_eligible(layer) {
                self.handles
                    .attach(layer, self.config.rotate_handle_offset, &self.viewport);
            }
        }
    }

    /// Remove every handle.
    pub fn reset_handles(&mut self) {
        self.handles.detach_all_except(None);
    }
}

/// Write geometry fields to a layer and redraw its surface.
fn write_geometry(layer: &mut Layer, geometry: &LayerGeometry) {
    layer.x = geometry.x;
    layer.y = geometry.y;
    layer.set_angle(geometry.angle);

    let surface = layer.surface_mut();
    if surface.width() != geometry.width || surface.height() != geometry.height {
        surface.set_dimensions(geometry.width, geometry.height);
    }
    if let Some(scale) = geometry.background_scale {
        surface.set_background_scale(scale.scale_x, scale.scale_y);
    }
    surface.render_all();
}
