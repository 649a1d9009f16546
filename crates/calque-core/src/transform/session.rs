//! Drag / rotate session state machine.
//!
//! ```text
//! Idle --Down(edge)---> DraggingResize --Up|Cancel--> Idle
//! Idle --Down(rotate)-> Rotating       --Up|Cancel--> Idle
//! ```
//!
//! [`transition`] is pure: it reads the layer stack, never writes it, and
//! returns the next state together with the effects the caller must apply.
//! A session whose layer disappeared falls back to `Idle` with no effects.

use tracing::debug;

use super::handles::HandleKind;
use super::resize::{resize_geometry, LayerGeometry};
use super::rotation::rotated_angle;
use super::Viewport;
use crate::geometry::{pointer_angle, Point};
use crate::layer::{LayerId, LayerStack};

/// State captured when a resize drag starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeSession {
    pub layer: LayerId,
    pub handle: HandleKind,
    /// Pointer position at pointer-down (pointer space).
    pub start_pointer: Point,
    pub start: LayerGeometry,
}

/// State captured when a rotation starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotateSession {
    pub layer: LayerId,
    /// Pointer position at pointer-down (pointer space).
    pub start_pointer: Point,
    pub start_angle: f64,
    /// Layer center in workspace coordinates.
    pub center: Point,
    /// Angle of the pointer around the center at pointer-down (degrees).
    pub initial_pointer_angle: f64,
}

/// Interactive manipulation state. At most one session exists at a time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Session {
    #[default]
    Idle,
    DraggingResize(ResizeSession),
    Rotating(RotateSession),
}

impl Session {
    pub fn is_idle(&self) -> bool {
        matches!(self, Session::Idle)
    }

    /// Layer mutated by the active session.
    pub fn layer(&self) -> Option<LayerId> {
        match self {
            Session::Idle => None,
            Session::DraggingResize(s) => Some(s.layer),
            Session::Rotating(s) => Some(s.layer),
        }
    }
}

/// Pointer input, in pointer (screen) coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// Pointer pressed on a handle of `layer`.
    Down {
        layer: LayerId,
        handle: HandleKind,
        position: Point,
    },
    Move { position: Point },
    Up,
    Cancel,
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    /// Write new geometry to the layer and redraw it.
    SetGeometry { layer: LayerId, geometry: LayerGeometry },
    /// Session finished: flush the layer and request a checkpoint.
    Commit { layer: LayerId },
}

/// Result of a transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub next: Session,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn to(next: Session) -> Self {
        Self {
            next,
            effects: Vec::new(),
        }
    }

    fn with(next: Session, effect: Effect) -> Self {
        Self {
            next,
            effects: vec![effect],
        }
    }
}

/// Compute the next session state for a pointer event.
pub fn transition(
    state: &Session,
    event: PointerEvent,
    layers: &LayerStack,
    viewport: &Viewport,
    min_size: f64,
) -> Transition {
    match (state, event) {
        (
            Session::Idle,
            PointerEvent::Down {
                layer,
                handle,
                position,
            },
        ) => Transition::to(begin(layer, handle, position, layers, viewport)),

        // A second pointer-down never starts a concurrent session
        (_, PointerEvent::Down { .. }) => Transition::to(*state),

        (Session::DraggingResize(session), PointerEvent::Move { position }) => {
            if layers.get(session.layer).is_none() {
                debug!(layer = %session.layer, "resize target vanished, session abandoned");
                return Transition::to(Session::Idle);
            }
            let delta = viewport.delta_to_workspace(position.delta_from(session.start_pointer));
            let geometry = resize_geometry(&session.start, session.handle, delta, min_size);
            Transition::with(
                *state,
                Effect::SetGeometry {
                    layer: session.layer,
                    geometry,
                },
            )
        }

        (Session::Rotating(session), PointerEvent::Move { position }) => {
            let Some(layer) = layers.get(session.layer) else {
                debug!(layer = %session.layer, "rotate target vanished, session abandoned");
                return Transition::to(Session::Idle);
            };
            let angle = rotated_angle(
                session.start_angle,
                session.center,
                session.initial_pointer_angle,
                viewport.to_workspace(position),
            );
            let mut geometry = LayerGeometry::of(layer);
            geometry.angle = angle;
            Transition::with(
                *state,
                Effect::SetGeometry {
                    layer: session.layer,
                    geometry,
                },
            )
        }

        (Session::Idle, PointerEvent::Move { .. }) => Transition::to(Session::Idle),

        (_, PointerEvent::Up | PointerEvent::Cancel) => match state.layer() {
            Some(layer) if layers.get(layer).is_some() => {
                Transition::with(Session::Idle, Effect::Commit { layer })
            }
            _ => Transition::to(Session::Idle),
        },
    }
}

fn begin(
    layer_id: LayerId,
    handle: HandleKind,
    pointer: Point,
    layers: &LayerStack,
    viewport: &Viewport,
) -> Session {
    let Some(layer) = layers.get(layer_id) else {
        debug!(layer = %layer_id, "pointer-down on a stale handle ignored");
        return Session::Idle;
    };

    match handle {
        HandleKind::Rotate => {
            let center = layer.center();
            Session::Rotating(RotateSession {
                layer: layer_id,
                start_pointer: pointer,
                start_angle: layer.angle(),
                center,
                initial_pointer_angle: pointer_angle(center, viewport.to_workspace(pointer)),
            })
        }
        edge => Session::DraggingResize(ResizeSession {
            layer: layer_id,
            handle: edge,
            start_pointer: pointer,
            start: LayerGeometry::of(layer),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{Layer, PixelSurface};

    fn stack() -> LayerStack {
        let mut layers = LayerStack::new();
        layers.push_top(
            Layer::new(LayerId(1), "Vue drone", Box::new(PixelSurface::new(400.0, 200.0)))
                .with_position(100.0, 100.0),
        );
        layers
    }

    fn down(handle: HandleKind, x: f64, y: f64) -> PointerEvent {
        PointerEvent::Down {
            layer: LayerId(1),
            handle,
            position: Point::new(x, y),
        }
    }

    fn step(state: &Session, event: PointerEvent, layers: &LayerStack) -> Transition {
        transition(state, event, layers, &Viewport::default(), 100.0)
    }

    #[test]
    fn test_down_on_edge_starts_resize() {
        let layers = stack();
        let t = step(&Session::Idle, down(HandleKind::Right, 500.0, 200.0), &layers);
        assert!(t.effects.is_empty());
        match t.next {
            Session::DraggingResize(s) => {
                assert_eq!(s.handle, HandleKind::Right);
                assert_eq!(s.start.width, 400.0);
                assert_eq!(s.start_pointer, Point::new(500.0, 200.0));
            }
            other => panic!("expected resize session, got {:?}", other),
        }
    }

    #[test]
    fn test_down_on_rotate_starts_rotation() {
        let layers = stack();
        let t = step(&Session::Idle, down(HandleKind::Rotate, 300.0, 70.0), &layers);
        match t.next {
            Session::Rotating(s) => {
                assert_eq!(s.center, Point::new(300.0, 200.0));
                assert!((s.initial_pointer_angle + 90.0).abs() < 1e-9);
            }
            other => panic!("expected rotate session, got {:?}", other),
        }
    }

    #[test]
    fn test_down_on_missing_layer_stays_idle() {
        let layers = LayerStack::new();
        let t = step(&Session::Idle, down(HandleKind::Left, 0.0, 0.0), &layers);
        assert_eq!(t.next, Session::Idle);
        assert!(t.effects.is_empty());
    }

    #[test]
    fn test_second_down_is_ignored() {
        let layers = stack();
        let resizing = step(&Session::Idle, down(HandleKind::Right, 500.0, 200.0), &layers).next;
        let t = step(&resizing, down(HandleKind::Rotate, 0.0, 0.0), &layers);
        assert_eq!(t.next, resizing);
    }

    #[test]
    fn test_move_emits_geometry_from_start_state() {
        let layers = stack();
        let resizing = step(&Session::Idle, down(HandleKind::Right, 500.0, 200.0), &layers).next;

        // Two moves to the same point give the same geometry
        let a = step(&resizing, PointerEvent::Move { position: Point::new(560.0, 200.0) }, &layers);
        let b = step(&a.next, PointerEvent::Move { position: Point::new(560.0, 200.0) }, &layers);
        assert_eq!(a.effects, b.effects);

        match a.effects.as_slice() {
            [Effect::SetGeometry { geometry, .. }] => assert_eq!(geometry.width, 460.0),
            other => panic!("unexpected effects {:?}", other),
        }
    }

    #[test]
    fn test_zoom_scales_resize_delta() {
        let layers = stack();
        let viewport = Viewport::new(2.0, Point::ZERO);
        let resizing = transition(&Session::Idle, down(HandleKind::Bottom, 600.0, 600.0), &layers, &viewport, 100.0).next;
        let t = transition(
            &resizing,
            PointerEvent::Move { position: Point::new(600.0, 700.0) },
            &layers,
            &viewport,
            100.0,
        );
        match t.effects.as_slice() {
            [Effect::SetGeometry { geometry, .. }] => assert_eq!(geometry.height, 250.0),
            other => panic!("unexpected effects {:?}", other),
        }
    }

    #[test]
    fn test_up_commits_and_returns_to_idle() {
        let layers = stack();
        let rotating = step(&Session::Idle, down(HandleKind::Rotate, 300.0, 70.0), &layers).next;
        let t = step(&rotating, PointerEvent::Up, &layers);
        assert_eq!(t.next, Session::Idle);
        assert_eq!(t.effects, vec![Effect::Commit { layer: LayerId(1) }]);

        let t = step(&rotating, PointerEvent::Cancel, &layers);
        assert_eq!(t.effects, vec![Effect::Commit { layer: LayerId(1) }]);
    }

    #[test]
    fn test_up_while_idle_is_noop() {
        let layers = stack();
        let t = step(&Session::Idle, PointerEvent::Up, &layers);
        assert_eq!(t.next, Session::Idle);
        assert!(t.effects.is_empty());
    }

    #[test]
    fn test_vanished_layer_abandons_session() {
        let mut layers = stack();
        let resizing = step(&Session::Idle, down(HandleKind::Left, 100.0, 200.0), &layers).next;
        layers.remove(LayerId(1));

        let t = step(&resizing, PointerEvent::Move { position: Point::new(0.0, 0.0) }, &layers);
        assert_eq!(t.next, Session::Idle);
        assert!(t.effects.is_empty());

        let t = step(&resizing, PointerEvent::Up, &layers);
        assert_eq!(t.next, Session::Idle);
        assert!(t.effects.is_empty());
    }
}
