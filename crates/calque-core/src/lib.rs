//! Calque Core - Layer geometry and export compositing engine
//!
//! This crate provides the engine behind Calque's layer editor: rotation-aware
//! interactive transforms driven by on-canvas handles, and a deterministic
//! export pipeline that flattens the layer stack into one raster.
//!
//! - [`transform`]: handle placement, resize/rotate sessions, controller
//! - [`export`]: size inference, auto-crop, compositing, scale bar, documents
//! - [`layer`]: the layer model and the rendering surface contract

pub mod decode;
pub mod encode;
pub mod export;
pub mod geometry;
pub mod layer;
pub mod transform;

pub use export::{ExportCompositor, ExportError, ExportPolicy, ExportReport, ScaleSettings};
pub use geometry::{Point, Rect};
pub use layer::{Layer, LayerId, LayerStack, PixelSurface, RenderSurface};
pub use transform::{HandleKind, TransformConfig, TransformController, Viewport};
