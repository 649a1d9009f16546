//! WASM bindings for the layer workspace and interactive transforms.
//!
//! A [`JsWorkspace`] owns the layer stack, the transform controller and the
//! export compositor. The front-end forwards pointer events to it and
//! receives handle updates and checkpoint requests through callbacks.
//!
//! # Example (TypeScript)
//!
//! ```typescript
//! const workspace = new JsWorkspace(
//!   undefined,                                  // TransformConfig (defaults)
//!   undefined,                                  // ExportPolicy (defaults)
//!   (layerId, handles) => drawHandles(layerId, handles),
//!   (layerId) => removeHandles(layerId),
//!   (layerId, geometry) => project.save(layerId, geometry),
//! );
//! workspace.refresh_handles(activeLayerId);
//!
//! canvas.onpointerdown = (e) => workspace.begin_drag(id, "right", e.clientX, e.clientY);
//! canvas.onpointermove = (e) => workspace.pointer_move(e.clientX, e.clientY);
//! canvas.onpointerup = () => workspace.pointer_up();
//! ```

use calque_core::export::{ExportCompositor, ExportPolicy, ScaleSettings};
use calque_core::transform::{
    Handle, HandleError, HandleKind, HandlePresenter, LayerGeometry, TransformConfig,
    TransformController, Viewport,
};
use calque_core::{Layer, LayerId, LayerStack, Point};
use js_sys::Function;
use wasm_bindgen::prelude::*;
use web_sys::console;

use crate::layers::JsLayerBuilder;
use crate::types::{js_error, settings_or_default};

/// Forwards handle set changes to JavaScript callbacks.
///
/// Without a `show` callback there is nowhere to put handles, which is
/// reported as a missing container.
struct JsHandlePresenter {
    on_show: Option<Function>,
    on_hide: Option<Function>,
}

impl HandlePresenter for JsHandlePresenter {
    fn show(&mut self, layer: LayerId, handles: &[Handle]) -> Result<(), HandleError> {
        let Some(callback) = &self.on_show else {
            return Err(HandleError::MissingContainer { layer });
        };
        let handles = serde_wasm_bindgen::to_value(handles).map_err(|e| {
            console::error_1(&js_error(format!("handle serialization failed: {}", e)));
            HandleError::MissingContainer { layer }
        })?;
        callback
            .call2(&JsValue::NULL, &JsValue::from(layer.0), &handles)
            .map_err(|e| {
                console::error_2(&JsValue::from_str("handle show callback threw"), &e);
                HandleError::MissingContainer { layer }
            })?;
        Ok(())
    }

    fn hide(&mut self, layer: LayerId) {
        if let Some(callback) = &self.on_hide {
            if let Err(e) = callback.call1(&JsValue::NULL, &JsValue::from(layer.0)) {
                console::error_2(&JsValue::from_str("handle hide callback threw"), &e);
            }
        }
    }
}

/// Checkpoint callback: `(layerId, geometry)`.
fn checkpoint_sink(callback: Option<Function>) -> impl FnMut(&Layer) {
    move |layer: &Layer| {
        let Some(callback) = &callback else {
            console::warn_1(&JsValue::from_str("no checkpoint callback, transform not saved"));
            return;
        };
        let geometry = serde_wasm_bindgen::to_value(&LayerGeometry::of(layer)).unwrap_or(JsValue::NULL);
        if let Err(e) = callback.call2(&JsValue::NULL, &JsValue::from(layer.id.0), &geometry) {
            console::error_2(&JsValue::from_str("checkpoint callback threw"), &e);
        }
    }
}

/// Parse a handle name, rejecting unknown names.
pub(crate) fn parse_handle(name: &str) -> Result<HandleKind, String> {
    HandleKind::from_name(name).ok_or_else(|| format!("Unknown handle '{}'", name))
}

/// Layer stack, transform controller and export compositor.
#[wasm_bindgen]
pub struct JsWorkspace {
    pub(crate) layers: LayerStack,
    pub(crate) controller: TransformController,
    pub(crate) compositor: ExportCompositor,
}

#[wasm_bindgen]
impl JsWorkspace {
    /// Create an empty workspace.
    ///
    /// `transform_config` and `export_policy` may be `undefined` for defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(
        transform_config: JsValue,
        export_policy: JsValue,
        on_show_handles: Option<Function>,
        on_hide_handles: Option<Function>,
        on_checkpoint: Option<Function>,
    ) -> Result<JsWorkspace, JsValue> {
        let config: TransformConfig = settings_or_default(transform_config)?;
        let policy: ExportPolicy = settings_or_default(export_policy)?;

        let presenter = JsHandlePresenter {
            on_show: on_show_handles,
            on_hide: on_hide_handles,
        };
        Ok(JsWorkspace {
            layers: LayerStack::new(),
            controller: TransformController::new(
                config,
                Box::new(presenter),
                Box::new(checkpoint_sink(on_checkpoint)),
            ),
            compositor: ExportCompositor::new(policy, ScaleSettings::default()),
        })
    }

    // =========================================================================
    // Layers
    // =========================================================================

    /// Add a layer, above every other layer when `on_top`, below otherwise.
    pub fn push_layer(&mut self, builder: JsLayerBuilder, on_top: bool) {
        let layer = builder.build();
        if on_top {
            self.layers.push_top(layer);
        } else {
            self.layers.push_bottom(layer);
        }
    }

    /// Remove a layer. Returns false if it does not exist.
    pub fn remove_layer(&mut self, id: u32) -> bool {
        self.layers.remove(LayerId(id)).is_some()
    }

    #[wasm_bindgen(getter)]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Mark a layer calibrated. Returns false if it does not exist.
    pub fn set_calibrated(&mut self, id: u32, calibrated: bool) -> bool {
        match self.layers.get_mut(LayerId(id)) {
            Some(layer) => {
                layer.calibrated = calibrated;
                true
            }
            None => false,
        }
    }

    pub fn set_opacity(&mut self, id: u32, opacity: f64) -> bool {
        match self.layers.get_mut(LayerId(id)) {
            Some(layer) => {
                layer.set_opacity(opacity);
                true
            }
            None => false,
        }
    }

    pub fn set_visible(&mut self, id: u32, visible: bool) -> bool {
        match self.layers.get_mut(LayerId(id)) {
            Some(layer) => {
                layer.visible = visible;
                true
            }
            None => false,
        }
    }

    /// Current geometry `{x, y, width, height, angle, background_scale}`.
    pub fn layer_geometry(&self, id: u32) -> Result<JsValue, JsValue> {
        let layer = self
            .layers
            .get(LayerId(id))
            .ok_or_else(|| js_error(format!("Unknown layer {}", id)))?;
        serde_wasm_bindgen::to_value(&LayerGeometry::of(layer)).map_err(js_error)
    }

    // =========================================================================
    // Transforms
    // =========================================================================

    /// Update the view zoom and the screen position of the workspace origin.
    pub fn set_viewport(&mut self, zoom: f64, origin_x: f64, origin_y: f64) {
        self.controller
            .set_viewport(Viewport::new(zoom, Point::new(origin_x, origin_y)), &self.layers);
    }

    /// Pointer-down on a resize handle (`left`, `right`, `top`, `bottom`).
    pub fn begin_drag(&mut self, id: u32, handle: &str, x: f64, y: f64) -> Result<bool, JsValue> {
        let kind = parse_handle(handle).map_err(js_error)?;
        Ok(self
            .controller
            .begin_drag(&self.layers, LayerId(id), kind, Point::new(x, y)))
    }

    /// Pointer-down on the rotate handle.
    pub fn begin_rotate(&mut self, id: u32, x: f64, y: f64) -> bool {
        self.controller
            .begin_rotate(&self.layers, LayerId(id), Point::new(x, y))
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) {
        self.controller.on_pointer_move(&mut self.layers, Point::new(x, y));
    }

    pub fn pointer_up(&mut self) {
        self.controller.on_pointer_up(&mut self.layers);
    }

    pub fn pointer_cancel(&mut self) {
        self.controller.on_pointer_cancel(&mut self.layers);
    }

    #[wasm_bindgen(getter)]
    pub fn is_idle(&self) -> bool {
        self.controller.session().is_idle()
    }

    /// Give handles to `active` only (if eligible). `undefined` clears all.
    pub fn refresh_handles(&mut self, active: Option<u32>) {
        self.controller.refresh_handles(&self.layers, active.map(LayerId));
    }

    /// Give handles to every eligible layer.
    pub fn show_after_calibration(&mut self) {
        self.controller.show_after_calibration(&self.layers);
    }

    pub fn reset_handles(&mut self) {
        self.controller.reset_handles();
    }

    /// Handles currently attached to a layer.
    pub fn handles(&self, id: u32) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.controller.handles(LayerId(id))).map_err(js_error)
    }
}
