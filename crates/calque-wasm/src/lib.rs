//! Calque WASM - WebAssembly bindings for Calque
//!
//! This crate provides WASM bindings to expose the calque-core layer engine
//! to JavaScript/TypeScript applications.
//!
//! # Module Structure
//!
//! - `types` - WASM-compatible wrapper types for rasters and export summaries
//! - `layers` - Layer construction (`JsLayerBuilder`)
//! - `transform` - The workspace: layers, handles, resize/rotate sessions
//! - `export` - Raster and document export
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsWorkspace, JsLayerBuilder } from '@calque/wasm';
//!
//! await init();
//!
//! const workspace = new JsWorkspace(undefined, undefined, showHandles, hideHandles, save);
//! workspace.push_layer(new JsLayerBuilder(1, "Plan rogné", 3000, 2000), false);
//! const png = workspace.export_png();
//! ```

use wasm_bindgen::prelude::*;

mod export;
mod layers;
mod transform;
mod types;

// Re-export public types
pub use layers::JsLayerBuilder;
pub use transform::JsWorkspace;
pub use types::JsRaster;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
