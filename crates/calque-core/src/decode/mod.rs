//! Snapshot decoding for the export compositor.
//!
//! Every layer reaches the compositor as encoded bytes produced by its
//! rendering surface. This module rehydrates those bytes into an RGBA raster.
//! The format is guessed from the content, so PNG and JPEG snapshots are both
//! accepted.

mod raster;

pub use raster::{decode_raster, DecodeError};
