//! # Orthotiles Core
//!
//! Leaf crate with the value types shared by the orthotiles service:
//! tile coordinates, geographic bounding boxes, output formats, zoom
//! ranges and the TileJSON response document. No I/O lives here.

mod tilejson;
mod types;

pub use tilejson::TileJSON;
pub use types::*;
