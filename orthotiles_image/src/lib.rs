//! # Orthotiles Image
//!
//! Raster tile buffers and the post-processing applied to them before they
//! leave the server: linear rescaling, named color maps, per-band
//! statistics and encoding to PNG/JPEG/WebP/TIFF.

pub mod colormap;
pub mod format;
mod raster;
mod stats;

pub use format::encode;
pub use raster::RasterTile;
pub use stats::{BandStatistics, band_statistics};
