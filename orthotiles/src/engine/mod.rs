//! The raster engine boundary.
//!
//! The tile pipeline treats raster decoding and reprojection as an opaque
//! capability behind these traits. The production implementation is the
//! GDAL-backed engine in [`gdal`] (cargo feature `gdal`, since it needs
//! the system GDAL libraries); [`mock`] provides a deterministic in-memory
//! engine for tests.

#[cfg(feature = "gdal")]
pub mod gdal;
pub mod mock;

use async_trait::async_trait;
use orthotiles_core::{GeoBBox, TileCoord};
use orthotiles_image::{BandStatistics, RasterTile};
use std::{collections::BTreeMap, path::Path, sync::Arc};
use thiserror::Error;

/// Pixel-interpolation strategy for tile extraction. Tiles are cut with
/// [`Resampling::Nearest`] to preserve original sample values for analytic
/// imagery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Resampling {
	#[default]
	Nearest,
	Bilinear,
	Cubic,
	Average,
}

#[derive(Debug, Error)]
pub enum EngineError {
	/// The artifact exists locally but cannot be opened or decoded.
	#[error("raster source unreadable: {0}")]
	Unreadable(String),

	/// The requested tile does not intersect the raster.
	#[error("tile outside bounds")]
	OutsideBounds,

	/// Non-finite geometry during extraction; treated like a tile outside
	/// the raster by the pipeline.
	#[error("invalid tile geometry: {0}")]
	Numeric(String),

	#[error(transparent)]
	Other(#[from] anyhow::Error),
}

/// An opened raster artifact.
#[async_trait]
pub trait RasterReader: Send + Sync + std::fmt::Debug {
	/// Geographic bounds of the raster, reprojected to EPSG:4326.
	fn bounds(&self) -> GeoBBox;

	/// Dataset-level nodata value, if any.
	fn nodata(&self) -> Option<f64>;

	/// Pixel type name, e.g. `"uint8"`.
	fn pixel_type(&self) -> String;

	/// Per-band color interpretation names, e.g. `["red", "green", "blue"]`.
	fn color_interpretations(&self) -> Vec<String>;

	/// Whether the tile intersects the raster's tile pyramid at all.
	fn tile_exists(&self, coord: &TileCoord) -> bool {
		coord.is_valid() && coord.to_geo_bbox().intersects(&self.bounds())
	}

	/// Cuts one tile of `tile_size`×`tile_size` pixels.
	async fn extract_tile(
		&self,
		coord: &TileCoord,
		tile_size: u32,
		nodata: Option<f64>,
		resampling: Resampling,
	) -> Result<RasterTile, EngineError>;

	/// Per-band statistics, keyed `"1"`, `"2"`, … Failures here are the
	/// caller's to recover from.
	async fn statistics(&self) -> anyhow::Result<BTreeMap<String, BandStatistics>>;
}

/// Opens raster artifacts from local paths.
#[async_trait]
pub trait RasterEngine: Send + Sync {
	async fn open(&self, path: &Path) -> Result<Arc<dyn RasterReader>, EngineError>;
}
