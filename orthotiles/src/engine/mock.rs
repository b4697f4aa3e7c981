//! Deterministic in-memory raster engine for tests.
//!
//! Produces gradient RGB tiles over a fixed geographic extent; opacity,
//! nodata and open failures are controllable so tests can drive every
//! pipeline branch without touching GDAL or real imagery. Extractions are
//! recorded on the engine so tests can assert which tiles were cut.

use super::{EngineError, RasterEngine, RasterReader, Resampling};
use async_trait::async_trait;
use orthotiles_core::{GeoBBox, TileCoord};
use orthotiles_image::{BandStatistics, RasterTile, band_statistics};
use std::{
	collections::BTreeMap,
	path::Path,
	sync::{Arc, Mutex},
};

#[derive(Clone)]
pub struct MockEngine {
	bounds: GeoBBox,
	opaque: bool,
	nodata: Option<f64>,
	fail_open: bool,
	extractions: Arc<Mutex<Vec<(TileCoord, u32)>>>,
}

impl MockEngine {
	pub fn new(bounds: GeoBBox) -> MockEngine {
		MockEngine {
			bounds,
			opaque: true,
			nodata: None,
			fail_open: false,
			extractions: Arc::new(Mutex::new(Vec::new())),
		}
	}

	/// Tiles from this engine carry a half-transparent mask.
	pub fn with_transparency(mut self) -> MockEngine {
		self.opaque = false;
		self
	}

	pub fn with_nodata(mut self, nodata: f64) -> MockEngine {
		self.nodata = Some(nodata);
		self
	}

	/// `open` fails with [`EngineError::Unreadable`].
	pub fn with_fail_open(mut self) -> MockEngine {
		self.fail_open = true;
		self
	}

	/// Every `(coord, tile_size)` pair extracted through this engine.
	pub fn extractions(&self) -> Vec<(TileCoord, u32)> {
		self.extractions.lock().unwrap().clone()
	}
}

#[async_trait]
impl RasterEngine for MockEngine {
	async fn open(&self, path: &Path) -> Result<Arc<dyn RasterReader>, EngineError> {
		if self.fail_open {
			return Err(EngineError::Unreadable(format!("mock refuses to open {path:?}")));
		}
		Ok(Arc::new(MockReader {
			bounds: self.bounds,
			opaque: self.opaque,
			nodata: self.nodata,
			extractions: Arc::clone(&self.extractions),
		}))
	}
}

#[derive(Debug)]
pub struct MockReader {
	bounds: GeoBBox,
	opaque: bool,
	nodata: Option<f64>,
	extractions: Arc<Mutex<Vec<(TileCoord, u32)>>>,
}

#[async_trait]
impl RasterReader for MockReader {
	fn bounds(&self) -> GeoBBox {
		self.bounds
	}

	fn nodata(&self) -> Option<f64> {
		self.nodata
	}

	fn pixel_type(&self) -> String {
		"uint8".to_string()
	}

	fn color_interpretations(&self) -> Vec<String> {
		vec!["red".to_string(), "green".to_string(), "blue".to_string()]
	}

	async fn extract_tile(
		&self,
		coord: &TileCoord,
		tile_size: u32,
		_nodata: Option<f64>,
		_resampling: Resampling,
	) -> Result<RasterTile, EngineError> {
		if !self.tile_exists(coord) {
			return Err(EngineError::OutsideBounds);
		}
		self.extractions.lock().unwrap().push((*coord, tile_size));

		let pixels = (tile_size as usize) * (tile_size as usize);
		let mut data = Vec::with_capacity(pixels * 3);
		for y in 0..tile_size {
			for x in 0..tile_size {
				data.push((x * 255 / tile_size.max(1)) as u8);
				data.push((y * 255 / tile_size.max(1)) as u8);
				data.push(coord.level);
			}
		}

		let mask = if self.opaque {
			vec![255u8; pixels]
		} else {
			// left half visible, right half nodata
			let mut mask = Vec::with_capacity(pixels);
			for _ in 0..tile_size {
				for x in 0..tile_size {
					mask.push(if x < tile_size / 2 { 255 } else { 0 });
				}
			}
			mask
		};

		Ok(RasterTile::new(tile_size, tile_size, 3, data, mask)?)
	}

	async fn statistics(&self) -> anyhow::Result<BTreeMap<String, BandStatistics>> {
		let tile = self
			.extract_tile(&TileCoord::new(0, 0, 0)?, 64, None, Resampling::Nearest)
			.await
			.map_err(|e| anyhow::anyhow!(e.to_string()))?;
		Ok(band_statistics(&tile))
	}
}
