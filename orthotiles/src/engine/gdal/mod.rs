//! GDAL-backed raster engine.
//!
//! Requires the system GDAL libraries, so the whole module sits behind the
//! `gdal` cargo feature. Opened sources are memoized per path, and each
//! source keeps a small pool of GDAL dataset handles bounded by a
//! concurrency semaphore.

mod band_mapping;
mod instance;
mod source;

use super::{EngineError, RasterEngine, RasterReader, Resampling};
use anyhow::anyhow;
use async_trait::async_trait;
use dashmap::DashMap;
use orthotiles_core::{GeoBBox, TileCoord};
use orthotiles_image::{BandStatistics, RasterTile, band_statistics};
use source::GdalSource;
use std::{
	collections::BTreeMap,
	path::{Path, PathBuf},
	sync::Arc,
};

pub struct GdalEngine {
	reuse_limit: u32,
	concurrency_limit: usize,
	readers: DashMap<PathBuf, Arc<GdalReader>>,
}

impl GdalEngine {
	pub fn new() -> GdalEngine {
		GdalEngine::with_limits(100, 4)
	}

	/// `reuse_limit` bounds how often one GDAL dataset handle is reused
	/// before being reopened; `concurrency_limit` bounds concurrently
	/// checked-out handles per source.
	pub fn with_limits(reuse_limit: u32, concurrency_limit: usize) -> GdalEngine {
		GdalEngine {
			reuse_limit,
			concurrency_limit,
			readers: DashMap::new(),
		}
	}
}

impl Default for GdalEngine {
	fn default() -> Self {
		GdalEngine::new()
	}
}

#[async_trait]
impl RasterEngine for GdalEngine {
	async fn open(&self, path: &Path) -> Result<Arc<dyn RasterReader>, EngineError> {
		if let Some(reader) = self.readers.get(path) {
			return Ok(Arc::clone(reader.value()) as Arc<dyn RasterReader>);
		}

		let source = GdalSource::new(path, self.reuse_limit, self.concurrency_limit)
			.await
			.map_err(|err| EngineError::Unreadable(format!("{err:#}")))?;

		let reader = Arc::new(GdalReader { source });
		self.readers.insert(path.to_path_buf(), Arc::clone(&reader));
		Ok(reader as Arc<dyn RasterReader>)
	}
}

#[derive(Debug)]
pub struct GdalReader {
	source: GdalSource,
}

#[async_trait]
impl RasterReader for GdalReader {
	fn bounds(&self) -> GeoBBox {
		*self.source.bbox()
	}

	fn nodata(&self) -> Option<f64> {
		self.source.nodata()
	}

	fn pixel_type(&self) -> String {
		self.source.pixel_type().to_string()
	}

	fn color_interpretations(&self) -> Vec<String> {
		self.source.color_interpretations().to_vec()
	}

	async fn extract_tile(
		&self,
		coord: &TileCoord,
		tile_size: u32,
		nodata: Option<f64>,
		resampling: Resampling,
	) -> Result<RasterTile, EngineError> {
		if !self.tile_exists(coord) {
			return Err(EngineError::OutsideBounds);
		}

		let bbox = coord.to_geo_bbox();
		if bbox.to_mercator().iter().any(|v| !v.is_finite()) {
			return Err(EngineError::Numeric("non-finite tile geometry".to_string()));
		}

		let (raw, channels) = self
			.source
			.read_region(&bbox, tile_size as usize, tile_size as usize, resampling)
			.await
			.map_err(EngineError::Other)?;

		split_channels(raw, channels, tile_size, tile_size, nodata.or(self.source.nodata()))
	}

	async fn statistics(&self) -> anyhow::Result<BTreeMap<String, BandStatistics>> {
		let (width, height) = self.source.overview_size(1024);
		let bbox = *self.source.bbox();
		let (raw, channels) = self.source.read_region(&bbox, width, height, Resampling::Average).await?;

		let tile = split_channels(raw, channels, width as u32, height as u32, self.source.nodata())
			.map_err(|err| anyhow!(err.to_string()))?;
		Ok(band_statistics(&tile))
	}
}

/// Splits interleaved GDAL output into color samples and a validity mask.
/// An alpha band becomes the mask; without one, samples equal to the
/// (integral, in-range) nodata value are masked out.
fn split_channels(
	raw: Vec<u8>,
	channels: usize,
	width: u32,
	height: u32,
	nodata: Option<f64>,
) -> Result<RasterTile, EngineError> {
	let pixels = (width as usize) * (height as usize);
	let (color_channels, has_alpha) = match channels {
		1 => (1, false),
		2 => (1, true),
		3 => (3, false),
		4 => (3, true),
		_ => return Err(EngineError::Other(anyhow!("unsupported channel count: {channels}"))),
	};

	let mut data = Vec::with_capacity(pixels * color_channels);
	let mut mask = vec![255u8; pixels];
	for i in 0..pixels {
		let px = &raw[i * channels..(i + 1) * channels];
		data.extend_from_slice(&px[..color_channels]);
		if has_alpha {
			mask[i] = if px[channels - 1] >= 128 { 255 } else { 0 };
		}
	}

	if !has_alpha
		&& let Some(nd) = nodata
		&& nd.fract() == 0.0
		&& (0.0..=255.0).contains(&nd)
	{
		let nd = nd as u8;
		for i in 0..pixels {
			if raw[i * channels..i * channels + color_channels].iter().all(|&v| v == nd) {
				mask[i] = 0;
			}
		}
	}

	Ok(RasterTile::new(width, height, color_channels as u8, data, mask)?)
}
