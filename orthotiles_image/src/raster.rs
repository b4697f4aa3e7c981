use crate::colormap::ColorMap;
use anyhow::{Result, bail, ensure};

/// A decoded raster tile: interleaved 8-bit color samples plus a per-pixel
/// validity mask.
///
/// The mask is kept separate from the color channels (one byte per pixel,
/// `0` = nodata, `255` = valid) so that post-processing operates on raw
/// sample values and the encoders decide whether to attach it as an alpha
/// channel.
#[derive(Clone, Debug, PartialEq)]
pub struct RasterTile {
	width: u32,
	height: u32,
	channels: u8,
	data: Vec<u8>,
	mask: Vec<u8>,
}

impl RasterTile {
	/// Builds a tile from interleaved samples and a mask.
	///
	/// `channels` must be 1 (grey) or 3 (RGB); alpha bands belong in the
	/// mask, not in the sample buffer.
	pub fn new(width: u32, height: u32, channels: u8, data: Vec<u8>, mask: Vec<u8>) -> Result<RasterTile> {
		ensure!(
			channels == 1 || channels == 3,
			"channel count must be 1 (grey) or 3 (RGB), got {channels}"
		);
		let pixels = (width as usize) * (height as usize);
		ensure!(
			data.len() == pixels * channels as usize,
			"sample buffer length {} does not match {width}x{height}x{channels}",
			data.len()
		);
		ensure!(
			mask.len() == pixels,
			"mask length {} does not match {width}x{height}",
			mask.len()
		);
		Ok(RasterTile {
			width,
			height,
			channels,
			data,
			mask,
		})
	}

	/// A fully valid tile with every sample set to `value`. Mostly useful
	/// for tests and mock sources.
	pub fn new_filled(width: u32, height: u32, channels: u8, value: u8) -> Result<RasterTile> {
		let pixels = (width as usize) * (height as usize);
		RasterTile::new(
			width,
			height,
			channels,
			vec![value; pixels * channels as usize],
			vec![255u8; pixels],
		)
	}

	pub fn width(&self) -> u32 {
		self.width
	}

	pub fn height(&self) -> u32 {
		self.height
	}

	pub fn channels(&self) -> u8 {
		self.channels
	}

	pub fn data(&self) -> &[u8] {
		&self.data
	}

	pub fn mask(&self) -> &[u8] {
		&self.mask
	}

	pub fn set_mask(&mut self, mask: Vec<u8>) -> Result<()> {
		ensure!(
			mask.len() == (self.width as usize) * (self.height as usize),
			"mask length {} does not match {}x{}",
			mask.len(),
			self.width,
			self.height
		);
		self.mask = mask;
		Ok(())
	}

	/// True if the validity mask is uniformly "fully visible". Drives the
	/// transparency-aware output-codec negotiation.
	pub fn is_opaque(&self) -> bool {
		self.mask.iter().all(|&m| m == 255)
	}

	/// Linearly map raw sample values from `(min, max)` into `0..=255`,
	/// clamping at both ends. Applied before any color map.
	pub fn rescale(&mut self, min: f64, max: f64) -> Result<()> {
		ensure!(max != min, "rescale range must not be empty (min == max)");
		let scale = 255.0 / (max - min);
		for v in &mut self.data {
			*v = ((f64::from(*v) - min) * scale).round().clamp(0.0, 255.0) as u8;
		}
		Ok(())
	}

	/// Map the first channel through a color map, producing an RGB tile
	/// with the same mask.
	pub fn apply_colormap(&self, map: &ColorMap) -> Result<RasterTile> {
		if self.channels != 1 {
			bail!("color maps apply to single-band tiles, this tile has {} channels", self.channels);
		}
		let mut data = Vec::with_capacity(self.data.len() * 3);
		for &v in &self.data {
			data.extend_from_slice(&map.lookup(v));
		}
		RasterTile::new(self.width, self.height, 3, data, self.mask.clone())
	}
}
