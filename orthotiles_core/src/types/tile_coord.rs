//! XYZ tile coordinates.
//!
//! A [`TileCoord`] addresses one tile of the Web-Mercator tile pyramid by
//! zoom level and integer x/y grid position, and can be converted to the
//! geographic area it covers.

use crate::GeoBBox;
use anyhow::{Result, ensure};
use std::f64::consts::PI;
use std::fmt::{self, Debug};

#[derive(Eq, PartialEq, Clone, Hash, Copy)]
pub struct TileCoord {
	pub x: u32,
	pub y: u32,
	pub level: u8,
}

impl TileCoord {
	pub fn new(level: u8, x: u32, y: u32) -> Result<TileCoord> {
		ensure!(level <= 31, "level ({level}) must be <= 31");
		Ok(TileCoord { x, y, level })
	}

	/// True if x and y fit into the tile grid of this zoom level.
	pub fn is_valid(&self) -> bool {
		if self.level > 31 {
			return false;
		}
		let max = 2u64.pow(u32::from(self.level));
		(u64::from(self.x) < max) && (u64::from(self.y) < max)
	}

	/// The geographic area `[west, south, east, north]` covered by this tile.
	pub fn to_geo_bbox(&self) -> GeoBBox {
		let scale: f64 = 2.0f64.powi(i32::from(self.level));
		let lng = |x: f64| (x / scale - 0.5) * 360.0;
		let lat = |y: f64| ((PI * (1.0 - 2.0 * y / scale)).exp().atan() / PI - 0.25) * 360.0;

		GeoBBox::new_clamped(
			lng(f64::from(self.x)),
			lat(f64::from(self.y)),
			lng(f64::from(self.x + 1)),
			lat(f64::from(self.y + 1)),
		)
	}
}

impl Debug for TileCoord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_fmt(format_args!("TileCoord({}, [{}, {}])", &self.level, &self.x, &self.y))
	}
}
