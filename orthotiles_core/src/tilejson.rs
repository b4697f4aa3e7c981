//! TileJSON 2.1.0 response document.
//!
//! Only the subset of the schema this service emits: a single tile URL
//! template, the widened zoom window and the geographic bounds of the
//! underlying orthomosaic.

use crate::{GeoBBox, ZoomRange};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TileJSON {
	pub tilejson: String,
	pub name: String,
	pub version: String,
	pub scheme: String,
	pub tiles: Vec<String>,
	pub minzoom: u8,
	pub maxzoom: u8,
	pub bounds: [f64; 4],
}

impl TileJSON {
	pub fn new(name: &str, tile_url: String, zoom: ZoomRange, bounds: &GeoBBox) -> TileJSON {
		TileJSON {
			tilejson: "2.1.0".to_string(),
			name: name.to_string(),
			version: "1.0.0".to_string(),
			scheme: "xyz".to_string(),
			tiles: vec![tile_url],
			minzoom: zoom.min,
			maxzoom: zoom.max,
			bounds: bounds.as_array(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn serializes_per_schema() {
		let tilejson = TileJSON::new(
			"Task t1 Orthomosaic",
			"/api/tiles/t1/{z}/{x}/{y}".to_string(),
			ZoomRange::new(8, 50).unwrap(),
			&GeoBBox::new(10.0, 20.0, 11.0, 21.0).unwrap(),
		);

		let json = serde_json::to_value(&tilejson).unwrap();
		assert_eq!(json["tilejson"], "2.1.0");
		assert_eq!(json["scheme"], "xyz");
		assert_eq!(json["tiles"][0], "/api/tiles/t1/{z}/{x}/{y}");
		assert_eq!(json["minzoom"], 8);
		assert_eq!(json["maxzoom"], 50);
		assert_eq!(json["bounds"][0], 10.0);
		assert_eq!(json["bounds"][3], 21.0);
	}
}
