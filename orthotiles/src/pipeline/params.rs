//! Parsing and validation of tile request parameters.
//!
//! Every check maps a malformed value onto a bad-request with a specific
//! message; nothing here is retried or defaulted silently except the tile
//! size, which falls back to the configured default.

use crate::{
	config::TileConfig,
	error::{ServeError, ServeResult},
};
use orthotiles_core::TileFormat;
use orthotiles_image::colormap::{self, ColorMap};
use serde::Deserialize;

/// Raw query parameters of tile/tilejson/bounds requests.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct TileQuery {
	pub size: Option<u32>,
	pub rescale: Option<String>,
	pub color_map: Option<String>,
	pub nodata: Option<String>,
	pub return_mask: Option<bool>,
	/// Only forwarded into tile URL templates; the tile endpoint takes its
	/// format from the path suffix.
	pub format: Option<String>,
}

/// Validated tile request parameters.
#[derive(Clone, Copy, Debug)]
pub struct TileParams {
	pub size: u32,
	pub format: TileFormat,
	pub rescale: Option<(f64, f64)>,
	pub color_map: Option<&'static ColorMap>,
	pub nodata: Option<f64>,
	pub return_mask: bool,
}

impl TileParams {
	pub fn parse(query: &TileQuery, path_format: Option<&str>, config: &TileConfig) -> ServeResult<TileParams> {
		let size = query.size.unwrap_or(config.default_size);
		if size != 256 && size != 512 {
			return Err(ServeError::BadRequest("Tile size must be 256 or 512".to_string()));
		}

		let format = match path_format {
			Some(name) => {
				TileFormat::try_from_str(name).map_err(|_| ServeError::BadRequest("Invalid format".to_string()))?
			}
			None => TileFormat::PNG,
		};

		let rescale = match &query.rescale {
			Some(text) => {
				let values: Result<Vec<f64>, _> = text.split(',').map(|part| part.trim().parse::<f64>()).collect();
				match values {
					Ok(values) if values.len() == 2 => Some((values[0], values[1])),
					_ => {
						return Err(ServeError::BadRequest(
							"Invalid rescale format (should be 'min,max')".to_string(),
						));
					}
				}
			}
			None => None,
		};

		let nodata = match &query.nodata {
			Some(text) if text.eq_ignore_ascii_case("nan") => Some(f64::NAN),
			Some(text) => Some(
				text
					.parse::<f64>()
					.map_err(|_| ServeError::BadRequest("Invalid nodata value".to_string()))?,
			),
			None => None,
		};

		let color_map = match &query.color_map {
			Some(name) => {
				Some(colormap::get(name).ok_or_else(|| ServeError::BadRequest("Invalid color map".to_string()))?)
			}
			None => None,
		};

		Ok(TileParams {
			size,
			format,
			rescale,
			color_map,
			nodata,
			return_mask: query.return_mask.unwrap_or(false),
		})
	}
}
