use serde::Deserialize;

fn default_tile_size() -> u32 {
	256
}
fn default_fallback_zoom_min() -> u8 {
	8
}
fn default_fallback_zoom_max() -> u8 {
	50
}
fn default_auto_webp() -> bool {
	true
}
fn default_cache_max_age() -> u64 {
	3600
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TileConfig {
	/// Tile size used when the request does not specify one.
	#[serde(default = "default_tile_size")]
	pub default_size: u32,

	/// Extra zoom levels by which the effective zoom window is widened on
	/// both ends.
	#[serde(default)]
	pub zoom_extra_levels: u8,

	/// Minimum zoom of the fallback window, used when a task carries no
	/// zoom overrides. A deliberate constant, not derived from resolution.
	#[serde(default = "default_fallback_zoom_min")]
	pub fallback_zoom_min: u8,

	/// Maximum zoom of the fallback window.
	#[serde(default = "default_fallback_zoom_max")]
	pub fallback_zoom_max: u8,

	/// Silently upgrade PNG responses to WebP when the client accepts it
	/// and the rendered tile is not fully opaque. Saves bandwidth on
	/// partially-transparent edge tiles.
	#[serde(default = "default_auto_webp")]
	pub auto_webp: bool,

	/// `Cache-Control: public, max-age=…` for tile responses, in seconds.
	#[serde(default = "default_cache_max_age")]
	pub cache_max_age_seconds: u64,
}

impl Default for TileConfig {
	fn default() -> Self {
		TileConfig {
			default_size: default_tile_size(),
			zoom_extra_levels: 0,
			fallback_zoom_min: default_fallback_zoom_min(),
			fallback_zoom_max: default_fallback_zoom_max(),
			auto_webp: default_auto_webp(),
			cache_max_age_seconds: default_cache_max_age(),
		}
	}
}
