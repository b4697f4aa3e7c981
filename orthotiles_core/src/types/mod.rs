mod geo_bbox;
mod tile_coord;
mod tile_format;
mod zoom_range;

pub use geo_bbox::GeoBBox;
pub use tile_coord::TileCoord;
pub use tile_format::TileFormat;
pub use zoom_range::ZoomRange;
