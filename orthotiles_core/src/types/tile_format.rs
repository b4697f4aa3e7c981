//! The closed set of tile output formats served by orthotiles.
//!
//! Each variant knows its canonical extension and media type. Parsing is
//! case-insensitive and accepts the common alternative spellings
//! (`jpeg`, `tiff`); everything else is rejected.

use anyhow::{Result, bail};
use std::fmt::{Display, Formatter};

#[allow(clippy::upper_case_acronyms)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum TileFormat {
	JPG,
	#[default]
	PNG,
	TIF,
	WEBP,
}

impl TileFormat {
	/// Returns a lowercase string identifier for this tile format.
	///
	/// # Examples
	/// ```
	/// use orthotiles_core::TileFormat;
	/// assert_eq!(TileFormat::PNG.as_str(), "png");
	/// ```
	pub fn as_str(&self) -> &str {
		match self {
			TileFormat::JPG => "jpg",
			TileFormat::PNG => "png",
			TileFormat::TIF => "tif",
			TileFormat::WEBP => "webp",
		}
	}

	pub fn try_from_str(value: &str) -> Result<Self> {
		Ok(match value.to_lowercase().trim() {
			"jpeg" | "jpg" => TileFormat::JPG,
			"png" => TileFormat::PNG,
			"tif" | "tiff" => TileFormat::TIF,
			"webp" => TileFormat::WEBP,
			_ => bail!("Unknown tile format: '{}'", value),
		})
	}

	/// The media type sent in the `Content-Type` header.
	pub fn as_mime_str(&self) -> &str {
		match self {
			TileFormat::JPG => "image/jpeg",
			TileFormat::PNG => "image/png",
			TileFormat::TIF => "image/tiff",
			TileFormat::WEBP => "image/webp",
		}
	}

	pub fn as_extension(&self) -> &str {
		match self {
			TileFormat::JPG => ".jpg",
			TileFormat::PNG => ".png",
			TileFormat::TIF => ".tif",
			TileFormat::WEBP => ".webp",
		}
	}
}

impl Display for TileFormat {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}
