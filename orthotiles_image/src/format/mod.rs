//! Encoders for the supported output formats (PNG, JPEG, WebP, TIFF).
//!
//! Each submodule encodes with codec-specific defaults; there is no
//! per-request encoder tuning. `encode` is the single entry point used by
//! the tile pipeline.

pub mod jpeg;
pub mod png;
pub mod tiff;
pub mod webp;

use crate::RasterTile;
use anyhow::{Result, anyhow, bail};
use image::{DynamicImage, ImageBuffer};
use orthotiles_core::TileFormat;

/// Encodes a tile to bytes in the given format.
///
/// `include_mask` attaches the validity mask as an alpha channel for
/// alpha-capable codecs; JPEG has no alpha and always drops the mask.
pub fn encode(tile: &RasterTile, format: TileFormat, include_mask: bool) -> Result<Vec<u8>> {
	match format {
		TileFormat::PNG => png::encode(&to_dynamic_image(tile, include_mask)?),
		TileFormat::JPG => jpeg::encode(&to_dynamic_image(tile, false)?, None),
		TileFormat::WEBP => webp::encode(&to_dynamic_image(tile, include_mask)?, None),
		TileFormat::TIF => tiff::encode(&to_dynamic_image(tile, include_mask)?),
	}
}

/// Builds an [`image::DynamicImage`] from the tile's samples, optionally
/// interleaving the mask as an alpha channel.
fn to_dynamic_image(tile: &RasterTile, with_alpha: bool) -> Result<DynamicImage> {
	let (width, height) = (tile.width(), tile.height());
	let pixels = (width as usize) * (height as usize);
	let channels = tile.channels() as usize;

	let buffer = if with_alpha {
		let mut buf = Vec::with_capacity(pixels * (channels + 1));
		for i in 0..pixels {
			buf.extend_from_slice(&tile.data()[i * channels..(i + 1) * channels]);
			buf.push(tile.mask()[i]);
		}
		buf
	} else {
		tile.data().to_vec()
	};

	let failed = || anyhow!("failed to create {width}x{height} image buffer");
	Ok(match (channels, with_alpha) {
		(1, false) => DynamicImage::ImageLuma8(ImageBuffer::from_vec(width, height, buffer).ok_or_else(failed)?),
		(1, true) => DynamicImage::ImageLumaA8(ImageBuffer::from_vec(width, height, buffer).ok_or_else(failed)?),
		(3, false) => DynamicImage::ImageRgb8(ImageBuffer::from_vec(width, height, buffer).ok_or_else(failed)?),
		(3, true) => DynamicImage::ImageRgba8(ImageBuffer::from_vec(width, height, buffer).ok_or_else(failed)?),
		_ => bail!("unsupported channel count: {channels}"),
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use image::GenericImageView;
	use rstest::rstest;

	fn test_tile(opaque: bool) -> RasterTile {
		let mut tile = RasterTile::new(
			2,
			2,
			3,
			vec![255, 0, 0, 0, 255, 0, 0, 0, 255, 128, 128, 128],
			vec![255; 4],
		)
		.unwrap();
		if !opaque {
			tile.set_mask(vec![255, 255, 255, 0]).unwrap();
		}
		tile
	}

	#[rstest]
	#[case(TileFormat::PNG)]
	#[case(TileFormat::JPG)]
	#[case(TileFormat::WEBP)]
	#[case(TileFormat::TIF)]
	fn encode_produces_nonempty_output(#[case] format: TileFormat) {
		let bytes = encode(&test_tile(true), format, false).unwrap();
		assert!(!bytes.is_empty());
	}

	#[test]
	fn png_with_mask_round_trips_alpha() {
		let bytes = encode(&test_tile(false), TileFormat::PNG, true).unwrap();
		let decoded = image::load_from_memory_with_format(&bytes, image::ImageFormat::Png).unwrap();
		assert_eq!(decoded.color(), image::ColorType::Rgba8);
		assert_eq!(decoded.get_pixel(1, 1).0[3], 0);
		assert_eq!(decoded.get_pixel(0, 0).0, [255, 0, 0, 255]);
	}

	#[test]
	fn jpeg_never_carries_alpha() {
		// include_mask is ignored for JPEG
		let bytes = encode(&test_tile(false), TileFormat::JPG, true).unwrap();
		let decoded = image::load_from_memory_with_format(&bytes, image::ImageFormat::Jpeg).unwrap();
		assert_eq!(decoded.color(), image::ColorType::Rgb8);
	}

	#[test]
	fn webp_output_is_riff() {
		let bytes = encode(&test_tile(false), TileFormat::WEBP, true).unwrap();
		assert_eq!(&bytes[0..4], b"RIFF");
		assert_eq!(&bytes[8..12], b"WEBP");
	}

	#[test]
	fn tiff_round_trips_pixels() {
		let tile = test_tile(true);
		let bytes = encode(&tile, TileFormat::TIF, false).unwrap();
		let decoded = image::load_from_memory_with_format(&bytes, image::ImageFormat::Tiff).unwrap();
		assert_eq!(decoded.dimensions(), (2, 2));
		assert_eq!(decoded.to_rgb8().as_raw().as_slice(), tile.data());
	}

	#[test]
	fn grey_tiles_encode_to_png() {
		let tile = RasterTile::new(2, 1, 1, vec![0, 255], vec![255, 255]).unwrap();
		let bytes = encode(&tile, TileFormat::PNG, false).unwrap();
		let decoded = image::load_from_memory_with_format(&bytes, image::ImageFormat::Png).unwrap();
		assert_eq!(decoded.color(), image::ColorType::L8);
	}
}
