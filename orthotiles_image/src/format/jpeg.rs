use anyhow::{Result, bail};
use image::{DynamicImage, ImageEncoder, codecs::jpeg::JpegEncoder};

/// Encode a `DynamicImage` as JPEG.
///
/// JPEG has no transparency, so only 8-bit Grey and RGB inputs are
/// accepted; callers must drop the mask beforehand. `quality` defaults
/// to 95.
pub fn encode(image: &DynamicImage, quality: Option<u8>) -> Result<Vec<u8>> {
	let quality = quality.unwrap_or(95);
	if quality >= 100 {
		bail!("JPEG does not support lossless compression, use a quality < 100");
	}

	if !matches!(image.color(), image::ColorType::L8 | image::ColorType::Rgb8) {
		bail!("JPEG only supports Grey or RGB images without alpha channel");
	}

	let mut buffer: Vec<u8> = Vec::new();
	JpegEncoder::new_with_quality(&mut buffer, quality).write_image(
		image.as_bytes(),
		image.width(),
		image.height(),
		image.color().into(),
	)?;

	Ok(buffer)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn encodes_rgb() {
		let image = DynamicImage::new_rgb8(4, 4);
		let bytes = encode(&image, None).unwrap();
		assert_eq!(&bytes[0..2], &[0xff, 0xd8]); // JPEG SOI marker
	}

	#[test]
	fn rejects_alpha() {
		let image = DynamicImage::new_rgba8(2, 2);
		assert!(encode(&image, None).is_err());
	}

	#[test]
	fn rejects_lossless_quality() {
		let image = DynamicImage::new_rgb8(2, 2);
		assert!(encode(&image, Some(100)).is_err());
	}
}
