use anyhow::{Result, anyhow};
use image::DynamicImage;

/// Encode a `DynamicImage` as lossy WebP (default quality 95).
///
/// Grey inputs are expanded to RGB first since libwebp only accepts RGB
/// and RGBA buffers.
pub fn encode(image: &DynamicImage, quality: Option<u8>) -> Result<Vec<u8>> {
	let quality = f32::from(quality.unwrap_or(95));

	let memory = match image {
		DynamicImage::ImageRgb8(img) => {
			webp::Encoder::from_rgb(img.as_raw(), img.width(), img.height()).encode_simple(false, quality)
		}
		DynamicImage::ImageRgba8(img) => {
			webp::Encoder::from_rgba(img.as_raw(), img.width(), img.height()).encode_simple(false, quality)
		}
		DynamicImage::ImageLuma8(_) => {
			let rgb = image.to_rgb8();
			webp::Encoder::from_rgb(rgb.as_raw(), rgb.width(), rgb.height()).encode_simple(false, quality)
		}
		DynamicImage::ImageLumaA8(_) => {
			let rgba = image.to_rgba8();
			webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height()).encode_simple(false, quality)
		}
		_ => return Err(anyhow!("webp only supports 8-bit images")),
	}
	.map_err(|e| anyhow!("webp encoding failed: {e:?}"))?;

	Ok(memory.to_vec())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn encodes_rgba_and_decodes_back() {
		let image = DynamicImage::new_rgba8(8, 8);
		let bytes = encode(&image, None).unwrap();
		let decoded = webp::Decoder::new(&bytes).decode().unwrap();
		assert_eq!(decoded.width(), 8);
		assert_eq!(decoded.height(), 8);
	}

	#[test]
	fn expands_grey_to_rgb() {
		let image = DynamicImage::new_luma8(4, 4);
		let bytes = encode(&image, None).unwrap();
		assert_eq!(&bytes[8..12], b"WEBP");
	}
}
