use anyhow::{Result, bail};
use image::{DynamicImage, ImageEncoder, codecs::png};

/// Encode a `DynamicImage` as PNG with the codec defaults used for tiles.
pub fn encode(image: &DynamicImage) -> Result<Vec<u8>> {
	if !matches!(
		image.color(),
		image::ColorType::L8 | image::ColorType::La8 | image::ColorType::Rgb8 | image::ColorType::Rgba8
	) {
		bail!("png only supports 8-bit Grey, GreyA, RGB or RGBA");
	}

	let mut buffer: Vec<u8> = Vec::new();
	png::PngEncoder::new_with_quality(&mut buffer, png::CompressionType::Default, png::FilterType::Adaptive)
		.write_image(image.as_bytes(), image.width(), image.height(), image.color().into())?;

	Ok(buffer)
}
