use anyhow::Result;
use image::{DynamicImage, ImageEncoder, codecs::tiff::TiffEncoder};
use std::io::Cursor;

/// Encode a `DynamicImage` as TIFF with the encoder defaults.
pub fn encode(image: &DynamicImage) -> Result<Vec<u8>> {
	let mut buffer = Cursor::new(Vec::new());
	TiffEncoder::new(&mut buffer).write_image(
		image.as_bytes(),
		image.width(),
		image.height(),
		image.color().into(),
	)?;
	Ok(buffer.into_inner())
}
