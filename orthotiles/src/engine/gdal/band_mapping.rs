use anyhow::{Context, Result, bail, ensure};
use gdal::{DriverManager, raster::ColorInterpretation, spatial_ref::SpatialRef};
use std::fmt::Debug;

pub struct BandMappingItem {
	pub band_index: usize,
	pub channel_index: usize,
}

/// Maps GDAL raster bands onto grey/RGB(+alpha) output channels, based on
/// each band's color interpretation. Undeclared bands 1..=4 fall back to
/// positional meaning (red, green, blue, alpha).
pub struct BandMapping {
	map: Vec<usize>,
}

impl BandMapping {
	pub fn try_from_dataset(dataset: &gdal::Dataset) -> Result<Self> {
		log::trace!("Computing band mapping (raster_count={})", dataset.raster_count());

		let bands: Vec<(usize, ColorInterpretation)> = (1..=dataset.raster_count())
			.map(|i| {
				let band = dataset
					.rasterband(i)
					.with_context(|| format!("Failed to get raster band {i} from GDAL dataset"))?;
				Ok((i, band.color_interpretation()))
			})
			.collect::<Result<_>>()?;

		let band_string = bands
			.iter()
			.map(|(_, ci)| format!("{ci:?}"))
			.collect::<Vec<_>>()
			.join(", ");

		let channels = (|| {
			// gray, red, green, blue, alpha
			let mut channels: [Option<usize>; 5] = [None, None, None, None, None];

			for (band_index, ci) in bands.iter() {
				use ColorInterpretation::*;
				let channel_index = match ci {
					GrayIndex => 0,
					RedBand => 1,
					GreenBand => 2,
					BlueBand => 3,
					AlphaBand => 4,
					Undefined => {
						if band_index > &4 {
							continue;
						};
						*band_index // 1 => red, 2 => green, 3 => blue, 4 => alpha
					}
					_ => bail!("GDAL band {band_index} has unsupported color interpretation: {ci:?}"),
				};

				ensure!(
					channels[channel_index].is_none(),
					"GDAL dataset band {band_index} uses the same channel ({}) as band {}",
					["grey", "red", "green", "blue", "alpha"][channel_index],
					channels[channel_index].unwrap()
				);
				channels[channel_index] = Some(*band_index);
			}
			Ok::<_, anyhow::Error>(channels)
		})()
		.with_context(|| format!("Failed to compute channel mapping from bands [{band_string}]"))?;

		let map: Vec<usize> = match channels {
			[None, Some(red), Some(green), Some(blue), Some(alpha)] => vec![red, green, blue, alpha],
			[None, Some(red), Some(green), Some(blue), None] => vec![red, green, blue],
			[Some(gray), None, None, None, Some(alpha)] => vec![gray, alpha],
			[Some(gray), None, None, None, None] => vec![gray],
			_ => {
				bail!("The found bands ({band_string}) cannot be interpreted as grey/RGB (+alpha)");
			}
		};
		log::trace!("Band mapping result: {map:?}");

		Ok(BandMapping { map })
	}

	pub fn len(&self) -> usize {
		self.map.len()
	}

	pub fn is_empty(&self) -> bool {
		self.map.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = BandMappingItem> + '_ {
		self
			.map
			.iter()
			.enumerate()
			.map(|(channel_index, &band_index)| BandMappingItem {
				band_index,
				channel_index,
			})
	}

	/// Writes this mapping's source→destination band lists into GDAL warp
	/// options.
	///
	/// # Safety
	/// The allocated band arrays are handed over to GDAL, which frees them
	/// together with the warp options.
	pub unsafe fn setup_gdal_warp_options(&self, options: &mut gdal_sys::GDALWarpOptions) {
		unsafe {
			let n = self.map.len();
			let bytes = n * std::mem::size_of::<i32>();
			options.nBandCount = n as i32;
			options.panSrcBands = gdal_sys::CPLMalloc(bytes).cast::<i32>();
			options.panDstBands = gdal_sys::CPLMalloc(bytes).cast::<i32>();
			for (channel_index, &band_index) in self.map.iter().enumerate() {
				options.panSrcBands.add(channel_index).write(band_index as i32);
				options.panDstBands.add(channel_index).write(channel_index as i32 + 1);
			}
		}
	}

	/// An in-memory EPSG:3857 destination dataset with this mapping's
	/// channel layout.
	pub fn create_mem_dataset(&self, width: usize, height: usize) -> Result<gdal::Dataset> {
		let driver = DriverManager::get_driver_by_name("MEM").context("Failed to get GDAL MEM driver")?;

		let mut dst = driver
			.create_with_band_type::<u8, _>("", width, height, self.len())
			.context("Failed to create in-memory dataset")?;
		dst.set_spatial_ref(&SpatialRef::from_epsg(3857)?)?;

		use ColorInterpretation::*;

		match self.len() {
			1 => dst.rasterband(1)?.set_color_interpretation(GrayIndex)?,
			2 => {
				dst.rasterband(1)?.set_color_interpretation(GrayIndex)?;
				dst.rasterband(2)?.set_color_interpretation(AlphaBand)?;
			}
			3 => {
				dst.rasterband(1)?.set_color_interpretation(RedBand)?;
				dst.rasterband(2)?.set_color_interpretation(GreenBand)?;
				dst.rasterband(3)?.set_color_interpretation(BlueBand)?;
			}
			4 => {
				dst.rasterband(1)?.set_color_interpretation(RedBand)?;
				dst.rasterband(2)?.set_color_interpretation(GreenBand)?;
				dst.rasterband(3)?.set_color_interpretation(BlueBand)?;
				dst.rasterband(4)?.set_color_interpretation(AlphaBand)?;
			}
			_ => bail!("Unsupported number of bands in band mapping: {}", self.len()),
		}

		Ok(dst)
	}
}

impl Debug for BandMapping {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "BandMapping {{ map: {:?} }}", self.map)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use gdal::DriverManager;
	use rstest::rstest;

	fn mem_dataset_with_bands(cis: Vec<ColorInterpretation>) -> Result<gdal::Dataset> {
		let driver = DriverManager::get_driver_by_name("MEM")?;
		let ds = driver.create_with_band_type::<u8, _>("", 2, 2, cis.len())?;
		for (i, ci) in cis.into_iter().enumerate() {
			ds.rasterband(i + 1)?.set_color_interpretation(ci)?;
		}
		Ok(ds)
	}

	fn parse_color_interpretations(text: &str) -> Vec<ColorInterpretation> {
		use ColorInterpretation::*;
		text
			.split(',')
			.filter_map(|s| {
				let t = s.trim().to_ascii_lowercase();
				Some(match t.as_str() {
					"grey" | "gray" => GrayIndex,
					"r" | "red" => RedBand,
					"g" | "green" => GreenBand,
					"b" | "blue" => BlueBand,
					"a" | "alpha" => AlphaBand,
					"u" | "undefined" => Undefined,
					"palette" | "pal" => PaletteIndex,
					_ => return None,
				})
			})
			.collect()
	}

	#[rstest]
	#[case("Grey", &[1])]
	#[case("Grey,A", &[1, 2])]
	#[case("R,G,B", &[1, 2, 3])]
	#[case("B,G,R", &[3, 2, 1])]
	#[case("R,G,B,A", &[1, 2, 3, 4])]
	#[case("A,R,G,B", &[2, 3, 4, 1])]
	fn mapping_ok_cases(#[case] colors_in: &str, #[case] mapping: &[usize]) -> Result<()> {
		let ds = mem_dataset_with_bands(parse_color_interpretations(colors_in))?;
		let bm = BandMapping::try_from_dataset(&ds)?;
		assert_eq!(bm.len(), mapping.len());

		let got: Vec<_> = bm
			.iter()
			.enumerate()
			.map(|(i, it)| {
				assert_eq!(i, it.channel_index);
				it.band_index
			})
			.collect();
		assert_eq!(got, mapping);
		Ok(())
	}

	#[rstest]
	#[case("Palette")]
	#[case("Red,Red")]
	#[case("Undefined,Undefined,Green")]
	fn mapping_error_cases(#[case] colors_in: &str) -> Result<()> {
		let ds = mem_dataset_with_bands(parse_color_interpretations(colors_in))?;
		assert!(BandMapping::try_from_dataset(&ds).is_err());
		Ok(())
	}
}
