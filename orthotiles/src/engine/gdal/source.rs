use super::{band_mapping::BandMapping, instance::Instance};
use crate::engine::Resampling;
use anyhow::{Context, Result, ensure};
use gdal::{Dataset, config::set_config_option, raster::ColorInterpretation, spatial_ref::SpatialRef, vector::Geometry};
use orthotiles_core::GeoBBox;
use std::{
	collections::LinkedList,
	path::{Path, PathBuf},
	sync::Arc,
};
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};

/// One opened raster artifact with a pool of GDAL dataset handles.
#[derive(Debug)]
pub struct GdalSource {
	filename: PathBuf,
	instances: Arc<Mutex<LinkedList<Instance>>>,
	bbox: GeoBBox,
	band_mapping: Arc<BandMapping>,
	nodata: Option<f64>,
	pixel_type: String,
	color_interpretations: Vec<String>,
	raster_size: (usize, usize),
	reuse_limit: u32,
	/// Limits the maximum number of concurrently checked-out `Instance`s.
	sem: Arc<Semaphore>,
}

unsafe impl Sync for GdalSource {}

/// An `Instance` checked out from the pool while holding a semaphore permit.
struct HeldInstance {
	inst: Instance,
	_permit: OwnedSemaphorePermit,
}

impl GdalSource {
	pub async fn new(filename: &Path, reuse_limit: u32, concurrency_limit: usize) -> Result<GdalSource> {
		log::debug!("Opening GDAL dataset from file: {:?}", filename);

		set_config_option("GDAL_NUM_THREADS", "ALL_CPUS")?;

		let dataset =
			Dataset::open(filename).with_context(|| format!("Failed to open GDAL dataset {filename:?}"))?;
		log::trace!(
			"Opened GDAL dataset {:?} ({}x{}, bands={})",
			filename,
			dataset.raster_size().0,
			dataset.raster_size().1,
			dataset.raster_count()
		);

		let bbox = dataset_bbox(&dataset)?;
		let band_mapping = BandMapping::try_from_dataset(&dataset)?;
		let raster_size = dataset.raster_size();

		let band1 = dataset.rasterband(1)?;
		let nodata = band1.no_data_value();
		let pixel_type = pixel_type_name(band1.band_type());
		let color_interpretations = (1..=dataset.raster_count())
			.map(|i| Ok(interp_name(dataset.rasterband(i)?.color_interpretation()).to_string()))
			.collect::<Result<Vec<_>>>()?;

		log::trace!("Dataset bbox (EPSG:4326): {:?}", bbox);
		log::trace!("Band mapping: {band_mapping:?}");

		let mut list = LinkedList::new();
		list.push_back(Instance::new(dataset));

		Ok(GdalSource {
			filename: filename.to_path_buf(),
			instances: Arc::new(Mutex::new(list)),
			bbox,
			band_mapping: Arc::new(band_mapping),
			nodata,
			pixel_type,
			color_interpretations,
			raster_size,
			reuse_limit: reuse_limit.min(1024),
			sem: Arc::new(Semaphore::new(concurrency_limit.max(1))),
		})
	}

	pub fn bbox(&self) -> &GeoBBox {
		&self.bbox
	}

	pub fn nodata(&self) -> Option<f64> {
		self.nodata
	}

	pub fn pixel_type(&self) -> &str {
		&self.pixel_type
	}

	pub fn color_interpretations(&self) -> &[String] {
		&self.color_interpretations
	}

	/// Dimensions for a whole-raster read, downscaled so that the longer
	/// edge is at most `cap` pixels.
	pub fn overview_size(&self, cap: usize) -> (usize, usize) {
		scaled_size(self.raster_size, cap)
	}

	async fn get_instance(&self) -> HeldInstance {
		let permit = self.sem.clone().acquire_owned().await.expect("semaphore closed");

		let inst = {
			let mut instances = self.instances.lock().await;
			if let Some(instance) = instances.pop_front()
				&& instance.age() < self.reuse_limit + 1
			{
				instance
			} else {
				Instance::new(Dataset::open(&self.filename).expect("failed to open GDAL dataset"))
			}
		};

		HeldInstance { inst, _permit: permit }
	}

	async fn drop_instance(&self, mut held: HeldInstance) {
		held.inst.cleanup();
		let mut instances = self.instances.lock().await;
		instances.push_back(held.inst);
		// `_permit` drops here, releasing one concurrency slot
	}

	/// Reads `width`×`height` pixels covering `bbox`, reprojected to
	/// Web Mercator. Returns interleaved samples and the channel count.
	pub async fn read_region(
		&self,
		bbox: &GeoBBox,
		width: usize,
		height: usize,
		resampling: Resampling,
	) -> Result<(Vec<u8>, usize)> {
		let held = self.get_instance().await;
		let dst = held
			.inst
			.reproject_to_dataset(width, height, bbox, Arc::clone(&self.band_mapping), resampling)?;
		self.drop_instance(held).await;

		let band_mapping = Arc::clone(&self.band_mapping);
		let channel_count = band_mapping.len();
		let buf = tokio::task::spawn_blocking(move || -> Result<Vec<u8>> {
			let mut buf = vec![0u8; width * height * channel_count];
			for item in band_mapping.iter() {
				let band = dst.rasterband(item.band_index)?.read_band_as::<u8>()?;
				let data = band.data();
				ensure!(
					data.len() == width * height,
					"Band {} data length mismatch: expected {} but got {}",
					item.band_index,
					width * height,
					data.len()
				);
				for (i, &px) in data.iter().enumerate() {
					buf[i * channel_count + item.channel_index] = px;
				}
			}
			Ok(buf)
		})
		.await??;

		Ok((buf, channel_count))
	}
}

fn scaled_size((width, height): (usize, usize), cap: usize) -> (usize, usize) {
	let longest = width.max(height).max(1);
	if longest <= cap {
		return (width.max(1), height.max(1));
	}
	let scale = longest as f64 / cap as f64;
	(
		((width as f64 / scale).round() as usize).max(1),
		((height as f64 / scale).round() as usize).max(1),
	)
}

fn pixel_type_name(data_type: gdal::raster::GdalDataType) -> String {
	use gdal::raster::GdalDataType::*;
	match data_type {
		UInt8 => "uint8",
		UInt16 => "uint16",
		Int16 => "int16",
		UInt32 => "uint32",
		Int32 => "int32",
		Float32 => "float32",
		Float64 => "float64",
		_ => "unknown",
	}
	.to_string()
}

fn interp_name(interp: ColorInterpretation) -> &'static str {
	use ColorInterpretation::*;
	match interp {
		GrayIndex => "gray",
		PaletteIndex => "palette",
		RedBand => "red",
		GreenBand => "green",
		BlueBand => "blue",
		AlphaBand => "alpha",
		HueBand => "hue",
		SaturationBand => "saturation",
		LightnessBand => "lightness",
		CyanBand => "cyan",
		MagentaBand => "magenta",
		YellowBand => "yellow",
		BlackBand => "black",
		Undefined => "undefined",
	}
}

fn dataset_bbox(dataset: &gdal::Dataset) -> Result<GeoBBox> {
	let gt = dataset
		.geo_transform()
		.context("Failed to get geo transform from GDAL dataset")?;

	ensure!(gt[2] == 0.0 && gt[4] == 0.0, "GDAL dataset must not be rotated");

	let width = dataset.raster_size().0;
	let height = dataset.raster_size().1;
	let spatial_ref = dataset
		.spatial_ref()
		.context("GDAL dataset must have a spatial reference (SRS) defined")?;

	let mut bbox = Geometry::bbox(
		gt[0],
		gt[3],
		gt[0] + gt[1] * width as f64,
		gt[3] + gt[5] * height as f64,
	)?;

	bbox.set_spatial_ref(spatial_ref.clone());
	bbox
		.transform_to_inplace(&SpatialRef::from_epsg(4326)?)
		.context("Failed to transform bounding box to EPSG:4326")?;

	let envelope = bbox.envelope();

	// Coordinates come back flipped in OGREnvelope
	let mut bbox = GeoBBox::new_clamped(envelope.MinY, envelope.MinX, envelope.MaxY, envelope.MaxX);
	bbox.limit_to_mercator();

	log::trace!("bounding box: {:?}", bbox);
	Ok(bbox)
}
