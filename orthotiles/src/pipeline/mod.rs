//! The tile request pipeline.
//!
//! Orchestrates: resolve metadata → acquire artifact → validate request
//! parameters → validate the tile is in range → extract → post-process →
//! negotiate the output codec → encode. The thin tilejson/bounds/metadata
//! endpoints reuse the first two steps and read from the opened artifact.

mod params;

pub use params::{TileParams, TileQuery};

use crate::{
	artifact::ArtifactStore,
	backend::BackendResolver,
	config::Config,
	engine::{EngineError, RasterEngine, RasterReader, Resampling},
	error::{ServeError, ServeResult},
	metadata::{MetadataClient, TaskMetadata},
};
use anyhow::{Context, Result, anyhow};
use axum::http::{HeaderMap, header};
use orthotiles_core::{TileCoord, TileFormat, TileJSON, ZoomRange};
use orthotiles_image::BandStatistics;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Serialize;
use std::{collections::BTreeMap, sync::Arc};

/// Characters kept verbatim in tile URL template query strings.
const QUERY_ENCODE: &percent_encoding::AsciiSet = &NON_ALPHANUMERIC
	.remove(b'-')
	.remove(b'.')
	.remove(b'_')
	.remove(b'~');

/// An encoded tile ready to be sent.
pub struct RenderedTile {
	pub bytes: Vec<u8>,
	pub media_type: String,
}

#[derive(Debug, Serialize)]
pub struct BoundsResponse {
	pub url: String,
	pub bounds: [f64; 4],
}

#[derive(Debug, Serialize)]
pub struct MetadataResponse {
	pub bounds: [f64; 4],
	pub minzoom: u8,
	pub maxzoom: u8,
	pub name: String,
	pub dtype: String,
	pub colorinterp: Vec<String>,
	pub nodata: Option<f64>,
	pub statistics: BTreeMap<String, BandStatistics>,
}

pub struct TileService {
	config: Config,
	backends: BackendResolver,
	metadata: MetadataClient,
	artifacts: ArtifactStore,
	engine: Arc<dyn RasterEngine>,
	fallback_zoom: ZoomRange,
}

impl TileService {
	pub fn new(config: Config, engine: Arc<dyn RasterEngine>) -> Result<TileService> {
		let fallback_zoom = ZoomRange::new(config.tiles.fallback_zoom_min, config.tiles.fallback_zoom_max)
			.context("Invalid fallback zoom range in configuration")?;

		Ok(TileService {
			backends: BackendResolver::new(&config.upstream),
			metadata: MetadataClient::new(&config.upstream)?,
			artifacts: ArtifactStore::new(&config.artifacts)?,
			engine,
			fallback_zoom,
			config,
		})
	}

	pub fn tile_cache_max_age(&self) -> u64 {
		self.config.tiles.cache_max_age_seconds
	}

	/// Steps 1–2 of every request: resolve the task's metadata via the
	/// request-derived backend, then acquire and open its artifact.
	async fn open_task(
		&self,
		task_id: &str,
		headers: &HeaderMap,
	) -> ServeResult<(Arc<TaskMetadata>, Arc<dyn RasterReader>)> {
		let backend = self.backends.resolve(headers);
		let metadata = self.metadata.resolve(task_id, backend).await?;

		let Some(cog_url) = metadata.cog_url.clone() else {
			return Err(ServeError::NotFound("Artifact not available for this task".to_string()));
		};

		let path = self
			.artifacts
			.acquire(&cog_url, task_id)
			.await
			.map_err(|source| ServeError::Artifact {
				message: "Failed to download artifact file".to_string(),
				source,
			})?;

		let reader = self.engine.open(&path).await.map_err(|err| match err {
			EngineError::Unreadable(message) => ServeError::Artifact {
				message: "Failed to read artifact file".to_string(),
				source: anyhow!(message),
			},
			other => ServeError::Internal(anyhow!(other)),
		})?;

		Ok((metadata, reader))
	}

	/// Task-supplied zoom window if complete, else the configured fallback;
	/// either way widened by the configured extra levels.
	fn effective_zoom_range(&self, metadata: &TaskMetadata) -> ZoomRange {
		let base = if let (Some(min), Some(max)) = (metadata.min_zoom, metadata.max_zoom) {
			ZoomRange::new(min, max).unwrap_or(self.fallback_zoom)
		} else {
			self.fallback_zoom
		};
		base.widened(self.config.tiles.zoom_extra_levels)
	}

	pub async fn render_tile(
		&self,
		task_id: &str,
		z: u8,
		x: u32,
		y: u32,
		path_format: Option<&str>,
		query: &TileQuery,
		headers: &HeaderMap,
	) -> ServeResult<RenderedTile> {
		let (metadata, reader) = self.open_task(task_id, headers).await?;
		let zoom_range = self.effective_zoom_range(&metadata);
		let params = TileParams::parse(query, path_format, &self.config.tiles)?;

		// A 512px tile at zoom z covers the ground of a 256px tile at z+1;
		// dropping one level keeps a single pyramid semantics.
		let mut effective_z = i32::from(z);
		if params.size == 512 {
			effective_z -= 1;
		}

		let Some(coord) = tile_coord(effective_z, x, y) else {
			return Err(ServeError::NotFound("Tile outside bounds".to_string()));
		};
		if !reader.tile_exists(&coord) {
			return Err(ServeError::NotFound("Tile outside bounds".to_string()));
		}
		if !zoom_range.contains(effective_z) {
			return Err(ServeError::NotFound("Zoom level outside bounds".to_string()));
		}

		let mut tile = reader
			.extract_tile(&coord, params.size, params.nodata, Resampling::Nearest)
			.await
			.map_err(|err| match err {
				EngineError::OutsideBounds | EngineError::Numeric(_) => {
					ServeError::NotFound("Tile outside bounds".to_string())
				}
				EngineError::Unreadable(message) => ServeError::Artifact {
					message: "Failed to read artifact file".to_string(),
					source: anyhow!(message),
				},
				EngineError::Other(source) => ServeError::Internal(source.context("Failed to render tile")),
			})?;

		// Rescale first: it operates on raw sample values. The color map is
		// applied to the rescaled result.
		if let Some((min, max)) = params.rescale {
			tile.rescale(min, max).map_err(|err| ServeError::BadRequest(err.to_string()))?;
		}
		if let Some(map) = params.color_map {
			tile = tile
				.apply_colormap(map)
				.map_err(|err| ServeError::BadRequest(err.to_string()))?;
		}

		let format = self.negotiate_format(params.format, &tile, headers);
		let include_mask = format != TileFormat::JPG && (params.return_mask || !tile.is_opaque());

		let bytes = orthotiles_image::encode(&tile, format, include_mask)
			.context("Failed to encode tile")
			.map_err(ServeError::Internal)?;

		Ok(RenderedTile {
			bytes,
			media_type: format.as_mime_str().to_string(),
		})
	}

	/// Bandwidth optimization for partially-transparent edge tiles: a PNG
	/// response is upgraded to WebP when the client declares support and
	/// the tile is not fully opaque. Togglable via `tiles.auto_webp`.
	fn negotiate_format(&self, requested: TileFormat, tile: &orthotiles_image::RasterTile, headers: &HeaderMap) -> TileFormat {
		if requested == TileFormat::PNG && self.config.tiles.auto_webp && accepts_webp(headers) && !tile.is_opaque() {
			log::debug!("upgrading PNG response to WebP for partially transparent tile");
			return TileFormat::WEBP;
		}
		requested
	}

	pub async fn tilejson(&self, task_id: &str, query: &TileQuery, headers: &HeaderMap) -> ServeResult<TileJSON> {
		let (metadata, reader) = self.open_task(task_id, headers).await?;
		let zoom_range = self.effective_zoom_range(&metadata);

		// Always read bounds from the artifact to get accurate geographic
		// (EPSG:4326) coordinates, not the task's raw bounds.
		let bounds = reader.bounds();

		Ok(TileJSON::new(
			&format!("Task {task_id} Orthomosaic"),
			tile_url_template(task_id, query),
			zoom_range,
			&bounds,
		))
	}

	pub async fn bounds(&self, task_id: &str, query: &TileQuery, headers: &HeaderMap) -> ServeResult<BoundsResponse> {
		let (_metadata, reader) = self.open_task(task_id, headers).await?;

		Ok(BoundsResponse {
			url: tile_url_template(task_id, query),
			bounds: reader.bounds().as_array(),
		})
	}

	pub async fn metadata(&self, task_id: &str, headers: &HeaderMap) -> ServeResult<MetadataResponse> {
		let (metadata, reader) = self.open_task(task_id, headers).await?;
		let zoom_range = self.effective_zoom_range(&metadata);

		// Statistics failures are non-fatal; the request still succeeds
		// with an empty statistics object.
		let statistics = match reader.statistics().await {
			Ok(statistics) => statistics,
			Err(err) => {
				log::warn!("Could not compute statistics for task {task_id}: {err:#}");
				BTreeMap::new()
			}
		};

		let bounds = match metadata.bounds.as_deref() {
			Some([w, s, e, n]) => [*w, *s, *e, *n],
			_ => reader.bounds().as_array(),
		};

		Ok(MetadataResponse {
			bounds,
			minzoom: zoom_range.min,
			maxzoom: zoom_range.max,
			name: format!("Task {task_id} Orthomosaic"),
			dtype: reader.pixel_type(),
			colorinterp: reader.color_interpretations(),
			nodata: reader.nodata(),
			statistics,
		})
	}
}

fn accepts_webp(headers: &HeaderMap) -> bool {
	headers
		.get(header::ACCEPT)
		.and_then(|value| value.to_str().ok())
		.is_some_and(|accept| accept.contains("image/webp"))
}

/// A coordinate for the effective zoom, or `None` when the zoom or the
/// x/y indices fall outside the tile grid.
fn tile_coord(effective_z: i32, x: u32, y: u32) -> Option<TileCoord> {
	let level = u8::try_from(effective_z).ok()?;
	let coord = TileCoord::new(level, x, y).ok()?;
	coord.is_valid().then_some(coord)
}

/// The tile URL template advertised by tilejson/bounds responses, carrying
/// forward the request's format/rescale/color_map/size parameters.
fn tile_url_template(task_id: &str, query: &TileQuery) -> String {
	let mut url = format!("/api/tiles/{task_id}/{{z}}/{{x}}/{{y}}");

	let mut pairs: Vec<(&str, String)> = Vec::new();
	if let Some(format) = &query.format {
		pairs.push(("format", format.clone()));
	}
	if let Some(rescale) = &query.rescale {
		pairs.push(("rescale", rescale.clone()));
	}
	if let Some(color_map) = &query.color_map {
		pairs.push(("color_map", color_map.clone()));
	}
	if let Some(size) = query.size {
		pairs.push(("size", size.to_string()));
	}

	if !pairs.is_empty() {
		let encoded: Vec<String> = pairs
			.iter()
			.map(|(key, value)| format!("{key}={}", utf8_percent_encode(value, QUERY_ENCODE)))
			.collect();
		url.push('?');
		url.push_str(&encoded.join("&"));
	}

	url
}
