//! HTTP handlers.
//!
//! Handlers stay thin: extract, delegate to the [`TileService`], and wrap
//! the result. Error mapping lives in [`ServeError`]'s `IntoResponse`.

use crate::{
	error::{ServeError, ServeResult},
	pipeline::{MetadataResponse, TileQuery, TileService},
};
use axum::{
	Json,
	body::Body,
	extract::{Path, Query, State},
	http::{HeaderMap, header},
	response::Response,
};
use orthotiles_core::TileJSON;
use serde_json::{Value, json};
use std::sync::Arc;

const SERVICE_NAME: &str = "orthotiles";

pub async fn health() -> Json<Value> {
	Json(json!({ "status": "healthy", "service": SERVICE_NAME }))
}

pub async fn root() -> Json<Value> {
	Json(json!({
		"service": SERVICE_NAME,
		"version": env!("CARGO_PKG_VERSION"),
		"endpoints": {
			"health": "/health",
			"tilejson": "/api/tiles/{task_id}/tilejson",
			"bounds": "/api/tiles/{task_id}/bounds",
			"metadata": "/api/tiles/{task_id}/metadata",
			"tiles": "/api/tiles/{task_id}/{z}/{x}/{y}[.format]"
		}
	}))
}

pub async fn tilejson(
	State(service): State<Arc<TileService>>,
	Path(task_id): Path<String>,
	Query(query): Query<TileQuery>,
	headers: HeaderMap,
) -> ServeResult<Json<TileJSON>> {
	log::debug!("handle tilejson request for task {task_id}");
	Ok(Json(service.tilejson(&task_id, &query, &headers).await?))
}

pub async fn bounds(
	State(service): State<Arc<TileService>>,
	Path(task_id): Path<String>,
	Query(query): Query<TileQuery>,
	headers: HeaderMap,
) -> ServeResult<Json<crate::pipeline::BoundsResponse>> {
	log::debug!("handle bounds request for task {task_id}");
	Ok(Json(service.bounds(&task_id, &query, &headers).await?))
}

pub async fn metadata(
	State(service): State<Arc<TileService>>,
	Path(task_id): Path<String>,
	headers: HeaderMap,
) -> ServeResult<Json<MetadataResponse>> {
	log::debug!("handle metadata request for task {task_id}");
	Ok(Json(service.metadata(&task_id, &headers).await?))
}

pub async fn tile(
	State(service): State<Arc<TileService>>,
	Path((task_id, z, x, y)): Path<(String, u8, u32, String)>,
	Query(query): Query<TileQuery>,
	headers: HeaderMap,
) -> ServeResult<Response<Body>> {
	let (y, format) = split_format_suffix(&y)?;
	log::debug!("handle tile request {task_id}/{z}/{x}/{y} (format: {format:?})");

	let rendered = service
		.render_tile(&task_id, z, x, y, format.as_deref(), &query, &headers)
		.await?;

	Ok(
		Response::builder()
			.status(200)
			.header(header::CONTENT_TYPE, rendered.media_type)
			.header(
				header::CACHE_CONTROL,
				format!("public, max-age={}", service.tile_cache_max_age()),
			)
			.body(Body::from(rendered.bytes))
			.expect("failed to build tile response"),
	)
}

/// Splits the `y[.format]` path segment.
fn split_format_suffix(segment: &str) -> ServeResult<(u32, Option<String>)> {
	let (y_text, format) = match segment.split_once('.') {
		Some((y, format)) => (y, Some(format.to_string())),
		None => (segment, None),
	};

	let y = y_text
		.parse::<u32>()
		.map_err(|_| ServeError::BadRequest(format!("Invalid tile coordinate: {segment}")))?;

	Ok((y, format))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn split_format_suffix_variants() {
		assert_eq!(split_format_suffix("3").unwrap(), (3, None));
		assert_eq!(split_format_suffix("3.png").unwrap(), (3, Some("png".to_string())));
		assert_eq!(split_format_suffix("3.webp").unwrap(), (3, Some("webp".to_string())));
		assert!(split_format_suffix("x.png").is_err());
		assert!(split_format_suffix(".png").is_err());
		assert!(split_format_suffix("").is_err());
	}

	#[tokio::test]
	async fn health_reports_service_name() {
		let Json(body) = health().await;
		assert_eq!(body["status"], "healthy");
		assert_eq!(body["service"], "orthotiles");
	}

	#[tokio::test]
	async fn root_lists_endpoints() {
		let Json(body) = root().await;
		assert_eq!(body["service"], "orthotiles");
		assert!(body["endpoints"]["tilejson"].as_str().unwrap().contains("tilejson"));
	}
}
