//! Task metadata resolution with time-bounded caching.
//!
//! `resolveMetadata` in one type: check the cache, otherwise ask the
//! backend's task-info endpoint and remember the answer for the configured
//! TTL. Two concurrent misses for the same task may both fetch upstream;
//! the fetch is idempotent, so that is only a minor efficiency loss.

use crate::{
	config::UpstreamConfig,
	error::{ServeError, ServeResult},
};
use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};

/// One orthomosaic as the backend describes it.
///
/// If `cog_url` is absent the task has not been processed yet and no
/// tile/metadata/bounds operation can succeed for it.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskMetadata {
	pub id: String,
	pub project_id: i64,
	#[serde(default)]
	pub cog_url: Option<String>,
	#[serde(default)]
	pub tile_service_url: Option<String>,
	/// `[west, south, east, north]` in degrees, as reported by the backend.
	#[serde(default)]
	pub bounds: Option<Vec<f64>>,
	#[serde(default)]
	pub min_zoom: Option<u8>,
	#[serde(default)]
	pub max_zoom: Option<u8>,
	pub status: String,
}

pub struct MetadataClient {
	http: reqwest::Client,
	cache: moka::future::Cache<String, Arc<TaskMetadata>>,
}

impl MetadataClient {
	pub fn new(config: &UpstreamConfig) -> Result<MetadataClient> {
		let http = reqwest::Client::builder()
			.timeout(Duration::from_secs(config.metadata_timeout_seconds))
			.build()
			.context("Failed to build metadata HTTP client")?;

		let cache = moka::future::Cache::builder()
			.max_capacity(config.cache_max_entries)
			.time_to_live(Duration::from_secs(config.cache_ttl_seconds))
			.build();

		Ok(MetadataClient { http, cache })
	}

	/// Returns the metadata for `task_id`, from cache if fresh.
	pub async fn resolve(&self, task_id: &str, backend_base_url: &str) -> ServeResult<Arc<TaskMetadata>> {
		if let Some(hit) = self.cache.get(task_id).await {
			log::trace!("metadata cache hit for task {task_id}");
			return Ok(hit);
		}

		let metadata = self.fetch(task_id, backend_base_url).await?;
		self.cache.insert(task_id.to_string(), Arc::clone(&metadata)).await;
		Ok(metadata)
	}

	async fn fetch(&self, task_id: &str, backend_base_url: &str) -> ServeResult<Arc<TaskMetadata>> {
		let url = format!("{backend_base_url}/api/tiles/{task_id}/info");
		log::debug!("fetching task metadata from {url}");

		let response = self.http.get(&url).send().await.map_err(|err| ServeError::Upstream {
			task_id: task_id.to_string(),
			source: anyhow!(err).context(format!("Request to {url} failed")),
		})?;

		let status = response.status();
		if !status.is_success() {
			let body = response.text().await.unwrap_or_default();
			return Err(ServeError::Upstream {
				task_id: task_id.to_string(),
				source: anyhow!("upstream returned {status}: {body}"),
			});
		}

		let metadata: TaskMetadata = response
			.json()
			.await
			.with_context(|| format!("Failed to parse task-info response from {url}"))?;

		Ok(Arc::new(metadata))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn deserializes_camel_case_payload() {
		let metadata: TaskMetadata = serde_json::from_str(
			r#"{
				"id": "t1",
				"projectId": 42,
				"cogUrl": "https://storage.example.org/t1.tif",
				"tileServiceUrl": null,
				"bounds": [10.0, 20.0, 11.0, 21.0],
				"minZoom": 12,
				"maxZoom": 22,
				"status": "COMPLETED"
			}"#,
		)
		.unwrap();

		assert_eq!(metadata.id, "t1");
		assert_eq!(metadata.project_id, 42);
		assert_eq!(metadata.cog_url.as_deref(), Some("https://storage.example.org/t1.tif"));
		assert_eq!(metadata.bounds, Some(vec![10.0, 20.0, 11.0, 21.0]));
		assert_eq!(metadata.min_zoom, Some(12));
		assert_eq!(metadata.max_zoom, Some(22));
	}

	#[test]
	fn optional_fields_may_be_absent() {
		let metadata: TaskMetadata =
			serde_json::from_str(r#"{"id": "t2", "projectId": 1, "status": "PROCESSING"}"#).unwrap();
		assert_eq!(metadata.cog_url, None);
		assert_eq!(metadata.bounds, None);
		assert_eq!(metadata.min_zoom, None);
		assert_eq!(metadata.max_zoom, None);
	}
}
