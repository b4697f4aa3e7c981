use serde::Deserialize;
use std::collections::HashMap;

fn default_backend() -> String {
	"http://localhost:8080".to_string()
}
fn default_metadata_timeout() -> u64 {
	300 // upstream /info can be slow while processing runs
}
fn default_cache_ttl() -> u64 {
	300
}
fn default_cache_max_entries() -> u64 {
	1000
}

/// Metadata backend selection and the task-metadata cache.
///
/// `backends` maps a request host (taken from the `Origin`, `Referer` or
/// `Host` header) to the backend base URL serving that deployment; new
/// environments are added here, not in code.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct UpstreamConfig {
	/// Backend base URL used when no table entry matches.
	#[serde(default = "default_backend")]
	pub default_backend: String,

	/// Host → backend base URL.
	#[serde(default)]
	pub backends: HashMap<String, String>,

	/// Timeout for the task-info request, in seconds.
	#[serde(default = "default_metadata_timeout")]
	pub metadata_timeout_seconds: u64,

	/// Time-to-live of cached task metadata, in seconds.
	#[serde(default = "default_cache_ttl")]
	pub cache_ttl_seconds: u64,

	/// Maximum number of cached task-metadata entries.
	#[serde(default = "default_cache_max_entries")]
	pub cache_max_entries: u64,
}

impl Default for UpstreamConfig {
	fn default() -> Self {
		UpstreamConfig {
			default_backend: default_backend(),
			backends: HashMap::new(),
			metadata_timeout_seconds: default_metadata_timeout(),
			cache_ttl_seconds: default_cache_ttl(),
			cache_max_entries: default_cache_max_entries(),
		}
	}
}
