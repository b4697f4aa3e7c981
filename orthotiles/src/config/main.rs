use super::{ArtifactConfig, Cors, ServerConfig, TileConfig, UpstreamConfig};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
	fs::File,
	io::{BufReader, Read},
	path::Path,
};

#[derive(Default, Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
	/// HTTP server configuration
	#[serde(default)]
	pub server: ServerConfig,

	/// Cross-Origin Resource Sharing (CORS) settings
	#[serde(default)]
	pub cors: Cors,

	/// Metadata backend selection, timeouts and the metadata cache
	#[serde(default)]
	pub upstream: UpstreamConfig,

	/// Local artifact cache and download timeouts
	#[serde(default)]
	pub artifacts: ArtifactConfig,

	/// Tile rendering defaults and zoom behavior
	#[serde(default)]
	pub tiles: TileConfig,
}

impl Config {
	pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
		Ok(serde_yaml_ng::from_reader(reader)?)
	}

	pub fn from_string(text: &str) -> Result<Self> {
		Ok(serde_yaml_ng::from_str(text)?)
	}

	pub fn from_path(path: &Path) -> Result<Self> {
		let file = File::open(path).with_context(|| format!("Failed to open config file {path:?}"))?;
		Config::from_reader(BufReader::new(file))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;
	use std::collections::HashMap;

	#[test]
	fn parse_empty_config() {
		assert_eq!(Config::from_string("").unwrap(), Config::default());
	}

	#[test]
	fn parse_full_config() {
		let yaml = r#"
server:
  ip: 127.0.0.1
  port: 51234
cors:
  allowed_origins:
    - "https://example.org"
    - "*.other-example.org"
  max_age_seconds: 86400
  allow_credentials: true
upstream:
  default_backend: "https://prod.example.org"
  backends:
    "prod.example.org": "https://prod.example.org"
    "localhost:8000": "http://localhost:8000"
  metadata_timeout_seconds: 120
  cache_ttl_seconds: 60
  cache_max_entries: 10
artifacts:
  cache_dir: /var/cache/orthotiles
  connect_timeout_seconds: 10
  download_timeout_seconds: 90
tiles:
  default_size: 512
  zoom_extra_levels: 2
  fallback_zoom_min: 4
  fallback_zoom_max: 30
  auto_webp: false
  cache_max_age_seconds: 600
"#;
		let cfg = Config::from_string(yaml).unwrap();

		assert_eq!(
			cfg,
			Config {
				server: ServerConfig {
					ip: Some("127.0.0.1".to_string()),
					port: Some(51234),
				},
				cors: Cors {
					allowed_origins: vec!["https://example.org".to_string(), "*.other-example.org".to_string()],
					max_age_seconds: Some(86400),
					allow_credentials: Some(true),
				},
				upstream: UpstreamConfig {
					default_backend: "https://prod.example.org".to_string(),
					backends: HashMap::from([
						("prod.example.org".to_string(), "https://prod.example.org".to_string()),
						("localhost:8000".to_string(), "http://localhost:8000".to_string()),
					]),
					metadata_timeout_seconds: 120,
					cache_ttl_seconds: 60,
					cache_max_entries: 10,
				},
				artifacts: ArtifactConfig {
					cache_dir: Some("/var/cache/orthotiles".into()),
					connect_timeout_seconds: 10,
					download_timeout_seconds: 90,
				},
				tiles: TileConfig {
					default_size: 512,
					zoom_extra_levels: 2,
					fallback_zoom_min: 4,
					fallback_zoom_max: 30,
					auto_webp: false,
					cache_max_age_seconds: 600,
				},
			}
		);
	}

	#[test]
	fn unknown_fields_are_rejected() {
		assert!(Config::from_string("pi: 3.14").is_err());
	}

	#[test]
	fn defaults_match_the_documented_values() {
		let cfg = Config::default();
		assert_eq!(cfg.upstream.metadata_timeout_seconds, 300);
		assert_eq!(cfg.upstream.cache_ttl_seconds, 300);
		assert_eq!(cfg.upstream.cache_max_entries, 1000);
		assert_eq!(cfg.artifacts.connect_timeout_seconds, 60);
		assert_eq!(cfg.artifacts.download_timeout_seconds, 300);
		assert_eq!(cfg.tiles.default_size, 256);
		assert_eq!(cfg.tiles.zoom_extra_levels, 0);
		assert_eq!(cfg.tiles.fallback_zoom_min, 8);
		assert_eq!(cfg.tiles.fallback_zoom_max, 50);
		assert!(cfg.tiles.auto_webp);
		assert_eq!(cfg.tiles.cache_max_age_seconds, 3600);
	}
}
