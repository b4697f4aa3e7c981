//! Backend selection from ordinary browser request headers.
//!
//! Multiple front-end deployments (production, staging, local) share one
//! tiling service; which metadata backend to ask is derived from the
//! request's `Origin`, falling back to `Referer`, then `Host`. The mapping
//! is plain configuration data, and resolution never fails: anything
//! unknown degrades to the default backend.

use crate::config::UpstreamConfig;
use axum::http::{HeaderMap, header};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct BackendResolver {
	backends: HashMap<String, String>,
	default_backend: String,
}

impl BackendResolver {
	pub fn new(config: &UpstreamConfig) -> BackendResolver {
		BackendResolver {
			backends: config
				.backends
				.iter()
				.map(|(host, url)| (host.to_ascii_lowercase(), url.clone()))
				.collect(),
			default_backend: config.default_backend.clone(),
		}
	}

	/// Resolves the backend base URL for a request.
	pub fn resolve(&self, headers: &HeaderMap) -> &str {
		let value = [header::ORIGIN, header::REFERER, header::HOST]
			.iter()
			.find_map(|name| headers.get(name).and_then(|v| v.to_str().ok()))
			.unwrap_or("");

		let host = host_of(value);
		let backend = self.backends.get(&host).map_or(self.default_backend.as_str(), String::as_str);
		log::debug!("resolved backend '{backend}' for request host '{host}'");
		backend
	}
}

/// Reduces a header value like `https://maps.example.org/path` to its
/// `host[:port]` part. Values without a scheme pass through unchanged.
fn host_of(value: &str) -> String {
	let rest = match value.find("://") {
		Some(pos) => &value[pos + 3..],
		None => value,
	};
	let host = rest.split(['/', '?', '#']).next().unwrap_or("");
	host.to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::http::HeaderValue;

	fn resolver() -> BackendResolver {
		BackendResolver::new(&UpstreamConfig {
			default_backend: "https://prod.example.org".to_string(),
			backends: HashMap::from([
				("prod.example.org".to_string(), "https://prod.example.org".to_string()),
				("dev.example.org".to_string(), "https://dev.example.org".to_string()),
				("localhost:8000".to_string(), "http://localhost:8000".to_string()),
			]),
			..UpstreamConfig::default()
		})
	}

	fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
		let mut map = HeaderMap::new();
		for (name, value) in pairs {
			map.insert(
				axum::http::HeaderName::from_bytes(name.as_bytes()).unwrap(),
				HeaderValue::from_str(value).unwrap(),
			);
		}
		map
	}

	#[test]
	fn origin_wins_over_referer_and_host() {
		let map = headers(&[
			("origin", "https://dev.example.org"),
			("referer", "https://prod.example.org/map"),
			("host", "localhost:8000"),
		]);
		assert_eq!(resolver().resolve(&map), "https://dev.example.org");
	}

	#[test]
	fn referer_is_used_when_origin_is_absent() {
		let map = headers(&[("referer", "https://dev.example.org/projects/3")]);
		assert_eq!(resolver().resolve(&map), "https://dev.example.org");
	}

	#[test]
	fn host_header_matches_with_port() {
		let map = headers(&[("host", "localhost:8000")]);
		assert_eq!(resolver().resolve(&map), "http://localhost:8000");
	}

	#[test]
	fn unknown_host_degrades_to_default() {
		let map = headers(&[("origin", "https://evil.example.net")]);
		assert_eq!(resolver().resolve(&map), "https://prod.example.org");
	}

	#[test]
	fn missing_headers_degrade_to_default() {
		assert_eq!(resolver().resolve(&HeaderMap::new()), "https://prod.example.org");
	}

	#[test]
	fn host_of_strips_scheme_and_path() {
		assert_eq!(host_of("https://Maps.Example.org/a/b?c#d"), "maps.example.org");
		assert_eq!(host_of("localhost:8000"), "localhost:8000");
		assert_eq!(host_of(""), "");
	}
}
