//! CORS layer builder.
//!
//! Supports the following `allowed_origins` patterns (strings):
//! - `"*"`                     → allow all origins
//! - `"*.example.com"`         → suffix match (implemented as `*example.com`)
//! - `"https://example.com*"`  → prefix match
//! - `"/^https://(foo|bar)\.example\.com$/"` → custom regex (leading and trailing `/`)
//! - exact strings like `"https://maps.example.org"`
//!
//! Only the origin predicate, methods and credentials are set here;
//! headers mirror the request so credentialed requests keep working.

use crate::config::Cors;
use anyhow::Result;
use axum::http::{Method, header::HeaderValue, request::Parts};
use regex::Regex;
use std::time::Duration;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};

const DEFAULT_MAX_AGE_SECONDS: u64 = 3600;

type Predicate = Box<dyn Fn(&str) -> bool + Send + Sync + 'static>;

pub fn build_cors_layer(config: &Cors) -> Result<CorsLayer> {
	let checks: Vec<Predicate> = config
		.allowed_origins
		.iter()
		.map(|pattern| {
			Ok::<Predicate, anyhow::Error>(if pattern == "*" {
				// Allow everything.
				Box::new(|_: &str| true)
			} else if Regex::new(r"^\*[^*]+$")?.is_match(pattern) {
				// "*suffix" → suffix match
				let suffix = pattern[1..].to_string();
				Box::new(move |origin: &str| origin.ends_with(&suffix))
			} else if Regex::new(r"^[^*]+\*$")?.is_match(pattern) {
				// "prefix*" → prefix match
				let prefix = pattern[..pattern.len() - 1].to_string();
				Box::new(move |origin: &str| origin.starts_with(&prefix))
			} else if Regex::new(r"^/.+/$")?.is_match(pattern) {
				// "/regex/" → full regex (strip slashes)
				let re = Regex::new(&pattern[1..pattern.len() - 1])?;
				Box::new(move |origin: &str| re.is_match(origin))
			} else {
				// Exact match
				let exact = pattern.clone();
				Box::new(move |origin: &str| origin == exact)
			})
		})
		.collect::<Result<Vec<_>>>()?;

	let mut layer = CorsLayer::new()
		.allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _req: &Parts| {
			let origin_str = origin.to_str().unwrap_or("");
			checks.iter().any(|check| check(origin_str))
		}))
		.allow_methods([Method::GET, Method::POST, Method::OPTIONS])
		.allow_headers(AllowHeaders::mirror_request())
		.max_age(Duration::from_secs(
			config.max_age_seconds.unwrap_or(DEFAULT_MAX_AGE_SECONDS),
		));

	if config.allow_credentials.unwrap_or(false) {
		layer = layer.allow_credentials(true);
	}

	Ok(layer)
}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::{
		Router,
		body::Body,
		http::{Request, header},
		routing::get,
	};
	use tower::ServiceExt; // for `oneshot`

	fn layer_for(origins: &[&str]) -> CorsLayer {
		build_cors_layer(&Cors {
			allowed_origins: origins.iter().map(|s| s.to_string()).collect(),
			max_age_seconds: None,
			allow_credentials: None,
		})
		.unwrap()
	}

	async fn has_acao(layer: &CorsLayer, origin: &str) -> bool {
		let app = Router::new().route("/", get(|| async { "ok" })).layer(layer.clone());

		let req = Request::builder()
			.uri("/")
			.header(header::ORIGIN, origin)
			.body(Body::empty())
			.unwrap();

		let resp = app.oneshot(req).await.unwrap();
		resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_some()
	}

	#[tokio::test]
	async fn exact_match() {
		let layer = layer_for(&["https://maps.example.org"]);
		assert!(has_acao(&layer, "https://maps.example.org").await);
		assert!(!has_acao(&layer, "https://maps.example.com").await);
	}

	#[tokio::test]
	async fn star_all() {
		let layer = layer_for(&["*"]);
		assert!(has_acao(&layer, "http://anything.local").await);
	}

	#[tokio::test]
	async fn suffix_match() {
		let layer = layer_for(&["*example.com"]);
		assert!(has_acao(&layer, "https://foo.example.com").await);
		assert!(!has_acao(&layer, "https://example.org").await);
	}

	#[tokio::test]
	async fn prefix_match() {
		let layer = layer_for(&["https://dev-*"]);
		assert!(has_acao(&layer, "https://dev-01.example.com").await);
		assert!(!has_acao(&layer, "https://prod-01.example.com").await);
	}

	#[tokio::test]
	async fn regex_match() {
		let layer = layer_for(&["/^https://(foo|bar)\\.example\\.com$/"]);
		assert!(has_acao(&layer, "https://foo.example.com").await);
		assert!(has_acao(&layer, "https://bar.example.com").await);
		assert!(!has_acao(&layer, "https://baz.example.com").await);
	}

	#[tokio::test]
	async fn empty_origin_list_allows_nothing() {
		let layer = layer_for(&[]);
		assert!(!has_acao(&layer, "https://maps.example.org").await);
	}
}
