use serde::Deserialize;

#[derive(Debug, Default, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Cors {
	/// Allowed origins. Supported patterns: `"*"`, `"*suffix"`, `"prefix*"`,
	/// `"/regex/"` and exact strings. Empty means no cross-origin access.
	#[serde(default)]
	pub allowed_origins: Vec<String>,

	/// `Access-Control-Max-Age` for preflight responses, in seconds.
	pub max_age_seconds: Option<u64>,

	/// Whether to send `Access-Control-Allow-Credentials`.
	pub allow_credentials: Option<bool>,
}
