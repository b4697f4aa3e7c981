use serde::Deserialize;
use std::path::PathBuf;

fn default_connect_timeout() -> u64 {
	60
}
fn default_download_timeout() -> u64 {
	300
}

/// Local cache for downloaded image artifacts.
///
/// The cache is unbounded and never invalidated by this service; cleanup
/// is left to the storage the directory lives on.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ArtifactConfig {
	/// Directory for downloaded artifacts. Defaults to the OS temp directory.
	pub cache_dir: Option<PathBuf>,

	/// Connect timeout for artifact downloads, in seconds. Short, to fail
	/// fast on unreachable hosts.
	#[serde(default = "default_connect_timeout")]
	pub connect_timeout_seconds: u64,

	/// Total timeout for artifact downloads, in seconds. Long, to tolerate
	/// large files and slow storage backends.
	#[serde(default = "default_download_timeout")]
	pub download_timeout_seconds: u64,
}

impl Default for ArtifactConfig {
	fn default() -> Self {
		ArtifactConfig {
			cache_dir: None,
			connect_timeout_seconds: default_connect_timeout(),
			download_timeout_seconds: default_download_timeout(),
		}
	}
}
