//! Local on-disk cache of downloaded image artifacts.
//!
//! The existence of `{cache_dir}/{task_id}.tif` is the sole acquisition
//! marker: once a file is in place it is never re-downloaded or
//! invalidated by this service. Concurrent first-requests for the same
//! task share one download through a per-identifier lock, and downloads
//! stream into a `.part` file that is renamed into place only on success,
//! so the existence check can never observe a truncated file.

use crate::config::ArtifactConfig;
use anyhow::{Context, Result, ensure};
use dashmap::DashMap;
use futures::StreamExt;
use std::{
	path::{Path, PathBuf},
	sync::Arc,
	time::Duration,
};
use tokio::{fs, io::AsyncWriteExt, sync::Mutex};

pub struct ArtifactStore {
	dir: PathBuf,
	http: reqwest::Client,
	locks: DashMap<String, Arc<Mutex<()>>>,
}

impl ArtifactStore {
	pub fn new(config: &ArtifactConfig) -> Result<ArtifactStore> {
		let dir = config.cache_dir.clone().unwrap_or_else(std::env::temp_dir);
		std::fs::create_dir_all(&dir).with_context(|| format!("Failed to create artifact cache directory {dir:?}"))?;

		let http = reqwest::Client::builder()
			.connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
			.timeout(Duration::from_secs(config.download_timeout_seconds))
			.build()
			.context("Failed to build artifact HTTP client")?;

		Ok(ArtifactStore {
			dir,
			http,
			locks: DashMap::new(),
		})
	}

	/// The deterministic local path for a task's artifact.
	pub fn local_path(&self, task_id: &str) -> PathBuf {
		self.dir.join(format!("{task_id}.tif"))
	}

	/// Returns the local artifact path, downloading it first if no file
	/// exists yet. At most one download runs per task at any time.
	pub async fn acquire(&self, artifact_url: &str, task_id: &str) -> Result<PathBuf> {
		ensure!(
			!task_id.contains(['/', '\\']) && task_id != "." && task_id != "..",
			"invalid task identifier {task_id:?}"
		);

		let path = self.local_path(task_id);
		if fs::try_exists(&path).await? {
			log::trace!("artifact for task {task_id} already cached at {path:?}");
			return Ok(path);
		}

		let lock = Arc::clone(self.locks.entry(task_id.to_string()).or_default().value());
		let _guard = lock.lock().await;

		// A concurrent request may have finished the download while this
		// one waited for the lock.
		if fs::try_exists(&path).await? {
			return Ok(path);
		}

		self.download(artifact_url, &path).await?;
		log::info!("downloaded artifact for task {task_id} to {path:?}");
		Ok(path)
	}

	async fn download(&self, url: &str, path: &Path) -> Result<()> {
		let part = path.with_extension("tif.part");

		let result = self.stream_to_file(url, &part).await;
		if let Err(err) = result {
			let _ = fs::remove_file(&part).await;
			return Err(err);
		}

		if let Err(err) = fs::rename(&part, path).await {
			let _ = fs::remove_file(&part).await;
			return Err(err).with_context(|| format!("Failed to move downloaded artifact into place at {path:?}"));
		}

		Ok(())
	}

	async fn stream_to_file(&self, url: &str, part: &Path) -> Result<()> {
		let response = self
			.http
			.get(url)
			.send()
			.await
			.with_context(|| format!("Request to {url} failed"))?
			.error_for_status()
			.with_context(|| format!("Download from {url} failed"))?;

		let mut file = fs::File::create(part)
			.await
			.with_context(|| format!("Failed to create {part:?}"))?;

		let mut stream = response.bytes_stream();
		while let Some(chunk) = stream.next().await {
			let chunk = chunk.with_context(|| format!("Download from {url} aborted mid-stream"))?;
			file.write_all(&chunk).await?;
		}
		file.flush().await?;

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn store(dir: &Path) -> ArtifactStore {
		ArtifactStore::new(&ArtifactConfig {
			cache_dir: Some(dir.to_path_buf()),
			..ArtifactConfig::default()
		})
		.unwrap()
	}

	#[tokio::test]
	async fn existing_file_short_circuits_without_network() {
		let dir = tempfile::tempdir().unwrap();
		let store = store(dir.path());

		let path = store.local_path("t1");
		fs::write(&path, b"cached bytes").await.unwrap();

		// The URL is unroutable; a network attempt would fail loudly.
		let got = store.acquire("http://192.0.2.1/none.tif", "t1").await.unwrap();
		assert_eq!(got, path);
		assert_eq!(fs::read(&got).await.unwrap(), b"cached bytes");
	}

	#[tokio::test]
	async fn failed_download_leaves_no_file_behind() {
		let dir = tempfile::tempdir().unwrap();
		let store = ArtifactStore::new(&ArtifactConfig {
			cache_dir: Some(dir.path().to_path_buf()),
			connect_timeout_seconds: 1,
			download_timeout_seconds: 1,
		})
		.unwrap();

		let result = store.acquire("http://127.0.0.1:9/none.tif", "t9").await;
		assert!(result.is_err());
		assert!(!store.local_path("t9").exists());
		assert!(!store.local_path("t9").with_extension("tif.part").exists());
	}

	#[tokio::test]
	async fn rejects_path_traversal_identifiers() {
		let dir = tempfile::tempdir().unwrap();
		let store = store(dir.path());

		assert!(store.acquire("http://example.org/a.tif", "../etc/passwd").await.is_err());
		assert!(store.acquire("http://example.org/a.tif", "..").await.is_err());
	}

	#[test]
	fn local_path_is_deterministic() {
		let dir = tempfile::tempdir().unwrap();
		let store = store(dir.path());
		assert_eq!(store.local_path("abc"), dir.path().join("abc.tif"));
		assert_eq!(store.local_path("abc"), store.local_path("abc"));
	}
}
