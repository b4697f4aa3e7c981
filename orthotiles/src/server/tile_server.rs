use super::{build_cors_layer, build_router};
use crate::{config::Config, engine::RasterEngine, pipeline::TileService};
use anyhow::{Context, Result};
use axum::Router;
use std::sync::Arc;
use tokio::sync::oneshot::Sender;

/// The HTTP server around one [`TileService`].
///
/// Owns the explicitly constructed caches (inside the service) and hands
/// them to request handlers via the router state; nothing here is a
/// process-wide singleton.
pub struct TileServer {
	config: Config,
	service: Arc<TileService>,
	exit_signal: Option<Sender<()>>,
}

impl TileServer {
	pub fn new(config: Config, engine: Arc<dyn RasterEngine>) -> Result<TileServer> {
		let service = Arc::new(TileService::new(config.clone(), engine)?);
		Ok(TileServer {
			config,
			service,
			exit_signal: None,
		})
	}

	pub fn service(&self) -> Arc<TileService> {
		Arc::clone(&self.service)
	}

	pub fn build_router(&self) -> Result<Router> {
		let mut router = build_router(Arc::clone(&self.service));
		if !self.config.cors.allowed_origins.is_empty() {
			router = router.layer(build_cors_layer(&self.config.cors)?);
		}
		Ok(router)
	}

	pub async fn start(&mut self) -> Result<()> {
		if self.exit_signal.is_some() {
			self.stop().await;
		}

		log::info!("starting server");

		let router = self.build_router()?;
		let addr = self.config.server.bind_addr();
		eprintln!("server starts listening on {addr}");

		let listener = tokio::net::TcpListener::bind(&addr)
			.await
			.with_context(|| format!("Failed to bind {addr}"))?;
		let (tx, rx) = tokio::sync::oneshot::channel::<()>();

		tokio::spawn(async move {
			axum::serve(listener, router.into_make_service())
				.with_graceful_shutdown(async {
					rx.await.ok();
				})
				.await
				.expect("server failed");
		});

		self.exit_signal = Some(tx);

		Ok(())
	}

	pub async fn stop(&mut self) {
		if let Some(tx) = self.exit_signal.take() {
			log::info!("stopping server");
			tx.send(()).ok();
		}
	}
}
