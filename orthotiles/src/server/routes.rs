//! Router composition.
//!
//! Wires handlers into an Axum `Router` without mixing in server lifecycle
//! or CORS logic. The final segment of the tile route carries an optional
//! `.format` suffix that the handler splits off itself, since the router
//! only matches whole path segments.

use super::handlers;
use crate::pipeline::TileService;
use axum::{Router, routing::get};
use std::sync::Arc;

pub fn build_router(service: Arc<TileService>) -> Router {
	Router::new()
		.route("/health", get(handlers::health))
		.route("/", get(handlers::root))
		.route("/api/tiles/{task_id}/tilejson", get(handlers::tilejson))
		.route("/api/tiles/{task_id}/bounds", get(handlers::bounds))
		.route("/api/tiles/{task_id}/metadata", get(handlers::metadata))
		.route("/api/tiles/{task_id}/{z}/{x}/{y}", get(handlers::tile))
		.with_state(service)
}
