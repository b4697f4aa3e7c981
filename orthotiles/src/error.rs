//! The request-error taxonomy of the tile pipeline.
//!
//! Every handler returns `Result<_, ServeError>`; the `IntoResponse`
//! implementation maps each variant onto its HTTP status and a small JSON
//! body. Upstream and artifact failures are logged with their full error
//! chain but never leak details to the caller.

use axum::{
	Json,
	http::StatusCode,
	response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

pub type ServeResult<T> = Result<T, ServeError>;

#[derive(Debug, Error)]
pub enum ServeError {
	/// Malformed request parameter (size, format, rescale, nodata, color map).
	#[error("{0}")]
	BadRequest(String),

	/// Unknown task, task without artifact, or tile outside spatial/zoom bounds.
	#[error("{0}")]
	NotFound(String),

	/// The metadata backend was unreachable or returned an error status.
	/// Surfaced as task-not-found so backend details stay server-side.
	#[error("Task {task_id} not found")]
	Upstream { task_id: String, source: anyhow::Error },

	/// Artifact download or open failure.
	#[error("{message}")]
	Artifact { message: String, source: anyhow::Error },

	/// Any other failure; details are logged, never returned.
	#[error("Internal server error")]
	Internal(#[from] anyhow::Error),
}

impl IntoResponse for ServeError {
	fn into_response(self) -> Response {
		let (status, message) = match &self {
			ServeError::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
			ServeError::NotFound(message) => (StatusCode::NOT_FOUND, message.clone()),
			ServeError::Upstream { task_id, source } => {
				log::error!(
					"Failed to fetch task metadata for {task_id}:\n{}",
					format_error_chain(source)
				);
				(StatusCode::NOT_FOUND, format!("Task {task_id} not found"))
			}
			ServeError::Artifact { message, source } => {
				log::error!("{message}:\n{}", format_error_chain(source));
				(StatusCode::INTERNAL_SERVER_ERROR, message.clone())
			}
			ServeError::Internal(source) => {
				log::error!("Internal server error:\n{}", format_error_chain(source));
				(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
			}
		};

		(status, Json(json!({ "detail": message }))).into_response()
	}
}

/// Renders an error with its full cause chain, one cause per line.
pub fn format_error_chain(err: &anyhow::Error) -> String {
	let mut result = err.to_string();

	for (i, cause) in err.chain().skip(1).enumerate() {
		if i == 0 {
			result.push_str("\n  Caused by:");
		}
		result.push_str(&format!("\n    {}", cause));
	}

	result
}
