//! # Orthotiles
//!
//! A tile server that cuts XYZ raster tiles from large orthomosaic
//! images, given only an opaque task identifier. The identifier is
//! resolved to an image location through an upstream backend (selected
//! from the request's origin), the image artifact is downloaded into a
//! local cache once, and tiles are rendered per request with optional
//! rescaling, color mapping and transparency-aware output-format
//! negotiation.
//!
//! ## Crate layout
//! - [`config`] — YAML configuration with CLI overrides
//! - [`backend`] — request-header → metadata-backend selection
//! - [`metadata`] — task metadata client with a TTL cache
//! - [`artifact`] — on-disk artifact cache with single-flight downloads
//! - [`engine`] — the raster engine boundary (GDAL behind the `gdal` feature)
//! - [`pipeline`] — the tile request pipeline
//! - [`server`] — axum router, handlers and server lifecycle

pub mod artifact;
pub mod backend;
pub mod config;
pub mod engine;
pub mod error;
pub mod metadata;
pub mod pipeline;
pub mod server;
