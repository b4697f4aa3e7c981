//! HTTP server: router composition, handlers, CORS and lifecycle.

mod cors;
mod handlers;
mod routes;
mod tile_server;

pub use cors::build_cors_layer;
pub use routes::build_router;
pub use tile_server::TileServer;
