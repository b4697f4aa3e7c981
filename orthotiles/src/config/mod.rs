//! Server configuration, loaded from YAML with CLI overrides.

mod artifacts;
mod cors;
mod main;
mod server;
mod tiles;
mod upstream;

pub use artifacts::ArtifactConfig;
pub use cors::Cors;
pub use main::Config;
pub use server::ServerConfig;
pub use tiles::TileConfig;
pub use upstream::UpstreamConfig;
