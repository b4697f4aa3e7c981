use anyhow::Result;
use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use orthotiles::{config::Config, engine::RasterEngine, server::TileServer};
use std::{path::PathBuf, sync::Arc, time::Duration};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
	/// Path to a configuration file (YAML) for the server, CORS, backend
	/// table and caches.
	#[arg(short = 'c', long, value_name = "FILE")]
	config: Option<PathBuf>,

	/// Serve via socket ip. Default: 0.0.0.0
	#[arg(short = 'i', long)]
	ip: Option<String>,

	/// Serve via port. Default: 8000
	#[arg(short, long)]
	port: Option<u16>,

	#[command(flatten)]
	verbose: Verbosity<InfoLevel>,
}

fn main() -> Result<()> {
	let cli = Cli::parse();

	env_logger::Builder::new()
		.filter_level(cli.verbose.log_level_filter())
		.format_timestamp(None)
		.init();

	run(cli)
}

#[tokio::main]
async fn run(cli: Cli) -> Result<()> {
	let mut config = match &cli.config {
		Some(path) => Config::from_path(path)?,
		None => Config::default(),
	};
	config.server.override_optional_ip(&cli.ip);
	config.server.override_optional_port(&cli.port);

	let engine = build_engine()?;
	let mut server = TileServer::new(config, engine)?;
	server.start().await?;

	loop {
		tokio::time::sleep(Duration::from_secs(60)).await;
	}
}

#[cfg(feature = "gdal")]
fn build_engine() -> Result<Arc<dyn RasterEngine>> {
	Ok(Arc::new(orthotiles::engine::gdal::GdalEngine::new()))
}

#[cfg(not(feature = "gdal"))]
fn build_engine() -> Result<Arc<dyn RasterEngine>> {
	anyhow::bail!("this build has no raster engine; rebuild with `--features gdal`")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn cli_parses_flags() {
		let cli = Cli::try_parse_from(["orthotiles", "-i", "127.0.0.1", "-p", "9000"]).unwrap();
		assert_eq!(cli.ip.as_deref(), Some("127.0.0.1"));
		assert_eq!(cli.port, Some(9000));
		assert!(cli.config.is_none());
	}

	#[test]
	fn cli_rejects_unknown_flags() {
		assert!(Cli::try_parse_from(["orthotiles", "--bogus"]).is_err());
	}
}
