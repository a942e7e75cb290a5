use std::error::Error;

use clap::Parser;
use inkspire::{service, StudioConfig};
use tracing::info;
use tracing_subscriber::fmt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
	// .env must be loaded before clap reads the INKSPIRE_* fallbacks
	dotenv::dotenv().ok();

	let config = StudioConfig::parse();

	let subscriber = fmt::Subscriber::builder().with_max_level(config.log_level).finish();
	tracing::subscriber::set_global_default(subscriber)?;

	info!(task = "tracing_setup", result = "success", "tracing successfully set up");
	info!(task = "dotenv_setup", result = "success", "dotenv loaded successfully");

	service::serve(config).await
}
