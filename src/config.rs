use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use clap::Parser;
use tracing::Level;

use crate::{
	models::{Backend, BackendSettings, DEFAULT_EOS_TOKEN_ID, DEFAULT_MODEL},
	passes::DEFAULT_SETTING,
	studio::DEFAULT_SESSION_TTL_SECS,
};

/// Runtime configuration of the InkSpire server.
///
/// Every flag can also be supplied through its `INKSPIRE_*` environment variable, including from a
/// `.env` file.
#[derive(Parser, Debug, Clone)]
#[command(name = "inkspire", version, about = "Craft AI-generated stories from just a prompt")]
pub struct StudioConfig {
	/// Address to listen on.
	#[arg(long, env = "INKSPIRE_HOST", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
	pub host: IpAddr,
	/// Port to listen on.
	#[arg(long, env = "INKSPIRE_PORT", default_value_t = 8501)]
	pub port: u16,
	/// Kind of inference endpoint serving the model.
	#[arg(long, env = "INKSPIRE_BACKEND", value_enum, default_value_t = Backend::Pipeline)]
	pub backend: Backend,
	/// URL of the inference endpoint.
	#[arg(long, env = "INKSPIRE_ENDPOINT", default_value = "http://127.0.0.1:8080")]
	pub endpoint: String,
	/// Credential for the inference endpoint.
	#[arg(long, env = "INKSPIRE_API_KEY", hide_env_values = true)]
	pub api_key: Option<String>,
	/// Model to generate stories with.
	#[arg(long, env = "INKSPIRE_MODEL", default_value = DEFAULT_MODEL)]
	pub model: String,
	/// End-of-sequence token id of the model's tokenizer.
	#[arg(long, env = "INKSPIRE_EOS_TOKEN_ID", default_value_t = DEFAULT_EOS_TOKEN_ID)]
	pub eos_token_id: u32,
	/// Where generated stories take place.
	#[arg(long, env = "INKSPIRE_SETTING", default_value = DEFAULT_SETTING)]
	pub setting: String,
	/// Seconds of inactivity after which a session is dropped.
	#[arg(long, env = "INKSPIRE_SESSION_TTL_SECS", default_value_t = DEFAULT_SESSION_TTL_SECS as u64)]
	pub session_ttl_secs: u64,
	/// Log level
	#[arg(long, env = "INKSPIRE_LOG_LEVEL", default_value = "info")]
	pub log_level: Level,
}

impl StudioConfig {
	pub fn socket_addr(&self) -> SocketAddr {
		SocketAddr::new(self.host, self.port)
	}

	pub fn backend_settings(&self) -> BackendSettings {
		BackendSettings {
			backend: self.backend,
			endpoint: self.endpoint.clone(),
			api_key: self.api_key.clone(),
			model: self.model.clone(),
			eos_token_id: Some(self.eos_token_id),
		}
	}

	pub fn session_ttl(&self) -> chrono::Duration {
		// chrono::Duration tops out at i64::MAX milliseconds
		let secs = self.session_ttl_secs.min(i64::MAX as u64 / 1000);
		chrono::Duration::seconds(secs as i64)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_reproduce_the_stock_setup() {
		let config = StudioConfig::try_parse_from(["inkspire"]).unwrap();

		assert_eq!(config.socket_addr(), SocketAddr::from(([127, 0, 0, 1], 8501)));
		assert_eq!(config.backend, Backend::Pipeline);
		assert_eq!(config.model, "TinyLlama/TinyLlama-1.1B-Chat-v1.0");
		assert_eq!(config.setting, "a mysterious jungle");
		assert_eq!(config.session_ttl(), chrono::Duration::seconds(3600));
		assert_eq!(config.log_level, Level::INFO);

		let settings = config.backend_settings();
		assert_eq!(settings.eos_token_id, Some(2));
		assert_eq!(settings.endpoint, "http://127.0.0.1:8080");
	}

	#[test]
	fn flags_override_defaults() {
		let config = StudioConfig::try_parse_from([
			"inkspire",
			"--port",
			"9000",
			"--setting",
			"a frozen moon",
			"--log-level",
			"debug",
		])
		.unwrap();

		assert_eq!(config.port, 9000);
		assert_eq!(config.setting, "a frozen moon");
		assert_eq!(config.log_level, Level::DEBUG);
	}
}
