use serde::Deserialize;

const DEFAULT_IP: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Default, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
	/// IP to bind to.
	pub ip: Option<String>,

	/// TCP port to bind to.
	pub port: Option<u16>,
}

impl ServerConfig {
	pub fn override_optional_ip(&mut self, ip: &Option<String>) {
		if ip.is_some() {
			self.ip = ip.clone();
		}
	}

	pub fn override_optional_port(&mut self, port: &Option<u16>) {
		if port.is_some() {
			self.port = *port;
		}
	}

	/// The socket address to bind, with defaults applied.
	pub fn bind_addr(&self) -> String {
		format!(
			"{}:{}",
			self.ip.as_deref().unwrap_or(DEFAULT_IP),
			self.port.unwrap_or(DEFAULT_PORT)
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn bind_addr_defaults() {
		assert_eq!(ServerConfig::default().bind_addr(), "0.0.0.0:8000");
	}

	#[test]
	fn overrides_win_when_present() {
		let mut config = ServerConfig {
			ip: Some("10.0.0.1".to_string()),
			port: Some(1234),
		};
		config.override_optional_ip(&None);
		config.override_optional_port(&Some(9999));
		assert_eq!(config.bind_addr(), "10.0.0.1:9999");
	}
}
