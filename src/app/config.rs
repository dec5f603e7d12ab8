use std::path::Path;

use serde::Deserialize;

use crate::app::Error;

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
	/// Base URL speakers are re-pointed at during migration.
	pub public_url: String,
	/// Account that discovered devices are filed under.
	pub account: String,
	pub ssh: SshConfig,
	pub discovery: DiscoveryConfig,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			public_url: "http://localhost:8000".to_owned(),
			account: "default".to_owned(),
			ssh: SshConfig::default(),
			discovery: DiscoveryConfig::default(),
		}
	}
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SshConfig {
	pub user: String,
	pub password: String,
	pub port: u16,
	pub timeout_seconds: u64,
}

impl Default for SshConfig {
	fn default() -> Self {
		Self {
			user: "root".to_owned(),
			password: String::new(),
			port: 22,
			timeout_seconds: 10,
		}
	}
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DiscoveryConfig {
	/// Speaker hosts probed periodically, with an optional `:port`.
	pub hosts: Vec<String>,
	pub interval_seconds: u64,
	pub timeout_seconds: u64,
}

impl Default for DiscoveryConfig {
	fn default() -> Self {
		Self {
			hosts: Vec::new(),
			interval_seconds: 60 * 5,
			timeout_seconds: 5,
		}
	}
}

impl Config {
	pub fn from_path(path: &Path) -> Result<Self, Error> {
		let content =
			std::fs::read_to_string(path).map_err(|e| Error::Io(path.to_owned(), e))?;
		toml::de::from_str::<Self>(&content).map_err(Error::ConfigDeserialization)
	}
}
