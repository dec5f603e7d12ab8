use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::paths::Paths;

pub mod conditional;
pub mod config;
pub mod datastore;
pub mod discovery;
pub mod freshness;
pub mod marge;
pub mod migration;
pub mod remote;
pub mod speaker;
pub mod xml;


#[derive(thiserror::Error, Debug)]
pub enum Error {
	#[error(transparent)]
	ThreadJoining(#[from] tokio::task::JoinError),

	#[error("Filesystem error for `{0}`: `{1}`")]
	Io(PathBuf, std::io::Error),
	#[error("Could not deserialize configuration: `{0}`")]
	ConfigDeserialization(toml::de::Error),

	#[error("Resource not found: `{0}`")]
	NotFound(PathBuf),
	#[error("Could not parse `{0}`: {1}")]
	Parse(PathBuf, quick_xml::DeError),
	#[error("Could not parse request body: {0}")]
	MalformedRequest(quick_xml::DeError),
	#[error("Invalid identifier: `{0}`")]
	InvalidIdentifier(String),
	#[error("Invalid preset number: `{0}`")]
	InvalidPresetNumber(String),

	#[error("Could not query device info from `{0}`: {1}")]
	DeviceInfoQuery(String, String),
	#[error("Could not connect to `{0}`: {1}")]
	Connectivity(String, String),
	#[error("Command `{command}` failed on `{host}`: {reason}")]
	RemoteCommand {
		host: String,
		command: String,
		reason: String,
		output: String,
	},
	#[error("Could not enable remote services in any of the locations: {0:?}")]
	RemoteServicesUnavailable(Vec<String>),
}

#[derive(Clone)]
pub struct App {
	pub port: u16,
	pub marge_manager: marge::Manager,
	pub migration_manager: migration::Manager,
	pub discovery_manager: discovery::Manager,
}

impl App {
	pub async fn new(port: u16, paths: Paths) -> Result<Self, Error> {
		let config = match &paths.config_file_path {
			Some(path) => config::Config::from_path(path)?,
			None => config::Config::default(),
		};

		let accounts_dir = paths.data_dir_path.join(datastore::ACCOUNTS_DIR);
		tokio::fs::create_dir_all(&accounts_dir)
			.await
			.map_err(|e| Error::Io(accounts_dir.clone(), e))?;

		let datastore = datastore::Manager::new(paths.data_dir_path);
		let marge_manager = marge::Manager::new(datastore.clone());

		let shell = Arc::new(remote::ssh::Client::new(&config.ssh));
		let migration_manager = migration::Manager::new(
			datastore.clone(),
			shell,
			config.public_url.clone(),
			Duration::from_secs(config.discovery.timeout_seconds),
		);

		let discovery_manager = discovery::Manager::new(
			datastore.clone(),
			config.account.clone(),
			config.discovery.clone(),
		);

		Ok(Self {
			port,
			marge_manager,
			migration_manager,
			discovery_manager,
		})
	}
}
