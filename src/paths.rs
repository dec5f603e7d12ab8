use std::path::PathBuf;

use crate::options::CLIOptions;

pub struct Paths {
	pub config_file_path: Option<PathBuf>,
	pub data_dir_path: PathBuf,
	pub log_file_path: Option<PathBuf>,
	#[cfg(unix)]
	pub pid_file_path: PathBuf,
}

impl Default for Paths {
	fn default() -> Self {
		Self {
			config_file_path: None,
			data_dir_path: [".", "data"].iter().collect(),
			log_file_path: Some([".", "homeport.log"].iter().collect()),
			#[cfg(unix)]
			pid_file_path: [".", "homeport.pid"].iter().collect(),
		}
	}
}

impl Paths {
	fn from_build() -> Self {
		let defaults = Self::default();
		Self {
			config_file_path: option_env!("HOMEPORT_CONFIG_DIR")
				.map(PathBuf::from)
				.map(|p| p.join("homeport.toml"))
				.or(defaults.config_file_path),
			data_dir_path: option_env!("HOMEPORT_DATA_DIR")
				.map(PathBuf::from)
				.unwrap_or(defaults.data_dir_path),
			log_file_path: option_env!("HOMEPORT_LOG_DIR")
				.map(PathBuf::from)
				.map(|p| p.join("homeport.log"))
				.or(defaults.log_file_path),
			#[cfg(unix)]
			pid_file_path: option_env!("HOMEPORT_PID_DIR")
				.map(PathBuf::from)
				.map(|p| p.join("homeport.pid"))
				.unwrap_or(defaults.pid_file_path),
		}
	}

	pub fn new(cli_options: &CLIOptions) -> Self {
		let mut paths = Self::from_build();
		if let Some(path) = &cli_options.config_file_path {
			paths.config_file_path = Some(path.clone());
		}
		if let Some(path) = &cli_options.data_dir_path {
			paths.data_dir_path = path.clone();
		}
		#[cfg(unix)]
		if let Some(path) = &cli_options.pid_file_path {
			paths.pid_file_path = path.clone();
		}

		let log_to_file = cli_options.log_file_path.is_some() || !cli_options.foreground;
		if log_to_file {
			paths.log_file_path = cli_options.log_file_path.clone().or(paths.log_file_path);
		} else {
			paths.log_file_path = None;
		};

		paths
	}
}
