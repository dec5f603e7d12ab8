use simplelog::LevelFilter;
use std::path::PathBuf;

pub struct CLIOptions {
	pub show_help: bool,
	pub foreground: bool,
	pub log_file_path: Option<PathBuf>,
	#[cfg(unix)]
	pub pid_file_path: Option<PathBuf>,
	pub config_file_path: Option<PathBuf>,
	pub data_dir_path: Option<PathBuf>,
	pub port: Option<u16>,
	pub log_level: Option<LevelFilter>,
}

pub struct Manager {
	protocol: getopts::Options,
}

impl Manager {
	pub fn new() -> Self {
		Self {
			protocol: get_options(),
		}
	}

	pub fn parse(&self, input: &[String]) -> Result<CLIOptions, getopts::Fail> {
		let matches = self.protocol.parse(input)?;

		Ok(CLIOptions {
			show_help: matches.opt_present("h"),
			#[cfg(unix)]
			foreground: matches.opt_present("f"),
			#[cfg(not(unix))]
			foreground: true,
			log_file_path: matches.opt_str("log").map(PathBuf::from),
			#[cfg(unix)]
			pid_file_path: matches.opt_str("pid").map(PathBuf::from),
			config_file_path: matches.opt_str("c").map(PathBuf::from),
			data_dir_path: matches.opt_str("data").map(PathBuf::from),
			port: matches.opt_str("p").and_then(|p| p.parse().ok()),
			log_level: matches.opt_str("log-level").and_then(|l| l.parse().ok()),
		})
	}

	pub fn usage(&self, brief: &str) -> String {
		self.protocol.usage(brief)
	}
}

fn get_options() -> getopts::Options {
	let mut options = getopts::Options::new();
	options.optopt("c", "config", "set the configuration file", "FILE");
	options.optopt("p", "port", "set homeport to run on a custom port", "PORT");
	options.optopt(
		"",
		"data",
		"set the directory holding account and device records",
		"DIRECTORY",
	);
	options.optopt("", "log", "set the path to the log file", "FILE");
	options.optopt("", "pid", "set the path to the pid file", "FILE");
	options.optopt(
		"",
		"log-level",
		"set the log level to one of off, error, warn, info, debug, trace",
		"LEVEL",
	);

	#[cfg(unix)]
	options.optflag(
		"f",
		"foreground",
		"run homeport in the foreground instead of daemonizing",
	);

	options.optflag("h", "help", "print this help menu");
	options
}

#[cfg(test)]
mod test {
	use super::*;

	fn args(input: &[&str]) -> Vec<String> {
		input.iter().map(|a| a.to_string()).collect()
	}

	#[test]
	fn parses_paths_and_port() {
		let options = Manager::new()
			.parse(&args(&["-c", "homeport.toml", "--data", "records", "-p", "8080"]))
			.unwrap();
		assert_eq!(options.config_file_path, Some(PathBuf::from("homeport.toml")));
		assert_eq!(options.data_dir_path, Some(PathBuf::from("records")));
		assert_eq!(options.port, Some(8080));
		assert!(!options.show_help);
	}

	#[test]
	fn ignores_unparsable_values() {
		let options = Manager::new()
			.parse(&args(&["-p", "eighty", "--log-level", "loud"]))
			.unwrap();
		assert_eq!(options.port, None);
		assert_eq!(options.log_level, None);
	}

	#[test]
	fn parses_log_level() {
		let options = Manager::new()
			.parse(&args(&["--log-level", "debug"]))
			.unwrap();
		assert_eq!(options.log_level, Some(LevelFilter::Debug));
	}

	#[test]
	fn rejects_unknown_flags() {
		assert!(Manager::new().parse(&args(&["--bogus"])).is_err());
	}
}
