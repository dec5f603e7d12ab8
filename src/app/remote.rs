use crate::app::Error;

pub mod ssh;

/// Command channel to a speaker. Every call stands on its own, there is no session reuse.
pub trait RemoteShell: Send + Sync {
	/// Runs a command line and returns its combined stdout and stderr.
	fn run(&self, host: &str, command: &str) -> Result<String, Error>;

	/// Replaces the content of a remote file.
	fn upload_content(&self, host: &str, content: &[u8], remote_path: &str) -> Result<(), Error>;
}
