use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use log::debug;
use ssh2::{Channel, ExtendedData, MethodType, Session};

use crate::app::config::SshConfig;
use crate::app::remote::RemoteShell;
use crate::app::Error;

/// Speaker firmware only speaks these older key exchanges, so they are offered first.
const KEY_EXCHANGES: &str = "diffie-hellman-group1-sha1,diffie-hellman-group14-sha1,ecdh-sha2-nistp256,ecdh-sha2-nistp384,ecdh-sha2-nistp521,curve25519-sha256@libssh.org";

/// Hosts may carry the port of the speaker's web API. SSH always uses the configured port.
fn ssh_host(host: &str) -> &str {
	if host.parse::<SocketAddr>().is_ok() {
		return host
			.rsplit_once(':')
			.map_or(host, |(ip, _)| ip.trim_start_matches('[').trim_end_matches(']'));
	}
	match host.rsplit_once(':') {
		Some((name, port)) if !name.contains(':') && port.parse::<u16>().is_ok() => name,
		_ => host,
	}
}

pub struct Client {
	user: String,
	password: String,
	port: u16,
	timeout: Duration,
}

impl Client {
	pub fn new(config: &SshConfig) -> Self {
		Self {
			user: config.user.clone(),
			password: config.password.clone(),
			port: config.port,
			timeout: Duration::from_secs(config.timeout_seconds.max(1)),
		}
	}

	fn session_timeout_millis(&self) -> u32 {
		u32::try_from(self.timeout.as_millis()).unwrap_or(u32::MAX)
	}

	fn connect(&self, host: &str) -> Result<Session, Error> {
		let connectivity = |reason: String| Error::Connectivity(host.to_owned(), reason);

		let address = (ssh_host(host), self.port)
			.to_socket_addrs()
			.map_err(|e| connectivity(e.to_string()))?
			.next()
			.ok_or_else(|| connectivity("host did not resolve".to_owned()))?;

		let tcp = TcpStream::connect_timeout(&address, self.timeout)
			.map_err(|e| connectivity(e.to_string()))?;
		tcp.set_read_timeout(Some(self.timeout))
			.and_then(|_| tcp.set_write_timeout(Some(self.timeout)))
			.map_err(|e| connectivity(e.to_string()))?;

		let mut session = Session::new().map_err(|e| connectivity(e.to_string()))?;
		session.set_timeout(self.session_timeout_millis());
		session
			.method_pref(MethodType::Kex, KEY_EXCHANGES)
			.map_err(|e| connectivity(e.to_string()))?;
		session.set_tcp_stream(tcp);
		session
			.handshake()
			.map_err(|e| connectivity(e.to_string()))?;

		// Speakers usually accept the "none" method, which querying the auth methods tries.
		let _ = session.auth_methods(&self.user);
		if !session.authenticated() {
			session
				.userauth_password(&self.user, &self.password)
				.map_err(|e| connectivity(format!("authentication failed: {e}")))?;
		}
		Ok(session)
	}

	fn open_channel(&self, host: &str, command: &str) -> Result<Channel, Error> {
		let session = self.connect(host)?;
		let connectivity = |e: ssh2::Error| Error::Connectivity(host.to_owned(), e.to_string());
		let mut channel = session.channel_session().map_err(connectivity)?;
		channel
			.handle_extended_data(ExtendedData::Merge)
			.map_err(connectivity)?;
		channel.exec(command).map_err(connectivity)?;
		Ok(channel)
	}

	fn finish(&self, host: &str, command: &str, mut channel: Channel) -> Result<String, Error> {
		let failure = |reason: String, output: &str| Error::RemoteCommand {
			host: host.to_owned(),
			command: command.to_owned(),
			reason,
			output: output.to_owned(),
		};

		let mut output = String::new();
		if let Err(e) = channel.read_to_string(&mut output) {
			return Err(failure(e.to_string(), &output));
		}
		channel
			.wait_close()
			.map_err(|e| failure(e.to_string(), &output))?;
		let status = channel
			.exit_status()
			.map_err(|e| failure(e.to_string(), &output))?;
		debug!("`{command}` on `{host}` exited with {status}");

		if status != 0 {
			return Err(failure(format!("exit status {status}"), &output));
		}
		Ok(output)
	}
}

impl RemoteShell for Client {
	fn run(&self, host: &str, command: &str) -> Result<String, Error> {
		let channel = self.open_channel(host, command)?;
		self.finish(host, command, channel)
	}

	fn upload_content(&self, host: &str, content: &[u8], remote_path: &str) -> Result<(), Error> {
		let command = format!("cat > '{remote_path}'");
		let mut channel = self.open_channel(host, &command)?;

		let streamed = channel
			.write_all(content)
			.map_err(|e| e.to_string())
			.and_then(|_| channel.send_eof().map_err(|e| e.to_string()));
		if let Err(reason) = streamed {
			return Err(Error::RemoteCommand {
				host: host.to_owned(),
				command,
				reason,
				output: String::new(),
			});
		}

		self.finish(host, &command, channel).map(|_| ())
	}
}
