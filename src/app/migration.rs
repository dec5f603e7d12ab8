use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use tokio::task::spawn_blocking;

use crate::app::remote::RemoteShell;
use crate::app::xml::{Document, Element};
use crate::app::{datastore, speaker, Error};

/// Speaker file holding the addresses of the cloud services it talks to.
pub const PRIVATE_CFG_PATH: &str = "/opt/Bose/etc/SoundTouchSdkPrivateCfg.xml";

/// Marker files enabling remote services, in order of preference.
pub const MARKER_LOCATIONS: [&str; 3] = [
	"/etc/remote_services",
	"/mnt/nv/remote_services",
	"/tmp/remote_services",
];

/// Cleared on every reboot.
pub const VOLATILE_MARKER_LOCATION: &str = "/tmp/remote_services";

const PRIVATE_CFG_DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;
const LIVENESS_COMMAND: &str = "ls /";
const REMOUNT_COMMAND: &str = "rw";
const REBOOT_COMMAND: &str = "rw && reboot";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Summary {
	pub ssh_success: bool,
	/// Content of the speaker's configuration file, when it could be read.
	pub current_config: Option<String>,
	/// Why the configuration could not be read.
	pub diagnostic: Option<String>,
	pub planned_config: String,
	pub remote_services_enabled: bool,
	pub remote_services_persistent: bool,
	pub remote_services_found: Vec<String>,
	pub remote_services_check_error: Option<String>,
	pub device_name: Option<String>,
	pub device_model: Option<String>,
	pub device_serial: Option<String>,
	pub firmware_version: Option<String>,
}

pub fn planned_config(target_url: &str) -> String {
	let target = target_url.trim_end_matches('/');
	let flag = |value: bool| if value { "true" } else { "false" };
	let root = Element::new("SoundTouchSdkPrivateCfg")
		.child(Element::leaf("margeServerUrl", format!("{target}/marge")))
		.child(Element::leaf("statsServerUrl", target))
		.child(Element::leaf(
			"swUpdateUrl",
			format!("{target}/updates/soundtouch"),
		))
		.child(Element::leaf("usePandoraProductionServer", flag(true)))
		.child(Element::leaf("isZeroconfEnabled", flag(true)))
		.child(Element::leaf("saveMargeCustomerReport", flag(false)))
		.child(Element::leaf(
			"bmxRegistryUrl",
			format!("{target}/bmx/registry/v1/services"),
		));
	Document::new(root)
		.declaration(PRIVATE_CFG_DECLARATION)
		.indent("  ")
		.render()
}

/// Re-points speakers at this server over their remote shell.
#[derive(Clone)]
pub struct Manager {
	datastore: datastore::Manager,
	shell: Arc<dyn RemoteShell>,
	public_url: String,
	info_timeout: Duration,
}

impl Manager {
	pub fn new(
		datastore: datastore::Manager,
		shell: Arc<dyn RemoteShell>,
		public_url: String,
		info_timeout: Duration,
	) -> Self {
		Self {
			datastore,
			shell,
			public_url,
			info_timeout,
		}
	}

	fn resolve_target(&self, target_url: Option<&str>) -> String {
		match target_url {
			Some(t) if !t.is_empty() => t.to_owned(),
			_ => self.public_url.clone(),
		}
	}

	/// Every stored device across accounts, candidates for migration.
	pub async fn known_devices(&self) -> Result<Vec<datastore::StoredDevice>, Error> {
		let datastore = self.datastore.clone();
		spawn_blocking(move || datastore.list_all_devices(None)).await?
	}

	pub async fn summary(&self, host: &str, target_url: Option<&str>) -> Result<Summary, Error> {
		let manager = self.clone();
		let host = host.to_owned();
		let target = self.resolve_target(target_url);
		Ok(spawn_blocking(move || manager.compute_summary(&host, &target)).await?)
	}

	pub async fn migrate(&self, host: &str, target_url: Option<&str>) -> Result<(), Error> {
		let manager = self.clone();
		let host = host.to_owned();
		let target = self.resolve_target(target_url);
		spawn_blocking(move || manager.migrate_speaker(&host, &target)).await?
	}

	pub async fn enable_remote_services(&self, host: &str) -> Result<String, Error> {
		let manager = self.clone();
		let host = host.to_owned();
		spawn_blocking(move || manager.enable_markers(&host)).await?
	}

	fn compute_summary(&self, host: &str, target: &str) -> Summary {
		let mut summary = Summary::default();

		match self.datastore.list_all_devices(None) {
			Ok(devices) => {
				if let Some(cached) = devices.into_iter().find(|d| d.info.ip_address == host) {
					let info = cached.info;
					summary.device_name = Some(info.name);
					summary.device_model = Some(info.product_code);
					summary.device_serial = Some(info.device_serial_number);
					summary.firmware_version = Some(info.firmware_version);
				}
			}
			Err(e) => warn!("Could not list cached devices: {e}"),
		}

		match speaker::fetch_info(host, self.info_timeout) {
			Ok(live) => {
				summary.device_name = live.name.or(summary.device_name);
				summary.device_model = live.model.or(summary.device_model);
				summary.device_serial = live.serial.or(summary.device_serial);
				summary.firmware_version = live.firmware.or(summary.firmware_version);
			}
			Err(e) => warn!("{e}"),
		}

		summary.planned_config = planned_config(target);

		let read = self.shell.run(host, &format!("cat {PRIVATE_CFG_PATH}"));
		match read {
			Ok(content) if !content.is_empty() => {
				summary.ssh_success = true;
				summary.current_config = Some(content);
			}
			read => match self.shell.run(host, LIVENESS_COMMAND) {
				Ok(_) => {
					summary.ssh_success = true;
					match read {
						Ok(empty) => summary.current_config = Some(empty),
						Err(e) => {
							summary.diagnostic = Some(format!("Error reading config: {e}"))
						}
					}
				}
				Err(e) => {
					summary.diagnostic = Some(format!("SSH connection failed: {e}"));
				}
			},
		}

		if summary.ssh_success {
			self.probe_markers(host, &mut summary);
		} else {
			summary.remote_services_check_error =
				Some("Skipped, the device is not reachable".to_owned());
		}

		summary
	}

	fn probe_markers(&self, host: &str, summary: &mut Summary) {
		for location in MARKER_LOCATIONS {
			match self.shell.run(host, &format!("[ -e {location} ]")) {
				Ok(_) => {
					summary.remote_services_found.push(location.to_owned());
					summary.remote_services_enabled = true;
					if location != VOLATILE_MARKER_LOCATION {
						summary.remote_services_persistent = true;
					}
				}
				Err(Error::RemoteCommand { .. }) => (),
				Err(e) => {
					summary.remote_services_check_error = Some(e.to_string());
					break;
				}
			}
		}
	}

	fn migrate_speaker(&self, host: &str, target: &str) -> Result<(), Error> {
		if let Err(e) = self.enable_markers(host) {
			warn!("Continuing migration of `{host}` without remote services: {e}");
		}

		let config = planned_config(target);
		self.shell
			.upload_content(host, config.as_bytes(), PRIVATE_CFG_PATH)?;
		info!("Uploaded configuration pointing `{host}` at {target}");

		self.shell.run(host, REBOOT_COMMAND)?;
		info!("Rebooting `{host}`");
		Ok(())
	}

	fn enable_markers(&self, host: &str) -> Result<String, Error> {
		if let Err(e) = self.shell.run(host, REMOUNT_COMMAND) {
			warn!("Could not remount `{host}` writable: {e}");
		}

		for location in MARKER_LOCATIONS {
			match self.shell.run(host, &format!("touch {location}")) {
				Ok(_) => {
					info!("Enabled remote services on `{host}` at {location}");
					return Ok(location.to_owned());
				}
				Err(e) => warn!("Could not create {location} on `{host}`: {e}"),
			}
		}

		Err(Error::RemoteServicesUnavailable(
			MARKER_LOCATIONS.iter().map(|l| l.to_string()).collect(),
		))
	}
}
