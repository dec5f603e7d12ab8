use std::time::Duration;

use log::{error, info, warn};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;
use tokio::task::spawn_blocking;

use crate::app::config::DiscoveryConfig;
use crate::app::datastore::{self, DeviceInfo};
use crate::app::{speaker, Error};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiscoveredDevice {
	pub id: String,
	pub display_name: String,
	pub host: String,
	pub model_id: String,
}

enum Message {
	Device(DiscoveredDevice),
	Flush(oneshot::Sender<()>),
}

/// Finds speakers and files them under the configured account.
/// All store writes go through a single writer task.
#[derive(Clone)]
pub struct Manager {
	sender: UnboundedSender<Message>,
	config: DiscoveryConfig,
}

impl Manager {
	pub fn new(datastore: datastore::Manager, account: String, config: DiscoveryConfig) -> Self {
		let (sender, receiver) = unbounded_channel();
		tokio::spawn(write_devices(datastore, account, receiver));
		Self { sender, config }
	}

	pub fn publish(&self, device: DiscoveredDevice) {
		if self.sender.send(Message::Device(device)).is_err() {
			error!("Discovery writer is gone, dropping device");
		}
	}

	/// Waits until every device published so far is stored.
	pub async fn flush(&self) {
		let (sender, receiver) = oneshot::channel();
		if self.sender.send(Message::Flush(sender)).is_ok() {
			let _ = receiver.await;
		}
	}

	/// Probes every configured host once and returns how many speakers answered.
	pub async fn scan(&self) -> usize {
		let timeout = Duration::from_secs(self.config.timeout_seconds);
		let mut found = 0;
		for host in &self.config.hosts {
			match probe(host.clone(), timeout).await {
				Ok(device) => {
					found += 1;
					self.publish(device);
				}
				Err(e) => warn!("Discovery probe of `{host}` failed: {e}"),
			}
		}
		self.flush().await;
		found
	}

	pub fn begin_periodic_scans(&self) {
		if self.config.hosts.is_empty() {
			info!("No speaker hosts configured, discovery is idle");
			return;
		}
		let interval = Duration::from_secs(self.config.interval_seconds.max(1));
		tokio::spawn({
			let manager = self.clone();
			async move {
				loop {
					let found = manager.scan().await;
					info!(
						"Discovery found {found} of {} speakers",
						manager.config.hosts.len()
					);
					tokio::time::sleep(interval).await;
				}
			}
		});
	}
}

async fn probe(host: String, timeout: Duration) -> Result<DiscoveredDevice, Error> {
	let live = spawn_blocking({
		let host = host.clone();
		move || speaker::fetch_info(&host, timeout)
	})
	.await??;

	let id = live.device_id.ok_or_else(|| {
		Error::DeviceInfoQuery(host.clone(), "response carries no device id".to_owned())
	})?;
	Ok(DiscoveredDevice {
		id,
		display_name: live.name.unwrap_or_default(),
		host,
		model_id: live.model.unwrap_or_default(),
	})
}

async fn write_devices(
	datastore: datastore::Manager,
	account: String,
	mut receiver: UnboundedReceiver<Message>,
) {
	while let Some(message) = receiver.recv().await {
		match message {
			Message::Device(device) => {
				let datastore = datastore.clone();
				let account = account.clone();
				let id = device.id.clone();
				match spawn_blocking(move || record(&datastore, &account, device)).await {
					Ok(Ok(())) => (),
					Ok(Err(e)) => error!("Could not store discovered device `{id}`: {e}"),
					Err(e) => error!("Discovery writer task failed: {e}"),
				}
			}
			Message::Flush(done) => {
				let _ = done.send(());
			}
		}
	}
}

/// Merges into any existing record, keeping what discovery does not know about.
fn record(
	datastore: &datastore::Manager,
	account: &str,
	device: DiscoveredDevice,
) -> Result<(), Error> {
	let mut info = match datastore.get_device_info(account, &device.id) {
		Ok(info) => info,
		Err(Error::NotFound(_)) => DeviceInfo {
			device_id: device.id.clone(),
			..Default::default()
		},
		Err(e) => return Err(e),
	};
	if !device.display_name.is_empty() {
		info.name = device.display_name;
	}
	if !device.model_id.is_empty() && !info.product_code.starts_with(&device.model_id) {
		info.product_code = device.model_id;
	}
	info.ip_address = device.host;
	datastore.save_device_info(account, &device.id, &info)
}
