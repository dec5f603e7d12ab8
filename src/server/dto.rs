use serde::{Deserialize, Serialize};

use crate::app::{datastore, migration};

#[derive(PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Banner {
	pub name: String,
	pub version: String,
}

#[derive(PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Acknowledgement {
	pub ok: bool,
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct TargetQuery {
	pub target: Option<String>,
}

#[derive(PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Device {
	pub account: String,
	pub device_id: String,
	pub name: String,
	pub product_code: String,
	pub firmware_version: String,
	pub ip_address: String,
}

impl From<datastore::StoredDevice> for Device {
	fn from(d: datastore::StoredDevice) -> Self {
		Self {
			account: d.account,
			device_id: d.info.device_id,
			name: d.info.name,
			product_code: d.info.product_code,
			firmware_version: d.info.firmware_version,
			ip_address: d.info.ip_address,
		}
	}
}

#[derive(PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct MigrationSummary {
	pub ssh_success: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub current_config: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub diagnostic: Option<String>,
	pub planned_config: String,
	pub remote_services_enabled: bool,
	pub remote_services_persistent: bool,
	pub remote_services_found: Vec<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub remote_services_check_err: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub device_name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub device_model: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub device_serial: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub firmware_version: Option<String>,
}

impl From<migration::Summary> for MigrationSummary {
	fn from(s: migration::Summary) -> Self {
		Self {
			ssh_success: s.ssh_success,
			current_config: s.current_config,
			diagnostic: s.diagnostic,
			planned_config: s.planned_config,
			remote_services_enabled: s.remote_services_enabled,
			remote_services_persistent: s.remote_services_persistent,
			remote_services_found: s.remote_services_found,
			remote_services_check_err: s.remote_services_check_error,
			device_name: s.device_name,
			device_model: s.device_model,
			device_serial: s.device_serial,
			firmware_version: s.firmware_version,
		}
	}
}

#[derive(PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct RemoteServices {
	pub location: String,
}

#[derive(PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ScanReport {
	pub found: usize,
}
