use std::time::Duration;

use quick_xml::de::from_str;
use quick_xml::DeError;

use crate::app::datastore::wire::{self, IdentityDocument, NetworkDocument};
use crate::app::Error;

/// Port of the speaker's local web API.
pub const INFO_PORT: u16 = 8090;

/// What a speaker says about itself. Fields it left blank stay `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LiveIdentity {
	pub device_id: Option<String>,
	pub name: Option<String>,
	pub model: Option<String>,
	pub serial: Option<String>,
	pub firmware: Option<String>,
	pub ip_address: Option<String>,
}

fn non_empty(value: String) -> Option<String> {
	Some(value).filter(|v| !v.is_empty())
}

impl LiveIdentity {
	pub fn from_xml(xml: &str) -> Result<Self, DeError> {
		let identity: IdentityDocument = from_str(xml)?;
		let network: NetworkDocument = from_str(xml)?;

		let mut live = LiveIdentity {
			device_id: non_empty(identity.device_id),
			name: non_empty(identity.name),
			model: non_empty(identity.device_type),
			..Default::default()
		};

		let mut scm_serial = None;
		let mut product_serial = None;
		for component in identity.components.components {
			match component.category.as_str() {
				wire::SCM => {
					live.firmware = non_empty(component.software_version);
					scm_serial = non_empty(component.serial_number);
				}
				wire::PACKAGED_PRODUCT => product_serial = non_empty(component.serial_number),
				_ => (),
			}
		}
		live.serial = scm_serial.or(product_serial);

		live.ip_address = network
			.network_info
			.into_iter()
			.find(|n| n.kind == wire::SCM)
			.and_then(|n| non_empty(n.ip_address));

		Ok(live)
	}
}

/// A host given with an explicit port is used as is, otherwise the speaker's API port is added.
pub fn info_url(host: &str) -> String {
	if host.contains(':') {
		format!("http://{host}/info")
	} else {
		format!("http://{host}:{INFO_PORT}/info")
	}
}

pub fn fetch_info(host: &str, timeout: Duration) -> Result<LiveIdentity, Error> {
	let url = info_url(host);
	let query_error = |reason: String| Error::DeviceInfoQuery(url.clone(), reason);

	let agent = ureq::AgentBuilder::new().timeout(timeout).build();
	let body = agent
		.get(&url)
		.call()
		.map_err(|e| query_error(e.to_string()))?
		.into_string()
		.map_err(|e| query_error(e.to_string()))?;

	LiveIdentity::from_xml(&body).map_err(|e| query_error(e.to_string()))
}
