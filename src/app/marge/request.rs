use quick_xml::de::from_str;
use serde::Deserialize;

use crate::app::Error;

fn parse<'de, T: Deserialize<'de>>(body: &'de str) -> Result<T, Error> {
	from_str(body).map_err(Error::MalformedRequest)
}

/// Body a speaker posts when a preset button is stored.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
pub struct PresetRequest {
	#[serde(rename = "sourceid", default)]
	pub source_id: String,
	#[serde(default)]
	pub location: String,
	#[serde(rename = "contentItemType", default)]
	pub content_item_type: String,
	#[serde(default)]
	pub name: String,
	#[serde(rename = "containerArt", default)]
	pub container_art: String,
}

impl PresetRequest {
	pub fn parse(body: &str) -> Result<Self, Error> {
		parse(body)
	}
}

#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
pub struct RecentRequest {
	#[serde(rename = "lastplayedat", default)]
	pub last_played_at: String,
	#[serde(rename = "sourceid", default)]
	pub source_id: String,
	#[serde(default)]
	pub name: String,
	#[serde(default)]
	pub location: String,
	#[serde(rename = "contentItemType", default)]
	pub content_item_type: String,
}

impl RecentRequest {
	pub fn parse(body: &str) -> Result<Self, Error> {
		parse(body)
	}
}

#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
pub struct DeviceRequest {
	#[serde(rename = "@deviceid", default)]
	pub device_id: String,
	#[serde(default)]
	pub name: String,
	#[serde(rename = "ipaddress", default)]
	pub ip_address: String,
	#[serde(rename = "firmwareVersion", default)]
	pub firmware_version: String,
	#[serde(rename = "serialnumber", default)]
	pub serial_number: String,
}

impl DeviceRequest {
	pub fn parse(body: &str) -> Result<Self, Error> {
		parse(body)
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn parses_preset_request() {
		let body = r#"<?xml version="1.0" encoding="UTF-8"?>
			<preset buttonNumber="3">
				<name>Jazz &amp; Blues</name>
				<sourceid>100001</sourceid>
				<location>/v1/playback/station/s12345</location>
				<contentItemType>stationurl</contentItemType>
				<containerArt>http://example.com/art.png</containerArt>
			</preset>"#;
		let request = PresetRequest::parse(body).unwrap();
		assert_eq!(request.name, "Jazz & Blues");
		assert_eq!(request.source_id, "100001");
		assert_eq!(request.content_item_type, "stationurl");
	}

	#[test]
	fn parses_recent_request_with_missing_fields() {
		let body = "<recent><lastplayedat>2023-11-14T22:13:20+00:00</lastplayedat><location>/p/1</location></recent>";
		let request = RecentRequest::parse(body).unwrap();
		assert_eq!(request.last_played_at, "2023-11-14T22:13:20+00:00");
		assert_eq!(request.location, "/p/1");
		assert!(request.source_id.is_empty());
	}

	#[test]
	fn parses_device_request() {
		let body = r#"<device deviceid="08DF1F0BA325"><name>Kitchen</name><ipaddress>10.0.0.8</ipaddress></device>"#;
		let request = DeviceRequest::parse(body).unwrap();
		assert_eq!(request.device_id, "08DF1F0BA325");
		assert_eq!(request.ip_address, "10.0.0.8");
	}

	#[test]
	fn rejects_malformed_body() {
		assert!(matches!(
			PresetRequest::parse("<preset><name>unterminated</preset>"),
			Err(Error::MalformedRequest(_))
		));
	}
}
