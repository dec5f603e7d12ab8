use quick_xml::de::from_str;
use quick_xml::DeError;
use serde::Deserialize;

use super::types::*;
use crate::app::xml::{Document, Element, DECLARATION};

pub const SCM: &str = "SCM";
pub const PACKAGED_PRODUCT: &str = "PackagedProduct";

fn document(root: Element) -> String {
	Document::new(root)
		.declaration(DECLARATION)
		.indent("    ")
		.render()
}

fn flag(value: bool) -> &'static str {
	if value {
		"true"
	} else {
		"false"
	}
}

fn parse_flag(value: &str) -> bool {
	value != "false"
}

pub fn join_product_code(device_type: &str, module_type: &str) -> String {
	if module_type.is_empty() {
		device_type.to_owned()
	} else {
		format!("{device_type} {module_type}")
	}
}

pub fn split_product_code(product_code: &str) -> (&str, &str) {
	product_code.split_once(' ').unwrap_or((product_code, ""))
}

/// Identity half of a device document: who the device is and what it is made of.
#[derive(Debug, Default, Deserialize)]
pub struct IdentityDocument {
	#[serde(rename = "@deviceID", default)]
	pub device_id: String,
	#[serde(default)]
	pub name: String,
	#[serde(rename = "type", default)]
	pub device_type: String,
	#[serde(rename = "moduleType", default)]
	pub module_type: String,
	#[serde(default)]
	pub components: Components,
}

#[derive(Debug, Default, Deserialize)]
pub struct Components {
	#[serde(rename = "component", default)]
	pub components: Vec<Component>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Component {
	#[serde(rename = "componentCategory", default)]
	pub category: String,
	#[serde(rename = "softwareVersion", default)]
	pub software_version: String,
	#[serde(rename = "serialNumber", default)]
	pub serial_number: String,
}

/// Network half of a device document.
#[derive(Debug, Default, Deserialize)]
pub struct NetworkDocument {
	#[serde(rename = "networkInfo", default)]
	pub network_info: Vec<NetworkInfo>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NetworkInfo {
	#[serde(rename = "@type", default)]
	pub kind: String,
	#[serde(rename = "ipAddress", default)]
	pub ip_address: String,
}

impl From<IdentityDocument> for DeviceInfo {
	fn from(document: IdentityDocument) -> Self {
		let mut info = DeviceInfo {
			device_id: document.device_id,
			name: document.name,
			product_code: join_product_code(&document.device_type, &document.module_type),
			..Default::default()
		};
		for component in document.components.components {
			match component.category.as_str() {
				SCM => {
					info.firmware_version = component.software_version;
					info.device_serial_number = component.serial_number;
				}
				PACKAGED_PRODUCT => info.product_serial_number = component.serial_number,
				_ => (),
			}
		}
		info
	}
}

pub fn apply_network(info: &mut DeviceInfo, network: NetworkDocument) {
	if let Some(scm) = network.network_info.into_iter().find(|n| n.kind == SCM) {
		info.ip_address = scm.ip_address;
	}
}

pub fn device_info_from_xml(xml: &str) -> Result<DeviceInfo, DeError> {
	let identity: IdentityDocument = from_str(xml)?;
	let network: NetworkDocument = from_str(xml)?;
	let mut info = DeviceInfo::from(identity);
	apply_network(&mut info, network);
	Ok(info)
}

pub fn device_info_to_xml(info: &DeviceInfo) -> String {
	let (device_type, module_type) = split_product_code(&info.product_code);
	let root = Element::new("info")
		.attr("deviceID", &info.device_id)
		.child(Element::leaf("name", &info.name))
		.child(Element::leaf("type", device_type))
		.child(Element::leaf("moduleType", module_type))
		.child(
			Element::new("components")
				.child(
					Element::new("component")
						.child(Element::leaf("componentCategory", SCM))
						.child(Element::leaf("softwareVersion", &info.firmware_version))
						.child(Element::leaf("serialNumber", &info.device_serial_number)),
				)
				.child(
					Element::new("component")
						.child(Element::leaf("componentCategory", PACKAGED_PRODUCT))
						.child(Element::leaf("serialNumber", &info.product_serial_number)),
				),
		)
		.child(
			Element::new("networkInfo")
				.attr("type", SCM)
				.child(Element::leaf("ipAddress", &info.ip_address)),
		);
	document(root)
}

#[derive(Debug, Default, Deserialize)]
struct StoredContentItem {
	#[serde(rename = "@source", default)]
	source: String,
	#[serde(rename = "@type", default)]
	item_type: String,
	#[serde(rename = "@location", default)]
	location: String,
	#[serde(rename = "@sourceAccount", default)]
	source_account: String,
	#[serde(rename = "@isPresetable", default)]
	is_presetable: String,
	#[serde(rename = "itemName", default)]
	item_name: String,
	#[serde(rename = "containerArt", default)]
	container_art: String,
}

impl StoredContentItem {
	fn into_content_item(self, id: String) -> (ContentItem, String) {
		let item = ContentItem {
			id,
			name: self.item_name,
			source: self.source,
			item_type: self.item_type,
			location: self.location,
			source_account: self.source_account,
			is_presetable: parse_flag(&self.is_presetable),
		};
		(item, self.container_art)
	}
}

fn content_item_element(tag: &'static str, item: &ContentItem, container_art: &str) -> Element {
	Element::new(tag)
		.attr_if_not_empty("source", &item.source)
		.attr("type", &item.item_type)
		.attr("location", &item.location)
		.attr_if_not_empty("sourceAccount", &item.source_account)
		.attr("isPresetable", flag(item.is_presetable))
		.child(Element::leaf("itemName", &item.name))
		.child(Element::leaf("containerArt", container_art))
}

#[derive(Debug, Default, Deserialize)]
struct PresetsDocument {
	#[serde(rename = "preset", default)]
	presets: Vec<StoredPreset>,
}

#[derive(Debug, Default, Deserialize)]
struct StoredPreset {
	#[serde(rename = "@id", default)]
	id: String,
	#[serde(rename = "@createdOn", default)]
	created_on: String,
	#[serde(rename = "@updatedOn", default)]
	updated_on: String,
	#[serde(rename = "ContentItem", default)]
	content_item: StoredContentItem,
}

pub fn presets_from_xml(xml: &str) -> Result<Vec<Preset>, DeError> {
	let document: PresetsDocument = from_str(xml)?;
	Ok(document
		.presets
		.into_iter()
		.map(|p| {
			let (content_item, container_art) = p.content_item.into_content_item(p.id);
			Preset {
				content_item,
				created_on: p.created_on,
				updated_on: p.updated_on,
				container_art,
			}
		})
		.collect())
}

pub fn presets_to_xml(presets: &[Preset]) -> String {
	let root = Element::new("presets").children(presets.iter().map(|p| {
		Element::new("preset")
			.attr("id", &p.content_item.id)
			.attr("createdOn", &p.created_on)
			.attr("updatedOn", &p.updated_on)
			.child(content_item_element(
				"ContentItem",
				&p.content_item,
				&p.container_art,
			))
	}));
	document(root)
}

#[derive(Debug, Default, Deserialize)]
struct RecentsDocument {
	#[serde(rename = "recent", default)]
	recents: Vec<StoredRecent>,
}

#[derive(Debug, Default, Deserialize)]
struct StoredRecent {
	#[serde(rename = "@id", default)]
	id: String,
	#[serde(rename = "@deviceID", default)]
	device_id: String,
	#[serde(rename = "@utcTime", default)]
	utc_time: String,
	#[serde(rename = "contentItem", default)]
	content_item: StoredContentItem,
}

pub fn recents_from_xml(xml: &str) -> Result<Vec<Recent>, DeError> {
	let document: RecentsDocument = from_str(xml)?;
	Ok(document
		.recents
		.into_iter()
		.map(|r| {
			let (content_item, container_art) = r.content_item.into_content_item(r.id);
			Recent {
				content_item,
				device_id: r.device_id,
				utc_time: r.utc_time,
				container_art,
			}
		})
		.collect())
}

pub fn recents_to_xml(recents: &[Recent]) -> String {
	let root = Element::new("recents").children(recents.iter().map(|r| {
		Element::new("recent")
			.attr("id", &r.content_item.id)
			.attr("deviceID", &r.device_id)
			.attr("utcTime", &r.utc_time)
			.child(content_item_element(
				"contentItem",
				&r.content_item,
				&r.container_art,
			))
	}));
	document(root)
}

#[derive(Debug, Default, Deserialize)]
struct SourcesDocument {
	#[serde(rename = "source", default)]
	sources: Vec<StoredSource>,
}

#[derive(Debug, Default, Deserialize)]
struct StoredSource {
	#[serde(rename = "@displayName", default)]
	display_name: String,
	#[serde(rename = "@id", default)]
	id: String,
	#[serde(rename = "@secret", default)]
	secret: String,
	#[serde(rename = "@secretType", default)]
	secret_type: String,
	#[serde(rename = "sourceKey", default)]
	source_key: StoredSourceKey,
}

#[derive(Debug, Default, Deserialize)]
struct StoredSourceKey {
	#[serde(rename = "@type", default)]
	key_type: String,
	#[serde(rename = "@account", default)]
	account: String,
}

/// Sources stored without an id come back with an empty one.
pub fn configured_sources_from_xml(xml: &str) -> Result<Vec<ConfiguredSource>, DeError> {
	let document: SourcesDocument = from_str(xml)?;
	Ok(document
		.sources
		.into_iter()
		.map(|s| ConfiguredSource {
			display_name: s.display_name,
			id: s.id,
			secret: s.secret,
			secret_type: s.secret_type,
			source_key_type: s.source_key.key_type,
			source_key_account: s.source_key.account,
		})
		.collect())
}

pub fn configured_sources_to_xml(sources: &[ConfiguredSource]) -> String {
	let root = Element::new("sources").children(sources.iter().map(|s| {
		Element::new("source")
			.attr("displayName", &s.display_name)
			.attr_if_not_empty("id", &s.id)
			.attr("secret", &s.secret)
			.attr("secretType", &s.secret_type)
			.child(
				Element::new("sourceKey")
					.attr("type", &s.source_key_type)
					.attr("account", &s.source_key_account),
			)
	}));
	document(root)
}
