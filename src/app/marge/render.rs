use chrono::{DateTime, SecondsFormat};

use crate::app::datastore::{
	source_providers, ConfiguredSource, ContentItem, DeviceInfo, Preset, Recent,
	DEFAULT_TIMESTAMP,
};
use crate::app::xml::Element;

/// Provider id speakers expect in the trial eligibility setting.
const TRIAL_PROVIDER_ID: &str = "14";

fn or_default_timestamp(value: &str) -> &str {
	if value.is_empty() {
		DEFAULT_TIMESTAMP
	} else {
		value
	}
}

/// Unix seconds as an RFC 3339 UTC timestamp, empty when the input is not a number.
pub fn last_played_at(utc_time: &str) -> String {
	utc_time
		.parse::<i64>()
		.ok()
		.and_then(|seconds| DateTime::from_timestamp(seconds, 0))
		.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
		.unwrap_or_default()
}

fn matching_source<'a>(
	sources: &'a [ConfiguredSource],
	item: &ContentItem,
) -> Option<&'a ConfiguredSource> {
	sources.iter().find(|s| s.serves(item))
}

pub fn source_providers_element() -> Element {
	Element::new("sourceProviders").children(source_providers().into_iter().map(|p| {
		Element::new("sourceProvider")
			.attr("id", p.id.to_string())
			.child(Element::leaf("createdOn", p.created_on))
			.child(Element::leaf("name", p.name))
			.child(Element::leaf("updatedOn", p.updated_on))
	}))
}

pub fn configured_source_element(source: &ConfiguredSource) -> Element {
	Element::new("source")
		.attr("id", &source.id)
		.attr("type", "Audio")
		.child(Element::leaf("createdOn", DEFAULT_TIMESTAMP))
		.child(Element::new("credential").attr("type", "token").text(&source.secret))
		.child(Element::leaf("name", &source.source_key_account))
		.child(Element::leaf(
			"sourceproviderid",
			source.provider_id().to_string(),
		))
		.child(Element::leaf("sourcename", &source.display_name))
		.child(Element::leaf("sourcesettings", ""))
		.child(Element::leaf("updatedOn", DEFAULT_TIMESTAMP))
		.child(Element::leaf("username", &source.source_key_account))
}

pub fn preset_element(preset: &Preset, sources: &[ConfiguredSource]) -> Element {
	let item = &preset.content_item;
	let mut element = Element::new("preset")
		.attr("buttonNumber", &item.id)
		.child(Element::leaf("containerArt", &preset.container_art))
		.child(Element::leaf("contentItemType", &item.item_type))
		.child(Element::leaf(
			"createdOn",
			or_default_timestamp(&preset.created_on),
		))
		.child(Element::leaf("location", &item.location))
		.child(Element::leaf("name", &item.name));
	if let Some(source) = matching_source(sources, item) {
		element = element.child(configured_source_element(source));
	}
	element.child(Element::leaf(
		"updatedOn",
		or_default_timestamp(&preset.updated_on),
	))
}

pub fn presets_element(presets: &[Preset], sources: &[ConfiguredSource]) -> Element {
	Element::new("presets").children(presets.iter().map(|p| preset_element(p, sources)))
}

pub fn recent_element(recent: &Recent, sources: &[ConfiguredSource]) -> Element {
	let item = &recent.content_item;
	let mut element = Element::new("recent")
		.attr("id", &item.id)
		.child(Element::leaf("contentItemType", &item.item_type))
		.child(Element::leaf("createdOn", DEFAULT_TIMESTAMP))
		.child(Element::leaf(
			"lastplayedat",
			last_played_at(&recent.utc_time),
		))
		.child(Element::leaf("location", &item.location))
		.child(Element::leaf("name", &item.name));
	if let Some(source) = matching_source(sources, item) {
		element = element.child(configured_source_element(source));
	}
	element.child(Element::leaf("updatedOn", DEFAULT_TIMESTAMP))
}

/// Most recently played first. Entries without a valid timestamp sink to the end.
pub fn recents_element(recents: &[Recent], sources: &[ConfiguredSource]) -> Element {
	let mut sorted = recents.iter().collect::<Vec<_>>();
	sorted.sort_by_key(|r| std::cmp::Reverse(r.played_at()));
	Element::new("recents").children(sorted.into_iter().map(|r| recent_element(r, sources)))
}

pub fn device_element(
	info: &DeviceInfo,
	presets: &[Preset],
	recents: &[Recent],
	sources: &[ConfiguredSource],
) -> Element {
	Element::new("device")
		.attr("deviceid", &info.device_id)
		.child(
			Element::new("attachedProduct")
				.attr("product_code", &info.product_code)
				.child(Element::new("components"))
				.child(Element::leaf("productlabel", &info.product_code))
				.child(Element::leaf("serialnumber", &info.product_serial_number)),
		)
		.child(Element::leaf("createdOn", DEFAULT_TIMESTAMP))
		.child(Element::leaf("firmwareVersion", &info.firmware_version))
		.child(Element::leaf("ipaddress", &info.ip_address))
		.child(Element::leaf("name", &info.name))
		.child(presets_element(presets, sources))
		.child(recents_element(recents, sources))
		.child(Element::leaf("serialnumber", &info.device_serial_number))
		.child(Element::leaf("updatedOn", DEFAULT_TIMESTAMP))
}

pub fn provider_settings_element(account: &str) -> Element {
	Element::new("providerSettings").child(
		Element::new("providerSetting")
			.child(Element::leaf("boseId", account))
			.child(Element::leaf("keyName", "ELIGIBLE_FOR_TRIAL"))
			.child(Element::leaf("value", "true"))
			.child(Element::leaf("providerId", TRIAL_PROVIDER_ID)),
	)
}

pub fn software_update_element() -> Element {
	Element::new("software_update").child(Element::leaf("softwareUpdateLocation", ""))
}

/// Every device of the account embeds the account-wide presets and recents.
pub fn account_element(
	account: &str,
	devices: &[DeviceInfo],
	presets: &[Preset],
	recents: &[Recent],
	sources: &[ConfiguredSource],
) -> Element {
	Element::new("account")
		.attr("id", account)
		.child(Element::leaf("accountStatus", "OK"))
		.child(
			Element::new("devices").children(
				devices
					.iter()
					.map(|d| device_element(d, presets, recents, sources)),
			),
		)
		.child(Element::leaf("mode", "global"))
		.child(Element::leaf("preferrendLanguage", "en"))
		.child(provider_settings_element(account))
		.child(Element::new("sources").children(sources.iter().map(configured_source_element)))
}
