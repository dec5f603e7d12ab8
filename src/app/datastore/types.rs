/// Timestamp speakers accept for records whose creation time is unknown.
pub const DEFAULT_TIMESTAMP: &str = "2012-09-19T12:43:00.000+00:00";

/// First id handed out to configured sources stored without one.
pub const FIRST_SOURCE_ID: u64 = 100001;

/// Streaming providers known to speaker firmware. A provider's id is its 1-based position.
pub const PROVIDERS: [&str; 38] = [
	"PANDORA",
	"INTERNET_RADIO",
	"OFF",
	"LOCAL",
	"AIRPLAY",
	"CURRATED_RADIO",
	"STORED_MUSIC",
	"SLAVE_SOURCE",
	"AUX",
	"RECOMMENDED_INTERNET_RADIO",
	"LOCAL_INTERNET_RADIO",
	"GLOBAL_INTERNET_RADIO",
	"HELLO",
	"DEEZER",
	"SPOTIFY",
	"IHEART",
	"SIRIUSXM",
	"GOOGLE_PLAY_MUSIC",
	"QQMUSIC",
	"AMAZON",
	"LOCAL_MUSIC",
	"WBMX",
	"SOUNDCLOUD",
	"TIDAL",
	"TUNEIN",
	"QPLAY",
	"JUKE",
	"BBC",
	"DARFM",
	"7DIGITAL",
	"SAAVN",
	"RDIO",
	"PHONE_MUSIC",
	"ALEXA",
	"RADIOPLAYER",
	"RADIO.COM",
	"RADIO_COM",
	"SIRIUSXM_EVEREST",
];

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeviceInfo {
	pub device_id: String,
	pub name: String,
	/// Vendor `type` and `moduleType` joined by a single space.
	pub product_code: String,
	pub firmware_version: String,
	pub device_serial_number: String,
	pub product_serial_number: String,
	pub ip_address: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentItem {
	pub id: String,
	pub name: String,
	pub source: String,
	pub item_type: String,
	pub location: String,
	pub source_account: String,
	pub is_presetable: bool,
}

impl Default for ContentItem {
	fn default() -> Self {
		Self {
			id: String::new(),
			name: String::new(),
			source: String::new(),
			item_type: String::new(),
			location: String::new(),
			source_account: String::new(),
			is_presetable: true,
		}
	}
}

/// The content item id is the preset's button number.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Preset {
	pub content_item: ContentItem,
	pub created_on: String,
	pub updated_on: String,
	pub container_art: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Recent {
	pub content_item: ContentItem,
	pub device_id: String,
	/// Unix seconds, kept verbatim from storage.
	pub utc_time: String,
	pub container_art: String,
}

impl Recent {
	pub fn played_at(&self) -> Option<i64> {
		self.utc_time.parse().ok()
	}
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfiguredSource {
	pub display_name: String,
	/// Empty until assigned, either explicitly or when the store loads it.
	pub id: String,
	pub secret: String,
	pub secret_type: String,
	pub source_key_type: String,
	pub source_key_account: String,
}

impl ConfiguredSource {
	pub fn provider_id(&self) -> usize {
		PROVIDERS
			.iter()
			.position(|p| *p == self.source_key_type)
			.map(|i| i + 1)
			.unwrap_or(0)
	}

	pub fn serves(&self, item: &ContentItem) -> bool {
		self.source_key_type == item.source && self.source_key_account == item.source_account
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceProvider {
	pub id: usize,
	pub name: &'static str,
	pub created_on: &'static str,
	pub updated_on: &'static str,
}

pub fn source_providers() -> Vec<SourceProvider> {
	PROVIDERS
		.iter()
		.copied()
		.enumerate()
		.map(|(i, name)| SourceProvider {
			id: i + 1,
			name,
			created_on: DEFAULT_TIMESTAMP,
			updated_on: DEFAULT_TIMESTAMP,
		})
		.collect()
}

/// A device record together with the account it is filed under.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredDevice {
	pub account: String,
	pub info: DeviceInfo,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resource {
	Presets,
	Recents,
	Sources,
}

impl Resource {
	pub const ALL: [Resource; 3] = [Resource::Presets, Resource::Recents, Resource::Sources];

	pub fn file_name(self) -> &'static str {
		match self {
			Resource::Presets => "Presets.xml",
			Resource::Recents => "Recents.xml",
			Resource::Sources => "Sources.xml",
		}
	}
}
