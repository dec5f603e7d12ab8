use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use log::warn;
use regex::Regex;

use crate::app::Error;

mod types;
pub mod wire;

pub use types::*;

pub const ACCOUNTS_DIR: &str = "accounts";
pub const DEVICES_DIR: &str = "devices";
pub const DEVICE_INFO_FILE: &str = "DeviceInfo.xml";

static IDENTIFIER: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]+$").expect("identifier pattern is valid"));

pub fn validate_identifier(identifier: &str) -> Result<&str, Error> {
	if identifier == "." || identifier == ".." || !IDENTIFIER.is_match(identifier) {
		return Err(Error::InvalidIdentifier(identifier.to_owned()));
	}
	Ok(identifier)
}

/// Account and device records persisted as one XML document per resource.
#[derive(Clone)]
pub struct Manager {
	data_dir: PathBuf,
}

impl Manager {
	pub fn new(data_dir: PathBuf) -> Self {
		Self { data_dir }
	}

	pub fn accounts_dir(&self) -> PathBuf {
		self.data_dir.join(ACCOUNTS_DIR)
	}

	pub fn account_dir(&self, account: &str) -> Result<PathBuf, Error> {
		Ok(self.accounts_dir().join(validate_identifier(account)?))
	}

	pub fn devices_dir(&self, account: &str) -> Result<PathBuf, Error> {
		Ok(self.account_dir(account)?.join(DEVICES_DIR))
	}

	pub fn device_dir(&self, account: &str, device: &str) -> Result<PathBuf, Error> {
		Ok(self.devices_dir(account)?.join(validate_identifier(device)?))
	}

	pub fn resource_path(&self, account: &str, resource: Resource) -> Result<PathBuf, Error> {
		Ok(self.account_dir(account)?.join(resource.file_name()))
	}

	pub fn device_info_path(&self, account: &str, device: &str) -> Result<PathBuf, Error> {
		Ok(self.device_dir(account, device)?.join(DEVICE_INFO_FILE))
	}

	pub fn get_device_info(&self, account: &str, device: &str) -> Result<DeviceInfo, Error> {
		let path = self.device_info_path(account, device)?;
		read_document(&path, wire::device_info_from_xml)
	}

	pub fn save_device_info(
		&self,
		account: &str,
		device: &str,
		info: &DeviceInfo,
	) -> Result<(), Error> {
		let path = self.device_info_path(account, device)?;
		write_document(&path, &wire::device_info_to_xml(info))
	}

	pub fn get_presets(&self, account: &str) -> Result<Vec<Preset>, Error> {
		let path = self.resource_path(account, Resource::Presets)?;
		read_document(&path, wire::presets_from_xml)
	}

	pub fn save_presets(&self, account: &str, presets: &[Preset]) -> Result<(), Error> {
		let path = self.resource_path(account, Resource::Presets)?;
		write_document(&path, &wire::presets_to_xml(presets))
	}

	pub fn get_recents(&self, account: &str) -> Result<Vec<Recent>, Error> {
		let path = self.resource_path(account, Resource::Recents)?;
		read_document(&path, wire::recents_from_xml)
	}

	pub fn save_recents(&self, account: &str, recents: &[Recent]) -> Result<(), Error> {
		let path = self.resource_path(account, Resource::Recents)?;
		write_document(&path, &wire::recents_to_xml(recents))
	}

	pub fn get_configured_sources(&self, account: &str) -> Result<Vec<ConfiguredSource>, Error> {
		let path = self.resource_path(account, Resource::Sources)?;
		let mut sources = read_document(&path, wire::configured_sources_from_xml)?;
		assign_source_ids(&mut sources);
		Ok(sources)
	}

	pub fn save_configured_sources(
		&self,
		account: &str,
		sources: &[ConfiguredSource],
	) -> Result<(), Error> {
		let path = self.resource_path(account, Resource::Sources)?;
		write_document(&path, &wire::configured_sources_to_xml(sources))
	}

	pub fn remove_device(&self, account: &str, device: &str) -> Result<(), Error> {
		let path = self.device_dir(account, device)?;
		match fs::remove_dir_all(&path) {
			Ok(()) => Ok(()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(Error::Io(path, e)),
		}
	}

	pub fn list_devices(&self, account: &str) -> Result<Vec<String>, Error> {
		let path = self.devices_dir(account)?;
		list_directories(&path)
	}

	/// Every readable device record, across all accounts unless one is named.
	pub fn list_all_devices(&self, account: Option<&str>) -> Result<Vec<StoredDevice>, Error> {
		let accounts = match account {
			Some(account) => vec![validate_identifier(account)?.to_owned()],
			None => list_directories(&self.accounts_dir())?,
		};

		let mut devices = Vec::new();
		for account in accounts {
			let device_ids = match self.list_devices(&account) {
				Ok(ids) => ids,
				Err(e) => {
					warn!("Skipping account `{account}`: {e}");
					continue;
				}
			};
			for device_id in device_ids {
				match self.get_device_info(&account, &device_id) {
					Ok(info) => devices.push(StoredDevice {
						account: account.clone(),
						info,
					}),
					Err(e) => warn!("Skipping device `{device_id}` of account `{account}`: {e}"),
				}
			}
		}
		Ok(devices)
	}
}

/// Gives id-less sources the lowest free ids from [`FIRST_SOURCE_ID`] upwards, in file order.
pub fn assign_source_ids(sources: &mut [ConfiguredSource]) {
	let taken = sources
		.iter()
		.filter_map(|s| s.id.parse::<u64>().ok())
		.collect::<HashSet<_>>();

	let mut next = FIRST_SOURCE_ID;
	for source in sources.iter_mut().filter(|s| s.id.is_empty()) {
		while taken.contains(&next) {
			next += 1;
		}
		source.id = next.to_string();
		next += 1;
	}
}

fn read_document<T>(
	path: &Path,
	parse: impl FnOnce(&str) -> Result<T, quick_xml::DeError>,
) -> Result<T, Error> {
	let content = match fs::read_to_string(path) {
		Ok(c) => c,
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
			return Err(Error::NotFound(path.to_owned()))
		}
		Err(e) => return Err(Error::Io(path.to_owned(), e)),
	};
	parse(&content).map_err(|e| Error::Parse(path.to_owned(), e))
}

fn write_document(path: &Path, content: &str) -> Result<(), Error> {
	if let Some(parent) = path.parent() {
		fs::create_dir_all(parent).map_err(|e| Error::Io(parent.to_owned(), e))?;
	}
	let mut temp_path = path.as_os_str().to_owned();
	temp_path.push(".tmp");
	let temp_path = PathBuf::from(temp_path);
	fs::write(&temp_path, content).map_err(|e| Error::Io(temp_path.clone(), e))?;
	fs::rename(&temp_path, path).map_err(|e| Error::Io(path.to_owned(), e))
}

fn list_directories(path: &Path) -> Result<Vec<String>, Error> {
	let entries = match fs::read_dir(path) {
		Ok(entries) => entries,
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
		Err(e) => return Err(Error::Io(path.to_owned(), e)),
	};

	let mut names = entries
		.filter_map(|e| e.ok())
		.filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
		.filter_map(|e| e.file_name().into_string().ok())
		.collect::<Vec<_>>();
	names.sort();
	Ok(names)
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::test::prepare_test_directory;
	use crate::test_name;

	fn make_store(test_name: String) -> Manager {
		Manager::new(prepare_test_directory(test_name))
	}

	fn source(id: &str, key_type: &str) -> ConfiguredSource {
		ConfiguredSource {
			display_name: format!("{key_type} account"),
			id: id.to_owned(),
			secret: "token".to_owned(),
			secret_type: "token".to_owned(),
			source_key_type: key_type.to_owned(),
			source_key_account: "me".to_owned(),
		}
	}

	#[test]
	fn rejects_unsafe_identifiers() {
		let store = make_store(test_name!());
		for bad in ["", ".", "..", "../etc", "a/b", "a b", "a\\b"] {
			assert!(
				matches!(store.account_dir(bad), Err(Error::InvalidIdentifier(_))),
				"{bad:?} should be rejected"
			);
		}
		assert!(store.device_dir("1234567", "..").is_err());
		assert!(store.device_dir("1234567", "08DF1F0BA325").is_ok());
		assert!(store.account_dir("a.b_c-9").is_ok());
	}

	#[test]
	fn missing_resources_are_not_found() {
		let store = make_store(test_name!());
		assert!(matches!(
			store.get_presets("1234567"),
			Err(Error::NotFound(_))
		));
		assert!(matches!(
			store.get_device_info("1234567", "A1"),
			Err(Error::NotFound(_))
		));
	}

	#[test]
	fn malformed_resources_are_parse_errors() {
		let store = make_store(test_name!());
		let path = store.resource_path("1234567", Resource::Recents).unwrap();
		fs::create_dir_all(path.parent().unwrap()).unwrap();
		fs::write(&path, "<recents><recent id=\"1\"></recents>").unwrap();
		assert!(matches!(store.get_recents("1234567"), Err(Error::Parse(_, _))));
	}

	#[test]
	fn saves_replace_whole_list() {
		let store = make_store(test_name!());
		let preset = |id: &str| Preset {
			content_item: ContentItem {
				id: id.to_owned(),
				name: format!("Station {id}"),
				..Default::default()
			},
			..Default::default()
		};

		store
			.save_presets("1234567", &[preset("1"), preset("2")])
			.unwrap();
		store.save_presets("1234567", &[preset("3")]).unwrap();

		let presets = store.get_presets("1234567").unwrap();
		assert_eq!(presets, vec![preset("3")]);
		let account_dir = store.account_dir("1234567").unwrap();
		let leftovers = fs::read_dir(account_dir)
			.unwrap()
			.filter_map(|e| e.ok())
			.filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
			.count();
		assert_eq!(leftovers, 0);
	}

	#[test]
	fn source_ids_skip_explicit_ones() {
		let store = make_store(test_name!());
		store
			.save_configured_sources(
				"1234567",
				&[
					source("", "SPOTIFY"),
					source("100001", "TUNEIN"),
					source("", "DEEZER"),
				],
			)
			.unwrap();

		let sources = store.get_configured_sources("1234567").unwrap();
		let ids = sources.iter().map(|s| s.id.as_str()).collect::<Vec<_>>();
		assert_eq!(ids, vec!["100002", "100001", "100003"]);

		let raw = fs::read_to_string(
			store
				.resource_path("1234567", Resource::Sources)
				.unwrap(),
		)
		.unwrap();
		assert_eq!(raw.matches(" id=").count(), 1);
	}

	#[test]
	fn removing_a_device_deletes_its_directory() {
		let store = make_store(test_name!());
		let info = DeviceInfo {
			device_id: "A1".to_owned(),
			name: "Kitchen".to_owned(),
			..Default::default()
		};
		store.save_device_info("1234567", "A1", &info).unwrap();
		assert_eq!(store.list_devices("1234567").unwrap(), vec!["A1"]);

		store.remove_device("1234567", "A1").unwrap();
		assert!(store.list_devices("1234567").unwrap().is_empty());
		assert!(!store.device_dir("1234567", "A1").unwrap().exists());

		store.remove_device("1234567", "A1").unwrap();
	}

	#[test]
	fn lists_devices_across_accounts() {
		let store = make_store(test_name!());
		let info = |id: &str| DeviceInfo {
			device_id: id.to_owned(),
			..Default::default()
		};
		store.save_device_info("alpha", "A1", &info("A1")).unwrap();
		store.save_device_info("beta", "B1", &info("B1")).unwrap();

		let broken = store.device_info_path("beta", "B2").unwrap();
		fs::create_dir_all(broken.parent().unwrap()).unwrap();
		fs::write(&broken, "<info deviceID=").unwrap();

		let all = store.list_all_devices(None).unwrap();
		let ids = all
			.iter()
			.map(|d| (d.account.as_str(), d.info.device_id.as_str()))
			.collect::<Vec<_>>();
		assert_eq!(ids, vec![("alpha", "A1"), ("beta", "B1")]);

		let beta = store.list_all_devices(Some("beta")).unwrap();
		assert_eq!(beta.len(), 1);
		assert!(store.list_all_devices(Some("nobody")).unwrap().is_empty());
	}

	#[test]
	fn unsafe_account_directories_are_skipped() {
		let store = make_store(test_name!());
		let info = DeviceInfo {
			device_id: "A1".to_owned(),
			..Default::default()
		};
		store.save_device_info("alpha", "A1", &info).unwrap();
		let stray = store.accounts_dir().join("bad name").join(DEVICES_DIR).join("X1");
		fs::create_dir_all(&stray).unwrap();

		let all = store.list_all_devices(None).unwrap();
		assert_eq!(all.len(), 1);
		assert_eq!(all[0].account, "alpha");
	}

	#[test]
	fn device_fields_keep_surrounding_whitespace() {
		let store = make_store(test_name!());
		let info = DeviceInfo {
			device_id: "A1".to_owned(),
			name: " Living Room ".to_owned(),
			product_code: "SoundTouch sm2".to_owned(),
			firmware_version: "\t27.0.6 ".to_owned(),
			device_serial_number: " I633".to_owned(),
			product_serial_number: "0692\n".to_owned(),
			ip_address: " 192.168.1.20".to_owned(),
		};
		store.save_device_info("1234567", "A1", &info).unwrap();
		assert_eq!(store.get_device_info("1234567", "A1").unwrap(), info);
	}
}
