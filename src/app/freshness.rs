use std::fmt;
use std::path::Path;
use std::time::UNIX_EPOCH;

use crate::app::datastore::{self, Resource, DEFAULT_TIMESTAMP};
use crate::app::Error;

/// Change marker for a stored resource, exchanged with clients as an ETag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Token(pub u64);

impl Token {
	pub fn matches(&self, presented: &str) -> bool {
		self.to_string() == presented
	}
}

impl fmt::Display for Token {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Milliseconds since epoch of the last modification, zero for a missing file.
pub fn token_for(path: &Path) -> Result<Token, Error> {
	let metadata = match std::fs::metadata(path) {
		Ok(m) => m,
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Token(0)),
		Err(e) => return Err(Error::Io(path.to_owned(), e)),
	};
	let modified = metadata
		.modified()
		.map_err(|e| Error::Io(path.to_owned(), e))?;
	let millis = modified
		.duration_since(UNIX_EPOCH)
		.map(|d| d.as_millis() as u64)
		.unwrap_or_default();
	Ok(Token(millis))
}

pub fn resource_token(
	datastore: &datastore::Manager,
	account: &str,
	resource: Resource,
) -> Result<Token, Error> {
	token_for(&datastore.resource_path(account, resource)?)
}

/// Newest of the account's list resources. Device records are not part of it, so adding or
/// removing a device leaves the token unchanged.
pub fn account_token(datastore: &datastore::Manager, account: &str) -> Result<Token, Error> {
	let mut token = Token(0);
	for resource in Resource::ALL {
		token = token.max(resource_token(datastore, account, resource)?);
	}
	Ok(token)
}

/// Token for documents derived from the fixed provider catalog.
pub fn catalog_token() -> Token {
	chrono::DateTime::parse_from_rfc3339(DEFAULT_TIMESTAMP)
		.map(|t| Token(t.timestamp_millis() as u64))
		.unwrap_or_default()
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::app::datastore::{ConfiguredSource, Recent};
	use crate::test::{prepare_test_directory, wait_for_next_timestamp};
	use crate::test_name;

	#[test]
	fn missing_file_has_zero_token() {
		let directory = prepare_test_directory(test_name!());
		assert_eq!(token_for(&directory.join("Presets.xml")).unwrap(), Token(0));
	}

	#[test]
	fn tokens_compare_as_decimal_strings() {
		let token = Token(1700000000123);
		assert!(token.matches("1700000000123"));
		assert!(!token.matches("01700000000123"));
		assert!(!token.matches("1700000000123 "));
		assert!(!token.matches(""));
	}

	#[test]
	fn account_token_follows_latest_write() {
		let store = datastore::Manager::new(prepare_test_directory(test_name!()));
		assert_eq!(account_token(&store, "1234567").unwrap(), Token(0));

		store.save_recents("1234567", &[Recent::default()]).unwrap();
		let after_recents = account_token(&store, "1234567").unwrap();
		assert!(after_recents > Token(0));
		assert_eq!(
			after_recents,
			resource_token(&store, "1234567", Resource::Recents).unwrap()
		);

		wait_for_next_timestamp();
		store
			.save_configured_sources("1234567", &[ConfiguredSource::default()])
			.unwrap();
		let after_sources = account_token(&store, "1234567").unwrap();
		assert!(after_sources > after_recents);
		assert_eq!(
			after_sources,
			resource_token(&store, "1234567", Resource::Sources).unwrap()
		);
	}

	#[test]
	fn account_token_ignores_device_records() {
		let store = datastore::Manager::new(prepare_test_directory(test_name!()));
		store.save_presets("1234567", &[]).unwrap();
		let before = account_token(&store, "1234567").unwrap();

		wait_for_next_timestamp();
		let info = datastore::DeviceInfo {
			device_id: "A1".to_owned(),
			..Default::default()
		};
		store.save_device_info("1234567", "A1", &info).unwrap();
		assert_eq!(account_token(&store, "1234567").unwrap(), before);

		store.remove_device("1234567", "A1").unwrap();
		assert_eq!(account_token(&store, "1234567").unwrap(), before);
	}

	#[test]
	fn catalog_token_is_fixed() {
		assert_eq!(catalog_token(), Token(1348058580000));
	}
}
