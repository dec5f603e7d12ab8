use chrono::{DateTime, SecondsFormat, Utc};
use log::{info, warn};
use tokio::task::spawn_blocking;

use crate::app::conditional::Conditional;
use crate::app::datastore::{
	self, ConfiguredSource, ContentItem, DeviceInfo, Preset, Recent, Resource,
};
use crate::app::freshness::{self, Token};
use crate::app::xml::{Document, Element};
use crate::app::Error;

pub mod render;
pub mod request;

use request::{DeviceRequest, PresetRequest, RecentRequest};

/// A document produced by a write, with the token of the list resource it belongs to after the
/// write. Device writes carry the account token, which device records do not move.
#[derive(Debug, PartialEq, Eq)]
pub struct Written {
	pub token: Token,
	pub body: String,
}

/// Speaker-facing account service, answering in the firmware's XML dialect.
#[derive(Clone)]
pub struct Manager {
	datastore: datastore::Manager,
}

fn or_empty<T>(result: Result<Vec<T>, Error>) -> Result<Vec<T>, Error> {
	match result {
		Err(Error::NotFound(_)) => Ok(Vec::new()),
		r => r,
	}
}

fn document(root: Element) -> String {
	Document::new(root).render()
}

fn now_timestamp() -> String {
	Utc::now().to_rfc3339_opts(SecondsFormat::Millis, false)
}

fn find_source<'a>(
	sources: &'a [ConfiguredSource],
	source_id: &str,
) -> Option<&'a ConfiguredSource> {
	let source = sources.iter().find(|s| s.id == source_id);
	if source.is_none() {
		warn!("Configured source `{source_id}` is unknown, storing item without a source");
	}
	source
}

impl Manager {
	pub fn new(datastore: datastore::Manager) -> Self {
		Self { datastore }
	}

	async fn blocking<T, F>(&self, work: F) -> Result<T, Error>
	where
		T: Send + 'static,
		F: FnOnce(&datastore::Manager) -> Result<T, Error> + Send + 'static,
	{
		let datastore = self.datastore.clone();
		spawn_blocking(move || work(&datastore)).await?
	}

	pub async fn source_providers(&self, presented: Option<String>) -> Result<Conditional, Error> {
		Conditional::evaluate(freshness::catalog_token(), presented.as_deref(), || {
			Ok(document(render::source_providers_element()))
		})
	}

	pub async fn software_update(&self, presented: Option<String>) -> Result<Conditional, Error> {
		Conditional::evaluate(freshness::catalog_token(), presented.as_deref(), || {
			Ok(document(render::software_update_element()))
		})
	}

	pub async fn provider_settings(&self, account: &str) -> Result<String, Error> {
		datastore::validate_identifier(account)?;
		Ok(document(render::provider_settings_element(account)))
	}

	pub async fn account_full(
		&self,
		account: &str,
		presented: Option<String>,
	) -> Result<Conditional, Error> {
		let account = account.to_owned();
		self.blocking(move |datastore| {
			let account_dir = datastore.account_dir(&account)?;
			if !account_dir.is_dir() {
				return Err(Error::NotFound(account_dir));
			}
			let token = freshness::account_token(datastore, &account)?;
			Conditional::evaluate(token, presented.as_deref(), || {
				let devices = datastore
					.list_all_devices(Some(&account))?
					.into_iter()
					.map(|d| d.info)
					.collect::<Vec<_>>();
				let presets = or_empty(datastore.get_presets(&account))?;
				let recents = or_empty(datastore.get_recents(&account))?;
				let sources = or_empty(datastore.get_configured_sources(&account))?;
				Ok(document(render::account_element(
					&account, &devices, &presets, &recents, &sources,
				)))
			})
		})
		.await
	}

	pub async fn presets(
		&self,
		account: &str,
		presented: Option<String>,
	) -> Result<Conditional, Error> {
		let account = account.to_owned();
		self.blocking(move |datastore| {
			let token = freshness::resource_token(datastore, &account, Resource::Presets)?;
			Conditional::evaluate(token, presented.as_deref(), || {
				let presets = or_empty(datastore.get_presets(&account))?;
				let sources = or_empty(datastore.get_configured_sources(&account))?;
				Ok(document(render::presets_element(&presets, &sources)))
			})
		})
		.await
	}

	pub async fn recents(
		&self,
		account: &str,
		presented: Option<String>,
	) -> Result<Conditional, Error> {
		let account = account.to_owned();
		self.blocking(move |datastore| {
			let token = freshness::resource_token(datastore, &account, Resource::Recents)?;
			Conditional::evaluate(token, presented.as_deref(), || {
				let recents = or_empty(datastore.get_recents(&account))?;
				let sources = or_empty(datastore.get_configured_sources(&account))?;
				Ok(document(render::recents_element(&recents, &sources)))
			})
		})
		.await
	}

	/// Stores the preset for a button, replacing whatever the button held.
	pub async fn update_preset(
		&self,
		account: &str,
		device: &str,
		button: &str,
		body: String,
	) -> Result<Written, Error> {
		let number = button
			.parse::<u32>()
			.map_err(|_| Error::InvalidPresetNumber(button.to_owned()))?;
		let request = PresetRequest::parse(&body)?;
		let account = account.to_owned();
		let device = device.to_owned();

		self.blocking(move |datastore| {
			datastore::validate_identifier(&device)?;
			let sources = or_empty(datastore.get_configured_sources(&account))?;
			let source = find_source(&sources, &request.source_id);
			let content_item = ContentItem {
				id: number.to_string(),
				name: request.name,
				source: source.map(|s| s.source_key_type.clone()).unwrap_or_default(),
				item_type: request.content_item_type,
				location: request.location,
				source_account: source
					.map(|s| s.source_key_account.clone())
					.unwrap_or_default(),
				is_presetable: true,
			};

			let now = now_timestamp();
			let mut presets = or_empty(datastore.get_presets(&account))?;
			let preset = match presets
				.iter_mut()
				.find(|p| p.content_item.id == content_item.id)
			{
				Some(existing) => {
					existing.content_item = content_item;
					existing.container_art = request.container_art;
					existing.updated_on = now;
					existing.clone()
				}
				None => {
					let preset = Preset {
						content_item,
						created_on: now.clone(),
						updated_on: now,
						container_art: request.container_art,
					};
					presets.push(preset.clone());
					preset
				}
			};
			datastore.save_presets(&account, &presets)?;
			info!("Device `{device}` stored preset {number} for account `{account}`");

			Ok(Written {
				token: freshness::resource_token(datastore, &account, Resource::Presets)?,
				body: document(render::preset_element(&preset, &sources)),
			})
		})
		.await
	}

	/// Records a play. Replaying the same item moves its existing entry forward.
	pub async fn add_recent(
		&self,
		account: &str,
		device: &str,
		body: String,
	) -> Result<Written, Error> {
		let request = RecentRequest::parse(&body)?;
		let account = account.to_owned();
		let device = device.to_owned();

		self.blocking(move |datastore| {
			datastore::validate_identifier(&device)?;
			let sources = or_empty(datastore.get_configured_sources(&account))?;
			let source = find_source(&sources, &request.source_id);
			let source_type = source.map(|s| s.source_key_type.clone()).unwrap_or_default();
			let source_account = source
				.map(|s| s.source_key_account.clone())
				.unwrap_or_default();
			let utc_time = DateTime::parse_from_rfc3339(&request.last_played_at)
				.map(|t| t.timestamp())
				.unwrap_or_else(|_| Utc::now().timestamp())
				.to_string();

			let mut recents = or_empty(datastore.get_recents(&account))?;
			let existing = recents.iter_mut().find(|r| {
				r.content_item.source == source_type
					&& r.content_item.source_account == source_account
					&& r.content_item.location == request.location
			});
			let recent = match existing {
				Some(existing) => {
					existing.content_item.name = request.name;
					existing.content_item.item_type = request.content_item_type;
					existing.device_id = device.clone();
					existing.utc_time = utc_time;
					existing.clone()
				}
				None => {
					let next_id = recents
						.iter()
						.filter_map(|r| r.content_item.id.parse::<u64>().ok())
						.max()
						.unwrap_or(0) + 1;
					let recent = Recent {
						content_item: ContentItem {
							id: next_id.to_string(),
							name: request.name,
							source: source_type,
							item_type: request.content_item_type,
							location: request.location,
							source_account,
							is_presetable: true,
						},
						device_id: device.clone(),
						utc_time,
						container_art: String::new(),
					};
					recents.push(recent.clone());
					recent
				}
			};
			datastore.save_recents(&account, &recents)?;

			Ok(Written {
				token: freshness::resource_token(datastore, &account, Resource::Recents)?,
				body: document(render::recent_element(&recent, &sources)),
			})
		})
		.await
	}

	pub async fn add_device(&self, account: &str, body: String) -> Result<Written, Error> {
		let request = DeviceRequest::parse(&body)?;
		let account = account.to_owned();

		self.blocking(move |datastore| {
			let device_id = datastore::validate_identifier(&request.device_id)?.to_owned();
			let mut info = match datastore.get_device_info(&account, &device_id) {
				Ok(info) => info,
				Err(Error::NotFound(_)) => DeviceInfo {
					device_id: device_id.clone(),
					..Default::default()
				},
				Err(e) => return Err(e),
			};
			info.name = request.name;
			if !request.ip_address.is_empty() {
				info.ip_address = request.ip_address;
			}
			if !request.firmware_version.is_empty() {
				info.firmware_version = request.firmware_version;
			}
			if !request.serial_number.is_empty() {
				info.device_serial_number = request.serial_number;
			}
			datastore.save_device_info(&account, &device_id, &info)?;
			info!("Added device `{device_id}` to account `{account}`");

			let presets = or_empty(datastore.get_presets(&account))?;
			let recents = or_empty(datastore.get_recents(&account))?;
			let sources = or_empty(datastore.get_configured_sources(&account))?;
			Ok(Written {
				token: freshness::account_token(datastore, &account)?,
				body: document(render::device_element(&info, &presets, &recents, &sources)),
			})
		})
		.await
	}

	pub async fn remove_device(&self, account: &str, device: &str) -> Result<(), Error> {
		let account = account.to_owned();
		let device = device.to_owned();
		self.blocking(move |datastore| {
			datastore.remove_device(&account, &device)?;
			info!("Removed device `{device}` from account `{account}`");
			Ok(())
		})
		.await
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::app::test;
	use crate::test_name;

	const PRESET_BODY: &str = "<preset><sourceid>100001</sourceid><location>/station/s1</location><contentItemType>stationurl</contentItemType><name>Jazz</name><containerArt>http://art/1.png</containerArt></preset>";

	fn spotify() -> ConfiguredSource {
		ConfiguredSource {
			display_name: "me@example.com".to_owned(),
			id: String::new(),
			secret: "s3cr3t".to_owned(),
			secret_type: "token".to_owned(),
			source_key_type: "SPOTIFY".to_owned(),
			source_key_account: "me".to_owned(),
		}
	}

	#[tokio::test]
	async fn account_full_requires_known_account() {
		let ctx = test::ContextBuilder::new(test_name!()).build().await;
		let result = ctx.marge_manager.account_full("1234567", None).await;
		assert!(matches!(result, Err(Error::NotFound(_))));
	}

	#[tokio::test]
	async fn account_full_lists_bare_device() {
		let ctx = test::ContextBuilder::new(test_name!()).build().await;
		let info = DeviceInfo {
			device_id: "D1".to_owned(),
			..Default::default()
		};
		ctx.datastore.save_device_info("A1", "D1", &info).unwrap();

		let Conditional::Fresh { token, body } =
			ctx.marge_manager.account_full("A1", None).await.unwrap()
		else {
			panic!("expected a full response");
		};
		assert_eq!(token, Token(0));
		assert!(body.contains(r#"<device deviceid="D1">"#));
		assert!(body.contains("<presets/><recents/>"));
	}

	#[tokio::test]
	async fn presets_honor_presented_token() {
		let ctx = test::ContextBuilder::new(test_name!()).build().await;
		ctx.datastore
			.save_configured_sources("A1", &[spotify()])
			.unwrap();
		let written = ctx
			.marge_manager
			.update_preset("A1", "D1", "1", PRESET_BODY.to_owned())
			.await
			.unwrap();
		assert!(written.body.contains("<name>Jazz</name>"));
		assert!(written.body.contains("<sourceproviderid>15</sourceproviderid>"));

		let presented = Some(written.token.to_string());
		let unchanged = ctx.marge_manager.presets("A1", presented).await.unwrap();
		assert_eq!(unchanged, Conditional::Unchanged { token: written.token });

		let fresh = ctx
			.marge_manager
			.presets("A1", Some("stale".to_owned()))
			.await
			.unwrap();
		assert_eq!(fresh.token(), written.token);
	}

	#[tokio::test]
	async fn updating_a_preset_keeps_creation_time() {
		let ctx = test::ContextBuilder::new(test_name!()).build().await;
		ctx.marge_manager
			.update_preset("A1", "D1", "2", PRESET_BODY.to_owned())
			.await
			.unwrap();
		let created = ctx.datastore.get_presets("A1").unwrap();

		let renamed = PRESET_BODY.replace("Jazz", "Blues");
		ctx.marge_manager
			.update_preset("A1", "D1", "2", renamed)
			.await
			.unwrap();
		let updated = ctx.datastore.get_presets("A1").unwrap();

		assert_eq!(updated.len(), 1);
		assert_eq!(updated[0].content_item.name, "Blues");
		assert_eq!(updated[0].created_on, created[0].created_on);
	}

	#[tokio::test]
	async fn rejects_non_numeric_preset_button() {
		let ctx = test::ContextBuilder::new(test_name!()).build().await;
		let result = ctx
			.marge_manager
			.update_preset("A1", "D1", "first", PRESET_BODY.to_owned())
			.await;
		assert!(matches!(result, Err(Error::InvalidPresetNumber(_))));
	}

	#[tokio::test]
	async fn replayed_recent_is_updated_in_place() {
		let ctx = test::ContextBuilder::new(test_name!()).build().await;
		let body = |at: &str| {
			format!("<recent><lastplayedat>{at}</lastplayedat><sourceid></sourceid><name>Show</name><location>/p/1</location><contentItemType>stationurl</contentItemType></recent>")
		};
		let first = ctx
			.marge_manager
			.add_recent("A1", "D1", body("2023-11-14T22:13:20+00:00"))
			.await
			.unwrap();
		assert!(first.body.starts_with(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><recent id="1">"#));

		ctx.marge_manager
			.add_recent("A1", "D2", body("2023-11-15T22:13:20+00:00"))
			.await
			.unwrap();
		let recents = ctx.datastore.get_recents("A1").unwrap();
		assert_eq!(recents.len(), 1);
		assert_eq!(recents[0].device_id, "D2");
		assert_eq!(recents[0].utc_time, "1700086400");
	}

	#[tokio::test]
	async fn adding_a_device_merges_with_existing_record() {
		let ctx = test::ContextBuilder::new(test_name!()).build().await;
		let existing = DeviceInfo {
			device_id: "D1".to_owned(),
			name: "Old name".to_owned(),
			firmware_version: "27.0.6".to_owned(),
			..Default::default()
		};
		ctx.datastore.save_device_info("A1", "D1", &existing).unwrap();

		let written = ctx
			.marge_manager
			.add_device(
				"A1",
				r#"<device deviceid="D1"><name>Kitchen</name><ipaddress>10.0.0.8</ipaddress></device>"#
					.to_owned(),
			)
			.await
			.unwrap();
		assert!(written.body.contains("<name>Kitchen</name>"));

		let stored = ctx.datastore.get_device_info("A1", "D1").unwrap();
		assert_eq!(stored.name, "Kitchen");
		assert_eq!(stored.ip_address, "10.0.0.8");
		assert_eq!(stored.firmware_version, "27.0.6");

		ctx.marge_manager.remove_device("A1", "D1").await.unwrap();
		assert!(ctx.datastore.list_devices("A1").unwrap().is_empty());
	}
}
