use axum::{
	extract::{DefaultBodyLimit, Path, Query, State},
	http::{header, StatusCode},
	response::{IntoResponse, Response},
	routing::{delete, get, post},
	Json, Router,
};

use crate::{
	app::{conditional::Conditional, discovery, marge, migration, App},
	server::{dto, error::APIError, IfNoneMatch},
};

const XML_CONTENT_TYPE: &str = "application/xml";

pub fn router() -> Router<App> {
	Router::new()
		.route("/", get(get_banner))
		.nest("/marge", marge_router())
		.nest("/setup", setup_router())
		.layer(DefaultBodyLimit::max(1024 * 1024)) // 1MB
}

fn marge_router() -> Router<App> {
	Router::new()
		// Catalog
		.route("/streaming/sourceproviders", get(get_source_providers))
		.route("/updates/soundtouch", get(get_software_update))
		.route(
			"/streaming/account/{account}/provider_settings",
			get(get_provider_settings),
		)
		.route("/streaming/support/power_on", post(post_power_on))
		// Account
		.route("/accounts/{account}/full", get(get_account_full))
		.route("/accounts/{account}/devices", post(post_device))
		.route("/accounts/{account}/devices/{device}", delete(delete_device))
		// Per device
		.route(
			"/accounts/{account}/devices/{device}/presets",
			get(get_presets),
		)
		.route(
			"/accounts/{account}/devices/{device}/presets/{button}",
			post(post_preset),
		)
		.route(
			"/accounts/{account}/devices/{device}/recents",
			get(get_recents).post(post_recent),
		)
}

fn setup_router() -> Router<App> {
	Router::new()
		.route("/devices", get(get_devices))
		.route("/devices/{host}/summary", get(get_summary))
		.route("/devices/{host}/migrate", post(post_migrate))
		.route("/devices/{host}/remote_services", post(post_remote_services))
		.route("/discovery/scan", post(post_discovery_scan))
}

fn conditional_response(conditional: Conditional) -> Response {
	match conditional {
		Conditional::Unchanged { token } => {
			(StatusCode::NOT_MODIFIED, [(header::ETAG, token.to_string())]).into_response()
		}
		Conditional::Fresh { token, body } => (
			StatusCode::OK,
			[
				(header::CONTENT_TYPE, XML_CONTENT_TYPE.to_owned()),
				(header::ETAG, token.to_string()),
			],
			body,
		)
			.into_response(),
	}
}

fn written_response(written: marge::Written) -> Response {
	(
		StatusCode::OK,
		[
			(header::CONTENT_TYPE, XML_CONTENT_TYPE.to_owned()),
			(header::ETAG, written.token.to_string()),
		],
		written.body,
	)
		.into_response()
}

async fn get_banner() -> Json<dto::Banner> {
	Json(dto::Banner {
		name: env!("CARGO_PKG_NAME").to_owned(),
		version: env!("CARGO_PKG_VERSION").to_owned(),
	})
}

async fn get_source_providers(
	State(marge_manager): State<marge::Manager>,
	IfNoneMatch(presented): IfNoneMatch,
) -> Result<Response, APIError> {
	let conditional = marge_manager.source_providers(presented).await?;
	Ok(conditional_response(conditional))
}

async fn get_software_update(
	State(marge_manager): State<marge::Manager>,
	IfNoneMatch(presented): IfNoneMatch,
) -> Result<Response, APIError> {
	let conditional = marge_manager.software_update(presented).await?;
	Ok(conditional_response(conditional))
}

async fn get_provider_settings(
	State(marge_manager): State<marge::Manager>,
	Path(account): Path<String>,
) -> Result<Response, APIError> {
	let body = marge_manager.provider_settings(&account).await?;
	Ok(([(header::CONTENT_TYPE, XML_CONTENT_TYPE)], body).into_response())
}

async fn post_power_on() -> StatusCode {
	StatusCode::OK
}

async fn get_account_full(
	State(marge_manager): State<marge::Manager>,
	Path(account): Path<String>,
	IfNoneMatch(presented): IfNoneMatch,
) -> Result<Response, APIError> {
	let conditional = marge_manager.account_full(&account, presented).await?;
	Ok(conditional_response(conditional))
}

async fn get_presets(
	State(marge_manager): State<marge::Manager>,
	Path((account, _device)): Path<(String, String)>,
	IfNoneMatch(presented): IfNoneMatch,
) -> Result<Response, APIError> {
	let conditional = marge_manager.presets(&account, presented).await?;
	Ok(conditional_response(conditional))
}

async fn post_preset(
	State(marge_manager): State<marge::Manager>,
	Path((account, device, button)): Path<(String, String, String)>,
	body: String,
) -> Result<Response, APIError> {
	let written = marge_manager
		.update_preset(&account, &device, &button, body)
		.await?;
	Ok(written_response(written))
}

async fn get_recents(
	State(marge_manager): State<marge::Manager>,
	Path((account, _device)): Path<(String, String)>,
	IfNoneMatch(presented): IfNoneMatch,
) -> Result<Response, APIError> {
	let conditional = marge_manager.recents(&account, presented).await?;
	Ok(conditional_response(conditional))
}

async fn post_recent(
	State(marge_manager): State<marge::Manager>,
	Path((account, device)): Path<(String, String)>,
	body: String,
) -> Result<Response, APIError> {
	let written = marge_manager.add_recent(&account, &device, body).await?;
	Ok(written_response(written))
}

async fn post_device(
	State(marge_manager): State<marge::Manager>,
	Path(account): Path<String>,
	body: String,
) -> Result<Response, APIError> {
	let written = marge_manager.add_device(&account, body).await?;
	Ok(written_response(written))
}

async fn delete_device(
	State(marge_manager): State<marge::Manager>,
	Path((account, device)): Path<(String, String)>,
) -> Result<Json<dto::Acknowledgement>, APIError> {
	marge_manager.remove_device(&account, &device).await?;
	Ok(Json(dto::Acknowledgement { ok: true }))
}

async fn get_devices(
	State(migration_manager): State<migration::Manager>,
) -> Result<Json<Vec<dto::Device>>, APIError> {
	let devices = migration_manager.known_devices().await?;
	let devices = devices.into_iter().map(|d| d.into()).collect();
	Ok(Json(devices))
}

async fn get_summary(
	State(migration_manager): State<migration::Manager>,
	Path(host): Path<String>,
	Query(query): Query<dto::TargetQuery>,
) -> Result<Json<dto::MigrationSummary>, APIError> {
	let summary = migration_manager
		.summary(&host, query.target.as_deref())
		.await?;
	Ok(Json(summary.into()))
}

async fn post_migrate(
	State(migration_manager): State<migration::Manager>,
	Path(host): Path<String>,
	Query(query): Query<dto::TargetQuery>,
) -> Result<Json<dto::Acknowledgement>, APIError> {
	migration_manager
		.migrate(&host, query.target.as_deref())
		.await?;
	Ok(Json(dto::Acknowledgement { ok: true }))
}

async fn post_remote_services(
	State(migration_manager): State<migration::Manager>,
	Path(host): Path<String>,
) -> Result<Json<dto::RemoteServices>, APIError> {
	let location = migration_manager.enable_remote_services(&host).await?;
	Ok(Json(dto::RemoteServices { location }))
}

async fn post_discovery_scan(
	State(discovery_manager): State<discovery::Manager>,
) -> Json<dto::ScanReport> {
	let found = discovery_manager.scan().await;
	Json(dto::ScanReport { found })
}
