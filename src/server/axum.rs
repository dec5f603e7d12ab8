use axum::{extract::FromRef, Router, ServiceExt};
use log::error;
use tower::Layer;
use tower_http::{
	compression::CompressionLayer,
	normalize_path::{NormalizePath, NormalizePathLayer},
};

use crate::app::{self, App};

mod api;
mod conditional;
mod error;
mod logger;


pub fn make_router(app: App) -> NormalizePath<Router> {
	let router = api::router()
		.with_state(app)
		.layer(CompressionLayer::new())
		.layer(logger::LogLayer::new());

	NormalizePathLayer::trim_trailing_slash().layer(router)
}

pub async fn launch(app: App) -> Result<(), std::io::Error> {
	let port = app.port;
	let router = make_router(app);
	let make_service = ServiceExt::<axum::extract::Request>::into_make_service(router);
	let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
	tokio::spawn(async {
		if let Err(e) = axum::serve(listener, make_service).await {
			error!("Server stopped: {e}");
		}
	});
	Ok(())
}

impl FromRef<App> for app::marge::Manager {
	fn from_ref(app: &App) -> Self {
		app.marge_manager.clone()
	}
}

impl FromRef<App> for app::migration::Manager {
	fn from_ref(app: &App) -> Self {
		app.migration_manager.clone()
	}
}

impl FromRef<App> for app::discovery::Manager {
	fn from_ref(app: &App) -> Self {
		app.discovery_manager.clone()
	}
}
