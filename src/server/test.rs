use axum::body::Bytes;
use http::response::Builder;
use http::{Request, Response};
use serde::de::DeserializeOwned;
use std::ops::Deref;


mod marge;

pub use crate::server::axum::test::ServiceType;

pub trait TestService {
	async fn new(test_name: &str) -> Self;

	async fn execute_request(&mut self, request: &Request<String>) -> (Builder, Option<Bytes>);

	async fn fetch(&mut self, request: &Request<String>) -> Response<()> {
		let (response_builder, _body) = self.execute_request(request).await;
		response_builder.body(()).unwrap()
	}

	async fn fetch_text(&mut self, request: &Request<String>) -> Response<String> {
		let (response_builder, body) = self.execute_request(request).await;
		let body = String::from_utf8(body.unwrap().deref().to_owned()).unwrap();
		response_builder.body(body).unwrap()
	}

	async fn fetch_json<U: DeserializeOwned>(&mut self, request: &Request<String>) -> Response<U> {
		let (response_builder, body) = self.execute_request(request).await;
		let body = serde_json::from_slice(&body.unwrap()).unwrap();
		response_builder.body(body).unwrap()
	}
}
