use http::{header, StatusCode};

use crate::server::dto;
use crate::server::test::{protocol, ServiceType, TestService};
use crate::test_name;

const ACCOUNT: &str = "1234567";
const DEVICE: &str = "08DF1F0BA325";

const DEVICE_BODY: &str = r#"<device deviceid="08DF1F0BA325"><name>Kitchen</name><ipaddress>192.168.1.20</ipaddress><firmwareVersion>27.0.6</firmwareVersion><serialnumber>I6332527703739342000020</serialnumber></device>"#;

const PRESET_BODY: &str = "<preset><sourceid></sourceid><location>/station/s1</location><contentItemType>stationurl</contentItemType><name>Jazz</name><containerArt>http://art/1.png</containerArt></preset>";

const RECENT_BODY: &str = "<recent><lastplayedat>2023-11-14T22:13:20+00:00</lastplayedat><sourceid></sourceid><name>Show</name><location>/p/1</location><contentItemType>stationurl</contentItemType></recent>";

fn etag<T>(response: &http::Response<T>) -> String {
	response
		.headers()
		.get(header::ETAG)
		.unwrap()
		.to_str()
		.unwrap()
		.to_owned()
}

#[tokio::test]
async fn banner_names_the_service() {
	let mut service = ServiceType::new(&test_name!()).await;
	let response = service
		.fetch_json::<dto::Banner>(&protocol::banner())
		.await;
	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(response.body().name, "homeport");
}

#[tokio::test]
async fn source_providers_honor_etag() {
	let mut service = ServiceType::new(&test_name!()).await;

	let response = service
		.fetch_text(&protocol::source_providers(None))
		.await;
	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(
		response.headers().get(header::CONTENT_TYPE).unwrap(),
		"application/xml"
	);
	assert_eq!(etag(&response), "1348058580000");
	assert!(response.body().contains("<name>PANDORA</name>"));

	let response = service
		.fetch(&protocol::source_providers(Some("1348058580000")))
		.await;
	assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
	assert_eq!(etag(&response), "1348058580000");

	let response = service
		.fetch(&protocol::source_providers(Some("\"1348058580000\"")))
		.await;
	assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn software_update_honors_etag() {
	let mut service = ServiceType::new(&test_name!()).await;
	let response = service.fetch_text(&protocol::software_update(None)).await;
	assert_eq!(response.status(), StatusCode::OK);
	assert!(response
		.body()
		.contains("<softwareUpdateLocation></softwareUpdateLocation>"));

	let response = service
		.fetch(&protocol::software_update(Some(&etag(&response))))
		.await;
	assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
}

#[tokio::test]
async fn provider_settings_golden_path() {
	let mut service = ServiceType::new(&test_name!()).await;
	let response = service
		.fetch_text(&protocol::provider_settings(ACCOUNT))
		.await;
	assert_eq!(response.status(), StatusCode::OK);
	assert!(response.body().contains("<boseId>1234567</boseId>"));
}

#[tokio::test]
async fn provider_settings_rejects_bad_account() {
	let mut service = ServiceType::new(&test_name!()).await;
	let response = service
		.fetch(&protocol::provider_settings("bad$account"))
		.await;
	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn power_on_is_acknowledged() {
	let mut service = ServiceType::new(&test_name!()).await;
	let response = service.fetch(&protocol::power_on()).await;
	assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn account_full_of_unknown_account_is_not_found() {
	let mut service = ServiceType::new(&test_name!()).await;
	let response = service
		.fetch(&protocol::account_full(ACCOUNT, None))
		.await;
	assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn account_full_honors_etag() {
	let mut service = ServiceType::new(&test_name!()).await;
	let response = service
		.fetch_text(&protocol::add_device(ACCOUNT, DEVICE_BODY))
		.await;
	assert_eq!(response.status(), StatusCode::OK);
	assert!(response.body().contains("<name>Kitchen</name>"));

	let response = service
		.fetch_text(&protocol::account_full(ACCOUNT, None))
		.await;
	assert_eq!(response.status(), StatusCode::OK);
	assert!(response
		.body()
		.contains(r#"<device deviceid="08DF1F0BA325">"#));
	let token = etag(&response);

	let response = service
		.fetch(&protocol::account_full(ACCOUNT, Some(&token)))
		.await;
	assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
	assert_eq!(etag(&response), token);
}

#[tokio::test]
async fn posted_preset_is_served_with_its_etag() {
	let mut service = ServiceType::new(&test_name!()).await;
	let response = service
		.fetch_text(&protocol::update_preset(ACCOUNT, DEVICE, "3", PRESET_BODY))
		.await;
	assert_eq!(response.status(), StatusCode::OK);
	assert!(response.body().contains(r#"<preset buttonNumber="3">"#));
	let token = etag(&response);

	let response = service
		.fetch(&protocol::presets(ACCOUNT, DEVICE, Some(&token)))
		.await;
	assert_eq!(response.status(), StatusCode::NOT_MODIFIED);

	let response = service
		.fetch_text(&protocol::presets(ACCOUNT, DEVICE, Some("0")))
		.await;
	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(etag(&response), token);
	assert!(response.body().contains("<name>Jazz</name>"));
}

#[tokio::test]
async fn preset_button_must_be_a_number() {
	let mut service = ServiceType::new(&test_name!()).await;
	let response = service
		.fetch(&protocol::update_preset(ACCOUNT, DEVICE, "one", PRESET_BODY))
		.await;
	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_preset_is_rejected() {
	let mut service = ServiceType::new(&test_name!()).await;
	let body = "<preset><name>Jazz</preset>";
	let response = service
		.fetch(&protocol::update_preset(ACCOUNT, DEVICE, "1", body))
		.await;
	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn posted_recent_is_listed() {
	let mut service = ServiceType::new(&test_name!()).await;
	let response = service
		.fetch(&protocol::add_recent(ACCOUNT, DEVICE, RECENT_BODY))
		.await;
	assert_eq!(response.status(), StatusCode::OK);
	let token = etag(&response);

	let response = service
		.fetch(&protocol::recents(ACCOUNT, DEVICE, Some(&token)))
		.await;
	assert_eq!(response.status(), StatusCode::NOT_MODIFIED);

	let response = service
		.fetch_text(&protocol::recents(ACCOUNT, DEVICE, None))
		.await;
	assert_eq!(response.status(), StatusCode::OK);
	assert!(response.body().contains("<name>Show</name>"));
	assert!(response
		.body()
		.contains("<lastplayedat>2023-11-14T22:13:20Z</lastplayedat>"));
}

#[tokio::test]
async fn removed_device_leaves_account() {
	let mut service = ServiceType::new(&test_name!()).await;
	service
		.fetch(&protocol::add_device(ACCOUNT, DEVICE_BODY))
		.await;

	let response = service
		.fetch_json::<dto::Acknowledgement>(&protocol::remove_device(ACCOUNT, DEVICE))
		.await;
	assert_eq!(response.status(), StatusCode::OK);
	assert!(response.body().ok);

	let response = service
		.fetch_text(&protocol::account_full(ACCOUNT, None))
		.await;
	assert_eq!(response.status(), StatusCode::OK);
	assert!(!response.body().contains("deviceid"));
}
