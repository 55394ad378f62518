use std::time::Duration;

use aerocrawl_engine::{AddressResolver, GeocoderSettings, HttpAddressResolver};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn resolver_for(server: &MockServer) -> HttpAddressResolver {
    HttpAddressResolver::new(GeocoderSettings {
        base_url: server.uri(),
        timeout: Duration::from_secs(5),
        ..GeocoderSettings::default()
    })
    .unwrap()
}

#[tokio::test]
async fn resolves_first_match_to_coordinates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "US,Springfield,Abraham Field"))
        .and(query_param("format", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"[{"lat":"39.8440","lon":"-89.6779"},{"lat":"0","lon":"0"}]"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let coords = resolver_for(&server)
        .resolve("US,Springfield,Abraham Field")
        .await
        .expect("coordinates resolved");
    assert_eq!(coords.latitude, "39.8440");
    assert_eq!(coords.longitude, "-89.6779");
}

#[tokio::test]
async fn empty_result_array_omits_coordinates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("[]", "application/json"))
        .mount(&server)
        .await;

    assert!(resolver_for(&server).resolve("nowhere").await.is_none());
}

#[tokio::test]
async fn server_error_omits_coordinates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    assert!(resolver_for(&server).resolve("anywhere").await.is_none());
}

#[tokio::test]
async fn malformed_body_omits_coordinates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("not json", "application/json"))
        .mount(&server)
        .await;

    assert!(resolver_for(&server).resolve("anywhere").await.is_none());
}
