use std::time::Duration;

use aerocrawl_engine::{FailureKind, FetchSettings, PageFetcher, ReqwestPageFetcher};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn fetcher_returns_decoded_html_and_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/doc"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("<html>ok</html>", "text/html; charset=utf-8"),
        )
        .mount(&server)
        .await;

    let fetcher = ReqwestPageFetcher::new(FetchSettings::default()).unwrap();
    let url = format!("{}/doc", server.uri());

    let page = fetcher.fetch(&url).await.expect("fetch ok");
    assert_eq!(page.html, "<html>ok</html>");
    assert_eq!(page.metadata.original_url, url);
    assert_eq!(page.metadata.final_url, url);
    assert_eq!(page.metadata.byte_len, 15);
    assert_eq!(page.metadata.encoding, "UTF-8");
    assert!(page
        .metadata
        .content_type
        .unwrap()
        .starts_with("text/html"));
}

#[tokio::test]
async fn fetcher_decodes_gbk_body_via_content_type_charset() {
    // "机场" (airport) in GBK.
    let body: Vec<u8> = vec![
        b'<', b'h', b't', b'm', b'l', b'>', 0xbb, 0xfa, 0xb3, 0xa1, b'<', b'/', b'h', b't', b'm',
        b'l', b'>',
    ];
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cn"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=gbk"))
        .mount(&server)
        .await;

    let fetcher = ReqwestPageFetcher::new(FetchSettings::default()).unwrap();
    let url = format!("{}/cn", server.uri());

    let page = fetcher.fetch(&url).await.expect("fetch ok");
    assert_eq!(page.html, "<html>机场</html>");
    assert_eq!(page.metadata.encoding, "GBK");
}

#[tokio::test]
async fn fetcher_fails_on_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fetcher = ReqwestPageFetcher::new(FetchSettings::default()).unwrap();
    let url = format!("{}/missing", server.uri());

    let err = fetcher.fetch(&url).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(404));
}

#[tokio::test]
async fn fetcher_times_out_on_slow_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_string("slow"),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        request_timeout: Duration::from_millis(50),
        ..FetchSettings::default()
    };
    let fetcher = ReqwestPageFetcher::new(settings).unwrap();
    let url = format!("{}/slow", server.uri());

    let err = fetcher.fetch(&url).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn fetcher_rejects_too_large_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/large"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/html")
                .set_body_string("01234567890"),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        max_bytes: 10,
        ..FetchSettings::default()
    };
    let fetcher = ReqwestPageFetcher::new(settings).unwrap();
    let url = format!("{}/large", server.uri());

    let err = fetcher.fetch(&url).await.unwrap_err();
    assert!(matches!(err.kind, FailureKind::TooLarge { max_bytes: 10, .. }));
}

#[tokio::test]
async fn fetcher_rejects_non_html_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
        .mount(&server)
        .await;

    let fetcher = ReqwestPageFetcher::new(FetchSettings::default()).unwrap();
    let url = format!("{}/data", server.uri());

    let err = fetcher.fetch(&url).await.unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::UnsupportedContentType {
            content_type: "application/json".to_string()
        }
    );
}

#[tokio::test]
async fn release_is_idempotent_and_blocks_further_fetches() {
    let server = MockServer::start().await;
    let mut fetcher = ReqwestPageFetcher::new(FetchSettings::default()).unwrap();

    fetcher.release();
    fetcher.release();

    let err = fetcher.fetch(&server.uri()).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Released);
}
