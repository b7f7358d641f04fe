//! WebDriver backend integration tests.
//!
//! These need a chromedriver listening on `HUTBOOK_WEBDRIVER_URL`
//! (default http://localhost:9515).

use hutbook_e::backend::EmbeddedBackend;
use hutbook_e::webdriver::DEFAULT_WEBDRIVER_URL;
use hutbook_engine::backend::Backend;
use hutbook_engine::protocol::{ProbeAction, ProbeData, ProbeResponse, QueryRequest};
use serial_test::serial;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn backend() -> EmbeddedBackend {
    let url = std::env::var("HUTBOOK_WEBDRIVER_URL")
        .unwrap_or_else(|_| DEFAULT_WEBDRIVER_URL.to_string());
    EmbeddedBackend::with_url(url)
}

#[tokio::test]
#[serial]
#[ignore] // Requires a running chromedriver
async fn test_embedded_lifecycle_and_query() {
    init_tracing();
    let mut backend = backend();
    backend.launch().await.expect("Failed to launch backend");

    let nav = backend
        .navigate("data:text/html,<button>Avanti</button><button disabled>Indietro</button>")
        .await
        .expect("Navigation failed");
    assert!(nav.url.starts_with("data:"));

    let resp = backend
        .execute_probe(ProbeAction::Query(QueryRequest {
            css: "button".into(),
            scope: None,
        }))
        .await
        .expect("Probe failed");
    let ProbeResponse::Ok { data, .. } = resp else {
        panic!("probe returned an error");
    };
    let ProbeData::Elements { elements } = *data else {
        panic!("expected elements");
    };
    assert_eq!(elements.len(), 2);
    assert_eq!(elements[0].text.as_deref(), Some("Avanti"));
    assert!(elements[1].is_disabled());

    backend.press_key("Escape").await.expect("press_key failed");
    assert!(!backend.screenshot().await.expect("Screenshot failed").is_empty());

    backend.close().await.expect("Close failed");
    assert!(!backend.is_ready().await);
}
