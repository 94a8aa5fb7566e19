//! End-to-end dispatch through a real listener.

use reqwest::header::{ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE, LOCATION, SERVER};
use reqwest::{Method, StatusCode};
use serde_json::Value;

use media_gateway::config::GatewayConfig;

mod common;

#[tokio::test]
async fn root_redirects_to_landing_page() {
    let server = common::start_server(GatewayConfig::default()).await;
    let res = common::client().get(server.url("/")).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(res.headers()[LOCATION], "web/index.html");
}

#[tokio::test]
async fn legacy_prefix_redirects() {
    let server = common::start_server(GatewayConfig::default()).await;
    let res = common::client().get(server.url("/emby")).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(res.headers()[LOCATION], "emby/web/index.html");
}

#[tokio::test]
async fn options_preflight() {
    let server = common::start_server(GatewayConfig::default()).await;
    let res = common::client()
        .request(Method::OPTIONS, server.url("/Users/1/Items"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(
        res.headers()[ACCESS_CONTROL_ALLOW_HEADERS],
        "Content-Type, Authorization, Range, X-MediaBrowser-Token, X-Emby-Authorization"
    );
    assert!(res.text().await.unwrap().is_empty());
}

#[tokio::test]
async fn ping_under_every_prefix() {
    let server = common::start_server(GatewayConfig::default()).await;
    let client = common::client();

    for path in ["/System/Ping", "/emby/System/Ping", "/mediabrowser/system/ping", "/emby/emby/System/Ping"] {
        let res = client.get(server.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK, "{path}");
        assert_eq!(res.headers()[SERVER], "Media Server");
        assert!(res.headers().contains_key("x-request-id"));
        assert_eq!(res.text().await.unwrap(), "Media Server");
    }
}

#[tokio::test]
async fn format_extension_is_stripped() {
    let server = common::start_server(GatewayConfig::default()).await;
    let res = common::client()
        .get(server.url("/System/Info/Public.json"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[CONTENT_TYPE], "application/json");
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["ServerName"], "Media Server");
}

#[tokio::test]
async fn not_found_message_is_sanitized() {
    let mut config = GatewayConfig::default();
    config.paths.installation_path = "/srv/media".into();
    let server = common::start_server(config).await;

    let res = common::client().get(server.url("/srv/media/secret")).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.headers()[CONTENT_TYPE], "text/html");
    assert_eq!(res.text().await.unwrap(), "Unable to find the specified file: /secret");
}

#[tokio::test]
async fn api_key_guards_system_info() {
    let mut config = GatewayConfig::default();
    config.security.api_keys = vec!["k3y".into()];
    let server = common::start_server(config).await;
    let client = common::client();

    let denied = client.get(server.url("/System/Info")).send().await.unwrap();
    assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

    let allowed = client.get(server.url("/System/Info?api_key=k3y")).send().await.unwrap();
    assert_eq!(allowed.status(), StatusCode::OK);

    let header = client
        .get(server.url("/emby/System/Info"))
        .header("X-Emby-Token", "k3y")
        .send()
        .await
        .unwrap();
    assert_eq!(header.status(), StatusCode::OK);

    // Public info stays open.
    let public = client.get(server.url("/System/Info/Public")).send().await.unwrap();
    assert_eq!(public.status(), StatusCode::OK);
}

#[tokio::test]
async fn global_override_spares_ping() {
    let server = common::start_server(GatewayConfig::default()).await;
    let client = common::client();
    server.state.set_global_response(Some("<p>Upgrading</p>".into()));

    let blocked = client.get(server.url("/System/Info/Public")).send().await.unwrap();
    assert_eq!(blocked.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(blocked.headers()[CONTENT_TYPE], "text/html");
    assert_eq!(blocked.text().await.unwrap(), "<p>Upgrading</p>");

    let ping = client.get(server.url("/System/Ping")).send().await.unwrap();
    assert_eq!(ping.status(), StatusCode::OK);
}

#[tokio::test]
async fn shutting_down_answers_503() {
    let server = common::start_server(GatewayConfig::default()).await;
    server.state.begin_shutdown();
    let client = common::client();

    for _ in 0..2 {
        let res = client.get(server.url("/System/Ping")).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(res.text().await.unwrap(), "Server shutting down");
    }
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let mut config = GatewayConfig::default();
    config.listener.max_body_size = 16;
    let server = common::start_server(config).await;

    let res = common::client()
        .post(server.url("/System/Ping"))
        .body(vec![b'x'; 1024])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.headers()[CONTENT_TYPE], "text/html");
}

#[tokio::test]
async fn oversized_body_during_shutdown_is_503() {
    let mut config = GatewayConfig::default();
    config.listener.max_body_size = 16;
    let server = common::start_server(config).await;
    server.state.begin_shutdown();

    let res = common::client()
        .post(server.url("/System/Ping"))
        .body(vec![b'x'; 1024])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(res.text().await.unwrap(), "Server shutting down");
}

#[tokio::test]
async fn host_header_with_path_is_rejected() {
    let server = common::start_server(GatewayConfig::default()).await;

    let res = common::client()
        .get(server.url("/Ping"))
        .header("Host", "media.lan/System")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.text().await.unwrap(), "Invalid host");
}

#[tokio::test]
async fn live_config_changes_apply_to_next_request() {
    let server = common::start_server(GatewayConfig::default()).await;
    let client = common::client();

    let mut updated = GatewayConfig::default();
    updated.routing.default_redirect_path = "web/home.html".into();
    server.config.store(std::sync::Arc::new(updated));

    let res = client.get(server.url("/")).send().await.unwrap();
    assert_eq!(res.headers()[LOCATION], "web/home.html");
}
