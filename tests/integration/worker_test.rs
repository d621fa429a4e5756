//! Edge proxy and cache worker against a wiremock origin

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::extract::ConnectInfo;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use luxemarket::backend::server::{create_app_with, ServerConfig};
use luxemarket::backend::error::BackendError;
use luxemarket::backend::worker::{
    CacheWorker, FetchOutcome, HttpUpstream, StoredResponse, Upstream, WorkerConfig, WorkerRequest,
    WorkerState,
};
use pretty_assertions::assert_eq;
use reqwest::Url;
use tower::ServiceExt;
use wiremock::matchers::{header as header_eq, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SHELL: [&str; 5] = ["/", "/offline", "/products", "/cart", "/wishlist"];

async fn origin_with_shell() -> MockServer {
    let server = MockServer::start().await;
    for route in SHELL {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string(format!("<html>{}</html>", route)),
            )
            .mount(&server)
            .await;
    }
    server
}

fn upstream(server: &MockServer) -> Arc<HttpUpstream> {
    Arc::new(HttpUpstream::new(Url::parse(&server.uri()).unwrap()).unwrap())
}

/// Real HTTP upstream that can be switched off to simulate losing the network
struct Flaky {
    inner: HttpUpstream,
    offline: AtomicBool,
}

#[async_trait]
impl Upstream for Flaky {
    async fn fetch(&self, request: &WorkerRequest) -> Result<StoredResponse, BackendError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(BackendError::upstream("network unreachable"));
        }
        self.inner.fetch(request).await
    }

    fn origin(&self) -> &Url {
        self.inner.origin()
    }
}

/// Real HTTP upstream that remembers every URL it was asked for
struct Recording {
    inner: HttpUpstream,
    seen: Mutex<Vec<Url>>,
}

#[async_trait]
impl Upstream for Recording {
    async fn fetch(&self, request: &WorkerRequest) -> Result<StoredResponse, BackendError> {
        self.seen.lock().unwrap().push(request.url.clone());
        self.inner.fetch(request).await
    }

    fn origin(&self) -> &Url {
        self.inner.origin()
    }
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn app(server: &MockServer) -> Router {
    let config = ServerConfig::new(Url::parse(&server.uri()).unwrap());
    create_app_with(&config, upstream(server)).await
}

#[tokio::test]
async fn test_install_precaches_shell_over_http() {
    let server = origin_with_shell().await;
    let worker = CacheWorker::new(WorkerConfig::default(), upstream(&server));

    worker.install().await.unwrap();

    let status = worker.status().await;
    assert_eq!(status.state, WorkerState::Activated);
    assert_eq!(status.cached_entries, SHELL.len());
}

#[tokio::test]
async fn test_install_fails_when_a_shell_route_is_missing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let worker = CacheWorker::new(WorkerConfig::default(), upstream(&server));
    assert!(worker.install().await.is_err());
    assert_eq!(worker.state().await, WorkerState::Redundant);
}

#[tokio::test]
async fn test_http_error_navigation_is_not_replaced() {
    let server = origin_with_shell().await;
    Mock::given(method("GET"))
        .and(path("/products/404"))
        .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
        .mount(&server)
        .await;
    let worker = CacheWorker::new(WorkerConfig::default(), upstream(&server));
    worker.install().await.unwrap();

    let url = Url::parse(&server.uri()).unwrap().join("/products/404").unwrap();
    match worker.fetch(&WorkerRequest::navigate(url)).await {
        FetchOutcome::Response(response) => assert_eq!(response.status, StatusCode::NOT_FOUND),
        FetchOutcome::Passthrough => panic!("navigation should be handled"),
    }
}

#[tokio::test]
async fn test_proxy_serves_pages_and_caches_assets() {
    let server = origin_with_shell().await;
    Mock::given(method("GET"))
        .and(path("/img/bag.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(vec![0x89, 0x50, 0x4e, 0x47]),
        )
        .expect(1)
        .mount(&server)
        .await;
    let app = app(&server).await;

    let page = app
        .clone()
        .oneshot(
            Request::get("/cart")
                .header("sec-fetch-mode", "navigate")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(page.status(), StatusCode::OK);
    assert_eq!(body_text(page).await, "<html>/cart</html>");

    for _ in 0..2 {
        let image = app
            .clone()
            .oneshot(Request::get("/img/bag.png").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(image.status(), StatusCode::OK);
        assert_eq!(image.headers()[header::CONTENT_TYPE], "image/png");
    }
}

#[tokio::test]
async fn test_post_passes_through_to_origin() {
    let server = origin_with_shell().await;
    Mock::given(method("POST"))
        .and(path("/api/orders"))
        .respond_with(ResponseTemplate::new(201).set_body_string("created"))
        .expect(1)
        .mount(&server)
        .await;
    let app = app(&server).await;

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/orders")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"items":[]}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_text(response).await, "created");
}

#[tokio::test]
async fn test_origin_down_after_install() {
    let server = origin_with_shell().await;
    let origin = Url::parse(&server.uri()).unwrap();
    let flaky = Arc::new(Flaky {
        inner: HttpUpstream::new(origin.clone()).unwrap(),
        offline: AtomicBool::new(false),
    });
    let app = create_app_with(&ServerConfig::new(origin), flaky.clone()).await;
    flaky.offline.store(true, Ordering::SeqCst);

    let page = app
        .clone()
        .oneshot(Request::get("/wishlist").header("accept", "text/html").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(body_text(page).await, "<html>/wishlist</html>");

    let unknown = app
        .clone()
        .oneshot(Request::get("/products/3").header("accept", "text/html").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(body_text(unknown).await, "<html>/offline</html>");

    let api = app
        .clone()
        .oneshot(Request::get("/api/products").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(api.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = serde_json::from_str(&body_text(api).await).unwrap();
    assert_eq!(body["error"], "You are offline");
    assert_eq!(body["offline"], true);

    let image = app
        .oneshot(Request::get("/img/ring.jpg").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(image.headers()[header::CONTENT_TYPE], "image/svg+xml");
    assert!(body_text(image).await.contains("Image Unavailable"));
}

fn skip_waiting() -> Request<Body> {
    Request::post("/__worker/message")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"type":"SKIP_WAITING"}"#))
        .unwrap()
}

#[tokio::test]
async fn test_worker_control_routes() {
    let server = origin_with_shell().await;
    let config = ServerConfig::new(Url::parse(&server.uri()).unwrap()).with_control_token("s3cret");
    let app = create_app_with(&config, upstream(&server)).await;

    let status = app
        .clone()
        .oneshot(Request::get("/__worker/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status: serde_json::Value = serde_json::from_str(&body_text(status).await).unwrap();
    assert_eq!(status["state"], "activated");
    assert_eq!(status["cacheName"], "luxemarket-v1");

    let mut authorized = skip_waiting();
    authorized
        .headers_mut()
        .insert(header::AUTHORIZATION, "Bearer s3cret".parse().unwrap());
    let reply = app.clone().oneshot(authorized).await.unwrap();
    assert_eq!(reply.status(), StatusCode::OK);
    let reply: serde_json::Value = serde_json::from_str(&body_text(reply).await).unwrap();
    assert_eq!(reply["handled"], true);

    let rejected = app
        .oneshot(
            Request::post("/__worker/message")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::AUTHORIZATION, "Bearer s3cret")
                .body(Body::from("[1, 2]"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_control_message_requires_token_when_configured() {
    let server = origin_with_shell().await;
    let config = ServerConfig::new(Url::parse(&server.uri()).unwrap()).with_control_token("s3cret");
    let app = create_app_with(&config, upstream(&server)).await;

    let missing = app.clone().oneshot(skip_waiting()).await.unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let mut wrong = skip_waiting();
    wrong
        .headers_mut()
        .insert(header::AUTHORIZATION, "Bearer guess".parse().unwrap());
    let wrong = app.oneshot(wrong).await.unwrap();
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_control_message_without_token_is_loopback_only() {
    let server = origin_with_shell().await;
    let app = app(&server).await;

    let unknown_peer = app.clone().oneshot(skip_waiting()).await.unwrap();
    assert_eq!(unknown_peer.status(), StatusCode::FORBIDDEN);

    let mut remote = skip_waiting();
    remote
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from(([203, 0, 113, 7], 40000))));
    assert_eq!(app.clone().oneshot(remote).await.unwrap().status(), StatusCode::FORBIDDEN);

    let mut local = skip_waiting();
    local
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))));
    assert_eq!(app.oneshot(local).await.unwrap().status(), StatusCode::OK);
}

#[tokio::test]
async fn test_protocol_relative_target_stays_on_origin() {
    let server = origin_with_shell().await;
    let origin = Url::parse(&server.uri()).unwrap();
    let recording = Arc::new(Recording {
        inner: HttpUpstream::new(origin.clone()).unwrap(),
        seen: Mutex::new(Vec::new()),
    });
    let app = create_app_with(&ServerConfig::new(origin.clone()), recording.clone()).await;

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("//169.254.169.254/latest/meta-data")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let seen = recording.seen.lock().unwrap();
    let forwarded = seen.last().unwrap();
    assert_eq!(forwarded.host_str(), origin.host_str());
    assert_eq!(forwarded.port(), origin.port());
    assert_eq!(forwarded.path(), "//169.254.169.254/latest/meta-data");
}

async fn get_with_cookie(app: &Router, uri: &str, cookie: &str) -> axum::response::Response {
    app.clone()
        .oneshot(Request::get(uri).header(header::COOKIE, cookie).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_requests_with_cookies_are_not_shared() {
    let server = origin_with_shell().await;
    for user in ["alice", "bob"] {
        Mock::given(method("GET"))
            .and(path("/account/orders.json"))
            .and(header_eq("cookie", format!("session={}", user).as_str()))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("set-cookie", format!("session={}", user).as_str())
                    .set_body_string(format!("private data for {}", user)),
            )
            .expect(1)
            .mount(&server)
            .await;
    }
    let app = app(&server).await;

    let alice = get_with_cookie(&app, "/account/orders.json", "session=alice").await;
    assert_eq!(body_text(alice).await, "private data for alice");

    let bob = get_with_cookie(&app, "/account/orders.json", "session=bob").await;
    assert_eq!(bob.headers()[header::SET_COOKIE], "session=bob");
    assert_eq!(body_text(bob).await, "private data for bob");
}

#[tokio::test]
async fn test_private_and_cookie_setting_responses_are_not_cached() {
    let server = origin_with_shell().await;
    Mock::given(method("GET"))
        .and(path("/me.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("cache-control", "private, max-age=60")
                .set_body_string("me"),
        )
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/greeting.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "visitor=1")
                .set_body_string("hello"),
        )
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/no-store.css"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("cache-control", "no-store")
                .set_body_string("body {}"),
        )
        .expect(2)
        .mount(&server)
        .await;
    let app = app(&server).await;

    for uri in ["/me.json", "/greeting.txt", "/no-store.css"] {
        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }
}

#[tokio::test]
async fn test_precached_shell_drops_set_cookie() {
    let server = MockServer::start().await;
    for route in SHELL {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("set-cookie", "session=installer")
                    .set_body_string(format!("<html>{}</html>", route)),
            )
            .mount(&server)
            .await;
    }
    let worker = CacheWorker::new(WorkerConfig::default(), upstream(&server));
    worker.install().await.unwrap();

    let cached = worker.caches().match_request("/cart").await.unwrap();
    assert!(cached.headers.get(header::SET_COOKIE).is_none());
    assert_eq!(cached.body, "<html>/cart</html>");
}

#[tokio::test]
async fn test_runtime_cache_is_bounded() {
    let server = origin_with_shell().await;
    for asset in ["/a.js", "/b.js", "/c.js"] {
        Mock::given(method("GET"))
            .and(path(asset))
            .respond_with(ResponseTemplate::new(200).set_body_string(asset))
            .mount(&server)
            .await;
    }
    let config = WorkerConfig {
        max_cached_entries: 2,
        ..WorkerConfig::default()
    };
    let worker = CacheWorker::new(config, upstream(&server));
    worker.install().await.unwrap();

    let base = Url::parse(&server.uri()).unwrap();
    for asset in ["/a.js", "/b.js", "/c.js"] {
        worker.fetch(&WorkerRequest::get(base.join(asset).unwrap())).await;
    }

    assert_eq!(worker.status().await.cached_entries, SHELL.len() + 2);
    assert!(worker.caches().match_request("/a.js").await.is_none());
    assert!(worker.caches().match_request("/c.js").await.is_some());
    assert!(worker.caches().match_request("/offline").await.is_some());
}
