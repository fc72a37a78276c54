#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header::SET_COOKIE, Request, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use bytes::Bytes;
use http_body_util::BodyExt;
use tower::ServiceExt;

use vgate_core::{HeaderBag, RequestAttributes, RequestView, Verdict};
use vgate_gateway::app_state::GateState;
use vgate_gateway::client::VerdictClient;
use vgate_gateway::config;
use vgate_gateway::enrich::TIMING_HEADER;
use vgate_gateway::policy::PolicyGate;
use vgate_gateway::router::build_router;
use vgate_gateway::transport::request_view;

struct FixedVerdict {
    verdict: Verdict,
    calls: AtomicUsize,
}

impl FixedVerdict {
    fn new(verdict: Verdict) -> Arc<Self> {
        Arc::new(Self {
            verdict,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VerdictClient for FixedVerdict {
    async fn evaluate(&self, _attributes: &RequestAttributes) -> Verdict {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.verdict.clone()
    }
}

async fn home() -> impl IntoResponse {
    ([(SET_COOKIE, "app=1; Path=/")], "hello")
}

fn gate(expose_headers: bool, policy: PolicyGate, client: Arc<FixedVerdict>) -> Router {
    let yaml = format!("version: 1\napi:\n  key: \"k\"\ngate:\n  expose_headers: {expose_headers}\n");
    let cfg = config::load_from_str(&yaml).unwrap();
    let state = GateState::with_parts(&cfg, policy, client);
    let app = Router::new().route("/", get(home)).route("/login", get(home));
    build_router(state, app)
}

fn get_req(path: &str) -> Request<Body> {
    Request::builder()
        .uri(path)
        .header("host", "www.my-domain.com")
        .header("user-agent", "Mozilla/5.0")
        .body(Body::empty())
        .unwrap()
}

async fn body_bytes(resp: axum::response::Response) -> Bytes {
    resp.into_body().collect().await.unwrap().to_bytes()
}

fn cookies(verdict_cookies: &str) -> HeaderBag {
    let mut bag = HeaderBag::new();
    bag.insert("Set-Cookie", Bytes::copy_from_slice(verdict_cookies.as_bytes()));
    bag
}

#[tokio::test]
async fn ignored_requests_skip_the_service() {
    let client = FixedVerdict::new(Verdict::block(403, Bytes::from_static(b"no")));
    let policy = PolicyGate::new().exclude(|req: &RequestView| req.path == "/");
    let app = gate(false, policy, Arc::clone(&client));

    let resp = app.oneshot(get_req("/")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(client.calls(), 0);
    assert_eq!(body_bytes(resp).await, Bytes::from_static(b"hello"));
}

#[tokio::test]
async fn unmatched_include_list_skips_the_service() {
    let client = FixedVerdict::new(Verdict::block(403, Bytes::from_static(b"no")));
    let policy = PolicyGate::new().include(|req: &RequestView| req.path.starts_with("/shop"));
    let app = gate(false, policy, Arc::clone(&client));

    let resp = app.clone().oneshot(get_req("/")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(client.calls(), 0);

    let resp = app.oneshot(get_req("/metrics")).await.unwrap();
    let text = String::from_utf8(body_bytes(resp).await.to_vec()).unwrap();
    assert!(text.contains("vgate_dispositions_total{disposition=\"ignored\"} 1"));
}

#[tokio::test]
async fn blocked_requests_get_the_verdict_body() {
    let mut verdict = Verdict::block(403, Bytes::from_static(b"<html>blocked</html>"));
    verdict.response_headers = cookies("datadome=blocked; Path=/");
    let client = FixedVerdict::new(verdict);
    let app = gate(false, PolicyGate::new(), Arc::clone(&client));

    let resp = app.oneshot(get_req("/")).await.unwrap();
    assert_eq!(client.calls(), 1);
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let set: Vec<_> = resp.headers().get_all(SET_COOKIE).iter().collect();
    assert_eq!(set.len(), 1);
    assert_eq!(set[0], "datadome=blocked; Path=/");
    assert_eq!(body_bytes(resp).await, Bytes::from_static(b"<html>blocked</html>"));
}

#[tokio::test]
async fn redirects_carry_location() {
    let client = FixedVerdict::new(Verdict::redirect_to(
        302,
        Some(Bytes::from_static(b"https://captcha.example/")),
    ));
    let app = gate(false, PolicyGate::new(), client);

    let resp = app.oneshot(get_req("/")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(resp.headers().get("location").unwrap(), "https://captcha.example/");
    assert!(body_bytes(resp).await.is_empty());
}

#[tokio::test]
async fn monitor_mode_lets_flagged_requests_through() {
    let client = FixedVerdict::new(Verdict::block(403, Bytes::from_static(b"no")));
    let policy = PolicyGate::new()
        .monitor_mode(true)
        .intercept(|req: &RequestView| req.path == "/login");
    let app = gate(false, policy, client);

    let resp = app.clone().oneshot(get_req("/")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app.oneshot(get_req("/login")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn pass_through_appends_verdict_cookies() {
    let mut verdict = Verdict::pass();
    verdict.response_headers = cookies("datadome=abc; Path=/\nsecond=2");
    verdict
        .response_headers
        .insert("X-DD-B", Bytes::from_static(b"1"));
    let app = gate(false, PolicyGate::new(), FixedVerdict::new(verdict));

    let resp = app.oneshot(get_req("/")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let set: Vec<_> = resp
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert_eq!(set, vec!["app=1; Path=/", "datadome=abc; Path=/", "second=2"]);
    assert_eq!(resp.headers().get("x-dd-b").unwrap(), "1");
    assert!(resp.headers().get(TIMING_HEADER).is_none());
}

#[tokio::test]
async fn exposed_headers_include_diagnostics_and_timing() {
    let mut verdict = Verdict::pass();
    verdict
        .request_headers
        .insert("X-DataDomeResponse", Bytes::from_static(b"200"));
    let app = gate(true, PolicyGate::new(), FixedVerdict::new(verdict));

    let resp = app.oneshot(get_req("/")).await.unwrap();
    assert_eq!(resp.headers().get("x-datadomeresponse").unwrap(), "200");

    let elapsed: f64 = resp
        .headers()
        .get(TIMING_HEADER)
        .unwrap()
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!(elapsed >= 0.0);
}

#[tokio::test]
async fn exposed_timing_after_timeout_is_minus_one() {
    let app = gate(true, PolicyGate::new(), FixedVerdict::new(Verdict::timed_out()));

    let resp = app.oneshot(get_req("/")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get(TIMING_HEADER).unwrap(), "-1");
}

#[tokio::test]
async fn metrics_endpoint_is_not_gated() {
    let client = FixedVerdict::new(Verdict::block(403, Bytes::from_static(b"no")));
    let app = gate(false, PolicyGate::new(), Arc::clone(&client));

    let _ = app.clone().oneshot(get_req("/")).await.unwrap();

    let resp = app.oneshot(get_req("/metrics")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(client.calls(), 1);

    let text = String::from_utf8(body_bytes(resp).await.to_vec()).unwrap();
    assert!(text.contains("vgate_dispositions_total{disposition=\"intercepted\"} 1"));
    assert!(text.contains("vgate_verdicts_total{outcome=\"block\"} 1"));
    assert!(text.contains("vgate_verdicts_inflight 0"));
}

#[test]
fn request_view_reads_host_header() {
    let req = Request::builder()
        .method("POST")
        .uri("/shop/cart?id=7")
        .header("host", "Shop.Example:8443")
        .header("content-length", "12")
        .body(Body::empty())
        .unwrap();

    let view = request_view(&req);
    assert_eq!(view.method, "POST");
    assert_eq!(view.scheme, "http");
    assert_eq!(view.host.as_deref(), Some("Shop.Example"));
    assert_eq!(view.port, Some(8443));
    assert_eq!(view.path, "/shop/cart");
    assert_eq!(view.path_and_query, "/shop/cart?id=7");
    assert_eq!(view.body_len, Some(12));
    assert!(view.peer_addr.is_none());
}

#[test]
fn request_view_handles_ipv6_and_forwarded_proto() {
    let req = Request::builder()
        .uri("/")
        .header("host", "[::1]:9000")
        .body(Body::empty())
        .unwrap();
    let view = request_view(&req);
    assert_eq!(view.host.as_deref(), Some("::1"));
    assert_eq!(view.port, Some(9000));

    let req = Request::builder()
        .uri("/")
        .header("host", "shop.example")
        .header("x-forwarded-proto", "https")
        .body(Body::empty())
        .unwrap();
    let view = request_view(&req);
    assert_eq!(view.scheme, "https");
    assert_eq!(view.port, Some(443));
}

#[tokio::test]
async fn slow_client_is_bounded_by_caller() {
    struct Slow;

    #[async_trait]
    impl VerdictClient for Slow {
        async fn evaluate(&self, _attributes: &RequestAttributes) -> Verdict {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Verdict::pass()
        }
    }

    let cfg = config::load_from_str("version: 1\napi:\n  key: \"k\"\n").unwrap();
    let state = GateState::with_parts(&cfg, PolicyGate::new(), Arc::new(Slow));
    let app = build_router(state.clone(), Router::new().route("/", get(home)));

    let dropped = tokio::time::timeout(Duration::from_millis(50), app.oneshot(get_req("/"))).await;
    assert!(dropped.is_err());
    assert_eq!(state.metrics().verdicts_inflight.get(), 0);
}
