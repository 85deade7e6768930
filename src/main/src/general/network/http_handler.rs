use crate::{
    apis::{self, ApiHandler, LatencyReq, LatencyResp},
    general::{m_metric_observor::MetricObservor, metrics::MetricsAggregator},
    result::{LMError, LMIoErr, LMResult, RequestError},
    util::JoinHandleWrapper,
};
use async_trait::async_trait;
use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::{any::Any, net::SocketAddr, sync::Arc};
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer};

#[derive(Clone)]
pub struct ApiHandlerImpl {
    aggregator: MetricsAggregator,
    observor: Arc<MetricObservor>,
}

impl ApiHandlerImpl {
    pub fn new(aggregator: MetricsAggregator, observor: Arc<MetricObservor>) -> Self {
        Self {
            aggregator,
            observor,
        }
    }

    #[cfg(test)]
    pub fn aggregator(&self) -> &MetricsAggregator {
        &self.aggregator
    }
}

#[async_trait]
impl ApiHandler for ApiHandlerImpl {
    async fn handle_latency(&self, body: &[u8]) -> LatencyResp {
        let res = LatencyReq::from_body(body).and_then(|req| {
            tracing::debug!(
                "handle_latency regions={:?} threshold_ms={:?}",
                req.regions,
                req.threshold_ms
            );
            self.aggregator.handle(&req)
        });
        match &res {
            Ok(stats) => {
                tracing::debug!("handle_latency answered {} regions", stats.len());
                self.observor.record_outcome("ok");
            }
            Err(err) => {
                if let RequestError::Internal(_) = err {
                    tracing::warn!("handle_latency failed: {}", err);
                } else {
                    tracing::debug!("handle_latency rejected: {}", err);
                }
                self.observor.record_outcome(err.outcome());
            }
        }
        res.into()
    }
}

async fn handle_metrics(State(observor): State<Arc<MetricObservor>>) -> Response {
    observor.handle_prometheus()
}

// Panics never surface as a transport failure, the body carries the message.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_owned()
    };
    tracing::error!("handler panicked: {}", detail);
    let resp: LatencyResp = Err(RequestError::Internal(detail)).into();
    (StatusCode::OK, Json(resp)).into_response()
}

// Any origin, method and header, with credentials. A literal `*` can't be
// combined with credentials, so the request's own values are mirrored back.
fn cors_layer() -> CorsLayer {
    CorsLayer::very_permissive().expose_headers([
        header::CONTENT_TYPE,
        header::CONTENT_LENGTH,
        header::DATE,
        header::VARY,
    ])
}

/// Attach the panic boundary and CORS to any router, outermost last.
///
/// Request bodies are unbounded: a size rejection would answer with a non-200
/// plain-text body, which clients of this endpoint never expect.
pub fn with_layers(router: Router) -> Router {
    router
        .layer(DefaultBodyLimit::disable())
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors_layer())
}

pub fn build_router(api: ApiHandlerImpl, metrics_enabled: bool) -> Router {
    let observor = api.observor.clone();
    let mut app = apis::add_routers(Router::new()).with_state(api);
    if metrics_enabled {
        app = app.merge(
            Router::new()
                .route("/metrics", get(handle_metrics))
                .with_state(observor),
        );
    }
    with_layers(app)
}

pub fn start_http_handler(addr: SocketAddr, app: Router) -> LMResult<JoinHandleWrapper> {
    let server = axum::Server::try_bind(&addr)
        .map_err(|err| LMIoErr::Bind { addr, err })?
        .serve(app.into_make_service());
    let local_addr = server.local_addr();
    tracing::info!("http start on {}", local_addr);

    Ok(JoinHandleWrapper::new(
        "http_handler",
        tokio::spawn(async move {
            server
                .await
                .map_err(|err| LMError::from(LMIoErr::Serve(err)))
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::general::{m_telemetry_store::TelemetryStore, metrics::DEFAULT_THRESHOLD_MS};
    use axum::{
        body::Body,
        http::{Method, Request},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const DATA: &str = r#"[
        {"region": "us-east", "latency_ms": 100, "uptime_pct": 99.9},
        {"region": "us-east", "latency_ms": 200, "uptime_pct": 99.8},
        {"region": "emea", "latency_ms": 185.5, "uptime_pct": 98.25}
    ]"#;

    fn test_api() -> ApiHandlerImpl {
        let store = Arc::new(TelemetryStore::from_json_str(DATA).unwrap());
        ApiHandlerImpl::new(
            MetricsAggregator::new(store, DEFAULT_THRESHOLD_MS),
            Arc::new(MetricObservor::new()),
        )
    }

    fn post(body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    async fn call(app: Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let body = hyper::body::to_bytes(resp.into_body()).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_stats_for_known_region() {
        let app = build_router(test_api(), true);
        let req = post(r#"{"regions": ["us-east"], "threshold_ms": 150}"#);
        let (status, body) = call(app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"us-east": {"avg_latency": 150.0, "p95_latency": 195.0, "avg_uptime": 99.85, "breaches": 1}})
        );
    }

    #[tokio::test]
    async fn test_default_threshold_and_omitted_region() {
        let app = build_router(test_api(), true);
        let (_, body) = call(app, post(r#"{"regions": ["emea", "nowhere", "us-east"]}"#)).await;
        let obj = body.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert!(!obj.contains_key("nowhere"));
        assert_eq!(body["emea"]["breaches"], json!(1));
        assert_eq!(body["us-east"]["breaches"], json!(1));
    }

    #[tokio::test]
    async fn test_errors_are_200() {
        for (req, msg) in [
            (r#"{"regions": []}"#, "Request must include a 'regions' array"),
            (r#"{"threshold_ms": 10}"#, "Request must include a 'regions' array"),
            (r#"{"regions": ["nonexistent-region"]}"#, "No data found for the specified regions"),
            ("not json", "Invalid JSON in request body"),
            (
                r#"{"regions": ["emea"], "threshold_ms": [1]}"#,
                "An error occurred: threshold_ms must be a number",
            ),
        ] {
            let (status, body) = call(build_router(test_api(), true), post(req)).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, json!({ "error": msg }), "{}", req);
        }
    }

    #[tokio::test]
    async fn test_body_over_two_megabytes() {
        let app = build_router(test_api(), true);
        let mut regions: Vec<String> = (0..200_000).map(|i| format!("edge-{:06}", i)).collect();
        regions.push("emea".to_owned());
        let body = json!({ "regions": regions }).to_string();
        assert!(body.len() > 2 * 1024 * 1024);

        let (status, body) = call(app, post(&body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"emea": {"avg_latency": 185.5, "p95_latency": 185.5, "avg_uptime": 98.25, "breaches": 1}})
        );
    }

    #[tokio::test]
    async fn test_identical_requests_identical_bodies() {
        let app = build_router(test_api(), true);
        let req = r#"{"regions": ["us-east", "emea"], "threshold_ms": 190}"#;
        let a = app.clone().oneshot(post(req)).await.unwrap();
        let b = app.oneshot(post(req)).await.unwrap();
        let a = hyper::body::to_bytes(a.into_body()).await.unwrap();
        let b = hyper::body::to_bytes(b.into_body()).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let app = build_router(test_api(), true);
        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/")
            .header("origin", "https://dashboard.example.com")
            .header("access-control-request-method", "POST")
            .header("access-control-request-headers", "content-type,x-custom")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let headers = resp.headers();
        assert_eq!(
            headers["access-control-allow-origin"],
            "https://dashboard.example.com"
        );
        assert_eq!(headers["access-control-allow-credentials"], "true");
        assert_eq!(headers["access-control-allow-methods"], "POST");
        assert_eq!(
            headers["access-control-allow-headers"],
            "content-type,x-custom"
        );
    }

    #[tokio::test]
    async fn test_cors_simple_request_exposes_headers() {
        let app = build_router(test_api(), true);
        let mut req = post(r#"{"regions": ["emea"]}"#);
        let _ = req
            .headers_mut()
            .insert("origin", "http://localhost:3000".parse().unwrap());
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(
            resp.headers()["access-control-allow-origin"],
            "http://localhost:3000"
        );
        assert!(resp.headers().contains_key("access-control-expose-headers"));
    }

    #[tokio::test]
    async fn test_panic_becomes_error_body() {
        let app = with_layers(Router::new().route(
            "/",
            axum::routing::post(|| async {
                if true {
                    panic!("dataset exploded");
                }
                "unreachable"
            }),
        ));
        let (status, body) = call(app, post("{}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"error": "An error occurred: dataset exploded"}));
    }

    #[tokio::test]
    async fn test_metrics_route() {
        let api = test_api();
        let app = build_router(api.clone(), true);
        let _ = call(app.clone(), post(r#"{"regions": ["emea"]}"#)).await;
        let _ = call(app.clone(), post(r#"{"regions": []}"#)).await;
        assert_eq!(api.observor.outcome_count("ok"), 1);
        assert_eq!(api.observor.outcome_count("invalid_request"), 1);

        let req = Request::builder()
            .method(Method::GET)
            .uri("/metrics")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_metrics_route_disabled() {
        let app = build_router(test_api(), false);
        let req = Request::builder()
            .method(Method::GET)
            .uri("/metrics")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_start_http_handler_binds_ephemeral_port() {
        let app = build_router(test_api(), false);
        let handle = start_http_handler("127.0.0.1:0".parse().unwrap(), app).unwrap();
        handle.abort();
    }
}
