use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use prometheus_client::{
    encoding::{text::encode, EncodeLabelSet},
    metrics::{counter::Counter, family::Family},
    registry::Registry,
};

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct OutcomeLabels {
    pub outcome: String,
}

pub struct MetricObservor {
    registry: Registry,
    requests: Family<OutcomeLabels, Counter>,
}

impl Default for MetricObservor {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricObservor {
    pub fn new() -> Self {
        let mut registry = Registry::default();
        let requests = Family::<OutcomeLabels, Counter>::default();
        registry.register(
            "latency_requests",
            "Latency metric requests by outcome",
            requests.clone(),
        );
        Self { registry, requests }
    }

    pub fn record_outcome(&self, outcome: &str) {
        let _ = self
            .requests
            .get_or_create(&OutcomeLabels {
                outcome: outcome.to_owned(),
            })
            .inc();
    }

    #[cfg(test)]
    pub fn outcome_count(&self, outcome: &str) -> u64 {
        self.requests
            .get_or_create(&OutcomeLabels {
                outcome: outcome.to_owned(),
            })
            .get()
    }

    pub fn handle_prometheus(&self) -> Response {
        let mut body = String::new();
        tracing::debug!("handle_prometheus");
        if let Err(err) = encode(&mut body, &self.registry) {
            tracing::warn!("encode metrics failed: {:?}", err);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
        let mut resp = (StatusCode::OK, body).into_response();
        let _ = resp.headers_mut().insert(
            "content-type",
            HeaderValue::from_static("application/openmetrics-text; version=1.0.0; charset=utf-8"),
        );
        resp
    }
}
