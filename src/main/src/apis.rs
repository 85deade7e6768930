use crate::{
    general::{metrics::RegionStatsMap, network::http_handler::ApiHandlerImpl},
    result::RequestError,
};
use async_trait::async_trait;
use axum::{body::Bytes, extract::State, http::StatusCode, routing::post, Json, Router};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct LatencyReq {
    pub regions: Vec<String>,
    pub threshold_ms: Option<f64>,
}

impl LatencyReq {
    /// Decode and validate a raw request body.
    pub fn from_body(body: &[u8]) -> Result<Self, RequestError> {
        let value: Value = serde_json::from_slice(body).map_err(|_| RequestError::InvalidBody)?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Result<Self, RequestError> {
        let obj = value.as_object().ok_or(RequestError::MissingRegions)?;

        let regions = match obj.get("regions") {
            Some(Value::Array(items)) if !items.is_empty() => items
                .iter()
                .map(|v| v.as_str().map(str::to_owned))
                .collect::<Option<Vec<_>>>()
                .ok_or(RequestError::MissingRegions)?,
            _ => return Err(RequestError::MissingRegions),
        };

        let threshold_ms = match obj.get("threshold_ms") {
            None => None,
            Some(v) => Some(v.as_f64().ok_or_else(|| {
                RequestError::Internal("threshold_ms must be a number".to_owned())
            })?),
        };

        Ok(Self {
            regions,
            threshold_ms,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LatencyResp {
    Fail { error: String },
    Stats(RegionStatsMap),
}

impl From<Result<RegionStatsMap, RequestError>> for LatencyResp {
    fn from(res: Result<RegionStatsMap, RequestError>) -> Self {
        match res {
            Ok(stats) => LatencyResp::Stats(stats),
            Err(err) => LatencyResp::Fail {
                error: err.to_string(),
            },
        }
    }
}

#[async_trait]
pub trait ApiHandler {
    async fn handle_latency(&self, body: &[u8]) -> LatencyResp;
}

pub fn add_routers(router: Router<ApiHandlerImpl>) -> Router<ApiHandlerImpl> {
    async fn latency(
        State(handler): State<ApiHandlerImpl>,
        body: Bytes,
    ) -> (StatusCode, Json<LatencyResp>) {
        (StatusCode::OK, Json(handler.handle_latency(&body).await))
    }
    router.route("/", post(latency))
}
