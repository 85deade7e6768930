use std::sync::Arc;

use super::{
    stats::{mean, percentile, round_to},
    types::{RegionStats, RegionStatsMap},
};
use crate::{apis::LatencyReq, general::m_telemetry_store::TelemetryStore, result::RequestError};

/// Computes per-region latency/uptime aggregates over the static telemetry
/// collection.
///
/// 1. regions without any record are left out of the result
/// 2. the request fails only when no requested region has data
#[derive(Clone)]
pub struct MetricsAggregator {
    store: Arc<TelemetryStore>,
    default_threshold_ms: f64,
}

impl MetricsAggregator {
    pub fn new(store: Arc<TelemetryStore>, default_threshold_ms: f64) -> Self {
        Self {
            store,
            default_threshold_ms,
        }
    }

    #[cfg(test)]
    pub fn default_threshold_ms(&self) -> f64 {
        self.default_threshold_ms
    }

    pub fn handle(&self, req: &LatencyReq) -> Result<RegionStatsMap, RequestError> {
        let threshold_ms = req.threshold_ms.unwrap_or(self.default_threshold_ms);
        let mut result = RegionStatsMap::new();
        for region in &req.regions {
            if result.contains_key(region) {
                continue;
            }
            if let Some(stats) = self.region_stats(region, threshold_ms)? {
                let _ = result.insert(region.clone(), stats);
            }
        }
        if result.is_empty() {
            return Err(RequestError::NoData);
        }
        Ok(result)
    }

    /// `Ok(None)` when the region has no record.
    pub fn region_stats(
        &self,
        region: &str,
        threshold_ms: f64,
    ) -> Result<Option<RegionStats>, RequestError> {
        let (latencies, uptimes): (Vec<f64>, Vec<f64>) = self
            .store
            .select(region)
            .map(|r| (r.latency_ms, r.uptime_pct))
            .unzip();
        if latencies.is_empty() {
            tracing::debug!("no telemetry for region {}", region);
            return Ok(None);
        }

        let avg_latency = finite(region, "avg_latency", mean(&latencies))?;
        let p95_latency = finite(region, "p95_latency", percentile(&latencies, 95.0))?;
        let avg_uptime = finite(region, "avg_uptime", mean(&uptimes))?;
        let breaches = latencies.iter().filter(|l| **l > threshold_ms).count() as u64;

        Ok(Some(RegionStats {
            avg_latency: round_to(avg_latency, 2),
            p95_latency: round_to(p95_latency, 2),
            avg_uptime: round_to(avg_uptime, 3),
            breaches,
        }))
    }
}

fn finite(region: &str, stat: &str, value: Option<f64>) -> Result<f64, RequestError> {
    match value {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(RequestError::Internal(format!(
            "non-finite {} for region {}",
            stat, region
        ))),
    }
}
