use serde::Serialize;
use std::collections::BTreeMap;

pub const DEFAULT_THRESHOLD_MS: f64 = 180.0;

// Per-region aggregate, already rounded for output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionStats {
    pub avg_latency: f64,
    pub p95_latency: f64,
    pub avg_uptime: f64,
    pub breaches: u64,
}

// Region name to its stats, sorted so the serialized body is stable
pub type RegionStatsMap = BTreeMap<String, RegionStats>;
