use std::{collections::BTreeSet, path::Path};

use serde::{Deserialize, Serialize};

use crate::result::{LMDataErr, LMIoErr, LMResult};

/// One latency/uptime observation of a region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub region: String,
    pub latency_ms: f64,
    pub uptime_pct: f64,
}

/// The whole telemetry collection, loaded once at startup.
///
/// There is no mutation path after construction, the store is shared behind an
/// `Arc` by every request.
#[derive(Debug, Default)]
pub struct TelemetryStore {
    records: Vec<TelemetryRecord>,
}

impl TelemetryStore {
    pub fn new(records: Vec<TelemetryRecord>) -> Self {
        Self { records }
    }

    pub fn from_json_str(json: &str) -> LMResult<Self> {
        let records: Vec<TelemetryRecord> = serde_json::from_str(json)
            .map_err(|err| LMDataErr::DecodeTelemetry { path: None, err })?;
        Ok(Self::new(records))
    }

    pub fn load(path: impl AsRef<Path>) -> LMResult<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|err| LMIoErr::Io {
            path: path.to_owned(),
            err,
        })?;
        let records: Vec<TelemetryRecord> =
            serde_json::from_reader(std::io::BufReader::new(file)).map_err(|err| {
                LMDataErr::DecodeTelemetry {
                    path: Some(path.to_owned()),
                    err,
                }
            })?;
        tracing::info!("loaded {} telemetry records from {:?}", records.len(), path);
        Ok(Self::new(records))
    }

    #[cfg(test)]
    pub fn records(&self) -> &[TelemetryRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records of `region` in collection order, exact match.
    pub fn select<'a>(&'a self, region: &'a str) -> impl Iterator<Item = &'a TelemetryRecord> {
        self.records.iter().filter(move |r| r.region == region)
    }

    pub fn regions(&self) -> BTreeSet<&str> {
        self.records.iter().map(|r| r.region.as_str()).collect()
    }
}
