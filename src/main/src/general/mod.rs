pub mod m_metric_observor;
pub mod m_telemetry_store;
pub mod metrics;
pub mod network;
