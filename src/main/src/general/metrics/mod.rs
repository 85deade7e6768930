mod aggregator;
pub mod stats;
mod types;

pub use aggregator::MetricsAggregator;
pub use types::{RegionStats, RegionStatsMap, DEFAULT_THRESHOLD_MS};
