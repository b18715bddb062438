//! Health report types.

use std::collections::BTreeMap;

use serde::Serialize;

/// Lag statistics for one projection.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct LagStats {
    pub avg_lag_ms: f64,
    pub max_lag_ms: u64,
    pub sample_count: usize,
}

impl LagStats {
    /// Whether the worst recorded lag is within `threshold_ms`.
    ///
    /// Stats without samples are healthy: a projection that has not seen
    /// traffic yet has shown no lag.
    pub fn is_healthy(&self, threshold_ms: u64) -> bool {
        self.sample_count == 0 || self.max_lag_ms <= threshold_ms
    }
}

/// Summary of every tracked projection.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ConsistencyReport {
    pub projections: BTreeMap<String, LagStats>,
    pub overall_healthy: bool,
}

impl ConsistencyReport {
    /// Names of projections whose max lag exceeds `threshold_ms`.
    pub fn unhealthy(&self, threshold_ms: u64) -> Vec<&str> {
        self.projections
            .iter()
            .filter(|(_, stats)| !stats.is_healthy(threshold_ms))
            .map(|(name, _)| name.as_str())
            .collect()
    }
}
