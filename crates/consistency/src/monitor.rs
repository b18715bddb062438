//! Per-projection lag tracking.

use std::collections::{HashMap, VecDeque};

use tokio::sync::RwLock;

use crate::config::MonitorConfig;
use crate::report::{ConsistencyReport, LagStats};

/// Lag samples for one projection, with running aggregates.
///
/// Individual samples are kept only when a window is configured; an
/// unbounded series is just its count, sum and max.
#[derive(Debug, Default)]
struct LagSeries {
    window: VecDeque<u64>,
    count: usize,
    sum: u128,
    max: u64,
}

impl LagSeries {
    fn push(&mut self, lag_ms: u64, max_samples: Option<usize>) {
        self.count += 1;
        self.sum += u128::from(lag_ms);
        self.max = self.max.max(lag_ms);

        let Some(limit) = max_samples else {
            return;
        };
        self.window.push_back(lag_ms);
        let mut evicted_max = false;
        while self.window.len() > limit {
            if let Some(evicted) = self.window.pop_front() {
                self.count -= 1;
                self.sum -= u128::from(evicted);
                evicted_max |= evicted == self.max;
            }
        }
        if evicted_max {
            self.max = self.window.iter().copied().max().unwrap_or(0);
        }
    }

    fn stats(&self) -> LagStats {
        if self.count == 0 {
            return LagStats::default();
        }
        LagStats {
            avg_lag_ms: self.sum as f64 / self.count as f64,
            max_lag_ms: self.max,
            sample_count: self.count,
        }
    }
}

/// Records lag samples per projection name and derives health from them.
///
/// Safe to share across projections (`Arc<ConsistencyMonitor>`): samples are
/// keyed by projection name and no operation coordinates across names.
#[derive(Debug, Default)]
pub struct ConsistencyMonitor {
    config: MonitorConfig,
    series: RwLock<HashMap<String, LagSeries>>,
}

impl ConsistencyMonitor {
    /// Creates a monitor with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a monitor with explicit configuration.
    pub fn with_config(config: MonitorConfig) -> Self {
        Self {
            config,
            series: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Appends one lag sample for `projection`.
    pub async fn record_lag(&self, projection: &str, lag_ms: u64) {
        self.series
            .write()
            .await
            .entry(projection.to_string())
            .or_default()
            .push(lag_ms, self.config.max_samples);

        metrics::histogram!("projection_lag_ms", "projection" => projection.to_string())
            .record(lag_ms as f64);

        if lag_ms > self.config.lag_threshold_ms {
            tracing::warn!(
                projection,
                lag_ms,
                threshold_ms = self.config.lag_threshold_ms,
                "projection lag above threshold"
            );
        }
    }

    /// Mean lag for `projection`, or 0 when nothing was recorded.
    pub async fn average_lag(&self, projection: &str) -> f64 {
        self.stats(projection).await.avg_lag_ms
    }

    /// Largest lag for `projection`, or 0 when nothing was recorded.
    pub async fn max_lag(&self, projection: &str) -> u64 {
        self.stats(projection).await.max_lag_ms
    }

    /// Number of retained samples for `projection`.
    pub async fn sample_count(&self, projection: &str) -> usize {
        self.stats(projection).await.sample_count
    }

    /// Aggregated statistics for `projection`.
    pub async fn stats(&self, projection: &str) -> LagStats {
        self.series
            .read()
            .await
            .get(projection)
            .map(LagSeries::stats)
            .unwrap_or_default()
    }

    /// Health under the configured threshold.
    pub async fn is_healthy(&self, projection: &str) -> bool {
        self.is_healthy_within(projection, self.config.lag_threshold_ms)
            .await
    }

    /// True iff the max recorded lag is at most `threshold_ms`.
    ///
    /// A projection without samples is healthy.
    pub async fn is_healthy_within(&self, projection: &str, threshold_ms: u64) -> bool {
        self.stats(projection).await.is_healthy(threshold_ms)
    }

    /// Names of every projection with at least one recorded sample.
    pub async fn tracked_projections(&self) -> Vec<String> {
        let mut names: Vec<String> = self.series.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Report under the configured threshold.
    pub async fn report(&self) -> ConsistencyReport {
        self.report_within(self.config.lag_threshold_ms).await
    }

    /// Summarizes every tracked projection.
    ///
    /// `overall_healthy` holds iff each tracked projection is healthy under
    /// `threshold_ms`; with nothing tracked the system is healthy.
    pub async fn report_within(&self, threshold_ms: u64) -> ConsistencyReport {
        let series = self.series.read().await;
        let projections: std::collections::BTreeMap<_, _> = series
            .iter()
            .map(|(name, series)| (name.clone(), series.stats()))
            .collect();
        let overall_healthy = projections
            .values()
            .all(|stats| stats.is_healthy(threshold_ms));

        ConsistencyReport {
            projections,
            overall_healthy,
        }
    }

    /// Drops all samples for all projections.
    pub async fn reset(&self) {
        self.series.write().await.clear();
        tracing::debug!("consistency monitor reset");
    }
}
