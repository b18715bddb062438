//! Monitor configuration loaded from environment variables.

/// Health threshold used when none is configured.
pub const DEFAULT_LAG_THRESHOLD_MS: u64 = 5000;

/// Consistency monitor settings.
///
/// Reads from environment variables:
/// - `CONSISTENCY_LAG_THRESHOLD_MS`: max lag still considered healthy (default: `5000`)
/// - `CONSISTENCY_MAX_SAMPLES`: per-projection sample window (default: unbounded)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    pub lag_threshold_ms: u64,
    pub max_samples: Option<usize>,
}

impl MonitorConfig {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            lag_threshold_ms: lookup("CONSISTENCY_LAG_THRESHOLD_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_LAG_THRESHOLD_MS),
            max_samples: lookup("CONSISTENCY_MAX_SAMPLES")
                .and_then(|v| v.parse().ok())
                .filter(|n: &usize| *n > 0),
        }
    }

    /// Sets the health threshold.
    pub fn with_lag_threshold_ms(mut self, threshold_ms: u64) -> Self {
        self.lag_threshold_ms = threshold_ms;
        self
    }

    /// Keeps only the most recent `max_samples` per projection.
    pub fn with_max_samples(mut self, max_samples: usize) -> Self {
        self.max_samples = Some(max_samples).filter(|n| *n > 0);
        self
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            lag_threshold_ms: DEFAULT_LAG_THRESHOLD_MS,
            max_samples: None,
        }
    }
}
