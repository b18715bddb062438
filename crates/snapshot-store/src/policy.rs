//! Snapshot cadence.
//!
//! Kept separate from [`SnapshotStore`](crate::SnapshotStore) so the cadence
//! can be tuned and tested without any storage.

use crate::Version;

/// Interval used when none is configured.
pub const DEFAULT_SNAPSHOT_INTERVAL: u64 = 10;

/// Returns true iff `version` is positive and an exact multiple of `interval`.
///
/// Version 0 never triggers: nothing has been applied yet. An interval of 0
/// disables snapshotting.
pub fn should_take_snapshot(version: Version, interval: u64) -> bool {
    let Ok(version) = u64::try_from(version.as_i64()) else {
        return false;
    };
    interval > 0 && version > 0 && version % interval == 0
}

/// Configured snapshot cadence.
///
/// Reads from environment variables:
/// - `SNAPSHOT_INTERVAL`: take a snapshot every N versions (default: `10`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotPolicy {
    pub interval: u64,
}

impl SnapshotPolicy {
    /// Creates a policy with an explicit interval.
    pub fn every(interval: u64) -> Self {
        Self { interval }
    }

    /// Loads the policy from the environment, falling back to the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            interval: lookup("SNAPSHOT_INTERVAL")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SNAPSHOT_INTERVAL),
        }
    }

    /// Whether a snapshot is due after applying the event at `version`.
    pub fn should_snapshot(&self, version: Version) -> bool {
        should_take_snapshot(version, self.interval)
    }
}

impl Default for SnapshotPolicy {
    fn default() -> Self {
        Self::every(DEFAULT_SNAPSHOT_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn v(value: i64) -> Version {
        Version::new(value)
    }

    #[test]
    fn default_interval_triggers_on_multiples_of_ten() {
        assert!(should_take_snapshot(v(10), DEFAULT_SNAPSHOT_INTERVAL));
        assert!(should_take_snapshot(v(20), DEFAULT_SNAPSHOT_INTERVAL));
        assert!(!should_take_snapshot(v(9), DEFAULT_SNAPSHOT_INTERVAL));
        assert!(!should_take_snapshot(v(11), DEFAULT_SNAPSHOT_INTERVAL));
    }

    #[test]
    fn version_zero_never_triggers() {
        assert!(!should_take_snapshot(v(0), DEFAULT_SNAPSHOT_INTERVAL));
        assert!(!should_take_snapshot(v(0), 1));
    }

    #[test]
    fn custom_interval() {
        assert!(should_take_snapshot(v(5), 5));
        assert!(!should_take_snapshot(v(7), 5));
        assert!(should_take_snapshot(v(1), 1));
    }

    #[test]
    fn zero_interval_and_negative_versions_never_trigger() {
        assert!(!should_take_snapshot(v(10), 0));
        assert!(!should_take_snapshot(v(-10), 5));
    }

    #[test]
    fn policy_delegates_to_cadence_function() {
        let policy = SnapshotPolicy::every(3);
        assert!(policy.should_snapshot(v(6)));
        assert!(!policy.should_snapshot(v(7)));
        assert_eq!(SnapshotPolicy::default().interval, 10);
    }

    #[test]
    fn invalid_interval_falls_back_to_default() {
        let policy = SnapshotPolicy::from_lookup(|_| Some("often".to_string()));
        assert_eq!(policy.interval, DEFAULT_SNAPSHOT_INTERVAL);
    }

    #[test]
    #[serial]
    fn from_env_reads_interval() {
        // SAFETY: serialized with every other test touching the environment.
        unsafe { std::env::set_var("SNAPSHOT_INTERVAL", "25") };
        assert_eq!(SnapshotPolicy::from_env().interval, 25);

        unsafe { std::env::remove_var("SNAPSHOT_INTERVAL") };
        assert_eq!(SnapshotPolicy::from_env().interval, DEFAULT_SNAPSHOT_INTERVAL);
    }
}
