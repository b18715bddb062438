//! Eventual-consistency monitoring for projections.
//!
//! Whatever drives live event application measures how long after an event
//! occurred its effect landed in a read model, and reports it here:
//! - [`ConsistencyMonitor`] keeps lag samples per projection and answers health queries
//! - [`MonitorConfig`] holds the default health threshold and sample window
//! - [`ConsistencyReport`] summarizes every tracked projection

pub mod config;
pub mod monitor;
pub mod report;

pub use config::{DEFAULT_LAG_THRESHOLD_MS, MonitorConfig};
pub use monitor::ConsistencyMonitor;
pub use report::{ConsistencyReport, LagStats};
