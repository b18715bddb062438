//! Named projection registry with rebuild and live application.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use consistency::ConsistencyMonitor;
use futures_util::future::join_all;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::event::ProjectedEvent;
use crate::projection::Projection;
use crate::{ProjectionError, Result};

/// Outcome of rebuilding one projection.
///
/// A result with `errors > 0` is still a successful rebuild; whether the
/// partial view is acceptable is the caller's decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RebuildResult {
    pub projection_name: String,
    /// Every event attempted, failed or not.
    pub events_processed: u64,
    pub errors: u64,
    pub duration_ms: u64,
}

impl RebuildResult {
    /// True when every event applied cleanly.
    pub fn is_clean(&self) -> bool {
        self.errors == 0
    }

    /// Fraction of attempted events that failed, 0.0 for an empty log.
    pub fn error_rate(&self) -> f64 {
        if self.events_processed == 0 {
            return 0.0;
        }
        self.errors as f64 / self.events_processed as f64
    }
}

struct Registration {
    projection: Arc<dyn Projection>,
    // Held for the whole of every rebuild and live application so `project`
    // calls on one projection never overlap.
    gate: Arc<Mutex<()>>,
}

/// Registry of projections keyed by name.
///
/// Supports:
/// - Rebuild: reset one projection and replay a full event log into it,
///   counting per-event failures instead of aborting
/// - Rebuild all: the same for every registered projection, concurrently
/// - Live application: deliver new events, propagating failures to the caller
pub struct ProjectionRebuildManager {
    projections: HashMap<String, Registration>,
    monitor: Option<Arc<ConsistencyMonitor>>,
}

impl ProjectionRebuildManager {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            projections: HashMap::new(),
            monitor: None,
        }
    }

    /// Reports lag of every live application to `monitor`.
    pub fn with_monitor(mut self, monitor: Arc<ConsistencyMonitor>) -> Self {
        self.monitor = Some(monitor);
        self
    }

    /// Registers a projection under its name, replacing any previous one.
    pub fn register(&mut self, projection: Box<dyn Projection>) {
        let name = projection.name().to_string();
        let registration = Registration {
            projection: Arc::from(projection),
            gate: Arc::new(Mutex::new(())),
        };
        if self.projections.insert(name.clone(), registration).is_some() {
            tracing::debug!(projection = %name, "replaced registered projection");
        }
    }

    /// Names of all registered projections, sorted.
    pub fn registered_projections(&self) -> Vec<String> {
        let mut names: Vec<String> = self.projections.keys().cloned().collect();
        names.sort();
        names
    }

    /// Whether a projection is registered under `name`.
    pub fn is_registered(&self, name: &str) -> bool {
        self.projections.contains_key(name)
    }

    /// Returns the number of registered projections.
    pub fn projection_count(&self) -> usize {
        self.projections.len()
    }

    fn registration(&self, name: &str) -> Result<&Registration> {
        self.projections
            .get(name)
            .ok_or_else(|| ProjectionError::NotRegistered(name.to_string()))
    }

    /// Resets the named projection and replays `events` into it in order.
    ///
    /// Fails without touching any state if `name` is not registered. A failing
    /// event is counted in [`RebuildResult::errors`] and the replay continues
    /// with the next one.
    #[tracing::instrument(skip(self, events), fields(event_count = events.len()))]
    pub async fn rebuild(&self, name: &str, events: &[ProjectedEvent]) -> Result<RebuildResult> {
        let registration = self.registration(name)?;
        let _gate = registration.gate.lock().await;
        let started = Instant::now();

        registration.projection.reset().await?;

        let mut events_processed: u64 = 0;
        let mut errors: u64 = 0;
        for event in events {
            events_processed += 1;
            if let Err(error) = registration.projection.project(event).await {
                errors += 1;
                metrics::counter!("projections_rebuild_errors", "projection" => name.to_string())
                    .increment(1);
                tracing::warn!(
                    event_id = %event.event_id,
                    event_type = %event.event_type,
                    aggregate_id = %event.aggregate_id,
                    version = %event.aggregate_version,
                    %error,
                    "event failed during rebuild, continuing"
                );
            }
        }

        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        metrics::counter!("projections_events_processed", "projection" => name.to_string())
            .increment(events_processed);
        metrics::counter!("projections_rebuilds_total", "projection" => name.to_string())
            .increment(1);
        metrics::histogram!("projections_rebuild_duration_ms").record(duration_ms as f64);
        tracing::info!(events_processed, errors, duration_ms, "rebuild complete");

        Ok(RebuildResult {
            projection_name: name.to_string(),
            events_processed,
            errors,
            duration_ms,
        })
    }

    /// Rebuilds every registered projection from the same event log.
    ///
    /// Projections are rebuilt concurrently; each still sees the events
    /// strictly in the given order. Every rebuild runs to completion even when
    /// another one fails; the first failure in name order is then returned.
    #[tracing::instrument(skip(self, events), fields(event_count = events.len()))]
    pub async fn rebuild_all(
        &self,
        events: &[ProjectedEvent],
    ) -> Result<HashMap<String, RebuildResult>> {
        let names = self.registered_projections();
        let outcomes = join_all(names.iter().map(|name| self.rebuild(name, events))).await;

        let mut results = HashMap::with_capacity(outcomes.len());
        let mut first_error = None;
        for (name, outcome) in names.into_iter().zip(outcomes) {
            match outcome {
                Ok(result) => {
                    results.insert(name, result);
                }
                Err(error) => {
                    tracing::error!(projection = %name, %error, "rebuild failed");
                    first_error.get_or_insert(error);
                }
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(results),
        }
    }

    /// Applies one live event to the named projection.
    ///
    /// Failures propagate; retry or dead-lettering is the caller's policy.
    #[tracing::instrument(skip(self, event), fields(event_type = %event.event_type))]
    pub async fn process_event(&self, name: &str, event: &ProjectedEvent) -> Result<()> {
        let registration = self.registration(name)?;
        {
            let _gate = registration.gate.lock().await;
            registration.projection.project(event).await?;
        }
        metrics::counter!("projections_events_processed", "projection" => name.to_string())
            .increment(1);

        if let Some(monitor) = &self.monitor {
            monitor.record_lag(name, event.lag_ms(Utc::now())).await;
        }
        Ok(())
    }

    /// Applies one live event to every registered projection.
    ///
    /// Stops at the first failure; projections after it have not seen the event.
    #[tracing::instrument(skip(self, event), fields(event_type = %event.event_type))]
    pub async fn process_event_all(&self, event: &ProjectedEvent) -> Result<()> {
        for name in self.registered_projections() {
            self.process_event(&name, event).await?;
        }
        Ok(())
    }
}

impl Default for ProjectionRebuildManager {
    fn default() -> Self {
        Self::new()
    }
}
