//! Reproduction event type.

use super::EventSink;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// An event emitted while planning or executing a reproduction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReproEvent {
    /// The event type (e.g., "stage.changed").
    #[serde(rename = "type")]
    pub event_type: String,

    /// When the event occurred (RFC 3339).
    pub timestamp: String,

    /// The event payload data.
    #[serde(default)]
    pub data: HashMap<String, serde_json::Value>,
}

impl ReproEvent {
    /// Creates a new event.
    #[must_use]
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            data: HashMap::new(),
        }
    }

    /// Adds a data field to the event.
    #[must_use]
    pub fn add_data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    /// Sends the event to `sink` without blocking.
    pub fn emit(&self, sink: &dyn EventSink) {
        let mut payload: serde_json::Map<String, serde_json::Value> =
            self.data.clone().into_iter().collect();
        payload.insert("timestamp".to_string(), serde_json::json!(self.timestamp));
        sink.try_emit(&self.event_type, Some(serde_json::Value::Object(payload)));
    }

    fn for_stage(event_type: &str, address: &str) -> Self {
        Self::new(event_type).add_data("stage", serde_json::json!(address))
    }

    /// A reproduction run is starting.
    #[must_use]
    pub fn run_started(run_id: Uuid, plan: &[String]) -> Self {
        Self::new("reproduce.started")
            .add_data("run_id", serde_json::json!(run_id.to_string()))
            .add_data("plan", serde_json::json!(plan))
    }

    /// A reproduction run finished.
    #[must_use]
    pub fn run_completed(run_id: Uuid, changed: &[String], duration_ms: f64) -> Self {
        Self::new("reproduce.completed")
            .add_data("run_id", serde_json::json!(run_id.to_string()))
            .add_data("changed", serde_json::json!(changed))
            .add_data("duration_ms", serde_json::json!(duration_ms))
    }

    /// A frozen stage is about to be evaluated without its dependencies.
    #[must_use]
    pub fn frozen(address: &str) -> Self {
        Self::for_stage("stage.frozen", address)
    }

    /// A stage's reproduce call is about to run.
    #[must_use]
    pub fn stage_started(address: &str, index: usize, force: bool) -> Self {
        Self::for_stage("stage.started", address)
            .add_data("index", serde_json::json!(index))
            .add_data("force", serde_json::json!(force))
    }

    /// A stage reported no change.
    #[must_use]
    pub fn unchanged(address: &str) -> Self {
        Self::for_stage("stage.unchanged", address)
    }

    /// A stage reported a change.
    #[must_use]
    pub fn changed(address: &str, duration_ms: f64) -> Self {
        Self::for_stage("stage.changed", address).add_data("duration_ms", serde_json::json!(duration_ms))
    }

    /// A changed stage's state was recorded.
    #[must_use]
    pub fn persisted(address: &str) -> Self {
        Self::for_stage("stage.persisted", address)
    }

    /// A stage failed and the run is aborting.
    #[must_use]
    pub fn failed(address: &str, error: &str) -> Self {
        Self::for_stage("stage.failed", address).add_data("error", serde_json::json!(error))
    }

    /// Every later stage in the run will be forced.
    #[must_use]
    pub fn force_downstream(address: &str) -> Self {
        Self::for_stage("stage.force_downstream", address)
    }

    /// Boundary between two stages.
    #[must_use]
    pub fn boundary(after_index: usize) -> Self {
        Self::new("reproduce.boundary").add_data("after", serde_json::json!(after_index))
    }

    /// The run cache prefetch is starting.
    #[must_use]
    pub fn run_cache_pull_started() -> Self {
        Self::new("run_cache.pull_started")
    }

    /// The run cache cannot be used; the run continues without it.
    #[must_use]
    pub fn run_cache_unsupported(reason: &str) -> Self {
        Self::new("run_cache.pull_unsupported").add_data("reason", serde_json::json!(reason))
    }
}
