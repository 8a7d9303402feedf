//! Event sink trait and implementations.

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, error, info, warn, Level};

/// Trait for event sinks that can receive reproduction events.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Emits an event asynchronously.
    ///
    /// # Arguments
    ///
    /// * `event_type` - The type of event (e.g., "stage.changed")
    /// * `data` - Optional event data
    async fn emit(&self, event_type: &str, data: Option<serde_json::Value>);

    /// Emits an event without blocking.
    ///
    /// Must never fail; sinks swallow their own errors.
    fn try_emit(&self, event_type: &str, data: Option<serde_json::Value>);
}

/// A no-op event sink that discards all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event_type: &str, _data: Option<serde_json::Value>) {}

    fn try_emit(&self, _event_type: &str, _data: Option<serde_json::Value>) {}
}

/// An event sink that forwards events to `tracing`.
///
/// Failures are logged at error level and warnings (frozen stages, an
/// unusable run cache) at warn level; everything else uses the configured
/// level.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self { level: Level::DEBUG }
    }
}

impl LoggingEventSink {
    /// Creates a new logging event sink with the specified level.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates an info-level logging sink.
    #[must_use]
    pub fn info() -> Self {
        Self::new(Level::INFO)
    }

    fn log_event(&self, event_type: &str, data: Option<&serde_json::Value>) {
        match event_type {
            "stage.failed" => error!(event_type, event_data = ?data, "Event: {}", event_type),
            "stage.frozen" | "run_cache.pull_unsupported" => {
                warn!(event_type, event_data = ?data, "Event: {}", event_type);
            }
            _ if self.level == Level::INFO => {
                info!(event_type, event_data = ?data, "Event: {}", event_type);
            }
            _ => debug!(event_type, event_data = ?data, "Event: {}", event_type),
        }
    }
}

#[async_trait]
impl EventSink for LoggingEventSink {
    async fn emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.log_event(event_type, data.as_ref());
    }

    fn try_emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.log_event(event_type, data.as_ref());
    }
}

/// An event sink that keeps every event in memory.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: RwLock<Vec<(String, Option<serde_json::Value>)>>,
}

impl CollectingEventSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    #[must_use]
    pub fn events(&self) -> Vec<(String, Option<serde_json::Value>)> {
        self.events.read().clone()
    }

    /// Returns the collected event types in emission order.
    #[must_use]
    pub fn event_types(&self) -> Vec<String> {
        self.events.read().iter().map(|(t, _)| t.clone()).collect()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if no events have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Clears all collected events.
    pub fn clear(&self) {
        self.events.write().clear();
    }

    /// Returns events of exactly `event_type`.
    #[must_use]
    pub fn events_of_type(&self, event_type: &str) -> Vec<Option<serde_json::Value>> {
        self.events
            .read()
            .iter()
            .filter(|(t, _)| t == event_type)
            .map(|(_, data)| data.clone())
            .collect()
    }

    /// Returns the `stage` field of every event of `event_type`.
    #[must_use]
    pub fn stages_for(&self, event_type: &str) -> Vec<String> {
        self.events_of_type(event_type)
            .into_iter()
            .filter_map(|data| {
                data.and_then(|d| d.get("stage").and_then(|s| s.as_str()).map(str::to_string))
            })
            .collect()
    }
}

#[async_trait]
impl EventSink for CollectingEventSink {
    async fn emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.events.write().push((event_type.to_string(), data));
    }

    fn try_emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.events.write().push((event_type.to_string(), data));
    }
}
