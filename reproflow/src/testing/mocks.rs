//! Mock stages for testing.

use anyhow::anyhow;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::stages::{ReproduceContext, Stage, StageFlags, StageOutcome};

/// Which stage method a recorded call went to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// `Stage::reproduce`.
    Reproduce,
    /// `Stage::persist`.
    Persist,
}

/// A recorded call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// Address of the called stage.
    pub address: String,
    /// Which method was called.
    pub kind: CallKind,
    /// Upstream addresses from the context (reproduce calls only).
    pub upstream: Vec<String>,
    /// Flags from the context (reproduce calls only).
    pub flags: StageFlags,
    /// The `update_pipeline` argument (persist calls only).
    pub update_pipeline: Option<bool>,
}

/// A call log shared between stages, preserving the global call order.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl CallLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, call: RecordedCall) {
        self.calls.lock().push(call);
    }

    /// Returns every call in order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Returns the reproduce calls in order.
    #[must_use]
    pub fn reproduce_calls(&self) -> Vec<RecordedCall> {
        self.of_kind(CallKind::Reproduce)
    }

    /// Returns the persist calls in order.
    #[must_use]
    pub fn persist_calls(&self) -> Vec<RecordedCall> {
        self.of_kind(CallKind::Persist)
    }

    /// Addresses of reproduced stages, in call order.
    #[must_use]
    pub fn reproduced(&self) -> Vec<String> {
        self.reproduce_calls().into_iter().map(|c| c.address).collect()
    }

    /// Addresses of persisted stages, in call order.
    #[must_use]
    pub fn persisted(&self) -> Vec<String> {
        self.persist_calls().into_iter().map(|c| c.address).collect()
    }

    /// Clears the log.
    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    fn of_kind(&self, kind: CallKind) -> Vec<RecordedCall> {
        self.calls.lock().iter().filter(|c| c.kind == kind).cloned().collect()
    }
}

/// A stage that records its calls and reports a configurable outcome.
///
/// Reports [`StageOutcome::Changed`] when configured to, or whenever it is
/// forced.
#[derive(Debug)]
pub struct RecordingStage {
    address: String,
    frozen: bool,
    import: bool,
    changed: bool,
    reproduce_error: Option<String>,
    persist_error: Option<String>,
    log: CallLog,
}

impl RecordingStage {
    /// Creates an unchanged, unfrozen stage with its own log.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            frozen: false,
            import: false,
            changed: false,
            reproduce_error: None,
            persist_error: None,
            log: CallLog::new(),
        }
    }

    /// Sets the frozen flag.
    #[must_use]
    pub fn frozen(mut self, frozen: bool) -> Self {
        self.frozen = frozen;
        self
    }

    /// Sets the import flag.
    #[must_use]
    pub fn import(mut self, import: bool) -> Self {
        self.import = import;
        self
    }

    /// Reports a change even when not forced.
    #[must_use]
    pub fn changed(mut self, changed: bool) -> Self {
        self.changed = changed;
        self
    }

    /// Makes every reproduce call fail with `message`.
    #[must_use]
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.reproduce_error = Some(message.into());
        self
    }

    /// Makes every persist call fail with `message`.
    #[must_use]
    pub fn failing_persist(mut self, message: impl Into<String>) -> Self {
        self.persist_error = Some(message.into());
        self
    }

    /// Records into `log` instead of a private log.
    #[must_use]
    pub fn with_log(mut self, log: &CallLog) -> Self {
        self.log = log.clone();
        self
    }

    /// Returns the log this stage records into.
    #[must_use]
    pub fn log(&self) -> &CallLog {
        &self.log
    }
}

#[async_trait]
impl Stage for RecordingStage {
    fn address(&self) -> &str {
        &self.address
    }

    fn is_frozen(&self) -> bool {
        self.frozen
    }

    fn is_import(&self) -> bool {
        self.import
    }

    async fn reproduce(&self, ctx: &ReproduceContext<'_>) -> anyhow::Result<StageOutcome> {
        self.log.record(RecordedCall {
            address: self.address.clone(),
            kind: CallKind::Reproduce,
            upstream: ctx.upstream_addresses(),
            flags: ctx.flags(),
            update_pipeline: None,
        });

        if let Some(message) = &self.reproduce_error {
            return Err(anyhow!("{message}"));
        }
        if self.changed || ctx.force() {
            Ok(StageOutcome::Changed)
        } else {
            Ok(StageOutcome::Unchanged)
        }
    }

    async fn persist(&self, update_pipeline: bool) -> anyhow::Result<()> {
        self.log.record(RecordedCall {
            address: self.address.clone(),
            kind: CallKind::Persist,
            upstream: Vec::new(),
            flags: StageFlags::default(),
            update_pipeline: Some(update_pipeline),
        });

        match &self.persist_error {
            Some(message) => Err(anyhow!("{message}")),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recording_stage_outcomes() {
        let stage = RecordingStage::new("train");
        let ctx = ReproduceContext::new(&[], StageFlags::default());
        assert_eq!(stage.reproduce(&ctx).await.unwrap(), StageOutcome::Unchanged);

        let forced = ReproduceContext::new(
            &[],
            StageFlags {
                force: true,
                ..StageFlags::default()
            },
        );
        assert_eq!(stage.reproduce(&forced).await.unwrap(), StageOutcome::Changed);
        assert_eq!(stage.log().reproduced(), vec!["train", "train"]);
    }

    #[tokio::test]
    async fn test_failing_stage_still_records() {
        let stage = RecordingStage::new("train").failing("boom");
        let ctx = ReproduceContext::new(&[], StageFlags::default());

        let err = stage.reproduce(&ctx).await.unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert_eq!(stage.log().reproduced(), vec!["train"]);
    }

    #[tokio::test]
    async fn test_shared_log_keeps_global_order() {
        let log = CallLog::new();
        let a = RecordingStage::new("a").with_log(&log);
        let b = RecordingStage::new("b").failing_persist("disk full").with_log(&log);

        a.persist(false).await.unwrap();
        assert!(b.persist(true).await.is_err());

        assert_eq!(log.persisted(), vec!["a", "b"]);
        assert_eq!(log.persist_calls()[1].update_pipeline, Some(true));

        log.clear();
        assert!(log.calls().is_empty());
    }
}
