//! Stage trait and the context handed to each reproduce call.
//!
//! Stages are the nodes of a reproduction graph. The engine never looks inside
//! a stage: change detection, command execution and output tracking all live
//! behind [`Stage::reproduce`] and [`Stage::persist`].

mod ports;

pub use ports::{
    GraphStageCollector, NoOpScmContext, RunCache, ScmContext, StageCollector,
    UnsupportedRunCache,
};

#[cfg(test)]
pub use ports::MockRunCache;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;

/// Shared handle to a stage.
pub type StageRef = Arc<dyn Stage>;

/// Trait for reproducible pipeline stages.
///
/// Identity is the address: two handles with the same address are the same stage.
#[async_trait]
pub trait Stage: Send + Sync + Debug {
    /// Returns the stable address of the stage (used in errors and logs).
    fn address(&self) -> &str;

    /// Whether the stage is pinned.
    ///
    /// A frozen stage's dependencies are never pulled into an evaluation
    /// closure through it.
    fn is_frozen(&self) -> bool {
        false
    }

    /// Whether the stage imports an external reference.
    fn is_import(&self) -> bool {
        false
    }

    /// Checks the stage for changes and re-executes it when needed.
    async fn reproduce(&self, ctx: &ReproduceContext<'_>) -> anyhow::Result<StageOutcome>;

    /// Records the stage's state.
    ///
    /// `update_pipeline` asks the stage to rewrite its pipeline definition entry
    /// as well as its own recorded metadata.
    async fn persist(&self, update_pipeline: bool) -> anyhow::Result<()>;
}

/// What a reproduce call reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageOutcome {
    /// The stage was re-executed (or would be, in a dry run).
    Changed,
    /// The stage was up to date.
    Unchanged,
}

impl StageOutcome {
    /// Returns true if the stage changed.
    #[must_use]
    pub fn is_changed(self) -> bool {
        matches!(self, Self::Changed)
    }
}

/// Per-call options forwarded to a stage's reproduce call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageFlags {
    /// Re-execute regardless of the stage's own change detection.
    pub force: bool,
    /// Only report what would run.
    pub dry: bool,
    /// Ask before executing.
    pub interactive: bool,
}

/// Context handed to [`Stage::reproduce`].
///
/// Borrows the upstream stages straight from the plan being executed.
#[derive(Debug, Clone, Copy)]
pub struct ReproduceContext<'a> {
    upstream: &'a [StageRef],
    flags: StageFlags,
}

impl<'a> ReproduceContext<'a> {
    /// Creates a new context.
    #[must_use]
    pub fn new(upstream: &'a [StageRef], flags: StageFlags) -> Self {
        Self { upstream, flags }
    }

    /// Stages processed earlier in the same plan, in plan order.
    #[must_use]
    pub fn upstream(&self) -> &'a [StageRef] {
        self.upstream
    }

    /// Addresses of the upstream stages.
    #[must_use]
    pub fn upstream_addresses(&self) -> Vec<String> {
        self.upstream.iter().map(|s| s.address().to_string()).collect()
    }

    /// Returns the flags for this call.
    #[must_use]
    pub fn flags(&self) -> StageFlags {
        self.flags
    }

    /// Whether the stage must re-execute unconditionally.
    #[must_use]
    pub fn force(&self) -> bool {
        self.flags.force
    }

    /// Whether this is a dry run.
    #[must_use]
    pub fn dry(&self) -> bool {
        self.flags.dry
    }

    /// Whether execution is interactive.
    #[must_use]
    pub fn interactive(&self) -> bool {
        self.flags.interactive
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingStage;

    #[test]
    fn test_outcome_is_changed() {
        assert!(StageOutcome::Changed.is_changed());
        assert!(!StageOutcome::Unchanged.is_changed());
    }

    #[test]
    fn test_context_upstream_addresses() {
        let a: StageRef = Arc::new(RecordingStage::new("a"));
        let b: StageRef = Arc::new(RecordingStage::new("b"));
        let upstream = vec![a, b];
        let ctx = ReproduceContext::new(
            &upstream,
            StageFlags {
                force: true,
                ..StageFlags::default()
            },
        );

        assert_eq!(ctx.upstream_addresses(), vec!["a", "b"]);
        // The context borrows the caller's stages instead of copying them.
        assert!(std::ptr::eq(ctx.upstream(), upstream.as_slice()));
        assert!(ctx.force());
        assert!(!ctx.dry());
        assert!(!ctx.interactive());
    }

    #[test]
    fn test_default_attributes() {
        let stage = RecordingStage::new("plain");
        assert!(!stage.is_frozen());
        assert!(!stage.is_import());
        assert_eq!(stage.address(), "plain");
    }
}
