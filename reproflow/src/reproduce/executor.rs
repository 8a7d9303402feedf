//! Sequential reproduction executor.
//!
//! Walks an evaluation plan in order, hands each stage everything processed
//! before it, persists changed stages and stops at the first failure.

use crate::errors::ReproductionError;
use crate::events::{EventSink, ReproEvent};
use crate::graph::EvaluationPlan;
use crate::observability::SpanTimer;
use crate::stages::{ReproduceContext, StageFlags, StageOutcome, StageRef};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Stages that changed during a run, in plan order.
#[derive(Debug, Clone, Default)]
pub struct ReproductionResult {
    run_id: Uuid,
    stages: Vec<StageRef>,
}

impl ReproductionResult {
    /// Identifier of the run, as reported in its events.
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Returns the changed stages.
    #[must_use]
    pub fn stages(&self) -> &[StageRef] {
        &self.stages
    }

    /// Returns the addresses of the changed stages.
    #[must_use]
    pub fn addresses(&self) -> Vec<String> {
        self.stages.iter().map(|s| s.address().to_string()).collect()
    }

    /// Returns true if the stage changed.
    #[must_use]
    pub fn contains(&self, address: &str) -> bool {
        self.stages.iter().any(|s| s.address() == address)
    }

    /// Returns the number of changed stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns true if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Consumes the result, returning the changed stages.
    #[must_use]
    pub fn into_stages(self) -> Vec<StageRef> {
        self.stages
    }
}

/// The force flag carried across one run.
///
/// Starts at the caller's value and can only ever be raised.
#[derive(Debug, Clone, Copy)]
struct ForceState {
    force: bool,
}

impl ForceState {
    fn new(initial: bool) -> Self {
        Self { force: initial }
    }

    fn is_set(self) -> bool {
        self.force
    }

    /// Raises the flag, returning true if it was not set before.
    fn escalate(&mut self) -> bool {
        let raised = !self.force;
        self.force = true;
        raised
    }
}

/// Runs stages one after another in plan order.
#[derive(Clone)]
pub struct ReproductionExecutor {
    events: Arc<dyn EventSink>,
}

impl std::fmt::Debug for ReproductionExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReproductionExecutor").finish_non_exhaustive()
    }
}

impl ReproductionExecutor {
    /// Creates an executor reporting to `events`.
    #[must_use]
    pub fn new(events: Arc<dyn EventSink>) -> Self {
        Self { events }
    }

    /// Executes `plan`.
    ///
    /// With `force_downstream`, the first changed stage forces every stage
    /// after it, whatever their own change detection says.
    ///
    /// # Errors
    ///
    /// Returns a [`ReproductionError`] naming the first stage whose reproduce
    /// or persist call failed. Later stages are not attempted.
    pub async fn execute(
        &self,
        plan: &EvaluationPlan,
        force_downstream: bool,
        flags: StageFlags,
    ) -> Result<ReproductionResult, ReproductionError> {
        let timer = SpanTimer::start("reproduce");
        let run_id = Uuid::new_v4();
        let stages = plan.stages();
        debug!(%run_id, stages = stages.len(), "Starting reproduction");
        ReproEvent::run_started(run_id, &plan.addresses()).emit(self.events.as_ref());

        let mut force = ForceState::new(flags.force);
        let mut changed = Vec::new();

        for (i, stage) in stages.iter().enumerate() {
            let stage_flags = StageFlags {
                force: force.is_set(),
                ..flags
            };

            let outcome = self
                .reproduce_stage(stage, i, &stages[..i], stage_flags)
                .await
                .map_err(|source| {
                    error!(stage = %stage.address(), error = %format!("{source:#}"), "Stage failed");
                    ReproEvent::failed(stage.address(), &format!("{source:#}")).emit(self.events.as_ref());
                    ReproductionError::new(stage.address(), source)
                })?;

            if outcome.is_changed() {
                changed.push(stage.clone());
                if force_downstream && force.escalate() {
                    debug!(stage = %stage.address(), "Forcing every following stage");
                    ReproEvent::force_downstream(stage.address()).emit(self.events.as_ref());
                }
            }

            if i + 1 < stages.len() {
                info!("");
                ReproEvent::boundary(i).emit(self.events.as_ref());
            }
        }

        let result = ReproductionResult {
            run_id,
            stages: changed,
        };
        ReproEvent::run_completed(run_id, &result.addresses(), timer.finish()).emit(self.events.as_ref());
        Ok(result)
    }

    async fn reproduce_stage(
        &self,
        stage: &StageRef,
        index: usize,
        upstream: &[StageRef],
        flags: StageFlags,
    ) -> anyhow::Result<StageOutcome> {
        let address = stage.address();
        if stage.is_frozen() && !stage.is_import() {
            warn!("{} is frozen. Its dependencies are not going to be reproduced.", address);
            ReproEvent::frozen(address).emit(self.events.as_ref());
        }

        ReproEvent::stage_started(address, index, flags.force).emit(self.events.as_ref());
        let timer = SpanTimer::start(address);
        let ctx = ReproduceContext::new(upstream, flags);
        let outcome = stage.reproduce(&ctx).await?;

        match outcome {
            StageOutcome::Unchanged => {
                debug!(stage = %address, "Stage is up to date");
                ReproEvent::unchanged(address).emit(self.events.as_ref());
            }
            StageOutcome::Changed => {
                ReproEvent::changed(address, timer.finish()).emit(self.events.as_ref());
                if !flags.dry {
                    stage.persist(false).await?;
                    ReproEvent::persisted(address).emit(self.events.as_ref());
                }
            }
        }

        Ok(outcome)
    }
}
