//! The top-level reproduce operation.

use super::executor::{ReproductionExecutor, ReproductionResult};
use super::options::{ReproduceOptions, Targets};
use crate::config::RepoConfig;
use crate::errors::{GraphError, ReproflowError, RunCacheError};
use crate::events::{EventSink, NoOpEventSink, ReproEvent};
use crate::graph::{
    dedupe_stages, derive_order, get_pipeline, get_pipelines, remove_frozen_edges, DependencyGraph,
    EvaluationPlan,
};
use crate::stages::{
    GraphStageCollector, NoOpScmContext, RunCache, ScmContext, StageCollector, StageRef,
    UnsupportedRunCache,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// A repository: its stage graph, configuration and collaborators.
///
/// Reproduce calls on the same repository never interleave.
pub struct Repository {
    graph: DependencyGraph,
    config: RepoConfig,
    collector: Arc<dyn StageCollector>,
    run_cache: Arc<dyn RunCache>,
    scm: Arc<dyn ScmContext>,
    events: Arc<dyn EventSink>,
    lock: Mutex<()>,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("stages", &self.graph.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Repository {
    /// Creates a repository over `graph` with default collaborators.
    ///
    /// Targets resolve against the graph's own stages, the run cache is
    /// unavailable and events are discarded.
    #[must_use]
    pub fn new(graph: DependencyGraph) -> Self {
        Self {
            collector: Arc::new(GraphStageCollector::new(&graph)),
            graph,
            config: RepoConfig::default(),
            run_cache: Arc::new(UnsupportedRunCache::new("no remote configured")),
            scm: Arc::new(NoOpScmContext),
            events: Arc::new(NoOpEventSink),
            lock: Mutex::new(()),
        }
    }

    /// Sets the persisted configuration.
    #[must_use]
    pub fn with_config(mut self, config: RepoConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the target resolver.
    #[must_use]
    pub fn with_collector(mut self, collector: Arc<dyn StageCollector>) -> Self {
        self.collector = collector;
        self
    }

    /// Sets the run cache.
    #[must_use]
    pub fn with_run_cache(mut self, run_cache: Arc<dyn RunCache>) -> Self {
        self.run_cache = run_cache;
        self
    }

    /// Sets the source-control hooks.
    #[must_use]
    pub fn with_scm(mut self, scm: Arc<dyn ScmContext>) -> Self {
        self.scm = scm;
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Returns the stage graph.
    #[must_use]
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    /// Reproduces `targets` and returns the stages that changed.
    ///
    /// Holds the repository lock for the whole call. The scm hooks wrap the
    /// work and `exit` runs whether or not it succeeded.
    ///
    /// # Errors
    ///
    /// Fails when a target cannot be resolved, when the run cache fails for
    /// any reason other than being unsupported, or when a stage fails.
    pub async fn reproduce(
        &self,
        targets: impl Into<Targets>,
        options: ReproduceOptions,
    ) -> Result<ReproductionResult, ReproflowError> {
        let targets = targets.into();
        let _guard = self.lock.lock().await;

        self.scm.enter();
        let result = self.reproduce_locked(targets, options).await;
        self.scm.exit(result.is_ok());
        result
    }

    async fn reproduce_locked(
        &self,
        targets: Targets,
        mut options: ReproduceOptions,
    ) -> Result<ReproductionResult, ReproflowError> {
        let targets = targets.normalize(options.all_pipelines, &self.config.core.project_file);
        if !options.interactive {
            options.interactive = self.config.core.interactive;
        }

        let stages = self.collect_seeds(&targets, &options)?;

        if options.pull && options.run_cache {
            self.pull_run_cache().await?;
        }

        let stages = dedupe_stages(stages);
        reproduce_stages(&self.graph, &stages, &options, self.events.clone()).await
    }

    fn collect_seeds(
        &self,
        targets: &[String],
        options: &ReproduceOptions,
    ) -> Result<Vec<StageRef>, ReproflowError> {
        if !(options.pipeline || options.all_pipelines) {
            let mut stages = Vec::new();
            for target in targets {
                stages.extend(self.collector.collect(target, options.recursive, options.glob)?);
            }
            return Ok(stages);
        }

        let pipelines = get_pipelines(&self.graph);
        let selected: Vec<&DependencyGraph> = if options.all_pipelines {
            pipelines.iter().collect()
        } else {
            let mut selected = Vec::with_capacity(targets.len());
            for target in targets {
                let stage = self.collector.get_target(target)?;
                let pipeline = get_pipeline(&pipelines, &stage)
                    .ok_or_else(|| GraphError::unknown(stage.address()))?;
                selected.push(pipeline);
            }
            selected
        };

        Ok(selected.into_iter().flat_map(DependencyGraph::roots).collect())
    }

    async fn pull_run_cache(&self) -> Result<(), RunCacheError> {
        debug!("Pulling run cache");
        ReproEvent::run_cache_pull_started().emit(self.events.as_ref());

        match self.run_cache.pull(None).await {
            Ok(()) => Ok(()),
            Err(err @ RunCacheError::NotSupported(_)) => {
                warn!("Failed to pull run cache: {}", err);
                ReproEvent::run_cache_unsupported(&err.to_string()).emit(self.events.as_ref());
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}

/// Plans and executes a reproduction of `stages` over the unpruned `graph`.
///
/// With `single_item` the stages are executed exactly as given. Otherwise
/// frozen stages are cut off from their dependencies and the plan expands
/// upstream, or downstream with `options.downstream`.
///
/// # Errors
///
/// Fails when a stage is not part of `graph` or when a stage fails.
pub async fn reproduce_stages(
    graph: &DependencyGraph,
    stages: &[StageRef],
    options: &ReproduceOptions,
    events: Arc<dyn EventSink>,
) -> Result<ReproductionResult, ReproflowError> {
    let plan = if options.single_item {
        EvaluationPlan::from_stages(stages.to_vec())
    } else {
        let active = remove_frozen_edges(graph);
        derive_order(&active, stages, options.downstream)?
    };

    debug!(plan = ?plan.addresses(), "Derived evaluation plan");
    let executor = ReproductionExecutor::new(events);
    Ok(executor
        .execute(&plan, options.force_downstream, options.stage_flags())
        .await?)
}
