//! # Reproflow
//!
//! A reproduction engine for stage-based data pipelines.
//!
//! Given a dependency graph of stages and a set of targets, reproflow works
//! out which stages must be re-evaluated and in which order, then evaluates
//! them one at a time:
//!
//! - **Dependency graph**: an adjacency-list DAG where `u -> v` means `u` depends on `v`
//! - **Frozen pruning**: pinned stages are cut off from their dependencies
//! - **Evaluation order**: upstream or downstream post-order over the selected stages
//! - **Sequential execution**: fail-fast, with optional force propagation
//! - **Event-driven observability**: every transition is pushed to an [`events::EventSink`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use reproflow::prelude::*;
//!
//! let graph = DependencyGraph::from_parts(
//!     [prepare, train, evaluate],
//!     [("dvc.yaml:train", "dvc.yaml:prepare"), ("dvc.yaml:evaluate", "dvc.yaml:train")],
//! )?;
//!
//! let repo = Repository::new(graph).with_event_sink(Arc::new(LoggingEventSink::info()));
//! let changed = repo
//!     .reproduce("dvc.yaml:evaluate", ReproduceOptions::new().with_force_downstream(true))
//!     .await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod errors;
pub mod events;
pub mod graph;
pub mod observability;
pub mod reproduce;
pub mod stages;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{CoreConfig, RepoConfig};
    pub use crate::errors::{
        CollectError, ContractErrorInfo, GraphError, ReproductionError, ReproflowError,
        RunCacheError,
    };
    pub use crate::events::{
        CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink, ReproEvent,
    };
    pub use crate::graph::{derive_order, remove_frozen_edges, DependencyGraph, EvaluationPlan};
    pub use crate::observability::{init_logging, LogFormat};
    pub use crate::reproduce::{
        ReproduceOptions, ReproductionExecutor, ReproductionResult, Repository, Targets,
    };
    pub use crate::stages::{
        ReproduceContext, RunCache, ScmContext, Stage, StageCollector, StageFlags, StageOutcome,
        StageRef,
    };
}
