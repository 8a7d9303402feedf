//! Dependency graph and the algorithms that plan a reproduction.
//!
//! This module provides:
//! - The adjacency-list stage graph
//! - Frozen-stage pruning
//! - Upstream/downstream evaluation order derivation
//! - Grouping into disjoint pipelines

mod dag;
mod order;
mod pipelines;
mod prune;

pub use dag::DependencyGraph;
pub use order::{dedupe_stages, derive_order, EvaluationPlan};
pub use pipelines::{get_pipeline, get_pipelines};
pub use prune::remove_frozen_edges;
