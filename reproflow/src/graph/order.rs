//! Evaluation order derivation.
//!
//! Given seed stages, selects the subgraph of interest and linearises it so
//! that every stage comes after everything it depends on.
//!
//! For the pipeline
//!
//! ```text
//!                E
//!               / \
//!              D   F
//!             / \   \
//!            B   C   G
//!             \ /
//!              A
//! ```
//!
//! (each stage depends on the ones drawn below it) the upstream plan for `D` is
//! `[A, B, C, D]` and the downstream plan for `B` is `[B, D, E]`.

use super::dag::Direction;
use super::DependencyGraph;
use crate::errors::GraphError;
use crate::stages::StageRef;
use std::collections::HashSet;

/// An ordered sequence of distinct stages, dependencies first.
#[derive(Debug, Clone, Default)]
pub struct EvaluationPlan {
    stages: Vec<StageRef>,
}

impl EvaluationPlan {
    /// Wraps a literal stage sequence without any expansion or reordering.
    #[must_use]
    pub fn from_stages(stages: Vec<StageRef>) -> Self {
        Self { stages }
    }

    /// Returns the stages in plan order.
    #[must_use]
    pub fn stages(&self) -> &[StageRef] {
        &self.stages
    }

    /// Returns the stage addresses in plan order.
    #[must_use]
    pub fn addresses(&self) -> Vec<String> {
        self.stages.iter().map(|s| s.address().to_string()).collect()
    }

    /// Position of a stage in the plan.
    #[must_use]
    pub fn position(&self, address: &str) -> Option<usize> {
        self.stages.iter().position(|s| s.address() == address)
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns true if the plan is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Consumes the plan, returning its stages.
    #[must_use]
    pub fn into_stages(self) -> Vec<StageRef> {
        self.stages
    }
}

/// Removes repeated stages, keeping the first occurrence of each address.
#[must_use]
pub fn dedupe_stages(stages: impl IntoIterator<Item = StageRef>) -> Vec<StageRef> {
    let mut seen = HashSet::new();
    stages
        .into_iter()
        .filter(|s| seen.insert(s.address().to_string()))
        .collect()
}

/// Derives the evaluation plan for `seeds`.
///
/// Upstream (`downstream == false`) selects every seed plus its transitive
/// dependencies. Downstream selects every seed plus its transitive
/// dependents. Either way the result is a post-order over dependency edges
/// restricted to the selection, so each stage follows all of its selected
/// dependencies. Seeds are walked in the order given and a stage is never
/// emitted twice.
///
/// # Errors
///
/// Returns an error if a seed is not part of `graph`.
pub fn derive_order(
    graph: &DependencyGraph,
    seeds: &[StageRef],
    downstream: bool,
) -> Result<EvaluationPlan, GraphError> {
    let seeds = dedupe_stages(seeds.iter().cloned());
    let seed_nodes = seeds
        .iter()
        .map(|s| graph.require(s.address()))
        .collect::<Result<Vec<_>, _>>()?;

    let order = if downstream {
        let selected = graph.reach(seed_nodes, Direction::Dependents);
        let mut within = vec![false; graph.len()];
        for &node in &selected {
            within[node] = true;
        }
        post_order(graph, &selected, &within)
    } else {
        post_order(graph, &seed_nodes, &vec![true; graph.len()])
    };

    Ok(EvaluationPlan::from_stages(
        order.into_iter().map(|i| graph.node(i).clone()).collect(),
    ))
}

/// Iterative depth-first post-order over dependency edges.
///
/// Only nodes flagged in `within` are entered. Roots are tried in order.
fn post_order(graph: &DependencyGraph, roots: &[usize], within: &[bool]) -> Vec<usize> {
    let mut visited = vec![false; graph.len()];
    let mut order = Vec::new();
    // (node, index of the next dependency to look at)
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for &root in roots {
        if visited[root] {
            continue;
        }
        visited[root] = true;
        stack.push((root, 0));

        while let Some(frame) = stack.last_mut() {
            let node = frame.0;
            let next = graph.outgoing_of(node).get(frame.1).copied();
            frame.1 += 1;

            match next {
                Some(dep) => {
                    if within[dep] && !visited[dep] {
                        visited[dep] = true;
                        stack.push((dep, 0));
                    }
                }
                None => {
                    stack.pop();
                    order.push(node);
                }
            }
        }
    }

    order
}
